//! Mock gateway: canned responses after a simulated network delay.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::RwLock;

use super::BackendGateway;
use super::types::*;
use crate::error::GatewayError;

/// Business id handed out by the mock login.
pub const MOCK_BUSINESS_ID: &str = "mock-business-123";

/// Products reported by every mock ingestion.
pub const MOCK_PRODUCT_COUNT: u64 = 44;

/// Simulated round-trip time per operation.
#[derive(Debug, Clone, PartialEq)]
pub struct MockLatency {
    pub login: Duration,
    pub ingest: Duration,
    pub query: Duration,
    pub get_orders: Duration,
    pub update_order_status: Duration,
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            login: Duration::from_millis(1000),
            ingest: Duration::from_millis(2000),
            query: Duration::from_millis(1500),
            get_orders: Duration::from_millis(1000),
            update_order_status: Duration::from_millis(800),
        }
    }
}

impl MockLatency {
    /// No delay at all.
    pub fn none() -> Self {
        Self {
            login: Duration::ZERO,
            ingest: Duration::ZERO,
            query: Duration::ZERO,
            get_orders: Duration::ZERO,
            update_order_status: Duration::ZERO,
        }
    }

    /// Every latency multiplied by `factor`.
    ///
    /// `None` when `factor` is negative or not finite, or when a scaled
    /// latency does not fit in a `Duration`.
    pub fn scaled(&self, factor: f64) -> Option<Self> {
        if !factor.is_finite() || factor < 0.0 {
            return None;
        }
        let scale = |d: Duration| Duration::try_from_secs_f64(d.as_secs_f64() * factor).ok();
        Some(Self {
            login: scale(self.login)?,
            ingest: scale(self.ingest)?,
            query: scale(self.query)?,
            get_orders: scale(self.get_orders)?,
            update_order_status: scale(self.update_order_status)?,
        })
    }
}

/// Prompts with a canned assistant answer.
pub const SUGGESTED_QUERIES: [&str; 3] = [
    "What products do you have?",
    "What are your best sellers?",
    "Tell me about shipping",
];

fn canned_answers() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            SUGGESTED_QUERIES[0],
            "We have a wide range of products including:\n\n\
             • Premium T-shirts ($29.99)\n\
             • Hoodies ($59.99)\n\
             • Sneakers ($89.99)\n\
             • Accessories starting at $14.99\n\n\
             Would you like details on any specific category?",
        ),
        (
            SUGGESTED_QUERIES[1],
            "Our top 3 best sellers this month are:\n\n\
             1. 🏆 Classic Black Hoodie - $59.99\n\
             2. 🥈 Vintage Logo Tee - $29.99\n\
             3. 🥉 Canvas Sneakers - $89.99\n\n\
             All items are in stock and ready to ship!",
        ),
        (
            SUGGESTED_QUERIES[2],
            "We offer several shipping options:\n\n\
             • Standard (5-7 days): Free on orders over $50\n\
             • Express (2-3 days): $9.99\n\
             • Next Day: $19.99\n\n\
             All orders include tracking and insurance.",
        ),
    ])
}

fn fallback_answer(query: &str) -> String {
    format!(
        "Thanks for asking about \"{query}\"! I'm your AI sales assistant and I'm here to help \
         you find the perfect products. We have a great selection available. What specifically \
         are you looking for?"
    )
}

fn fixture_orders(business_id: &str) -> Vec<Order> {
    let hoodie = CartItem {
        name: "Classic Black Hoodie".to_string(),
        unit_price_text: "$59.99".to_string(),
        unit_price_amount: dec!(59.99),
        unit_price_currency: "USD".to_string(),
        qty: 1,
        line_total_amount: dec!(59.99),
        suggested_asset_ids: None,
        product_ref: Some(ProductRef {
            source_chunk_id: "chunk-hoodie-01".to_string(),
            source_file_id: "catalog-001".to_string(),
        }),
    };
    let tee = CartItem {
        name: "Vintage Logo Tee".to_string(),
        unit_price_text: "$29.99".to_string(),
        unit_price_amount: dec!(29.99),
        unit_price_currency: "USD".to_string(),
        qty: 2,
        line_total_amount: dec!(59.98),
        suggested_asset_ids: Some(vec!["asset-tee-front".to_string()]),
        product_ref: None,
    };

    let order = |thread: &str,
                 payment: &str,
                 email: &str,
                 country: &str,
                 items: Vec<CartItem>,
                 status: &str,
                 at: &str| {
        let subtotal: Decimal = items.iter().map(|i| i.line_total_amount).sum();
        let item_count: u32 = items.iter().map(|i| i.qty).sum();
        Order {
            business_id: business_id.to_string(),
            thread_id: thread.to_string(),
            payment_id: payment.to_string(),
            email: email.to_string(),
            address: "221B Baker Street, London".to_string(),
            country: country.to_string(),
            amount: subtotal,
            currency: Some("USD".to_string()),
            status: status.to_string(),
            created_at: at.to_string(),
            updated_at: at.to_string(),
            cart_snapshot: CartSnapshot {
                thread_id: thread.to_string(),
                business_id: business_id.to_string(),
                items,
                summary: CartSummary {
                    item_count,
                    subtotal_amount: subtotal,
                    currency: "USD".to_string(),
                },
                updated_at: at.to_string(),
            },
        }
    };

    vec![
        order(
            "thread-1001",
            "pay-1001",
            "jane@example.com",
            "GB",
            vec![hoodie.clone()],
            "pending",
            "2025-01-15T10:30:00Z",
        ),
        order(
            "thread-1002",
            "pay-1002",
            "sam@example.com",
            "US",
            vec![hoodie, tee],
            "pending",
            "2025-01-16T18:05:00Z",
        ),
    ]
}

/// In-process stand-in for the backend.
///
/// Orders live in memory, so status updates are visible to later
/// `get_orders` calls on the same instance.
pub struct MockGateway {
    latency: MockLatency,
    orders: RwLock<Vec<Order>>,
}

impl MockGateway {
    pub fn new(latency: MockLatency) -> Self {
        Self {
            latency,
            orders: RwLock::new(fixture_orders(MOCK_BUSINESS_ID)),
        }
    }

    async fn delay(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[async_trait]
impl BackendGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, GatewayError> {
        self.delay(self.latency.login).await;
        tracing::info!(user_id = %request.user_id, "Mock login");

        if request.user_id.trim().is_empty() {
            return Ok(LoginResponse {
                success: false,
                message: Some("Email is required.".to_string()),
                ..Default::default()
            });
        }

        let mut auth_metadata = serde_json::Map::new();
        auth_metadata.insert("role".to_string(), serde_json::json!("admin"));
        Ok(LoginResponse {
            success: true,
            business_id: Some(MOCK_BUSINESS_ID.to_string()),
            auth_metadata: Some(auth_metadata),
            message: None,
            telegram_bot_token: None,
        })
    }

    async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse, GatewayError> {
        self.delay(self.latency.ingest).await;
        tracing::info!(url = %request.url, business_id = %request.business_id, "Mock ingest");
        Ok(IngestResponse {
            upload_batch_id: format!("mock-batch-{}", Utc::now().timestamp_millis()),
            products: MOCK_PRODUCT_COUNT,
            status: "ready".to_string(),
        })
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, GatewayError> {
        self.delay(self.latency.query).await;
        tracing::info!(query = %request.query, "Mock query");

        let response = canned_answers()
            .get(request.query.as_str())
            .map(|answer| answer.to_string())
            .unwrap_or_else(|| fallback_answer(&request.query));

        Ok(QueryResponse {
            response,
            sources: Some(vec!["Product Catalog".to_string(), "FAQ".to_string()]),
        })
    }

    async fn get_orders(
        &self,
        request: GetOrdersRequest,
    ) -> Result<GetOrdersResponse, GatewayError> {
        self.delay(self.latency.get_orders).await;
        let orders: Vec<Order> = self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| o.business_id == request.business_id)
            .cloned()
            .collect();
        tracing::info!(business_id = %request.business_id, count = orders.len(), "Mock get_orders");
        Ok(GetOrdersResponse {
            count: orders.len() as u64,
            orders,
        })
    }

    async fn update_order_status(
        &self,
        request: UpdateOrderStatusRequest,
    ) -> Result<UpdateOrderStatusResponse, GatewayError> {
        self.delay(self.latency.update_order_status).await;
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.business_id == request.business_id && o.payment_id == request.order_id)
            .ok_or_else(|| GatewayError::OrderNotFound {
                order_id: request.order_id.clone(),
            })?;
        order.status = ORDER_COMPLETED_STATUS.to_string();
        order.updated_at = Utc::now().to_rfc3339();
        tracing::info!(order_id = %request.order_id, "Mock order marked completed");
        Ok(UpdateOrderStatusResponse { success: true })
    }
}
