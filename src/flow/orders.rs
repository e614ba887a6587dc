//! Orders list controller.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::messages;
use crate::error::GatewayError;
use crate::gateway::{
    BackendGateway, GetOrdersRequest, ORDER_COMPLETED_STATUS, Order, UpdateOrderStatusRequest,
};
use crate::onboarding::OnboardingStore;

/// Mark the order with `payment_id` completed; every other order is untouched.
///
/// Returns whether a matching order was found.
pub fn apply_completed(orders: &mut [Order], payment_id: &str) -> bool {
    let mut found = false;
    for order in orders.iter_mut().filter(|o| o.payment_id == payment_id) {
        order.status = ORDER_COMPLETED_STATUS.to_string();
        found = true;
    }
    found
}

/// `created_at` as "Jan 15, 2025 · 10:30", or the raw text if it does not parse.
pub fn display_date(order: &Order) -> String {
    order
        .created_at_utc()
        .map(|dt: DateTime<Utc>| dt.format("%b %d, %Y · %H:%M").to_string())
        .unwrap_or_else(|| order.created_at.clone())
}

pub struct OrdersScreen {
    store: Arc<OnboardingStore>,
    gateway: Arc<dyn BackendGateway>,
    loading: bool,
    orders: Vec<Order>,
    count: u64,
    updating_order_id: Option<String>,
    error: Option<String>,
}

impl OrdersScreen {
    pub fn new(store: Arc<OnboardingStore>, gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            store,
            gateway,
            loading: false,
            orders: Vec::new(),
            count: 0,
            updating_order_id: None,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Total reported by the backend, which may exceed `orders().len()`.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The order whose status update is running, if any.
    pub fn updating_order_id(&self) -> Option<&str> {
        self.updating_order_id.as_deref()
    }

    /// Whether the "mark completed" action is available for `payment_id`.
    pub fn can_mark_completed(&self, payment_id: &str) -> bool {
        self.updating_order_id.is_none()
            && self
                .orders
                .iter()
                .any(|o| o.payment_id == payment_id && !o.is_completed())
    }

    /// Reload the list. On failure the previous list is kept.
    pub async fn refresh(&mut self) {
        self.loading = true;
        self.error = None;
        let request = GetOrdersRequest {
            business_id: self.store.business_id().await,
        };
        let result = self.gateway.get_orders(request).await;
        self.loading = false;

        match result {
            Ok(response) => {
                self.count = response.count;
                self.orders = response.orders;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch orders: {}", e);
                self.error = Some(messages::ORDERS_UNAVAILABLE.to_string());
            }
        }
    }

    /// Mark an order completed, then patch the local list.
    ///
    /// The local status only changes after the backend confirms, so a
    /// failure leaves nothing to roll back.
    pub async fn mark_completed(&mut self, payment_id: &str) -> Result<(), GatewayError> {
        if let Some(current) = &self.updating_order_id {
            return Err(GatewayError::AlreadyInFlight {
                order_id: current.clone(),
            });
        }
        self.error = None;
        self.updating_order_id = Some(payment_id.to_string());

        let request = UpdateOrderStatusRequest {
            business_id: self.store.business_id().await,
            order_id: payment_id.to_string(),
        };
        let result = self.gateway.update_order_status(request).await;
        self.updating_order_id = None;

        match result {
            Ok(response) if response.success => {
                if !apply_completed(&mut self.orders, payment_id) {
                    tracing::debug!(payment_id, "Completed order is not in the local list");
                }
                Ok(())
            }
            Ok(_) => {
                tracing::warn!(payment_id, "Backend declined order update");
                self.error = Some(messages::ORDER_UPDATE_FAILED.to_string());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to update order {}: {}", payment_id, e);
                self.error = Some(messages::ORDER_UPDATE_FAILED.to_string());
                Err(e)
            }
        }
    }
}
