//! Request and response shapes of the backend wire contract.
//!
//! Field names are snake_case on the wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

/// The status an order carries once it has been marked completed.
pub const ORDER_COMPLETED_STATUS: &str = "success";

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub user_id: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_metadata: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present when the business already has a provisioned bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_bot_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub url: String,
    pub business_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub upload_batch_id: String,
    pub products: u64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub business_id: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetOrdersRequest {
    pub business_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetOrdersResponse {
    pub count: u64,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub business_id: String,
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOrderStatusResponse {
    pub success: bool,
}

/// Reference back to the catalog chunk a cart line came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub source_chunk_id: String,
    pub source_file_id: String,
}

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    pub unit_price_text: String,
    pub unit_price_amount: Decimal,
    pub unit_price_currency: String,
    pub qty: u32,
    pub line_total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_asset_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_ref: Option<ProductRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub item_count: u32,
    pub subtotal_amount: Decimal,
    pub currency: String,
}

/// The cart as it stood when the order was placed. Never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub thread_id: String,
    pub business_id: String,
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
    pub updated_at: String,
}

/// An order placed through the assistant.
///
/// `payment_id` is the key used for status updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub business_id: String,
    pub thread_id: String,
    pub payment_id: String,
    pub email: String,
    pub address: String,
    pub country: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub cart_snapshot: CartSnapshot,
}

impl Order {
    pub fn is_completed(&self) -> bool {
        self.status == ORDER_COMPLETED_STATUS
    }

    /// `created_at` parsed as RFC 3339, if it is one.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn login_request_sends_plain_password() {
        let request = LoginRequest {
            user_id: "a@b.com".into(),
            password: SecretString::from("x"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"user_id": "a@b.com", "password": "x"}));
        assert!(!format!("{request:?}").contains("\"x\""));
    }

    #[test]
    fn login_response_optionals_default() {
        let response: LoginResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!response.success);
        assert!(response.business_id.is_none());
        assert!(response.message.is_none());
    }

    #[test]
    fn order_parses_wire_shape() {
        let json = serde_json::json!({
            "business_id": "biz",
            "thread_id": "t-1",
            "payment_id": "pay-1",
            "email": "buyer@example.com",
            "address": "1 Main St",
            "country": "US",
            "amount": "59.99",
            "currency": null,
            "status": "pending",
            "created_at": "2025-01-15T10:30:00Z",
            "updated_at": "2025-01-15T10:30:00Z",
            "cart_snapshot": {
                "thread_id": "t-1",
                "business_id": "biz",
                "items": [{
                    "name": "Classic Black Hoodie",
                    "unit_price_text": "$59.99",
                    "unit_price_amount": 59.99,
                    "unit_price_currency": "USD",
                    "qty": 1,
                    "line_total_amount": 59.99,
                    "product_ref": {"source_chunk_id": "c", "source_file_id": "f"}
                }],
                "summary": {"item_count": 1, "subtotal_amount": 59.99, "currency": "USD"},
                "updated_at": "2025-01-15T10:30:00Z"
            }
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.amount, dec!(59.99));
        assert!(order.currency.is_none());
        assert!(!order.is_completed());
        assert_eq!(order.cart_snapshot.items[0].line_total_amount, dec!(59.99));
        assert!(order.cart_snapshot.items[0].suggested_asset_ids.is_none());
        assert_eq!(
            order.created_at_utc().unwrap().to_rfc3339(),
            "2025-01-15T10:30:00+00:00"
        );
    }
}
