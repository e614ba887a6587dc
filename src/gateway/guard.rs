//! At-most-once order status updates.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::BackendGateway;
use super::types::*;
use crate::error::GatewayError;

type OrderKey = (String, String);

/// Wraps a gateway so that two `update_order_status` calls for the same
/// `(business_id, order_id)` never run at the same time.
///
/// The second caller fails fast with [`GatewayError::AlreadyInFlight`] and
/// never reaches the backend. Every other operation passes straight through.
pub struct InFlightGuard {
    inner: Arc<dyn BackendGateway>,
    in_flight: Arc<Mutex<HashSet<OrderKey>>>,
}

/// Releases its key when dropped, whether the call finished or failed.
struct Claim {
    key: OrderKey,
    in_flight: Arc<Mutex<HashSet<OrderKey>>>,
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.key);
    }
}

impl InFlightGuard {
    pub fn new(inner: Arc<dyn BackendGateway>) -> Self {
        Self {
            inner,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn claim(&self, business_id: &str, order_id: &str) -> Option<Claim> {
        let key = (business_id.to_string(), order_id.to_string());
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(key.clone()) {
            return None;
        }
        Some(Claim {
            key,
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

#[async_trait]
impl BackendGateway for InFlightGuard {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, GatewayError> {
        self.inner.login(request).await
    }

    async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse, GatewayError> {
        self.inner.ingest(request).await
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, GatewayError> {
        self.inner.query(request).await
    }

    async fn get_orders(
        &self,
        request: GetOrdersRequest,
    ) -> Result<GetOrdersResponse, GatewayError> {
        self.inner.get_orders(request).await
    }

    async fn update_order_status(
        &self,
        request: UpdateOrderStatusRequest,
    ) -> Result<UpdateOrderStatusResponse, GatewayError> {
        let Some(_claim) = self.claim(&request.business_id, &request.order_id) else {
            tracing::warn!(order_id = %request.order_id, "Duplicate order update refused");
            return Err(GatewayError::AlreadyInFlight {
                order_id: request.order_id,
            });
        };
        self.inner.update_order_status(request).await
    }
}
