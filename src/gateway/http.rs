//! HTTP gateway: POSTs JSON to the backend and decodes JSON replies.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::BackendGateway;
use super::types::*;
use crate::error::{ConfigError, GatewayError};

/// Talks to the real backend over HTTP.
///
/// Any non-2xx status is a transport failure ([`GatewayError::Status`]),
/// kept apart from a 2xx login body saying `success: false`.
pub struct HttpGateway {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        reqwest::Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
            key: "ONBOARD_API_BASE_URL".to_string(),
            message: format!("'{base_url}' is not a valid URL: {e}"),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "ONBOARD_API_TIMEOUT_SECS".to_string(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            base_url: trimmed.to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<Req, Resp>(
        &self,
        operation: &str,
        path: &str,
        body: &Req,
    ) -> Result<Resp, GatewayError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path);
        tracing::debug!(operation, %url, "Backend request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout {
                        operation: operation.to_string(),
                        timeout: self.timeout,
                    }
                } else {
                    GatewayError::Transport {
                        operation: operation.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                operation,
                status = status.as_u16(),
                body = %body.chars().take(200).collect::<String>(),
                "Backend returned an error status"
            );
            return Err(GatewayError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| GatewayError::Transport {
            operation: operation.to_string(),
            reason: format!("failed to read body: {e}"),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    fn name(&self) -> &str {
        "http"
    }

    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, GatewayError> {
        self.post("login", "/login", &request).await
    }

    async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse, GatewayError> {
        self.post("ingest", "/ingest", &request).await
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, GatewayError> {
        self.post("query", "/query", &request).await
    }

    async fn get_orders(
        &self,
        request: GetOrdersRequest,
    ) -> Result<GetOrdersResponse, GatewayError> {
        self.post("get_orders", "/orders", &request).await
    }

    async fn update_order_status(
        &self,
        request: UpdateOrderStatusRequest,
    ) -> Result<UpdateOrderStatusResponse, GatewayError> {
        self.post("update_order_status", "/orders/status", &request).await
    }
}
