//! Backend gateway: the remote operations the onboarding screens depend on.
//!
//! Supports:
//! - **Mock**: fixed latencies and canned responses, no network
//! - **Http**: JSON over HTTP POST via reqwest
//!
//! Both are wrapped in [`InFlightGuard`] by [`create_gateway`], which makes
//! order status updates at-most-once per order.

pub mod guard;
pub mod http;
pub mod mock;
pub mod types;

pub use guard::InFlightGuard;
pub use http::HttpGateway;
pub use mock::{MockGateway, MockLatency};
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ConfigError, GatewayError};

/// The backend contract.
///
/// Every operation is a single round trip. Transport problems come back as
/// `Err`. `login` can also fail softly: a successful round trip with
/// `success: false`, which [`BackendGateway::login_checked`] turns into
/// [`GatewayError::Rejected`].
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, GatewayError>;

    async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse, GatewayError>;

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, GatewayError>;

    async fn get_orders(
        &self,
        request: GetOrdersRequest,
    ) -> Result<GetOrdersResponse, GatewayError>;

    async fn update_order_status(
        &self,
        request: UpdateOrderStatusRequest,
    ) -> Result<UpdateOrderStatusResponse, GatewayError>;

    /// `login`, with `success: false` mapped to `Rejected`.
    async fn login_checked(&self, request: LoginRequest) -> Result<LoginResponse, GatewayError> {
        let response = self.login(request).await?;
        if response.success {
            Ok(response)
        } else {
            Err(GatewayError::Rejected {
                message: response.message.filter(|m| !m.trim().is_empty()),
            })
        }
    }
}

/// Supported gateway backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayBackend {
    Mock,
    Http,
}

impl std::str::FromStr for GatewayBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::InvalidValue {
                key: "ONBOARD_GATEWAY".to_string(),
                message: format!("unknown gateway backend '{other}' (expected mock or http)"),
            }),
        }
    }
}

/// Default backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.example.com";

/// Configuration for creating a gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub backend: GatewayBackend,
    /// Base URL for `Http`; endpoints are appended (`/login`, `/ingest`, ...).
    pub base_url: String,
    /// Per-request timeout for `Http`.
    pub timeout: Duration,
    /// Simulated latencies for `Mock`.
    pub mock_latency: MockLatency,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend: GatewayBackend::Mock,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            mock_latency: MockLatency::default(),
        }
    }
}

impl GatewayConfig {
    /// Build from `ONBOARD_GATEWAY`, `ONBOARD_API_BASE_URL`,
    /// `ONBOARD_API_TIMEOUT_SECS` and `ONBOARD_MOCK_LATENCY_SCALE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match std::env::var("ONBOARD_GATEWAY") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };

        let base_url = std::env::var("ONBOARD_API_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let timeout = match std::env::var("ONBOARD_API_TIMEOUT_SECS") {
            Ok(value) => parse_timeout(&value)?,
            Err(_) => defaults.timeout,
        };

        let mock_latency = match std::env::var("ONBOARD_MOCK_LATENCY_SCALE") {
            Ok(value) => parse_latency_scale(&defaults.mock_latency, &value)?,
            Err(_) => defaults.mock_latency,
        };

        Ok(Self {
            backend,
            base_url,
            timeout,
            mock_latency,
        })
    }
}

/// `ONBOARD_API_TIMEOUT_SECS`: a whole, non-zero number of seconds.
fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: "ONBOARD_API_TIMEOUT_SECS".to_string(),
        message,
    };
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("'{value}' is not a whole number of seconds")))?;
    if secs == 0 {
        return Err(invalid("must be at least 1 second".to_string()));
    }
    Ok(Duration::from_secs(secs))
}

/// `ONBOARD_MOCK_LATENCY_SCALE` applied to `base`.
fn parse_latency_scale(base: &MockLatency, value: &str) -> Result<MockLatency, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: "ONBOARD_MOCK_LATENCY_SCALE".to_string(),
        message,
    };
    let scale: f64 = value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("'{value}' is not a number")))?;
    base.scaled(scale).ok_or_else(|| {
        invalid(format!(
            "'{value}' must be a non-negative number small enough to scale every latency"
        ))
    })
}

/// Create a gateway from configuration.
pub fn create_gateway(config: &GatewayConfig) -> Result<Arc<dyn BackendGateway>, ConfigError> {
    let inner: Arc<dyn BackendGateway> = match config.backend {
        GatewayBackend::Mock => {
            tracing::info!("Using mock backend gateway");
            Arc::new(MockGateway::new(config.mock_latency.clone()))
        }
        GatewayBackend::Http => {
            let gateway = HttpGateway::new(&config.base_url, config.timeout)?;
            tracing::info!("Using HTTP backend gateway ({})", gateway.base_url());
            Arc::new(gateway)
        }
    };
    Ok(Arc::new(InFlightGuard::new(inner)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Gateway whose login answer is fixed; everything else is unused.
    struct FixedLogin(LoginResponse);

    #[async_trait]
    impl BackendGateway for FixedLogin {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn login(&self, _request: LoginRequest) -> Result<LoginResponse, GatewayError> {
            Ok(self.0.clone())
        }
        async fn ingest(&self, _request: IngestRequest) -> Result<IngestResponse, GatewayError> {
            unimplemented!("not used in login tests")
        }
        async fn query(&self, _request: QueryRequest) -> Result<QueryResponse, GatewayError> {
            unimplemented!("not used in login tests")
        }
        async fn get_orders(
            &self,
            _request: GetOrdersRequest,
        ) -> Result<GetOrdersResponse, GatewayError> {
            unimplemented!("not used in login tests")
        }
        async fn update_order_status(
            &self,
            _request: UpdateOrderStatusRequest,
        ) -> Result<UpdateOrderStatusResponse, GatewayError> {
            unimplemented!("not used in login tests")
        }
    }

    fn request() -> LoginRequest {
        LoginRequest {
            user_id: "a@b.com".into(),
            password: secrecy::SecretString::from("x"),
        }
    }

    #[tokio::test]
    async fn login_checked_maps_soft_failure() {
        let gateway = FixedLogin(LoginResponse {
            success: false,
            message: Some("Account locked".into()),
            ..Default::default()
        });
        match gateway.login_checked(request()).await {
            Err(GatewayError::Rejected { message }) => {
                assert_eq!(message.as_deref(), Some("Account locked"))
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_checked_drops_blank_message() {
        let gateway = FixedLogin(LoginResponse {
            success: false,
            message: Some("  ".into()),
            ..Default::default()
        });
        assert!(matches!(
            gateway.login_checked(request()).await,
            Err(GatewayError::Rejected { message: None })
        ));
    }

    #[tokio::test]
    async fn login_checked_passes_success() {
        let gateway = FixedLogin(LoginResponse {
            success: true,
            business_id: Some("biz".into()),
            ..Default::default()
        });
        let response = gateway.login_checked(request()).await.unwrap();
        assert_eq!(response.business_id.as_deref(), Some("biz"));
    }

    #[test]
    fn backend_parses_known_names() {
        assert_eq!("mock".parse::<GatewayBackend>().unwrap(), GatewayBackend::Mock);
        assert_eq!("HTTP".parse::<GatewayBackend>().unwrap(), GatewayBackend::Http);
        assert!("grpc".parse::<GatewayBackend>().is_err());
    }

    #[test]
    fn create_http_gateway() {
        let config = GatewayConfig {
            backend: GatewayBackend::Http,
            base_url: "http://localhost:9999/".into(),
            ..Default::default()
        };
        let gateway = create_gateway(&config).unwrap();
        assert_eq!(gateway.name(), "http");
    }

    #[test]
    fn create_rejects_bad_base_url() {
        let config = GatewayConfig {
            backend: GatewayBackend::Http,
            base_url: "not a url".into(),
            ..Default::default()
        };
        match create_gateway(&config) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "ONBOARD_API_BASE_URL"),
            Err(other) => panic!("expected InvalidValue, got {other:?}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn timeout_must_be_positive_whole_seconds() {
        assert_eq!(parse_timeout(" 15 ").unwrap(), Duration::from_secs(15));
        for value in ["0", "1.5", "-3", "soon"] {
            assert!(
                matches!(parse_timeout(value), Err(ConfigError::InvalidValue { .. })),
                "{value}"
            );
        }
    }

    #[test]
    fn latency_scale_is_validated() {
        let base = MockLatency::default();
        let half = parse_latency_scale(&base, "0.5").unwrap();
        assert_eq!(half.login, Duration::from_millis(500));
        assert_eq!(parse_latency_scale(&base, "0").unwrap(), MockLatency::none());

        for value in ["1e300", "inf", "NaN", "-1", "fast"] {
            match parse_latency_scale(&base, value) {
                Err(ConfigError::InvalidValue { key, .. }) => {
                    assert_eq!(key, "ONBOARD_MOCK_LATENCY_SCALE")
                }
                other => panic!("{value}: expected InvalidValue, got {other:?}"),
            }
        }
    }
}
