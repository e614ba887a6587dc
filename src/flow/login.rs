//! Login screen controller.

use std::sync::Arc;

use secrecy::SecretString;

use super::messages;
use crate::error::GatewayError;
use crate::gateway::{BackendGateway, LoginRequest};
use crate::onboarding::{LoginData, OnboardingStep, OnboardingStore, current_step};

pub struct LoginScreen {
    store: Arc<OnboardingStore>,
    gateway: Arc<dyn BackendGateway>,
    busy: bool,
    error: Option<String>,
}

impl LoginScreen {
    pub fn new(store: Arc<OnboardingStore>, gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            store,
            gateway,
            busy: false,
            error: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Log in and record the credentials.
    ///
    /// Returns the step to show next, or `None` with [`error`](Self::error)
    /// set when the backend was unreachable or refused the login.
    pub async fn submit(&mut self, user_id: &str, password: &str) -> Option<OnboardingStep> {
        if self.busy {
            return None;
        }
        self.error = None;
        self.busy = true;

        let request = LoginRequest {
            user_id: user_id.to_string(),
            password: SecretString::from(password),
        };
        let result = self.gateway.login_checked(request).await;
        self.busy = false;

        match result {
            Ok(response) => {
                let mut data = LoginData::new(user_id, password);
                data.business_id = response.business_id;
                data.auth_metadata = response.auth_metadata;
                data.telegram_bot_token = response.telegram_bot_token;
                let state = self.store.set_login_data(data).await;
                Some(current_step(&state))
            }
            Err(GatewayError::Rejected { message }) => {
                tracing::info!(user_id, "Login rejected");
                self.error = Some(message.unwrap_or_else(|| messages::LOGIN_REJECTED.to_string()));
                None
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.error = Some(messages::LOGIN_UNREACHABLE.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::gateway::*;
    use crate::storage::MemoryStorage;

    enum LoginBehaviour {
        Accept(LoginResponse),
        Down,
    }

    struct ScriptedLogin(LoginBehaviour);

    #[async_trait]
    impl BackendGateway for ScriptedLogin {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn login(&self, _request: LoginRequest) -> Result<LoginResponse, GatewayError> {
            match &self.0 {
                LoginBehaviour::Accept(response) => Ok(response.clone()),
                LoginBehaviour::Down => Err(GatewayError::Status {
                    operation: "login".into(),
                    status: 503,
                }),
            }
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

    async fn screen(behaviour: LoginBehaviour) -> (Arc<OnboardingStore>, LoginScreen) {
        let store = Arc::new(OnboardingStore::open(Arc::new(MemoryStorage::new())).await);
        let screen = LoginScreen::new(Arc::clone(&store), Arc::new(ScriptedLogin(behaviour)));
        (store, screen)
    }

    #[tokio::test]
    async fn success_without_business_goes_to_ingestion() {
        let (store, mut screen) = screen(LoginBehaviour::Accept(LoginResponse {
            success: true,
            ..Default::default()
        }))
        .await;

        assert_eq!(
            screen.submit("a@b.com", "x").await,
            Some(OnboardingStep::Ingestion)
        );
        assert!(screen.error().is_none());
        assert!(!screen.is_busy());

        let state = store.snapshot().await;
        assert_eq!(state.user_id.as_deref(), Some("a@b.com"));
        assert!(state.business_id.is_none());
    }

    #[tokio::test]
    async fn success_records_business_and_metadata() {
        let mut metadata = serde_json::Map::new();
        metadata.insert("role".into(), serde_json::json!("admin"));
        let (store, mut screen) = screen(LoginBehaviour::Accept(LoginResponse {
            success: true,
            business_id: Some("biz-9".into()),
            auth_metadata: Some(metadata.clone()),
            ..Default::default()
        }))
        .await;

        screen.submit("a@b.com", "x").await;
        let state = store.snapshot().await;
        assert_eq!(state.business_id.as_deref(), Some("biz-9"));
        assert_eq!(state.auth_metadata, Some(metadata));
    }

    #[tokio::test]
    async fn provisioned_bot_lands_on_orders_after_ingestion() {
        let (store, mut screen) = screen(LoginBehaviour::Accept(LoginResponse {
            success: true,
            telegram_bot_token: Some("tok".into()),
            ..Default::default()
        }))
        .await;

        // Token alone never skips ingestion.
        assert_eq!(
            screen.submit("a@b.com", "x").await,
            Some(OnboardingStep::Ingestion)
        );
        store.set_upload_batch_id("batch-1").await;
        assert_eq!(store.current_step().await, OnboardingStep::Orders);
    }

    #[tokio::test]
    async fn rejection_shows_server_message() {
        let (store, mut screen) = screen(LoginBehaviour::Accept(LoginResponse {
            success: false,
            message: Some("Unknown account".into()),
            ..Default::default()
        }))
        .await;

        assert!(screen.submit("a@b.com", "x").await.is_none());
        assert_eq!(screen.error(), Some("Unknown account"));
        assert!(!store.is_logged_in().await);
    }

    #[tokio::test]
    async fn rejection_without_message_uses_generic_text() {
        let (_store, mut screen) = screen(LoginBehaviour::Accept(LoginResponse {
            success: false,
            ..Default::default()
        }))
        .await;

        screen.submit("a@b.com", "x").await;
        assert_eq!(screen.error(), Some(messages::LOGIN_REJECTED));
    }

    #[tokio::test]
    async fn transport_failure_is_recoverable() {
        let (store, mut screen) = screen(LoginBehaviour::Down).await;

        assert!(screen.submit("a@b.com", "x").await.is_none());
        assert_eq!(screen.error(), Some(messages::LOGIN_UNREACHABLE));
        assert!(!screen.is_busy());
        assert_eq!(store.current_step().await, OnboardingStep::Login);
    }
}
