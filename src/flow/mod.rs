//! Screen controllers for the onboarding wizard.
//!
//! Each controller owns the interaction state of one screen (busy flag,
//! error text, chat log, order list) and talks to the gateway and the
//! store. Nothing here renders; a front end reads the controller fields.

pub mod assistant;
pub mod ingestion;
pub mod login;
pub mod orders;

pub use assistant::{AssistantScreen, ChatEntry, ChatRole};
pub use ingestion::IngestionScreen;
pub use login::LoginScreen;
pub use orders::OrdersScreen;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::gateway::{BackendGateway, create_gateway};
use crate::onboarding::{OnboardingStep, OnboardingStore};
use crate::storage::create_storage;

/// User-facing failure texts.
pub mod messages {
    pub const LOGIN_UNREACHABLE: &str = "Unable to connect. Please check your credentials.";
    pub const LOGIN_REJECTED: &str = "Login failed. Please try again.";
    pub const INGEST_FAILED: &str =
        "Failed to ingest your store. Please check the URL and try again.";
    pub const QUERY_FAILED: &str = "Sorry, I encountered an error. Please try again.";
    pub const ORDERS_UNAVAILABLE: &str = "Could not load orders. Please try again.";
    pub const ORDER_UPDATE_FAILED: &str = "Could not update the order. Please try again.";
}

/// The controller matching the current step.
pub enum Screen {
    Login(LoginScreen),
    Ingestion(IngestionScreen),
    Testing(AssistantScreen),
    Orders(OrdersScreen),
}

impl Screen {
    pub fn step(&self) -> OnboardingStep {
        match self {
            Self::Login(_) => OnboardingStep::Login,
            Self::Ingestion(_) => OnboardingStep::Ingestion,
            Self::Testing(_) => OnboardingStep::Testing,
            Self::Orders(_) => OnboardingStep::Orders,
        }
    }
}

/// Wires the session store and the gateway into screen controllers.
#[derive(Clone)]
pub struct OnboardingFlow {
    store: Arc<OnboardingStore>,
    gateway: Arc<dyn BackendGateway>,
}

impl OnboardingFlow {
    pub fn new(store: Arc<OnboardingStore>, gateway: Arc<dyn BackendGateway>) -> Self {
        Self { store, gateway }
    }

    /// Open the configured session storage, restore the record from it and
    /// connect the configured gateway.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let storage = create_storage(&config.storage).await?;
        let store = Arc::new(OnboardingStore::open(storage).await);
        let gateway = create_gateway(&config.gateway)?;
        tracing::info!(
            gateway = gateway.name(),
            step = %store.current_step().await,
            "Onboarding session ready"
        );
        Ok(Self::new(store, gateway))
    }

    pub fn store(&self) -> &Arc<OnboardingStore> {
        &self.store
    }

    pub async fn current_step(&self) -> OnboardingStep {
        self.store.current_step().await
    }

    /// Build a fresh controller for whatever step the store is on.
    pub async fn screen(&self) -> Screen {
        let store = Arc::clone(&self.store);
        let gateway = Arc::clone(&self.gateway);
        match self.store.current_step().await {
            OnboardingStep::Login => Screen::Login(LoginScreen::new(store, gateway)),
            OnboardingStep::Ingestion => {
                Screen::Ingestion(IngestionScreen::new(store, gateway))
            }
            OnboardingStep::Testing => Screen::Testing(AssistantScreen::new(store, gateway)),
            OnboardingStep::Orders => Screen::Orders(OrdersScreen::new(store, gateway)),
        }
    }

    /// Record the bot token handed out once the Telegram channel is live.
    pub async fn complete_channel_setup(&self, telegram_bot_token: &str) -> OnboardingStep {
        let token = telegram_bot_token.trim();
        if token.is_empty() {
            tracing::warn!("Ignoring empty Telegram bot token");
        } else {
            self.store.set_telegram_bot_token(token).await;
        }
        self.store.current_step().await
    }

    /// Drop the session and start over at login.
    pub async fn logout(&self) -> OnboardingStep {
        self.store.reset().await;
        OnboardingStep::Login
    }
}
