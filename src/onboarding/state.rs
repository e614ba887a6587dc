//! Onboarding state machine: which wizard step the user is on.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The screens of the onboarding wizard.
///
/// Never stored; always derived from [`OnboardingState`] by [`current_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Login,
    Ingestion,
    Testing,
    Orders,
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Login => "login",
            Self::Ingestion => "ingestion",
            Self::Testing => "testing",
            Self::Orders => "orders",
        };
        write!(f, "{s}")
    }
}

/// A password kept in reversible base64 form.
///
/// This is a placeholder transform, not protection. Real credential
/// handling needs a proper secret store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObscuredPassword(String);

impl ObscuredPassword {
    /// Obscure a plaintext password.
    pub fn obscure(plain: &str) -> Self {
        Self(STANDARD.encode(plain.as_bytes()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ObscuredPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ObscuredPassword([REDACTED])")
    }
}

/// Persisted onboarding record.
///
/// Stored as one JSON document under [`STORAGE_KEY`](super::store::STORAGE_KEY).
/// Every field serializes (as `null` when unset); missing fields in stored
/// documents read back as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingState {
    pub user_id: Option<String>,
    pub password: Option<ObscuredPassword>,
    pub business_id: Option<String>,
    pub upload_batch_id: Option<String>,
    pub auth_metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub telegram_bot_token: Option<String>,
}

/// Input to [`OnboardingStore::set_login_data`](super::OnboardingStore::set_login_data).
#[derive(Debug)]
pub struct LoginData {
    pub user_id: String,
    pub password: SecretString,
    pub business_id: Option<String>,
    pub auth_metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub telegram_bot_token: Option<String>,
}

impl LoginData {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: SecretString::from(password.into()),
            business_id: None,
            auth_metadata: None,
            telegram_bot_token: None,
        }
    }

    pub fn with_business_id(mut self, business_id: impl Into<String>) -> Self {
        self.business_id = Some(business_id.into());
        self
    }

    pub fn with_auth_metadata(
        mut self,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.auth_metadata = Some(metadata);
        self
    }

    pub fn with_telegram_bot_token(mut self, token: impl Into<String>) -> Self {
        self.telegram_bot_token = Some(token.into());
        self
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl OnboardingState {
    /// Both login fields are present and non-empty.
    pub fn is_logged_in(&self) -> bool {
        is_set(&self.user_id) && self.password.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn has_upload_batch(&self) -> bool {
        is_set(&self.upload_batch_id)
    }

    pub fn has_telegram_bot_token(&self) -> bool {
        is_set(&self.telegram_bot_token)
    }
}

/// Derive the wizard step from the stored record.
///
/// Checked in order, first match wins:
/// no login → `Login`, no upload batch → `Ingestion`, bot token →
/// `Orders`, otherwise `Testing`.
pub fn current_step(state: &OnboardingState) -> OnboardingStep {
    if !state.is_logged_in() {
        return OnboardingStep::Login;
    }
    if !state.has_upload_batch() {
        return OnboardingStep::Ingestion;
    }
    if state.has_telegram_bot_token() {
        OnboardingStep::Orders
    } else {
        OnboardingStep::Testing
    }
}
