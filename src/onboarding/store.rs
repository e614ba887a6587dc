//! OnboardingStore: owns the onboarding record and writes it through to
//! session storage on every mutation.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::sync::RwLock;

use super::state::{LoginData, ObscuredPassword, OnboardingState, OnboardingStep, current_step};
use crate::storage::SessionStorage;

/// Storage key of the persisted onboarding document.
pub const STORAGE_KEY: &str = "onboarding_state";

/// Read the persisted record.
///
/// Missing, unreadable or malformed data yields the all-unset default. A
/// malformed document is also removed from storage.
pub async fn load(storage: &dyn SessionStorage) -> OnboardingState {
    let raw = match storage.get(STORAGE_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return OnboardingState::default(),
        Err(e) => {
            tracing::warn!("Failed to read onboarding state: {}", e);
            return OnboardingState::default();
        }
    };

    match serde_json::from_str::<Option<OnboardingState>>(&raw) {
        Ok(state) => state.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Discarding malformed onboarding state: {}", e);
            if let Err(e) = storage.remove(STORAGE_KEY).await {
                tracing::warn!("Failed to remove malformed onboarding state: {}", e);
            }
            OnboardingState::default()
        }
    }
}

/// The session's onboarding record.
///
/// Create one per session with [`OnboardingStore::open`] and share it as
/// `Arc<OnboardingStore>`. The in-memory copy is authoritative; storage
/// failures are logged and never surfaced.
pub struct OnboardingStore {
    storage: Arc<dyn SessionStorage>,
    state: RwLock<OnboardingState>,
}

impl OnboardingStore {
    /// Restore the record from `storage`, or start empty.
    pub async fn open(storage: Arc<dyn SessionStorage>) -> Self {
        let state = load(storage.as_ref()).await;
        tracing::debug!(step = %current_step(&state), "Onboarding state loaded");
        Self {
            storage,
            state: RwLock::new(state),
        }
    }

    /// A copy of the current record.
    pub async fn snapshot(&self) -> OnboardingState {
        self.state.read().await.clone()
    }

    pub async fn current_step(&self) -> OnboardingStep {
        current_step(&*self.state.read().await)
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.is_logged_in()
    }

    /// Business id to pass to gateway calls; empty when unknown.
    pub async fn business_id(&self) -> String {
        self.state.read().await.business_id.clone().unwrap_or_default()
    }

    /// Record a successful login.
    ///
    /// `user_id` and `password` are always overwritten. The optional fields
    /// only replace the stored value when provided and non-empty.
    pub async fn set_login_data(&self, data: LoginData) -> OnboardingState {
        self.mutate(|state| {
            state.user_id = Some(data.user_id);
            state.password = Some(ObscuredPassword::obscure(data.password.expose_secret()));
            if let Some(business_id) = data.business_id.filter(|v| !v.is_empty()) {
                state.business_id = Some(business_id);
            }
            if let Some(metadata) = data.auth_metadata {
                state.auth_metadata = Some(metadata);
            }
            if let Some(token) = data.telegram_bot_token.filter(|v| !v.is_empty()) {
                state.telegram_bot_token = Some(token);
            }
        })
        .await
    }

    pub async fn set_upload_batch_id(&self, upload_batch_id: impl Into<String>) -> OnboardingState {
        let upload_batch_id = upload_batch_id.into();
        self.mutate(|state| state.upload_batch_id = Some(upload_batch_id)).await
    }

    pub async fn set_business_id(&self, business_id: impl Into<String>) -> OnboardingState {
        let business_id = business_id.into();
        self.mutate(|state| state.business_id = Some(business_id)).await
    }

    pub async fn set_telegram_bot_token(&self, token: impl Into<String>) -> OnboardingState {
        let token = token.into();
        self.mutate(|state| state.telegram_bot_token = Some(token)).await
    }

    /// Discard the session: every field back to unset, persisted.
    pub async fn reset(&self) -> OnboardingState {
        self.mutate(|state| *state = OnboardingState::default()).await
    }

    /// Apply `f` under the write lock, persist, and return the new record.
    async fn mutate<F>(&self, f: F) -> OnboardingState
    where
        F: FnOnce(&mut OnboardingState),
    {
        let mut state = self.state.write().await;
        let before = current_step(&state);
        f(&mut state);
        let after = current_step(&state);
        self.persist(&state).await;
        if before != after {
            tracing::info!(from = %before, to = %after, "Onboarding step changed");
        }
        state.clone()
    }

    async fn persist(&self, state: &OnboardingState) {
        let json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize onboarding state: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(STORAGE_KEY, &json).await {
            tracing::warn!("Failed to persist onboarding state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStorage;

    /// Storage whose writes always fail; reads see nothing.
    struct BrokenStorage;

    #[async_trait]
    impl SessionStorage for BrokenStorage {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Read {
                key: key.to_string(),
                reason: "disk on fire".to_string(),
            })
        }
        async fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                key: key.to_string(),
                reason: "disk on fire".to_string(),
            })
        }
        async fn remove(&self, _key: &str) -> Result<bool, StorageError> {
            Ok(false)
        }
    }

    async fn fresh() -> (Arc<MemoryStorage>, OnboardingStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = OnboardingStore::open(storage.clone()).await;
        (storage, store)
    }

    fn metadata() -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("role".into(), serde_json::json!("admin"));
        map
    }

    #[tokio::test]
    async fn walks_the_wizard() {
        let (_storage, store) = fresh().await;
        assert_eq!(store.current_step().await, OnboardingStep::Login);

        store.set_login_data(LoginData::new("a@b.com", "x")).await;
        assert_eq!(store.current_step().await, OnboardingStep::Ingestion);
        assert!(store.is_logged_in().await);

        store.set_upload_batch_id("batch-1").await;
        assert_eq!(store.current_step().await, OnboardingStep::Testing);

        store.set_telegram_bot_token("tok").await;
        assert_eq!(store.current_step().await, OnboardingStep::Orders);
    }

    #[tokio::test]
    async fn login_without_optionals_preserves_previous_values() {
        let (_storage, store) = fresh().await;
        store
            .set_login_data(
                LoginData::new("a@b.com", "x")
                    .with_business_id("biz-1")
                    .with_auth_metadata(metadata())
                    .with_telegram_bot_token("tok"),
            )
            .await;

        let state = store.set_login_data(LoginData::new("c@d.com", "y")).await;

        assert_eq!(state.user_id.as_deref(), Some("c@d.com"));
        assert_eq!(state.password, Some(ObscuredPassword::obscure("y")));
        assert_eq!(state.business_id.as_deref(), Some("biz-1"));
        assert_eq!(state.auth_metadata, Some(metadata()));
        assert_eq!(state.telegram_bot_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn empty_optionals_do_not_clear() {
        let (_storage, store) = fresh().await;
        store
            .set_login_data(LoginData::new("a@b.com", "x").with_business_id("biz-1"))
            .await;
        let state = store
            .set_login_data(LoginData::new("a@b.com", "x").with_business_id(""))
            .await;
        assert_eq!(state.business_id.as_deref(), Some("biz-1"));
    }

    #[tokio::test]
    async fn single_field_setters_preserve_other_fields() {
        let (_storage, store) = fresh().await;
        store
            .set_login_data(LoginData::new("a@b.com", "x").with_auth_metadata(metadata()))
            .await;
        let before = store.snapshot().await;

        let after = store.set_business_id("biz-2").await;
        assert_eq!(after.business_id.as_deref(), Some("biz-2"));
        assert_eq!(after.user_id, before.user_id);
        assert_eq!(after.password, before.password);
        assert_eq!(after.auth_metadata, before.auth_metadata);
        assert!(after.upload_batch_id.is_none());
        assert!(after.telegram_bot_token.is_none());
    }

    #[tokio::test]
    async fn password_is_persisted_obscured() {
        let (storage, store) = fresh().await;
        store.set_login_data(LoginData::new("a@b.com", "hunter2")).await;

        let raw = storage.get(STORAGE_KEY).await.unwrap().unwrap();
        assert!(!raw.contains("hunter2"));
        assert!(raw.contains("aHVudGVyMg=="));
    }

    #[tokio::test]
    async fn every_mutation_writes_through() {
        let (storage, store) = fresh().await;
        store.set_login_data(LoginData::new("a@b.com", "x")).await;
        store.set_upload_batch_id("batch-1").await;

        let persisted = load(storage.as_ref()).await;
        assert_eq!(persisted, store.snapshot().await);
        assert_eq!(persisted.upload_batch_id.as_deref(), Some("batch-1"));
    }

    #[tokio::test]
    async fn reset_then_load_is_default() {
        let (storage, store) = fresh().await;
        store
            .set_login_data(LoginData::new("a@b.com", "x").with_business_id("biz"))
            .await;
        store.set_upload_batch_id("batch-1").await;

        let reset = store.reset().await;
        assert_eq!(reset, OnboardingState::default());
        assert_eq!(load(storage.as_ref()).await, OnboardingState::default());
        assert_eq!(store.current_step().await, OnboardingStep::Login);
    }

    #[tokio::test]
    async fn reopen_restores_state() {
        let (storage, store) = fresh().await;
        store
            .set_login_data(
                LoginData::new("a@b.com", "x")
                    .with_business_id("biz")
                    .with_auth_metadata(metadata()),
            )
            .await;
        store.set_upload_batch_id("batch-1").await;
        let expected = store.snapshot().await;

        let reopened = OnboardingStore::open(storage).await;
        assert_eq!(reopened.snapshot().await, expected);
        assert_eq!(reopened.current_step().await, OnboardingStep::Testing);
    }

    #[tokio::test]
    async fn malformed_payload_loads_default() {
        let storage = MemoryStorage::new();
        for payload in [r#"{"userId":"a@b.com","pass"#, "not json", "[1,2,3]", r#"{"userId":5}"#] {
            storage.set(STORAGE_KEY, payload).await.unwrap();
            assert_eq!(load(&storage).await, OnboardingState::default(), "{payload}");
            assert!(storage.get(STORAGE_KEY).await.unwrap().is_none(), "{payload}");
        }
    }

    #[tokio::test]
    async fn null_payload_loads_default() {
        let storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "null").await.unwrap();
        assert_eq!(load(&storage).await, OnboardingState::default());
    }

    #[tokio::test]
    async fn storage_failures_are_swallowed() {
        let store = OnboardingStore::open(Arc::new(BrokenStorage)).await;
        assert_eq!(store.snapshot().await, OnboardingState::default());

        store.set_login_data(LoginData::new("a@b.com", "x")).await;
        store.set_upload_batch_id("batch-1").await;

        // In-memory state keeps serving the session
        assert_eq!(store.current_step().await, OnboardingStep::Testing);
    }
}
