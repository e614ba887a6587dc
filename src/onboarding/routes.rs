//! REST endpoints for onboarding status.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::state::{OnboardingStep, current_step};
use super::store::OnboardingStore;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub store: Arc<OnboardingStore>,
}

/// Onboarding record as exposed over HTTP. The password never leaves.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicState {
    pub user_id: Option<String>,
    pub business_id: Option<String>,
    pub upload_batch_id: Option<String>,
    pub auth_metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub telegram_bot_token: Option<String>,
}

/// Response of `GET /api/onboarding/status`.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingStatus {
    pub step: OnboardingStep,
    pub logged_in: bool,
    pub state: PublicState,
}

async fn status_of(store: &OnboardingStore) -> OnboardingStatus {
    let state = store.snapshot().await;
    OnboardingStatus {
        step: current_step(&state),
        logged_in: state.is_logged_in(),
        state: PublicState {
            user_id: state.user_id,
            business_id: state.business_id,
            upload_batch_id: state.upload_batch_id,
            auth_metadata: state.auth_metadata,
            telegram_bot_token: state.telegram_bot_token,
        },
    }
}

/// GET /api/onboarding/status
///
/// Returns the current step and the record without the password.
async fn get_status(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(status_of(&state.store).await)
}

/// POST /api/onboarding/reset
async fn post_reset(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    state.store.reset().await;
    Json(status_of(&state.store).await)
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/api/onboarding/status", get(get_status))
        .route("/api/onboarding/reset", post(post_reset))
        .with_state(state)
}
