//! Onboarding core: the persisted wizard record and the step it implies.
//!
//! The record moves through login, store ingestion, assistant testing and
//! finally the orders view. Which screen to show is never stored; it is
//! recomputed from the record after every mutation.

pub mod routes;
pub mod state;
pub mod store;

pub use routes::{OnboardingRouteState, OnboardingStatus, onboarding_routes};
pub use state::{LoginData, ObscuredPassword, OnboardingState, OnboardingStep, current_step};
pub use store::{OnboardingStore, STORAGE_KEY, load};
