//! Storefront onboarding: wizard state, persistence, and backend gateway.

pub mod config;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod onboarding;
pub mod storage;
