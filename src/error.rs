//! Error types for the onboarding core.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Backend gateway errors.
///
/// `Transport` and `Decode` are the generic failures every operation can
/// produce. `Rejected` is the domain-level outcome of a login that reached
/// the backend but came back with `success: false`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{operation} request failed: {reason}")]
    Transport { operation: String, reason: String },

    #[error("{operation} returned HTTP {status}")]
    Status { operation: String, status: u16 },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("Invalid {operation} response: {reason}")]
    Decode { operation: String, reason: String },

    #[error("Login rejected: {}", message.as_deref().unwrap_or("no reason given"))]
    Rejected { message: Option<String> },

    #[error("An update for order {order_id} is already in flight")]
    AlreadyInFlight { order_id: String },

    #[error("Order {order_id} not found")]
    OrderNotFound { order_id: String },
}

impl GatewayError {
    /// Whether this failure came from the transport rather than the domain.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::Timeout { .. } | Self::Decode { .. }
        )
    }
}

/// Session storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Read failed for key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Write failed for key {key}: {reason}")]
    Write { key: String, reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
