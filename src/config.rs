//! Configuration types.

use crate::error::ConfigError;
use crate::gateway::GatewayConfig;
use crate::storage::StorageConfig;

/// Everything the binary needs, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    /// Serve the onboarding status routes on this port when set.
    pub status_port: Option<u16>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let status_port = match std::env::var("ONBOARD_STATUS_PORT") {
            Ok(value) if !value.trim().is_empty() => {
                Some(value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "ONBOARD_STATUS_PORT".to_string(),
                    message: format!("'{value}' is not a valid port"),
                })?)
            }
            _ => None,
        };

        Ok(Self {
            gateway: GatewayConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            status_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayBackend;
    use crate::storage::StorageBackend;

    #[test]
    fn defaults_are_offline() {
        let config = AppConfig::default();
        assert_eq!(config.gateway.backend, GatewayBackend::Mock);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.status_port.is_none());
    }
}
