//! Session storage: key/value persistence behind the onboarding store.
//!
//! Supports:
//! - **Memory**: lives as long as the process, mirroring a browser session
//! - **File**: one JSON document per key under a directory
//! - **LibSql**: a `session_storage` table scoped by session id

mod file;
mod libsql_backend;
mod memory;

pub use file::FileStorage;
pub use libsql_backend::LibSqlStorage;
pub use memory::MemoryStorage;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ConfigError, StorageError};

/// Backend-agnostic string key/value storage.
///
/// Values are opaque text; callers own the encoding. Reads of a missing
/// key return `Ok(None)`.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Returns whether a value was present.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;
}

/// Supported storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File,
    LibSql,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "libsql" | "sqlite" => Ok(Self::LibSql),
            other => Err(ConfigError::InvalidValue {
                key: "ONBOARD_STORAGE".to_string(),
                message: format!(
                    "unknown storage backend '{other}' (expected memory, file or libsql)"
                ),
            }),
        }
    }
}

/// Configuration for creating a storage backend.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for `File`, database file for `LibSql`. Unused for `Memory`.
    pub path: PathBuf,
    /// Scopes rows in the libSQL table.
    pub session_id: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("./data/session"),
            session_id: "default".to_string(),
        }
    }
}

impl StorageConfig {
    /// Build from `ONBOARD_STORAGE`, `ONBOARD_STORAGE_PATH` and
    /// `ONBOARD_SESSION_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match std::env::var("ONBOARD_STORAGE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };

        let path = std::env::var("ONBOARD_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| match backend {
                StorageBackend::LibSql => PathBuf::from("./data/onboarding.db"),
                _ => defaults.path.clone(),
            });

        let session_id = std::env::var("ONBOARD_SESSION_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.session_id);

        Ok(Self {
            backend,
            path,
            session_id,
        })
    }
}

/// Create a storage backend from configuration.
pub async fn create_storage(
    config: &StorageConfig,
) -> Result<Arc<dyn SessionStorage>, StorageError> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory session storage");
            Ok(Arc::new(MemoryStorage::new()))
        }
        StorageBackend::File => {
            let storage = FileStorage::new(&config.path).await?;
            tracing::info!(path = %storage.root().display(), "Using file session storage");
            Ok(Arc::new(storage))
        }
        StorageBackend::LibSql => {
            let storage = LibSqlStorage::new_local(&config.path, &config.session_id).await?;
            Ok(Arc::new(storage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_known_names() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!(" File ".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("sqlite".parse::<StorageBackend>().unwrap(), StorageBackend::LibSql);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[tokio::test]
    async fn create_memory_storage() {
        let storage = create_storage(&StorageConfig::default()).await.unwrap();
        storage.set("k", "v").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
