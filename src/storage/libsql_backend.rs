//! libSQL backend: session storage rows keyed by `(session_id, key)`.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use super::SessionStorage;
use crate::error::StorageError;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS session_storage (
        session_id TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (session_id, key)
    );
"#;

/// libSQL-backed session storage.
///
/// Holds a single connection reused for all operations. Every row is
/// scoped to the `session_id` this instance was opened with.
pub struct LibSqlStorage {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    session_id: String,
}

impl LibSqlStorage {
    /// Open (or create) a local database file.
    pub async fn new_local(path: &Path, session_id: &str) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Unavailable(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!("Failed to open libSQL database: {e}"))
            })?;

        let storage = Self::from_database(db, session_id).await?;
        info!(path = %path.display(), session_id, "Session database opened");
        Ok(storage)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory(session_id: &str) -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db, session_id).await
    }

    async fn from_database(db: LibSqlDatabase, session_id: &str) -> Result<Self, StorageError> {
        let conn = db
            .connect()
            .map_err(|e| StorageError::Unavailable(format!("Failed to create connection: {e}")))?;
        conn.execute_batch(SCHEMA)
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to initialize schema: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            session_id: session_id.to_string(),
        })
    }
}

#[async_trait]
impl SessionStorage for LibSqlStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let read_err = |e: libsql::Error| StorageError::Read {
            key: key.to_string(),
            reason: e.to_string(),
        };

        let mut rows = self
            .conn
            .query(
                "SELECT value FROM session_storage WHERE session_id = ?1 AND key = ?2",
                params![self.session_id.as_str(), key],
            )
            .await
            .map_err(read_err)?;

        match rows.next().await.map_err(read_err)? {
            Some(row) => Ok(Some(row.get::<String>(0).map_err(read_err)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO session_storage (session_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (session_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![self.session_id.as_str(), key, value, now],
            )
            .await
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let count = self
            .conn
            .execute(
                "DELETE FROM session_storage WHERE session_id = ?1 AND key = ?2",
                params![self.session_id.as_str(), key],
            )
            .await
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(count > 0)
    }
}
