//! SQLite-backed key-value store.

use super::traits::KeyValueStore;
use crate::error::{FinderError, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Durable key-value store in a single SQLite table.
///
/// Thread-safe via internal mutex on the connection. An optional byte quota
/// bounds the total size of stored values.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    quota_bytes: Option<u64>,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FinderError::io_with_path(e, parent))?;
        }

        let conn = Connection::open(db_path).map_err(|e| FinderError::Database {
            message: format!("Failed to open cache database: {}", e),
            source: Some(e),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| FinderError::Database {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| FinderError::Database {
            message: format!("Failed to open in-memory database: {}", e),
            source: Some(e),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            quota_bytes: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Limit the total size of stored values.
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| FinderError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| FinderError::Database {
            message: format!("Failed to initialize cache schema: {}", e),
            source: Some(e),
        })
    }

    fn check_quota(&self, conn: &Connection, key: &str, new_size: u64) -> Result<()> {
        let Some(limit) = self.quota_bytes else {
            return Ok(());
        };
        let others: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(size_bytes), 0) FROM kv_entries WHERE key != ?1",
                params![key],
                |row| row.get(0),
            )
            .map_err(|e| FinderError::Database {
                message: format!("Failed to query cache size: {}", e),
                source: Some(e),
            })?;

        if others as u64 + new_size > limit {
            return Err(FinderError::StorageQuotaExceeded {
                key: key.to_string(),
                limit_bytes: limit,
            });
        }
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM kv_entries WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| FinderError::Database {
            message: format!("Failed to query cache entry: {}", e),
            source: Some(e),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        let size_bytes = value.len() as u64;
        self.check_quota(&conn, key, size_bytes)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO kv_entries (key, value, size_bytes, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![key, value, size_bytes as i64, Utc::now().to_rfc3339()],
        )
        .map_err(|e| FinderError::Database {
            message: format!("Failed to set cache entry: {}", e),
            source: Some(e),
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
            .map_err(|e| FinderError::Database {
                message: format!("Failed to remove cache entry: {}", e),
                source: Some(e),
            })?;
        if deleted > 0 {
            debug!(key, "Removed cache entry");
        }
        Ok(deleted > 0)
    }

    fn keys_after(&self, prefix: &str, cursor: Option<&str>, limit: usize) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT key FROM kv_entries
                WHERE substr(key, 1, ?1) = ?2 AND key > ?3
                ORDER BY key
                LIMIT ?4
                "#,
            )
            .map_err(|e| FinderError::Database {
                message: format!("Failed to prepare key scan: {}", e),
                source: Some(e),
            })?;

        let rows = stmt
            .query_map(
                params![
                    prefix.chars().count() as i64,
                    prefix,
                    cursor.unwrap_or(""),
                    limit as i64
                ],
                |row| row.get::<_, String>(0),
            )
            .map_err(|e| FinderError::Database {
                message: format!("Failed to scan cache keys: {}", e),
                source: Some(e),
            })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| FinderError::Database {
                message: format!("Failed to read cache key: {}", e),
                source: Some(e),
            })
    }
}
