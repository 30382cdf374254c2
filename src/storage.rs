//! Key-value slots holding the serialized memory bank.
//!
//! This module provides:
//! - `KeyValueStore`: the get/set contract the memory store persists through
//! - `SqliteSlot`: durable slot in a SQLite database
//! - `InMemorySlot`: process-local slot, shared between clones

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::Error;

/// Flat string storage addressed by key.
pub trait KeyValueStore: Send {
    /// Read the blob stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Replace the blob stored under `key`.
    fn set(&self, key: &str, blob: &str) -> Result<(), Error>;
}

fn check_quota(quota: Option<usize>, blob: &str) -> Result<(), Error> {
    match quota {
        Some(limit) if blob.len() > limit => Err(Error::QuotaExceeded {
            limit,
            actual: blob.len(),
        }),
        _ => Ok(()),
    }
}

/// SQLite-backed key-value slot.
pub struct SqliteSlot {
    conn: Connection,
    quota: Option<usize>,
}

/// Initialize the key-value table.
fn create_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

impl SqliteSlot {
    /// Open or create a SQLite database at the given path.
    ///
    /// `quota` caps the size in bytes of any single stored blob.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or schema initialization fails.
    pub fn open(path: &Path, quota: Option<usize>) -> Result<Self, Error> {
        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        Ok(Self { conn, quota })
    }

    /// When the blob under `key` was last written (RFC 3339).
    pub fn updated_at(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self
            .conn
            .query_row("SELECT updated_at FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?)
    }
}

impl KeyValueStore for SqliteSlot {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), Error> {
        check_quota(self.quota, blob)?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, blob, &now],
        )?;

        Ok(())
    }
}

/// In-process slot; clones share the same entries.
#[derive(Clone, Default)]
pub struct InMemorySlot {
    entries: Arc<Mutex<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl InMemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota: Some(quota),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, Error> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("in-memory slot lock poisoned".to_string()))
    }
}

impl KeyValueStore for InMemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), Error> {
        check_quota(self.quota, blob)?;
        self.lock()?.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
