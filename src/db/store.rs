//! SQLite-backed key-value store holding the serialized registry.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::models::Target;

/// Key of the slot holding the JSON array of targets.
pub const TARGETS_KEY: &str = "pulse_monitors";

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the store at the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// A store that lives only as long as the process.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), DbError> {
        let conn = self.lock()?;
        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // --- Raw slots ---

    fn read_slot(&self, key: &str) -> Result<Option<String>, DbError> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<(), DbError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Targets ---

    /// Read the persisted targets.
    ///
    /// A missing slot yields an empty list. So does an unreadable or
    /// unparseable one, after logging a warning.
    pub fn load(&self) -> Vec<Target> {
        match self.try_load() {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!("Stored targets unreadable, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<Target>, DbError> {
        match self.read_slot(TARGETS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the persisted targets with the given snapshot.
    pub fn save_all(&self, targets: &[Target]) -> Result<(), DbError> {
        let json = serde_json::to_string(targets)?;
        self.write_slot(TARGETS_KEY, &json)
    }
}
