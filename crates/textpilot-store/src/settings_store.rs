use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use textpilot_common::{Error, Result};
use tokio::sync::broadcast;
use tracing::info;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Published on every successful write so interested parties (UI surfaces,
/// caches) can react without polling.
#[derive(Debug, Clone)]
pub struct SettingChange {
    pub key: String,
    pub value: Value,
}

/// Persisted key-value settings. Values are JSON; typed accessors cover the
/// common string/bool cases. Access is serialized behind a mutex so the store
/// can be shared across concurrent request handlers.
pub struct SettingsStore {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<SettingChange>,
}

impl SettingsStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening settings store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Store(format!("failed to open settings database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Store(format!("failed to set pragmas: {e}")))?;

        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Store(format!("failed to open in-memory database: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .map_err(|e| Error::Store(format!("settings migration failed: {e}")))?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            conn: Mutex::new(conn),
            changes,
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Store(format!("failed to read setting '{key}': {e}")))?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get(key)?
            .and_then(|v| v.as_str().map(ToString::to_string)))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.get(key)?.and_then(|v| v.as_bool()))
    }

    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let raw = serde_json::to_string(&value)?;
        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = datetime('now')",
                params![key, raw],
            )
            .map_err(|e| Error::Store(format!("failed to write setting '{key}': {e}")))?;
        }

        // No receivers is fine; changes are best-effort notifications.
        let _ = self.changes.send(SettingChange {
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    pub fn set_string(&self, key: &str, value: impl Into<String>) -> Result<()> {
        self.set(key, Value::String(value.into()))
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, Value::Bool(value))
    }

    /// All persisted settings as one JSON object (settings surface readback).
    pub fn all(&self) -> Result<serde_json::Map<String, Value>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT key, value FROM settings ORDER BY key")
            .map_err(|e| Error::Store(format!("failed to prepare settings query: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| Error::Store(format!("failed to list settings: {e}")))?;

        let mut map = serde_json::Map::new();
        for row in rows {
            let (key, raw) =
                row.map_err(|e| Error::Store(format!("failed to read settings row: {e}")))?;
            map.insert(key, serde_json::from_str(&raw)?);
        }
        Ok(map)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
        self.changes.subscribe()
    }
}
