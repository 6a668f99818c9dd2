use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use textpilot_common::{Error, Result};
use tracing::info;

/// Insert shape before persistence assigns id, timestamp, and word counts.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub action: String,
    pub input_text: String,
    pub output_text: String,
    pub preset: Option<String>,
    pub site: Option<String>,
}

/// One completed action. Created exactly once per successful adapter result
/// and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub input_text: String,
    pub output_text: String,
    pub preset: Option<String>,
    pub site: Option<String>,
    pub words_processed: u64,
    pub words_generated: u64,
}

/// Running aggregates, updated in the same transaction as each append. Never
/// decrease except on reset.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageStats {
    pub total_actions: u64,
    pub total_words_processed: u64,
    pub total_words_generated: u64,
}

/// Whitespace-delimited token count; the unit for all usage aggregates.
pub fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Append-only usage log plus aggregate counters.
///
/// The entry append and the counter update land in one transaction, and the
/// mutex serializes overlapping recorders, so the two writes can never be
/// observed apart.
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening history store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Store(format!("failed to open history database: {e}")))?;

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
            "CREATE TABLE IF NOT EXISTS usage_history (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                action TEXT NOT NULL,
                input_text TEXT NOT NULL,
                output_text TEXT NOT NULL,
                preset TEXT,
                site TEXT,
                words_processed INTEGER NOT NULL,
                words_generated INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS usage_stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_actions INTEGER NOT NULL DEFAULT 0,
                total_words_processed INTEGER NOT NULL DEFAULT 0,
                total_words_generated INTEGER NOT NULL DEFAULT 0
            );

            INSERT OR IGNORE INTO usage_stats (id) VALUES (1);",
        )
        .map_err(|e| Error::Store(format!("history migration failed: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Assign id and timestamp, compute word counts from the entry's own
    /// texts, append, and bump the aggregates, all in one transaction.
    pub fn record(&self, new: NewHistoryEntry) -> Result<HistoryEntry> {
        let entry = HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            words_processed: word_count(&new.input_text),
            words_generated: word_count(&new.output_text),
            action: new.action,
            input_text: new.input_text,
            output_text: new.output_text,
            preset: new.preset,
            site: new.site,
        };

        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Store(format!("failed to begin history transaction: {e}")))?;

        tx.execute(
            "INSERT INTO usage_history
                (id, timestamp, action, input_text, output_text, preset, site,
                 words_processed, words_generated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id,
                entry.timestamp.to_rfc3339(),
                entry.action,
                entry.input_text,
                entry.output_text,
                entry.preset,
                entry.site,
                entry.words_processed,
                entry.words_generated,
            ],
        )
        .map_err(|e| Error::Store(format!("failed to append history entry: {e}")))?;

        tx.execute(
            "UPDATE usage_stats SET
                total_actions = total_actions + 1,
                total_words_processed = total_words_processed + ?1,
                total_words_generated = total_words_generated + ?2
             WHERE id = 1",
            params![entry.words_processed, entry.words_generated],
        )
        .map_err(|e| Error::Store(format!("failed to update usage stats: {e}")))?;

        tx.commit()
            .map_err(|e| Error::Store(format!("failed to commit history entry: {e}")))?;

        Ok(entry)
    }

    /// All entries, newest-last, unbounded.
    pub fn list(&self) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, action, input_text, output_text, preset, site,
                        words_processed, words_generated
                 FROM usage_history
                 ORDER BY rowid ASC",
            )
            .map_err(|e| Error::Store(format!("failed to prepare history query: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                let timestamp_raw: String = row.get(1)?;
                Ok(HistoryEntry {
                    id: row.get(0)?,
                    timestamp: parse_timestamp(&timestamp_raw),
                    action: row.get(2)?,
                    input_text: row.get(3)?,
                    output_text: row.get(4)?,
                    preset: row.get(5)?,
                    site: row.get(6)?,
                    words_processed: row.get(7)?,
                    words_generated: row.get(8)?,
                })
            })
            .map_err(|e| Error::Store(format!("failed to load history: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries
                .push(row.map_err(|e| Error::Store(format!("failed to read history row: {e}")))?);
        }
        Ok(entries)
    }

    pub fn stats(&self) -> Result<UsageStats> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT total_actions, total_words_processed, total_words_generated
             FROM usage_stats WHERE id = 1",
            [],
            |row| {
                Ok(UsageStats {
                    total_actions: row.get(0)?,
                    total_words_processed: row.get(1)?,
                    total_words_generated: row.get(2)?,
                })
            },
        )
        .map_err(|e| Error::Store(format!("failed to read usage stats: {e}")))
    }

    /// Clear the log and zero the aggregates together.
    pub fn reset(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Store(format!("failed to begin reset transaction: {e}")))?;

        tx.execute("DELETE FROM usage_history", [])
            .map_err(|e| Error::Store(format!("failed to clear history: {e}")))?;
        tx.execute(
            "UPDATE usage_stats SET
                total_actions = 0, total_words_processed = 0, total_words_generated = 0
             WHERE id = 1",
            [],
        )
        .map_err(|e| Error::Store(format!("failed to reset usage stats: {e}")))?;

        tx.commit()
            .map_err(|e| Error::Store(format!("failed to commit reset: {e}")))
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
