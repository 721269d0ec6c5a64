//! SQLite-backed persistence.
//!
//! Provides:
//! - The key-value table behind drafts, cached history and override state
//! - A local reminder table standing in for the OS notification scheduler

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{data_dir, KeyValueStore};
use crate::error::{CoreError, DatabaseError, PersistenceError, ReminderError};
use crate::integrations::{ReminderPayload, ReminderScheduler, ScheduleId};

/// A reminder row as stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReminder {
    pub schedule_id: ScheduleId,
    pub logical_id: String,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// SQLite database.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/entrygate/entrygate.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("entrygate.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::Poisoned)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reminders (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                logical_id  TEXT NOT NULL,
                fire_at     TEXT NOT NULL,
                title       TEXT NOT NULL,
                body        TEXT NOT NULL DEFAULT '',
                cancelled   INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_reminders_logical_id ON reminders(logical_id);
            CREATE INDEX IF NOT EXISTS idx_reminders_fire_at ON reminders(fire_at);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a key. Returns whether it existed.
    pub fn kv_remove(&self, key: &str) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Reminders not yet cancelled, soonest first.
    pub fn active_reminders(&self) -> Result<Vec<StoredReminder>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, logical_id, fire_at, title, body
             FROM reminders
             WHERE cancelled = 0
             ORDER BY fire_at ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut reminders = Vec::new();
        for row in rows {
            let (id, logical_id, fire_at, title, body) = row?;
            let fire_at = DateTime::parse_from_rfc3339(&fire_at)
                .map_err(|e| DatabaseError::QueryFailed(format!("bad fire_at '{fire_at}': {e}")))?
                .with_timezone(&Utc);
            reminders.push(StoredReminder {
                schedule_id: ScheduleId(id.to_string()),
                logical_id,
                fire_at,
                title,
                body,
            });
        }
        Ok(reminders)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.kv_get(key).map_err(|e| PersistenceError::Read {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.kv_set(key, value).map_err(|e| PersistenceError::Write {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.kv_remove(key)
            .map(|_| ())
            .map_err(|e| PersistenceError::Remove {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}

impl ReminderScheduler for Database {
    /// Replaces any live reminder with the same logical id, so at most one
    /// reminder per logical id is ever active.
    fn schedule(
        &self,
        id: &str,
        fire_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<ScheduleId, ReminderError> {
        let unavailable = |e: rusqlite::Error| ReminderError::Unavailable(e.to_string());
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| ReminderError::Unavailable("reminder table lock poisoned".into()))?;
        let tx = conn.transaction().map_err(unavailable)?;
        tx.execute(
            "UPDATE reminders SET cancelled = 1 WHERE logical_id = ?1 AND cancelled = 0",
            params![id],
        )
        .map_err(unavailable)?;
        tx.execute(
            "INSERT INTO reminders (logical_id, fire_at, title, body) VALUES (?1, ?2, ?3, ?4)",
            params![id, fire_at.to_rfc3339(), payload.title, payload.body],
        )
        .map_err(unavailable)?;
        let row_id = tx.last_insert_rowid();
        tx.commit().map_err(unavailable)?;
        Ok(ScheduleId(row_id.to_string()))
    }

    fn cancel(&self, schedule_id: &ScheduleId) -> Result<(), ReminderError> {
        let row_id: i64 = schedule_id.0.parse().map_err(|_| {
            ReminderError::Unavailable(format!("unknown schedule id '{}'", schedule_id.0))
        })?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| ReminderError::Unavailable("reminder table lock poisoned".into()))?;
        conn.execute(
            "UPDATE reminders SET cancelled = 1 WHERE id = ?1",
            params![row_id],
        )
        .map_err(|e| ReminderError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
