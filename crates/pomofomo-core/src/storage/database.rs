//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Recorded study sessions (`study_sessions`)
//! - Key-value store for application state (signed-in user)

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations};
use crate::error::StoreError;
use crate::session::{NewSession, SessionRecord, SessionStore, UserId};
use crate::timer::Mode;

/// SQLite database for session storage.
///
/// The connection sits behind a mutex so the store can be shared with the
/// async collaborators. No lock is held across an await point.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data_dir>/pomofomo.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("pomofomo.db"))
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrations::migrate(&conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a session and return the stored row.
    ///
    /// `created_at` is the current time, clamped so it never precedes the
    /// newest stored session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_session(&self, session: &NewSession) -> Result<SessionRecord, StoreError> {
        let conn = self.conn();
        let tx = conn.unchecked_transaction()?;

        let latest: Option<String> =
            tx.query_row("SELECT MAX(created_at) FROM study_sessions", [], |row| {
                row.get(0)
            })?;
        let now = Utc::now().trunc_subsecs(6);
        let created_at = match latest.as_deref().map(parse_timestamp).transpose()? {
            Some(latest) if latest > now => latest,
            _ => now,
        };

        tx.execute(
            "INSERT INTO study_sessions (mode, duration_secs, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.mode.as_str(),
                session.duration_secs,
                session.user_id.as_str(),
                format_timestamp(created_at),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(SessionRecord {
            id,
            mode: session.mode,
            duration_secs: session.duration_secs,
            user_id: session.user_id.clone(),
            created_at,
        })
    }

    /// Up to `limit` sessions of `user_id`, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn recent_sessions(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, mode, duration_secs, user_id, created_at
             FROM study_sessions
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id.as_str(), limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, mode, duration_secs, user_id, created_at) = row?;
            let mode = mode.parse::<Mode>().map_err(|message| StoreError::CorruptRow {
                table: "study_sessions",
                message,
            })?;
            records.push(SessionRecord {
                id,
                mode,
                duration_secs,
                user_id: UserId::new(user_id),
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(records)
    }

    /// Number of stored sessions across all users.
    pub fn session_count(&self) -> Result<u64, StoreError> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM study_sessions", [], |row| {
                row.get::<_, u64>(0)
            })?;
        Ok(count)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key. Returns whether it existed.
    pub fn kv_delete(&self, key: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn insert(&self, session: NewSession) -> Result<(), StoreError> {
        let record = self.insert_session(&session)?;
        tracing::debug!(id = record.id, user = %record.user_id, "inserted study session");
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        self.recent_sessions(user_id, limit)
    }
}

/// Fixed-width RFC 3339 so that text order matches time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow {
            table: "study_sessions",
            message: format!("bad created_at '{value}': {e}"),
        })
}
