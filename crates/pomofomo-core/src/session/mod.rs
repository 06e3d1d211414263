//! Study-session recording and history.
//!
//! The core never talks to an identity provider or a database directly.
//! It goes through two collaborators:
//!
//! - [`Identity`]: who is signed in right now, if anyone
//! - [`SessionStore`]: single-row inserts and the per-user recent query
//!
//! [`SessionRecorder`] validates a finished session before inserting it,
//! and [`SessionHistory`] lists what a user has recorded.

mod history;
mod memory;
mod recorder;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::timer::Mode;

pub use history::{HistoryView, SessionHistory, DEFAULT_HISTORY_LIMIT};
pub use memory::{MemoryStore, StaticIdentity};
pub use recorder::{SessionRecorder, MIN_RECORDABLE_SECS};

/// Mode a session was recorded in. Stored as `"pomo"` or `"stopwatch"`.
pub type SessionMode = Mode;

/// Opaque key of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored study session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub mode: SessionMode,
    pub duration_secs: u64,
    pub user_id: UserId,
    /// Assigned by the store at insert time.
    pub created_at: DateTime<Utc>,
}

/// Insert payload. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub mode: SessionMode,
    pub duration_secs: u64,
    pub user_id: UserId,
}

/// A finished run waiting to be handed to the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSession {
    pub mode: SessionMode,
    pub duration_secs: u64,
}

/// Resolves the current user.
#[async_trait]
pub trait Identity: Send + Sync {
    /// `Ok(None)` means nobody is signed in right now. An error means the
    /// answer is unknown and must not be read as signed out.
    async fn current_user(&self) -> Result<Option<UserId>, StoreError>;
}

/// Persistence for session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert one row. Atomic: either the whole record is stored or nothing is.
    async fn insert(&self, session: NewSession) -> Result<(), StoreError>;

    /// Up to `limit` records owned by `user_id`, newest first.
    async fn recent(&self, user_id: &UserId, limit: usize)
        -> Result<Vec<SessionRecord>, StoreError>;
}
