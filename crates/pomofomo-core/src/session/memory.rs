//! In-process collaborators.
//!
//! Used by tests and by callers that want the timer without a database.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Identity, NewSession, SessionMode, SessionRecord, SessionStore, UserId};
use crate::error::StoreError;

/// Identity fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserId>,
    unavailable: bool,
}

impl StaticIdentity {
    pub fn new(user: Option<&str>) -> Self {
        Self {
            user: user.map(UserId::new),
            unavailable: false,
        }
    }

    pub fn signed_in(user: impl Into<String>) -> Self {
        Self::new(Some(&user.into()))
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Identity whose lookup always fails.
    pub fn unavailable() -> Self {
        Self {
            user: None,
            unavailable: true,
        }
    }
}

#[async_trait]
impl Identity for StaticIdentity {
    async fn current_user(&self) -> Result<Option<UserId>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("identity lookup failed".into()));
        }
        Ok(self.user.clone())
    }
}

/// Vec-backed store that counts calls and can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<SessionRecord>>,
    inserts: Mutex<Vec<NewSession>>,
    insert_calls: AtomicUsize,
    query_calls: AtomicUsize,
    fail_inserts: AtomicBool,
    fail_queries: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose inserts always fail.
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail_inserts(true);
        store
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of `insert` calls, including failed ones.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Payloads of every `insert` call, in order.
    pub fn inserts(&self) -> Vec<NewSession> {
        lock(&self.inserts).clone()
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        lock(&self.records).clone()
    }

    /// Add a record with an explicit timestamp, bypassing `insert`.
    pub fn seed(
        &self,
        user_id: &str,
        mode: SessionMode,
        duration_secs: u64,
        created_at: DateTime<Utc>,
    ) -> SessionRecord {
        let mut records = lock(&self.records);
        let record = SessionRecord {
            id: records.len() as i64 + 1,
            mode,
            duration_secs,
            user_id: UserId::new(user_id),
            created_at,
        };
        records.push(record.clone());
        record
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: NewSession) -> Result<(), StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.inserts).push(session.clone());
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert rejected".into()));
        }

        let mut records = lock(&self.records);
        let latest = records.iter().map(|r| r.created_at).max();
        let now = Utc::now();
        let id = records.len() as i64 + 1;
        records.push(SessionRecord {
            id,
            mode: session.mode,
            duration_secs: session.duration_secs,
            user_id: session.user_id,
            created_at: latest.map_or(now, |latest| latest.max(now)),
        });
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("query rejected".into()));
        }

        let mut mine: Vec<SessionRecord> = lock(&self.records)
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        mine.truncate(limit);
        Ok(mine)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Mode;

    #[tokio::test]
    async fn insert_assigns_non_decreasing_timestamps() {
        let store = MemoryStore::new();
        for duration_secs in [10, 20, 30] {
            store
                .insert(NewSession {
                    mode: Mode::Pomo,
                    duration_secs,
                    user_id: UserId::new("a"),
                })
                .await
                .unwrap();
        }
        let records = store.records();
        assert!(records
            .windows(2)
            .all(|pair| pair[0].created_at <= pair[1].created_at));
        assert_eq!(store.insert_calls(), 3);
    }

    #[tokio::test]
    async fn failing_store_counts_attempts() {
        let store = MemoryStore::failing();
        let result = store
            .insert(NewSession {
                mode: Mode::Stopwatch,
                duration_secs: 12,
                user_id: UserId::new("a"),
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.insert_calls(), 1);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn static_identity() {
        assert_eq!(
            StaticIdentity::signed_in("x").current_user().await.unwrap(),
            Some(UserId::new("x"))
        );
        assert_eq!(StaticIdentity::anonymous().current_user().await.unwrap(), None);
        assert!(StaticIdentity::unavailable().current_user().await.is_err());
    }
}
