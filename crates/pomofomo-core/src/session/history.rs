use std::sync::Arc;

use super::{Identity, SessionRecord, SessionStore};
use crate::error::HistoryError;

/// Number of sessions shown when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Per-user query over recorded sessions.
pub struct SessionHistory {
    identity: Arc<dyn Identity>,
    store: Arc<dyn SessionStore>,
}

impl SessionHistory {
    pub fn new(identity: Arc<dyn Identity>, store: Arc<dyn SessionStore>) -> Self {
        Self { identity, store }
    }

    /// The current user's latest sessions, newest first, at most `limit`.
    ///
    /// Every call queries the store again. Nobody signed in yields an empty
    /// list rather than an error.
    ///
    /// # Errors
    /// Returns [`HistoryError::QueryFailed`] if the store read fails.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<SessionRecord>, HistoryError> {
        let user_id = self
            .identity
            .current_user()
            .await
            .map_err(HistoryError::QueryFailed)?;
        let Some(user_id) = user_id else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store
            .recent(&user_id, limit)
            .await
            .map_err(HistoryError::QueryFailed)
    }
}

/// Last fetched history, as shown to the user.
///
/// A failed refresh is logged and leaves the previous list in place.
pub struct HistoryView {
    history: SessionHistory,
    limit: usize,
    records: Vec<SessionRecord>,
    loading: bool,
    loaded: bool,
}

impl HistoryView {
    pub fn new(history: SessionHistory, limit: usize) -> Self {
        Self {
            history,
            limit,
            records: Vec::new(),
            loading: false,
            loaded: false,
        }
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// At least one refresh has finished, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn refresh(&mut self) -> &[SessionRecord] {
        self.loading = true;
        match self.history.list_recent(self.limit).await {
            Ok(records) => self.records = records,
            Err(e) => {
                tracing::warn!(error = %e, kept = self.records.len(), "history refresh failed");
            }
        }
        self.loading = false;
        self.loaded = true;
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStore, StaticIdentity};
    use crate::timer::Mode;
    use chrono::{Duration, TimeZone, Utc};

    fn seeded(store: &MemoryStore, user: &str, count: usize) {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        for i in 0..count {
            store.seed(
                user,
                Mode::Pomo,
                60 + i as u64,
                base + Duration::minutes(i as i64),
            );
        }
    }

    fn history(user: Option<&str>, store: Arc<MemoryStore>) -> SessionHistory {
        SessionHistory::new(Arc::new(StaticIdentity::new(user)), store)
    }

    #[tokio::test]
    async fn bounded_and_newest_first() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "alice", 15);
        let records = history(Some("alice"), store).list_recent(10).await.unwrap();

        assert_eq!(records.len(), 10);
        assert_eq!(records[0].duration_secs, 74);
        assert!(records
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn fewer_records_than_limit() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "alice", 3);
        let records = history(Some("alice"), store).list_recent(10).await.unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn only_current_users_records() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "alice", 4);
        seeded(&store, "bob", 6);
        let records = history(Some("bob"), store).list_recent(10).await.unwrap();
        assert_eq!(records.len(), 6);
        assert!(records.iter().all(|r| r.user_id.as_str() == "bob"));
    }

    #[tokio::test]
    async fn anonymous_gets_empty_list_without_query() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "alice", 4);
        let records = history(None, store.clone()).list_recent(10).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(store.query_calls(), 0);
    }

    #[tokio::test]
    async fn query_failure_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_queries(true);
        let result = history(Some("alice"), store).list_recent(10).await;
        assert!(matches!(result, Err(HistoryError::QueryFailed(_))));
    }

    #[tokio::test]
    async fn identity_fault_is_a_query_failure() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "alice", 2);
        let history = SessionHistory::new(Arc::new(StaticIdentity::unavailable()), store.clone());
        let result = history.list_recent(10).await;
        assert!(matches!(result, Err(HistoryError::QueryFailed(_))));
        assert_eq!(store.query_calls(), 0);
    }

    #[tokio::test]
    async fn view_keeps_stale_list_on_failure() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "alice", 2);
        let mut view = HistoryView::new(history(Some("alice"), store.clone()), 10);
        assert!(!view.is_loaded());

        assert_eq!(view.refresh().await.len(), 2);
        store.set_fail_queries(true);
        seeded(&store, "alice", 1);
        assert_eq!(view.refresh().await.len(), 2);
        assert!(view.is_loaded());
        assert!(!view.is_loading());

        store.set_fail_queries(false);
        assert_eq!(view.refresh().await.len(), 3);
    }
}
