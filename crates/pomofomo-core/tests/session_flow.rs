//! End-to-end session flow against an on-disk SQLite database.

use std::sync::Arc;

use pomofomo_core::notify::RecordingNotifier;
use pomofomo_core::timer::{ManualClock, UnsavedPolicy};
use pomofomo_core::{
    Coordinator, Database, Event, HistoryView, Mode, SaveError, SessionHistory, SessionRecorder,
    StoredIdentity,
};

struct App {
    coordinator: Coordinator,
    clock: ManualClock,
    db: Arc<Database>,
    identity: Arc<StoredIdentity>,
    notifier: Arc<RecordingNotifier>,
    _dir: tempfile::TempDir,
}

fn app(policy: UnsavedPolicy) -> App {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::open_at(&dir.path().join("pomofomo.db")).unwrap());
    let identity = Arc::new(StoredIdentity::new(db.clone()));
    let notifier = Arc::new(RecordingNotifier::default());
    let recorder = Arc::new(SessionRecorder::new(
        identity.clone(),
        db.clone(),
        notifier.clone(),
    ));
    let clock = ManualClock::new();
    let coordinator = Coordinator::new(Arc::new(clock.clone()), recorder, notifier.clone())
        .with_unsaved_policy(policy);
    App {
        coordinator,
        clock,
        db,
        identity,
        notifier,
        _dir: dir,
    }
}

impl App {
    async fn tick(&mut self, mode: Mode, n: usize) -> Vec<Result<(), SaveError>> {
        let mut outcomes = Vec::new();
        for _ in 0..n {
            let Some(tick) = self.clock.tick_for(mode) else {
                break;
            };
            if let Some(outcome) = self.coordinator.on_tick(tick).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    fn history(&self, limit: usize) -> HistoryView {
        HistoryView::new(
            SessionHistory::new(self.identity.clone(), self.db.clone()),
            limit,
        )
    }
}

#[tokio::test]
async fn pomodoro_and_stopwatch_sessions_reach_history() {
    let mut app = app(UnsavedPolicy::Discard);
    app.identity.sign_in("alice").unwrap();

    app.coordinator.set_duration(0.2).unwrap();
    assert!(app.coordinator.toggle());
    let outcomes = app.tick(Mode::Pomo, 20).await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_ok());

    app.coordinator.switch_mode(Mode::Stopwatch);
    app.coordinator.toggle();
    app.tick(Mode::Stopwatch, 30).await;
    app.coordinator.toggle();
    assert!(matches!(app.coordinator.commit().await, Some(Ok(()))));
    assert_eq!(app.coordinator.stopwatch().elapsed_secs(), 0);

    let mut view = app.history(10);
    let records = view.refresh().await.to_vec();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].mode, Mode::Stopwatch);
    assert_eq!(records[0].duration_secs, 30);
    assert_eq!(records[1].mode, Mode::Pomo);
    assert_eq!(records[1].duration_secs, 12);
    assert!(records.iter().all(|r| r.user_id.as_str() == "alice"));

    assert_eq!(app.notifier.alarms(), 1);
    assert_eq!(
        app.notifier
            .count(|e| matches!(e, Event::SessionSaved { .. })),
        2
    );
}

#[tokio::test]
async fn signed_out_commit_stores_nothing() {
    let mut app = app(UnsavedPolicy::Discard);

    app.coordinator.switch_mode(Mode::Stopwatch);
    app.coordinator.toggle();
    app.tick(Mode::Stopwatch, 30).await;
    app.coordinator.toggle();

    assert!(matches!(
        app.coordinator.commit().await,
        Some(Err(SaveError::Unauthenticated))
    ));
    assert_eq!(app.coordinator.stopwatch().elapsed_secs(), 0);
    assert_eq!(app.db.session_count().unwrap(), 0);
    assert!(app.history(10).refresh().await.is_empty());
}

#[tokio::test]
async fn kept_time_can_be_committed_after_sign_in() {
    let mut app = app(UnsavedPolicy::KeepOnFailure);

    app.coordinator.switch_mode(Mode::Stopwatch);
    app.coordinator.toggle();
    app.tick(Mode::Stopwatch, 45).await;
    app.coordinator.toggle();

    assert!(matches!(
        app.coordinator.commit().await,
        Some(Err(SaveError::Unauthenticated))
    ));
    assert_eq!(app.coordinator.stopwatch().elapsed_secs(), 45);

    app.identity.sign_in("bob").unwrap();
    assert!(matches!(app.coordinator.commit().await, Some(Ok(()))));
    assert_eq!(app.db.session_count().unwrap(), 1);

    let records = app.history(10).refresh().await.to_vec();
    assert_eq!(records[0].duration_secs, 45);
    assert_eq!(records[0].user_id.as_str(), "bob");
}

#[tokio::test]
async fn history_is_scoped_to_the_signed_in_user() {
    let mut app = app(UnsavedPolicy::Discard);

    for user in ["alice", "bob"] {
        app.identity.sign_in(user).unwrap();
        app.coordinator.switch_mode(Mode::Stopwatch);
        app.coordinator.toggle();
        app.tick(Mode::Stopwatch, 15).await;
        app.coordinator.toggle();
        assert!(matches!(app.coordinator.commit().await, Some(Ok(()))));
    }

    let records = app.history(10).refresh().await.to_vec();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id.as_str(), "bob");

    app.coordinator.shutdown();
    assert_eq!(app.clock.live(), 0);
}
