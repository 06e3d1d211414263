use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::clock::{Clock, TickHandle};
use super::Mode;
use crate::error::SaveError;
use crate::events::Event;
use crate::session::{PendingSession, SessionRecorder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchState {
    Idle,
    Running,
    Stopped,
}

/// What happens to unsaved time when a commit does not store a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsavedPolicy {
    /// Clear the stopwatch whatever the save outcome.
    #[default]
    Discard,
    /// Keep the elapsed time after a retryable failure so it can be committed again.
    KeepOnFailure,
}

/// Accumulating timer. Counts up one second per tick without bound.
pub struct StopwatchTimer {
    clock: Arc<dyn Clock>,
    elapsed_secs: u64,
    tick: Option<TickHandle>,
}

impl StopwatchTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            elapsed_secs: 0,
            tick: None,
        }
    }

    pub fn state(&self) -> StopwatchState {
        if self.tick.is_some() {
            StopwatchState::Running
        } else if self.elapsed_secs == 0 {
            StopwatchState::Idle
        } else {
            StopwatchState::Stopped
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn is_running(&self) -> bool {
        self.tick.is_some()
    }

    pub fn tick_handle_id(&self) -> Option<u64> {
        self.tick.as_ref().map(TickHandle::id)
    }

    pub fn start(&mut self) -> Option<Event> {
        if self.tick.is_some() {
            return None;
        }
        self.tick = Some(self.clock.arm(Mode::Stopwatch));
        Some(Event::TimerStarted {
            timer: Mode::Stopwatch,
            seconds: self.elapsed_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        let handle = self.tick.take()?;
        handle.cancel();
        Some(Event::TimerPaused {
            timer: Mode::Stopwatch,
            seconds: self.elapsed_secs,
            at: Utc::now(),
        })
    }

    pub fn tick(&mut self) {
        if self.tick.is_some() {
            self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        }
    }

    /// Session to hand to the recorder, available only while stopped.
    pub fn pending(&self) -> Option<PendingSession> {
        (self.state() == StopwatchState::Stopped).then_some(PendingSession {
            mode: Mode::Stopwatch,
            duration_secs: self.elapsed_secs,
        })
    }

    /// Record the stopped run, then clear it.
    ///
    /// Returns `None` when there is nothing to commit (idle or running).
    /// With [`UnsavedPolicy::KeepOnFailure`] the elapsed time survives an
    /// `Unauthenticated` or `SaveFailed` outcome.
    pub async fn commit(
        &mut self,
        recorder: &SessionRecorder,
        policy: UnsavedPolicy,
    ) -> Option<Result<(), SaveError>> {
        let pending = self.pending()?;
        let outcome = recorder.record(pending.mode, pending.duration_secs).await;

        let keep = policy == UnsavedPolicy::KeepOnFailure
            && matches!(&outcome, Err(e) if e.is_retryable());
        if keep {
            tracing::info!(
                elapsed_secs = self.elapsed_secs,
                "keeping unsaved stopwatch time for retry"
            );
            self.release();
        } else {
            self.clear();
        }
        Some(outcome)
    }

    /// Discard a stopped run without saving. No-op unless stopped.
    pub fn reset(&mut self) -> Option<Event> {
        if self.state() != StopwatchState::Stopped {
            return None;
        }
        self.clear();
        Some(Event::TimerReset {
            timer: Mode::Stopwatch,
            at: Utc::now(),
        })
    }

    pub fn release(&mut self) {
        if let Some(handle) = self.tick.take() {
            handle.cancel();
        }
    }

    fn clear(&mut self) {
        self.release();
        self.elapsed_secs = 0;
    }
}
