//! Mode coordinator.
//!
//! Owns one pomodoro and one stopwatch and routes user actions to the timer
//! that is on screen. Clock ticks are routed by the timer that armed them,
//! so a timer keeps running while the other mode is displayed. Switching
//! modes never touches either timer.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{SaveError, ValidationError};
use crate::events::Event;
use crate::notify::Notifier;
use crate::session::SessionRecorder;
use crate::timer::{Clock, Mode, PomodoroTimer, StopwatchTimer, Tick, UnsavedPolicy};

pub struct Coordinator {
    mode: Mode,
    pomodoro: PomodoroTimer,
    stopwatch: StopwatchTimer,
    recorder: Arc<SessionRecorder>,
    notifier: Arc<dyn Notifier>,
    unsaved_policy: UnsavedPolicy,
}

impl Coordinator {
    pub fn new(
        clock: Arc<dyn Clock>,
        recorder: Arc<SessionRecorder>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            mode: Mode::Pomo,
            pomodoro: PomodoroTimer::new(Arc::clone(&clock)),
            stopwatch: StopwatchTimer::new(clock),
            recorder,
            notifier,
            unsaved_policy: UnsavedPolicy::default(),
        }
    }

    pub fn with_unsaved_policy(mut self, policy: UnsavedPolicy) -> Self {
        self.unsaved_policy = policy;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn pomodoro(&self) -> &PomodoroTimer {
        &self.pomodoro
    }

    pub fn stopwatch(&self) -> &StopwatchTimer {
        &self.stopwatch
    }

    pub fn is_saving(&self) -> bool {
        self.recorder.is_saving()
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            pomodoro: self.pomodoro.state(),
            remaining_secs: self.pomodoro.remaining_secs(),
            initial_secs: self.pomodoro.initial_secs(),
            stopwatch: self.stopwatch.state(),
            elapsed_secs: self.stopwatch.elapsed_secs(),
            saving: self.is_saving(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn switch_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.emit(Some(Event::ModeSwitched {
            mode,
            at: Utc::now(),
        }));
    }

    /// Start the displayed timer, or pause it if it is running.
    pub fn toggle(&mut self) -> bool {
        let event = match self.mode {
            Mode::Pomo if self.pomodoro.is_running() => self.pomodoro.pause(),
            Mode::Pomo => self.pomodoro.start(),
            Mode::Stopwatch if self.stopwatch.is_running() => self.stopwatch.pause(),
            Mode::Stopwatch => self.stopwatch.start(),
        };
        self.emit(event)
    }

    pub fn reset(&mut self) -> bool {
        let event = match self.mode {
            Mode::Pomo => Some(self.pomodoro.reset()),
            Mode::Stopwatch => self.stopwatch.reset(),
        };
        self.emit(event)
    }

    /// Pick a countdown length. Always applies to the pomodoro timer.
    ///
    /// # Errors
    /// Returns an error if `minutes` is negative or not finite.
    pub fn set_duration(&mut self, minutes: f64) -> Result<(), ValidationError> {
        let event = self.pomodoro.set_duration(minutes)?;
        self.emit(Some(event));
        Ok(())
    }

    /// Save the stopped stopwatch run. `None` if there is nothing to save.
    pub async fn commit(&mut self) -> Option<Result<(), SaveError>> {
        self.stopwatch
            .commit(&self.recorder, self.unsaved_policy)
            .await
    }

    /// Apply one clock tick.
    ///
    /// Ticks from a handle the timer no longer holds are dropped. When the
    /// tick finishes the countdown, the alarm goes off and the session is
    /// handed to the recorder; the save outcome is returned.
    pub async fn on_tick(&mut self, tick: Tick) -> Option<Result<(), SaveError>> {
        match tick.mode {
            Mode::Pomo => {
                if self.pomodoro.tick_handle_id() != Some(tick.handle) {
                    tracing::debug!(handle = tick.handle, "dropping stale pomodoro tick");
                    return None;
                }
                let pending = self.pomodoro.tick()?;
                self.notifier.alarm();
                self.emit(Some(Event::PomodoroCompleted {
                    duration_secs: pending.duration_secs,
                    at: Utc::now(),
                }));
                Some(
                    self.recorder
                        .record(pending.mode, pending.duration_secs)
                        .await,
                )
            }
            Mode::Stopwatch => {
                if self.stopwatch.tick_handle_id() != Some(tick.handle) {
                    tracing::debug!(handle = tick.handle, "dropping stale stopwatch tick");
                    return None;
                }
                self.stopwatch.tick();
                None
            }
        }
    }

    /// Release both tick sources. Timer values are kept.
    pub fn shutdown(&mut self) {
        self.pomodoro.release();
        self.stopwatch.release();
    }

    fn emit(&self, event: Option<Event>) -> bool {
        match event {
            Some(event) => {
                self.notifier.notify(&event);
                true
            }
            None => false,
        }
    }
}
