//! Countdown timer.
//!
//! `remaining_secs` only ever moves down by one per tick and stops at zero.
//! Completion is edge-triggered: the tick that takes a running countdown
//! from one to zero returns the pending session and releases the tick
//! handle, so later ticks (including stale ones already queued by the
//! clock) find the timer stopped and do nothing.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::clock::{Clock, TickHandle};
use super::Mode;
use crate::error::ValidationError;
use crate::events::Event;
use crate::session::PendingSession;

/// Countdown length when nothing else has been selected.
pub const DEFAULT_POMODORO_MINUTES: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomodoroState {
    Idle,
    Running,
    Paused,
    /// Reached zero. Stays here until a duration is picked again.
    Completed,
}

pub struct PomodoroTimer {
    clock: Arc<dyn Clock>,
    remaining_secs: u64,
    initial_secs: u64,
    /// Last selected preset, in minutes. `reset()` returns to it.
    preset_minutes: f64,
    tick: Option<TickHandle>,
}

impl PomodoroTimer {
    /// A countdown armed with the default 25 minute preset.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let initial_secs = minutes_to_secs(DEFAULT_POMODORO_MINUTES);
        Self {
            clock,
            remaining_secs: initial_secs,
            initial_secs,
            preset_minutes: DEFAULT_POMODORO_MINUTES,
            tick: None,
        }
    }

    /// A countdown armed with `minutes`.
    ///
    /// # Errors
    /// Returns an error if `minutes` is negative or not finite.
    pub fn with_minutes(clock: Arc<dyn Clock>, minutes: f64) -> Result<Self, ValidationError> {
        let mut timer = Self::new(clock);
        timer.set_duration(minutes)?;
        Ok(timer)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PomodoroState {
        if self.tick.is_some() {
            PomodoroState::Running
        } else if self.remaining_secs == self.initial_secs {
            PomodoroState::Idle
        } else if self.remaining_secs == 0 {
            PomodoroState::Completed
        } else {
            PomodoroState::Paused
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn initial_secs(&self) -> u64 {
        self.initial_secs
    }

    pub fn preset_minutes(&self) -> f64 {
        self.preset_minutes
    }

    pub fn is_running(&self) -> bool {
        self.tick.is_some()
    }

    /// Stopped away from the armed duration, so a reset would change something.
    pub fn is_modified(&self) -> bool {
        !self.is_running() && self.remaining_secs != self.initial_secs
    }

    /// Id of the live tick handle, if running.
    pub fn tick_handle_id(&self) -> Option<u64> {
        self.tick.as_ref().map(TickHandle::id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the countdown. No-op when already running or nothing is left.
    pub fn start(&mut self) -> Option<Event> {
        if self.tick.is_some() || self.remaining_secs == 0 {
            return None;
        }
        self.tick = Some(self.clock.arm(Mode::Pomo));
        Some(Event::TimerStarted {
            timer: Mode::Pomo,
            seconds: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        let handle = self.tick.take()?;
        handle.cancel();
        Some(Event::TimerPaused {
            timer: Mode::Pomo,
            seconds: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Advance one second. Returns the finished session on the tick that
    /// reaches zero, and only on that tick.
    pub fn tick(&mut self) -> Option<PendingSession> {
        self.tick.as_ref()?;
        if self.remaining_secs == 0 {
            // start() never arms an empty countdown.
            self.release();
            return None;
        }

        self.remaining_secs -= 1;
        if self.remaining_secs > 0 {
            return None;
        }

        self.release();
        tracing::info!(duration_secs = self.initial_secs, "pomodoro completed");
        Some(PendingSession {
            mode: Mode::Pomo,
            duration_secs: self.initial_secs,
        })
    }

    /// Select a new countdown length. Valid in any state; stops the timer.
    ///
    /// # Errors
    /// Returns an error if `minutes` is negative or not finite. The timer is
    /// left untouched in that case.
    pub fn set_duration(&mut self, minutes: f64) -> Result<Event, ValidationError> {
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(ValidationError::InvalidDuration { minutes });
        }
        self.release();
        let secs = minutes_to_secs(minutes);
        self.remaining_secs = secs;
        self.initial_secs = secs;
        self.preset_minutes = minutes;
        Ok(Event::DurationSet {
            minutes,
            seconds: secs,
            at: Utc::now(),
        })
    }

    /// Back to the last selected preset.
    pub fn reset(&mut self) -> Event {
        self.release();
        let secs = minutes_to_secs(self.preset_minutes);
        self.remaining_secs = secs;
        self.initial_secs = secs;
        Event::DurationSet {
            minutes: self.preset_minutes,
            seconds: secs,
            at: Utc::now(),
        }
    }

    /// Drop the tick handle without touching the countdown.
    pub fn release(&mut self) {
        if let Some(handle) = self.tick.take() {
            handle.cancel();
        }
    }
}

fn minutes_to_secs(minutes: f64) -> u64 {
    (minutes * 60.0).round() as u64
}
