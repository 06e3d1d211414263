use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::{format_clock, preset_label};
use crate::session::SessionMode;
use crate::timer::{Mode, PomodoroState, StopwatchState};

/// Every user-visible state change produces an Event.
/// The notifier turns them into toasts, log lines, or terminal output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        timer: Mode,
        seconds: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        timer: Mode,
        seconds: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        timer: Mode,
        at: DateTime<Utc>,
    },
    /// A countdown preset was selected (or the countdown was reset to one).
    DurationSet {
        minutes: f64,
        seconds: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero while running. Fired once per zero-crossing.
    PomodoroCompleted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        mode: Mode,
        at: DateTime<Utc>,
    },
    SaveStarted {
        mode: SessionMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionSaved {
        mode: SessionMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionTooShort {
        mode: SessionMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SignInRequired {
        at: DateTime<Utc>,
    },
    SaveFailed {
        mode: SessionMode,
        duration_secs: u64,
        message: String,
        at: DateTime<Utc>,
    },
    /// Full display state of both timers.
    StateSnapshot {
        mode: Mode,
        pomodoro: PomodoroState,
        remaining_secs: u64,
        initial_secs: u64,
        stopwatch: StopwatchState,
        elapsed_secs: u64,
        saving: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short notice for the user, or `None` for events that are not announced.
    pub fn message(&self) -> Option<String> {
        let text = match self {
            Event::TimerStarted {
                timer: Mode::Pomo, ..
            } => "Focus started. You've got this!".to_string(),
            Event::TimerStarted {
                timer: Mode::Stopwatch,
                ..
            } => "Stopwatch started".to_string(),
            Event::TimerPaused {
                timer: Mode::Pomo,
                seconds,
                ..
            } => format!("Paused at {}", format_clock(*seconds)),
            Event::TimerPaused {
                timer: Mode::Stopwatch,
                seconds,
                ..
            } => format!("Stopwatch paused at {}", format_clock(*seconds)),
            Event::TimerReset { .. } => "Reset".to_string(),
            Event::DurationSet { minutes, .. } => format!("Set to {}", preset_label(*minutes)),
            Event::PomodoroCompleted { .. } => "Focus time is over. Nice work!".to_string(),
            Event::ModeSwitched { mode, .. } => format!("Switched to {}", mode.label()),
            Event::SaveStarted { .. } => "Saving session...".to_string(),
            Event::SessionSaved {
                mode,
                duration_secs,
                ..
            } => format!(
                "{} session saved ({})",
                mode.label(),
                format_clock(*duration_secs)
            ),
            Event::SessionTooShort { duration_secs, .. } => {
                format!("Not saved: {duration_secs}s is too short to record")
            }
            Event::SignInRequired { .. } => "Sign in to save your sessions".to_string(),
            Event::SaveFailed { .. } => "Failed to save session".to_string(),
            Event::StateSnapshot { .. } => return None,
        };
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::SignInRequired { at: Utc::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sign_in_required");
    }

    #[test]
    fn messages() {
        let at = Utc::now();
        let set = Event::DurationSet {
            minutes: 0.1,
            seconds: 6,
            at,
        };
        assert_eq!(set.message().as_deref(), Some("Set to 6s"));

        let paused = Event::TimerPaused {
            timer: Mode::Stopwatch,
            seconds: 75,
            at,
        };
        assert_eq!(
            paused.message().as_deref(),
            Some("Stopwatch paused at 01:15")
        );

        let saved = Event::SessionSaved {
            mode: Mode::Pomo,
            duration_secs: 1500,
            at,
        };
        assert_eq!(
            saved.message().as_deref(),
            Some("Pomodoro session saved (25:00)")
        );
    }
}
