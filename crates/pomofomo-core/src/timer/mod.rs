//! Dual-mode study timer.
//!
//! Both timers are tick-driven state machines. They never spawn anything
//! themselves: starting a timer arms a [`TickHandle`] on the injected
//! [`Clock`], and whoever owns the clock feeds ticks back through `tick()`.
//!
//! ## State Transitions
//!
//! ```text
//! Pomodoro:  Idle -> Running -> (Paused -> Running)* -> Completed
//! Stopwatch: Idle -> Running -> (Stopped -> Running)* -> Stopped -> Idle
//! ```

mod clock;
mod pomodoro;
mod preset;
mod stopwatch;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use clock::{Clock, IntervalClock, ManualClock, Tick, TickHandle, TICK_PERIOD};
pub use pomodoro::{PomodoroState, PomodoroTimer, DEFAULT_POMODORO_MINUTES};
pub use preset::Preset;
pub use stopwatch::{StopwatchState, StopwatchTimer, UnsavedPolicy};

/// Which timer a tick, action, or session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Pomo,
    Stopwatch,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Pomo => "pomo",
            Mode::Stopwatch => "stopwatch",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Pomo => "Pomodoro",
            Mode::Stopwatch => "Stopwatch",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pomo" | "pomodoro" => Ok(Mode::Pomo),
            "stopwatch" | "sw" => Ok(Mode::Stopwatch),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("pomo".parse::<Mode>().unwrap(), Mode::Pomo);
        assert_eq!("Pomodoro".parse::<Mode>().unwrap(), Mode::Pomo);
        assert_eq!("sw".parse::<Mode>().unwrap(), Mode::Stopwatch);
        assert!("lap".parse::<Mode>().is_err());
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Stopwatch).unwrap(), "\"stopwatch\"");
        assert_eq!(Mode::Pomo.to_string(), "pomo");
    }
}
