//! # Pomofomo Core Library
//!
//! Core logic for the Pomofomo study timer: a countdown (pomodoro) and a
//! count-up stopwatch, with finished sessions recorded per user and a
//! short history of recent sessions.
//!
//! ## Architecture
//!
//! - **Timers**: Tick-driven state machines fed by an injected [`timer::Clock`]
//! - **Sessions**: Validation and recording of finished sessions through the
//!   [`session::Identity`] and [`session::SessionStore`] collaborators
//! - **Coordinator**: Routes user actions and ticks to the active timer
//! - **Storage**: SQLite session storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Coordinator`]: Mode switching and action routing
//! - [`PomodoroTimer`] / [`StopwatchTimer`]: The two timers
//! - [`SessionRecorder`]: Save gatekeeper (minimum length, signed-in user)
//! - [`HistoryView`]: Recent-session list with stale-on-failure refresh
//! - [`Database`]: Session persistence
//! - [`Config`]: Application configuration management

pub mod coordinator;
pub mod error;
pub mod events;
pub mod format;
pub mod notify;
pub mod session;
pub mod storage;
pub mod timer;

pub use coordinator::Coordinator;
pub use error::{
    ConfigError, CoreError, HistoryError, SaveError, StoreError, ValidationError,
};
pub use events::Event;
pub use notify::{LogNotifier, Notifier};
pub use session::{HistoryView, SessionHistory, SessionRecord, SessionRecorder, UserId};
pub use storage::{Config, ConfigKey, Database, StoredIdentity};
pub use timer::{Mode, PomodoroTimer, Preset, StopwatchTimer};
