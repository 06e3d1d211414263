//! Core error types for pomofomo-core.
//!
//! Every failure in the timer and session-recording subsystem is recovered
//! at the boundary of the failing operation and reported as one of these
//! values. None of them is fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomofomo-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence collaborator errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session save outcome other than success
    #[error(transparent)]
    Save(#[from] SaveError),

    /// History read failure
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Errors reported by the persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Statement execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored row could not be decoded
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    /// Store unavailable (connectivity, poisoned handle, test doubles)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a session save that did not produce a stored record.
#[derive(Error, Debug)]
pub enum SaveError {
    /// Duration below the recordable floor; nothing was sent to the store.
    #[error("Session too short to record ({duration}s, minimum {minimum}s)")]
    TooShort { duration: u64, minimum: u64 },

    /// No signed-in user; nothing was sent to the store.
    #[error("Sign in to record sessions")]
    Unauthenticated,

    /// The store rejected or failed the insert.
    #[error("Failed to save session: {0}")]
    SaveFailed(#[source] StoreError),
}

/// History read failures.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to load session history: {0}")]
    QueryFailed(#[source] StoreError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Countdown minutes must be finite and non-negative
    #[error("Invalid duration: {minutes} minutes")]
    InvalidDuration { minutes: f64 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl SaveError {
    /// Whether the unsaved time could be saved by trying again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SaveError::Unauthenticated | SaveError::SaveFailed(_))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
