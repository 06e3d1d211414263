pub mod config;
pub mod database;
pub mod identity;
pub mod migrations;

pub use config::{Config, ConfigChange, ConfigKey};
pub use database::Database;
pub use identity::StoredIdentity;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/pomofomo[-dev]/`, creating it if needed.
///
/// Set POMOFOMO_ENV=dev to use the development data directory, or
/// POMOFOMO_HOME to use an explicit directory instead.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOFOMO_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOFOMO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomofomo-dev")
            } else {
                base_dir.join("pomofomo")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
