//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Countdown presets (focus, break, quick test)
//! - History list length
//! - Notification preferences
//! - What happens to stopwatch time that could not be saved
//!
//! Configuration is stored at `~/.config/pomofomo/config.toml`. Individual
//! settings are addressed through [`ConfigKey`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::session::DEFAULT_HISTORY_LIMIT;
use crate::timer::{Mode, UnsavedPolicy, DEFAULT_POMODORO_MINUTES};

/// Countdown presets, in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetsConfig {
    #[serde(default = "default_focus_min")]
    pub focus_min: f64,
    #[serde(default = "default_break_min")]
    pub break_min: f64,
    #[serde(default = "default_quick_test_min")]
    pub quick_test_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell when a countdown finishes.
    #[serde(default = "default_true")]
    pub bell: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StopwatchConfig {
    /// Keep the elapsed time when a save fails or nobody is signed in.
    #[serde(default)]
    pub keep_unsaved_on_failure: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomofomo/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Timer shown when a session starts.
    #[serde(default)]
    pub start_mode: Mode,
    #[serde(default)]
    pub presets: PresetsConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub stopwatch: StopwatchConfig,
}

fn default_focus_min() -> f64 {
    DEFAULT_POMODORO_MINUTES
}
fn default_break_min() -> f64 {
    5.0
}
fn default_quick_test_min() -> f64 {
    0.1
}
fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}
fn default_true() -> bool {
    true
}

impl Default for PresetsConfig {
    fn default() -> Self {
        Self {
            focus_min: default_focus_min(),
            break_min: default_break_min(),
            quick_test_min: default_quick_test_min(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_mode: Mode::Pomo,
            presets: PresetsConfig::default(),
            history: HistoryConfig::default(),
            notifications: NotificationsConfig::default(),
            stopwatch: StopwatchConfig::default(),
        }
    }
}

// ── Keys ─────────────────────────────────────────────────────────────

/// A single user-settable value, named by its dotted TOML path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    StartMode,
    FocusMin,
    BreakMin,
    QuickTestMin,
    HistoryLimit,
    NotificationsEnabled,
    NotificationsBell,
    KeepUnsavedOnFailure,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 8] = [
        ConfigKey::StartMode,
        ConfigKey::FocusMin,
        ConfigKey::BreakMin,
        ConfigKey::QuickTestMin,
        ConfigKey::HistoryLimit,
        ConfigKey::NotificationsEnabled,
        ConfigKey::NotificationsBell,
        ConfigKey::KeepUnsavedOnFailure,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::StartMode => "start_mode",
            ConfigKey::FocusMin => "presets.focus_min",
            ConfigKey::BreakMin => "presets.break_min",
            ConfigKey::QuickTestMin => "presets.quick_test_min",
            ConfigKey::HistoryLimit => "history.limit",
            ConfigKey::NotificationsEnabled => "notifications.enabled",
            ConfigKey::NotificationsBell => "notifications.bell",
            ConfigKey::KeepUnsavedOnFailure => "stopwatch.keep_unsaved_on_failure",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConfigKey::StartMode => "timer shown when `run` starts (pomo | stopwatch)",
            ConfigKey::FocusMin => "focus preset, minutes",
            ConfigKey::BreakMin => "break preset, minutes",
            ConfigKey::QuickTestMin => "quick test preset, minutes",
            ConfigKey::HistoryLimit => "sessions listed by `history`",
            ConfigKey::NotificationsEnabled => "print notices in the terminal",
            ConfigKey::NotificationsBell => "ring the bell when a countdown finishes",
            ConfigKey::KeepUnsavedOnFailure => "keep stopwatch time when a save fails",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// Old and new value of one setting after `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    pub key: ConfigKey,
    pub old: String,
    pub new: String,
}

impl ConfigChange {
    pub fn is_unchanged(&self) -> bool {
        self.old == self.new
    }
}

impl fmt::Display for ConfigChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unchanged() {
            write!(f, "{} unchanged ({})", self.key, self.new)
        } else {
            write!(f, "{}: {} -> {}", self.key, self.old, self.new)
        }
    }
}

fn parse_minutes(key: ConfigKey, value: &str) -> Result<f64, ConfigError> {
    let minutes = value
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(key, format!("'{value}' is not a number of minutes")))?;
    check_minutes(key, minutes)?;
    Ok(minutes)
}

fn check_minutes(key: ConfigKey, minutes: f64) -> Result<(), ConfigError> {
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(invalid(key, format!("{minutes} is not a valid number of minutes")));
    }
    Ok(())
}

fn parse_switch(key: ConfigKey, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => Ok(true),
        "false" | "off" | "no" => Ok(false),
        other => Err(invalid(key, format!("expected true or false, got '{other}'"))),
    }
}

fn invalid(key: ConfigKey, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.name().to_string(),
        message,
    }
}

// ── Load / save / access ─────────────────────────────────────────────

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// holds an invalid value, or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Load from disk, falling back to the defaults with a warning.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Current value of `key`, formatted the way `apply` accepts it.
    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::StartMode => self.start_mode.to_string(),
            ConfigKey::FocusMin => self.presets.focus_min.to_string(),
            ConfigKey::BreakMin => self.presets.break_min.to_string(),
            ConfigKey::QuickTestMin => self.presets.quick_test_min.to_string(),
            ConfigKey::HistoryLimit => self.history.limit.to_string(),
            ConfigKey::NotificationsEnabled => self.notifications.enabled.to_string(),
            ConfigKey::NotificationsBell => self.notifications.bell.to_string(),
            ConfigKey::KeepUnsavedOnFailure => self.stopwatch.keep_unsaved_on_failure.to_string(),
        }
    }

    /// Every key with its current value, in display order.
    pub fn entries(&self) -> Vec<(ConfigKey, String)> {
        ConfigKey::ALL
            .into_iter()
            .map(|key| (key, self.get(key)))
            .collect()
    }

    /// Settings whose value differs between `self` and `other`.
    pub fn diff(&self, other: &Config) -> Vec<ConfigChange> {
        ConfigKey::ALL
            .into_iter()
            .map(|key| ConfigChange {
                key,
                old: self.get(key),
                new: other.get(key),
            })
            .filter(|change| !change.is_unchanged())
            .collect()
    }

    /// Parse `value` for `key` and store it, without saving.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the value does not parse or
    /// is out of range. The config is unchanged in that case.
    pub fn apply(&mut self, key: ConfigKey, value: &str) -> Result<ConfigChange, ConfigError> {
        let old = self.get(key);
        match key {
            ConfigKey::StartMode => {
                self.start_mode = value.parse().map_err(|e: String| invalid(key, e))?;
            }
            ConfigKey::FocusMin => self.presets.focus_min = parse_minutes(key, value)?,
            ConfigKey::BreakMin => self.presets.break_min = parse_minutes(key, value)?,
            ConfigKey::QuickTestMin => self.presets.quick_test_min = parse_minutes(key, value)?,
            ConfigKey::HistoryLimit => {
                let limit = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| invalid(key, format!("'{value}' is not a whole number")))?;
                if limit == 0 {
                    return Err(invalid(key, "must be at least 1".to_string()));
                }
                self.history.limit = limit;
            }
            ConfigKey::NotificationsEnabled => {
                self.notifications.enabled = parse_switch(key, value)?;
            }
            ConfigKey::NotificationsBell => self.notifications.bell = parse_switch(key, value)?,
            ConfigKey::KeepUnsavedOnFailure => {
                self.stopwatch.keep_unsaved_on_failure = parse_switch(key, value)?;
            }
        }
        Ok(ConfigChange {
            key,
            old,
            new: self.get(key),
        })
    }

    /// [`apply`](Self::apply), then save.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is rejected or the config cannot be saved.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<ConfigChange, ConfigError> {
        let change = self.apply(key, value)?;
        if !change.is_unchanged() {
            self.save()?;
            tracing::info!(key = %key, old = %change.old, new = %change.new, "config updated");
        }
        Ok(change)
    }

    /// Check values serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_minutes(ConfigKey::FocusMin, self.presets.focus_min)?;
        check_minutes(ConfigKey::BreakMin, self.presets.break_min)?;
        check_minutes(ConfigKey::QuickTestMin, self.presets.quick_test_min)?;
        if self.history.limit == 0 {
            return Err(invalid(ConfigKey::HistoryLimit, "must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn unsaved_policy(&self) -> UnsavedPolicy {
        if self.stopwatch.keep_unsaved_on_failure {
            UnsavedPolicy::KeepOnFailure
        } else {
            UnsavedPolicy::Discard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[presets]\nfocus_min = 50.0\n").unwrap();
        assert_eq!(parsed.presets.focus_min, 50.0);
        assert_eq!(parsed.presets.break_min, 5.0);
        assert_eq!(parsed.history.limit, 10);
        assert_eq!(parsed.start_mode, Mode::Pomo);
    }

    #[test]
    fn keys_parse_from_their_names() {
        for key in ConfigKey::ALL {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), key);
        }
        assert!(matches!(
            "presets.nap_min".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn get_formats_current_values() {
        let cfg = Config::default();
        assert_eq!(cfg.get(ConfigKey::FocusMin), "25");
        assert_eq!(cfg.get(ConfigKey::QuickTestMin), "0.1");
        assert_eq!(cfg.get(ConfigKey::HistoryLimit), "10");
        assert_eq!(cfg.get(ConfigKey::NotificationsBell), "true");
        assert_eq!(cfg.get(ConfigKey::StartMode), "pomo");
        assert_eq!(cfg.entries().len(), ConfigKey::ALL.len());
    }

    #[test]
    fn apply_reports_the_change() {
        let mut cfg = Config::default();
        let change = cfg.apply(ConfigKey::FocusMin, "50").unwrap();
        assert_eq!(change.old, "25");
        assert_eq!(change.new, "50");
        assert_eq!(change.to_string(), "presets.focus_min: 25 -> 50");

        let again = cfg.apply(ConfigKey::FocusMin, "50.0").unwrap();
        assert!(again.is_unchanged());
        assert_eq!(again.to_string(), "presets.focus_min unchanged (50)");
    }

    #[test]
    fn apply_updates_typed_fields() {
        let mut cfg = Config::default();
        cfg.apply(ConfigKey::QuickTestMin, "0.25").unwrap();
        cfg.apply(ConfigKey::KeepUnsavedOnFailure, "on").unwrap();
        cfg.apply(ConfigKey::StartMode, "stopwatch").unwrap();
        cfg.apply(ConfigKey::NotificationsEnabled, "false").unwrap();

        assert_eq!(cfg.presets.quick_test_min, 0.25);
        assert_eq!(cfg.unsaved_policy(), UnsavedPolicy::KeepOnFailure);
        assert_eq!(cfg.start_mode, Mode::Stopwatch);
        assert!(!cfg.notifications.enabled);
    }

    #[test]
    fn apply_rejects_invalid_values_and_keeps_config() {
        let mut cfg = Config::default();
        assert!(cfg.apply(ConfigKey::NotificationsBell, "loud").is_err());
        assert!(cfg.apply(ConfigKey::HistoryLimit, "0").is_err());
        assert!(cfg.apply(ConfigKey::HistoryLimit, "2.5").is_err());
        assert!(cfg.apply(ConfigKey::BreakMin, "-5").is_err());
        assert!(cfg.apply(ConfigKey::BreakMin, "NaN").is_err());
        assert!(cfg.apply(ConfigKey::StartMode, "lap").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn diff_lists_only_changed_keys() {
        let mut cfg = Config::default();
        cfg.apply(ConfigKey::HistoryLimit, "3").unwrap();
        cfg.apply(ConfigKey::NotificationsBell, "false").unwrap();

        let changes = cfg.diff(&Config::default());
        let keys: Vec<ConfigKey> = changes.iter().map(|c| c.key).collect();
        assert_eq!(keys, vec![ConfigKey::HistoryLimit, ConfigKey::NotificationsBell]);
        assert_eq!(changes[0].old, "3");
        assert_eq!(changes[0].new, "10");
    }

    #[test]
    fn load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.apply(ConfigKey::HistoryLimit, "25").unwrap();
        cfg.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.history.limit, 25);
    }

    #[test]
    fn load_rejects_broken_or_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "presets = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));

        std::fs::write(&path, "[history]\nlimit = 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
