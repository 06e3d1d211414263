use serde::{Deserialize, Serialize};

use crate::storage::config::PresetsConfig;

/// Named countdown durations offered next to the pomodoro timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Focus,
    Break,
    /// Sub-minute countdown for checking the completion path end to end.
    QuickTest,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Focus, Preset::Break, Preset::QuickTest];

    pub fn minutes(&self, presets: &PresetsConfig) -> f64 {
        match self {
            Preset::Focus => presets.focus_min,
            Preset::Break => presets.break_min,
            Preset::QuickTest => presets.quick_test_min,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Focus => "focus",
            Preset::Break => "break",
            Preset::QuickTest => "test",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "focus" => Some(Preset::Focus),
            "break" => Some(Preset::Break),
            "test" | "quick" | "quick_test" => Some(Preset::QuickTest),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_minutes() {
        let presets = PresetsConfig::default();
        assert_eq!(Preset::Focus.minutes(&presets), 25.0);
        assert_eq!(Preset::Break.minutes(&presets), 5.0);
        assert_eq!(Preset::QuickTest.minutes(&presets), 0.1);
    }

    #[test]
    fn names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_name(preset.name()), Some(preset));
        }
        assert_eq!(Preset::from_name("quick"), Some(Preset::QuickTest));
        assert_eq!(Preset::from_name("nap"), None);
    }
}
