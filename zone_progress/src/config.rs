//! Storage key layout and progress-signal configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scenes::{ProfileId, SceneId, ZoneId};

/// Prefixes for every record kept in the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub session_prefix: String,
    pub permanent_prefix: String,
    pub transient_prefix: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            session_prefix: "gameCoachSession".to_string(),
            permanent_prefix: "zoneProgress".to_string(),
            transient_prefix: "tempSession".to_string(),
        }
    }
}

impl StorageKeys {
    pub fn session_key(&self, profile: &ProfileId, zone: &ZoneId) -> String {
        format!("{}_{}_{}", self.session_prefix, profile, zone)
    }

    pub fn permanent_key(&self, profile: &ProfileId, zone: &ZoneId) -> String {
        format!("{}_{}_{}", self.permanent_prefix, profile, zone)
    }

    pub fn transient_key(&self, profile: &ProfileId, zone: &ZoneId, scene: &SceneId) -> String {
        format!("{}_{}_{}_{}", self.transient_prefix, profile, zone, scene)
    }
}

/// Which transient-record fields count as "the player has done something".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSignals {
    /// Phases a mini-game starts in; a record still in one of these has no progress.
    pub initial_phases: Vec<String>,
    /// Boolean fields that mark partial progress when true.
    pub progress_flags: Vec<String>,
    /// Object/array fields that mark partial progress when non-empty.
    pub discovery_fields: Vec<String>,
    /// Flag set while a mini-game shows its own completion screen.
    pub completion_screen_flag: String,
}

impl Default for ProgressSignals {
    fn default() -> Self {
        Self {
            initial_phases: vec!["initial".to_string(), "mooshika_search".to_string()],
            progress_flags: vec![
                "hasStarted".to_string(),
                "tutorialComplete".to_string(),
                "firstItemFound".to_string(),
            ],
            discovery_fields: vec!["discovered".to_string(), "placed".to_string()],
            completion_screen_flag: "showingCompletion".to_string(),
        }
    }
}

impl ProgressSignals {
    pub fn is_initial_phase(&self, phase: &str) -> bool {
        self.initial_phases.iter().any(|p| p == phase)
    }
}

/// Settings for the progress side of the system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub keys: StorageKeys,
    pub signals: ProgressSignals,
}

impl ProgressConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let keys = StorageKeys::default();
        let profile = ProfileId::from("asha");
        let zone = ZoneId::from("garden");
        let scene = SceneId::from("pond");

        assert_eq!(keys.session_key(&profile, &zone), "gameCoachSession_asha_garden");
        assert_eq!(keys.permanent_key(&profile, &zone), "zoneProgress_asha_garden");
        assert_eq!(
            keys.transient_key(&profile, &zone, &scene),
            "tempSession_asha_garden_pond"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ProgressConfig::from_toml_str(
            r#"
            [keys]
            transient_prefix = "scratch"

            [signals]
            initial_phases = ["intro"]
            "#,
        )
        .unwrap();

        assert_eq!(config.keys.transient_prefix, "scratch");
        assert_eq!(config.keys.session_prefix, "gameCoachSession");
        assert!(config.signals.is_initial_phase("intro"));
        assert!(!config.signals.is_initial_phase("mooshika_search"));
        assert_eq!(config.signals.completion_screen_flag, "showingCompletion");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ProgressConfig::from_toml_str("keys = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
