//! Coach tuning knobs.

use serde::{Deserialize, Serialize};
use zone_progress::{ConfigError, ProgressConfig, ProgressSignals, StorageKeys};

const MINUTES_PER_DAY: u32 = 24 * 60;

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}

/// Configuration for the decision engine and the progress book it reads.
///
/// Every field has a default, so a TOML file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Minimum time between non-achievement messages.
    pub cooldown_ms: i64,
    /// Evaluations without progress before encouragement is offered.
    pub stuck_threshold: u32,
    /// Maximum length of a session's shown-message history.
    pub history_limit: usize,
    /// How many of the latest history entries count as "recent".
    pub recent_history_window: usize,
    /// Offset from UTC used to decide when a new day starts; less than a day either way.
    pub utc_offset_minutes: i32,
    pub keys: StorageKeys,
    pub signals: ProgressSignals,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 3 * 60 * 1000,
            stuck_threshold: 3,
            history_limit: 10,
            recent_history_window: 3,
            utc_offset_minutes: 0,
            keys: StorageKeys::default(),
            signals: ProgressSignals::default(),
        }
    }
}

impl CoachConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the decision rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.utc_offset_minutes.unsigned_abs() >= MINUTES_PER_DAY {
            return Err(invalid(
                "utc_offset_minutes",
                format!("{} is not within a day of UTC", self.utc_offset_minutes),
            ));
        }
        if self.cooldown_ms < 0 {
            return Err(invalid("cooldown_ms", "must not be negative".to_string()));
        }
        if self.history_limit == 0 {
            return Err(invalid("history_limit", "must be at least 1".to_string()));
        }
        if self.stuck_threshold == 0 {
            return Err(invalid("stuck_threshold", "must be at least 1".to_string()));
        }
        Ok(())
    }

    /// The subset needed by [`zone_progress::ProgressBook`].
    pub fn progress_config(&self) -> ProgressConfig {
        ProgressConfig {
            keys: self.keys.clone(),
            signals: self.signals.clone(),
        }
    }
}
