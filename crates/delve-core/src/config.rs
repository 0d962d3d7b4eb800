//! Configuration loading and typed config structures for the Delve simulation.
//!
//! The canonical configuration lives in `delve-config.yaml` at the project
//! root. Every section and every field is optional; anything left out takes
//! the default listed on the field. The loader parses the YAML and then
//! rejects combinations the engine cannot play with.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use delve_world::CavernConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but cannot be used together.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `delve-config.yaml`. Immutable once a game starts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Cavern generation parameters.
    #[serde(default)]
    pub cavern: CavernConfig,

    /// Bonus and score parameters.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Escape-phase parameters.
    #[serde(default)]
    pub escape: EscapeConfig,

    /// Wall-clock limits for each phase.
    #[serde(default)]
    pub deadlines: DeadlineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot play with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cavern = &self.cavern;
        if cavern.min_rows == 0 || cavern.min_cols == 0 {
            return Err(invalid("cavern dimensions must be at least 1"));
        }
        if cavern.min_rows > cavern.max_rows {
            return Err(invalid("cavern.min_rows exceeds cavern.max_rows"));
        }
        if cavern.min_cols > cavern.max_cols {
            return Err(invalid("cavern.min_cols exceeds cavern.max_cols"));
        }
        if cavern.max_edge_weight == 0 {
            return Err(invalid("cavern.max_edge_weight must be at least 1"));
        }
        if !(0.0..=1.0).contains(&cavern.loop_density) {
            return Err(invalid("cavern.loop_density must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&cavern.reward_density) {
            return Err(invalid("cavern.reward_density must lie in [0, 1]"));
        }

        let scoring = &self.scoring;
        if !scoring.min_bonus.is_finite() || !scoring.max_bonus.is_finite() {
            return Err(invalid("scoring bonuses must be finite"));
        }
        if scoring.min_bonus < 0.0 || scoring.min_bonus > scoring.max_bonus {
            return Err(invalid(
                "scoring.min_bonus must be non-negative and at most scoring.max_bonus",
            ));
        }
        if !scoring.no_bonus_multiple.is_finite() || scoring.no_bonus_multiple <= 1.0 {
            return Err(invalid("scoring.no_bonus_multiple must be greater than 1"));
        }

        let factor = self.escape.extra_steps_factor;
        if !factor.is_finite() || factor < 0.0 {
            return Err(invalid("escape.extra_steps_factor must be non-negative"));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Bonus and score configuration.
///
/// The bonus factor starts at `max_bonus` for an optimal locate walk and
/// falls linearly to `min_bonus` at `no_bonus_multiple` times the optimal
/// distance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoringConfig {
    /// Bonus floor.
    #[serde(default = "default_min_bonus")]
    pub min_bonus: f64,

    /// Bonus for a walk no longer than the optimal distance.
    #[serde(default = "default_max_bonus")]
    pub max_bonus: f64,

    /// Walk length, as a multiple of the optimal distance, where the bonus
    /// reaches its floor.
    #[serde(default = "default_no_bonus_multiple")]
    pub no_bonus_multiple: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_bonus: default_min_bonus(),
            max_bonus: default_max_bonus(),
            no_bonus_multiple: default_no_bonus_multiple(),
        }
    }
}

/// Escape-phase configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EscapeConfig {
    /// Share of the cavern's worst-case walk granted on top of the optimal
    /// distance to the exit.
    #[serde(default = "default_extra_steps_factor")]
    pub extra_steps_factor: f64,
}

impl Default for EscapeConfig {
    fn default() -> Self {
        Self {
            extra_steps_factor: default_extra_steps_factor(),
        }
    }
}

/// Phase deadline configuration. A value of 0 disables the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeadlineConfig {
    /// Wall-clock limit for the locate phase, in milliseconds (0 = none).
    #[serde(default = "default_locate_timeout_ms")]
    pub locate_timeout_ms: u64,

    /// Wall-clock limit for the escape phase, in milliseconds (0 = none).
    #[serde(default = "default_escape_timeout_ms")]
    pub escape_timeout_ms: u64,
}

impl DeadlineConfig {
    /// Deadlines that never expire.
    pub const fn unlimited() -> Self {
        Self {
            locate_timeout_ms: 0,
            escape_timeout_ms: 0,
        }
    }

    /// The locate-phase deadline, `None` when disabled.
    pub const fn locate_timeout(&self) -> Option<Duration> {
        as_deadline(self.locate_timeout_ms)
    }

    /// The escape-phase deadline, `None` when disabled.
    pub const fn escape_timeout(&self) -> Option<Duration> {
        as_deadline(self.escape_timeout_ms)
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            locate_timeout_ms: default_locate_timeout_ms(),
            escape_timeout_ms: default_escape_timeout_ms(),
        }
    }
}

const fn as_deadline(ms: u64) -> Option<Duration> {
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_min_bonus() -> f64 {
    1.0
}

const fn default_max_bonus() -> f64 {
    1.3
}

const fn default_no_bonus_multiple() -> f64 {
    4.0
}

const fn default_extra_steps_factor() -> f64 {
    0.3
}

const fn default_locate_timeout_ms() -> u64 {
    10_000
}

const fn default_escape_timeout_ms() -> u64 {
    15_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = GameConfig::default();
        assert_eq!(config.cavern.min_rows, 8);
        assert_eq!(config.cavern.max_cols, 40);
        assert_eq!(config.cavern.max_edge_weight, 15);
        assert!((config.scoring.max_bonus - 1.3).abs() < f64::EPSILON);
        assert!((config.escape.extra_steps_factor - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.deadlines.locate_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.deadlines.escape_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
cavern:
  min_rows: 5
  max_rows: 6
  min_cols: 7
  max_cols: 9
  max_edge_weight: 3
  loop_density: 0.2
  reward_density: 0.5
  max_reward: 50

scoring:
  min_bonus: 1.0
  max_bonus: 2.0
  no_bonus_multiple: 3.0

escape:
  extra_steps_factor: 0.5

deadlines:
  locate_timeout_ms: 250
  escape_timeout_ms: 0

logging:
  level: debug
  json: true
";
        let config = GameConfig::parse(yaml).unwrap();
        assert_eq!(config.cavern.max_rows, 6);
        assert_eq!(config.cavern.max_reward, 50);
        assert!((config.scoring.max_bonus - 2.0).abs() < f64::EPSILON);
        assert_eq!(
            config.deadlines.locate_timeout(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.deadlines.escape_timeout(), None);
        assert!(config.logging.json);
    }

    #[test]
    fn shipped_sample_matches_defaults() {
        let sample = include_str!("../../../delve-config.yaml");
        assert_eq!(GameConfig::parse(sample).unwrap(), GameConfig::default());
    }

    #[test]
    fn parse_partial_yaml_fills_defaults() {
        let config = GameConfig::parse("deadlines:\n  locate_timeout_ms: 5\n").unwrap();
        assert_eq!(config.deadlines.locate_timeout_ms, 5);
        assert_eq!(config.deadlines.escape_timeout_ms, 15_000);
        assert_eq!(config.cavern, CavernConfig::default());
    }

    #[test]
    fn inconsistent_values_are_rejected() {
        let cases = [
            "cavern:\n  min_rows: 30\n  max_rows: 10\n",
            "cavern:\n  max_edge_weight: 0\n",
            "cavern:\n  reward_density: 1.5\n",
            "scoring:\n  min_bonus: 2.0\n  max_bonus: 1.0\n",
            "scoring:\n  no_bonus_multiple: 1.0\n",
            "escape:\n  extra_steps_factor: -0.1\n",
        ];
        for yaml in cases {
            assert!(
                matches!(GameConfig::parse(yaml), Err(ConfigError::Invalid { .. })),
                "accepted: {yaml}"
            );
        }
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            GameConfig::parse("cavern: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = GameConfig::from_file(Path::new("/nonexistent/delve-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
