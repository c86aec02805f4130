//! Configuration loading and typed config structures for Infinite Resume.
//!
//! The optional `infinite-config.yaml` at the project root mirrors
//! [`ResumeConfig`]. Every field has a default, so an empty or missing file
//! yields a working configuration. Two environment variables override the
//! file:
//!
//! - `INFINITE_MODE` overrides `mode` (`development` or `production`)
//! - `INFINITE_STORAGE_DIR` overrides `storage.dir`

use std::path::{Path, PathBuf};

use infinite_journey::STORAGE_KEY;
use infinite_journey::tracker::DEFAULT_MAX_INTERACTIONS;
use infinite_sandbox::Budget;
use serde::Deserialize;

/// Environment variable overriding [`ResumeConfig::mode`].
pub const MODE_ENV: &str = "INFINITE_MODE";

/// Environment variable overriding [`StorageConfig::dir`].
pub const STORAGE_DIR_ENV: &str = "INFINITE_STORAGE_DIR";

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

    /// An environment override holds a value the field cannot take.
    #[error("invalid value {value:?} in {var}")]
    InvalidEnv {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A value is out of its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResumeConfig {
    /// Deployment mode; picks the default log level.
    #[serde(default)]
    pub mode: Mode,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where the journey snapshot lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Journey tracker settings.
    #[serde(default)]
    pub journey: JourneyConfig,

    /// Limits for one code panel run.
    #[serde(default)]
    pub sandbox: Budget,

    /// Timer intervals driving animation and demonstrations.
    #[serde(default)]
    pub timers: TimerConfig,

    /// Decorative geometry settings.
    #[serde(default)]
    pub geometry: GeometryConfig,
}

impl ResumeConfig {
    /// Load configuration from a YAML file, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and
    /// [`ConfigError::InvalidEnv`] or [`ConfigError::Invalid`] if the
    /// resulting values are unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if an override is unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. Environment variables are
    /// not consulted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `INFINITE_MODE` and `INFINITE_STORAGE_DIR` as looked up by
    /// `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `INFINITE_MODE` is neither
    /// `development` nor `production`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(MODE_ENV) {
            self.mode = value.parse()?;
        }
        if let Some(dir) = lookup(STORAGE_DIR_ENV).filter(|d| !d.is_empty()) {
            self.storage.dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// Reject values the runtime cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, ms) in self.timers.intervals() {
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    reason: format!("timers.{name} must be at least 1 ms"),
                });
            }
        }
        if self.storage.key.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "storage.key must not be empty".to_owned(),
            });
        }
        if self.sandbox.max_steps == 0 {
            return Err(ConfigError::Invalid {
                reason: "sandbox.max_steps must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// The log filter directive to use when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &str {
        self.logging
            .level
            .as_deref()
            .unwrap_or_else(|| self.mode.default_log_level())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Deployment mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Verbose logging.
    #[default]
    Development,
    /// Quiet logging.
    Production,
}

impl Mode {
    /// The log level this mode starts from.
    pub const fn default_log_level(self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Production => "info",
        }
    }
}

impl core::str::FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnv {
                var: MODE_ENV,
                value: s.to_owned(),
            }),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive such as `info` or `infinite_core=trace`. Unset
    /// means the mode's default.
    #[serde(default)]
    pub level: Option<String>,
}

/// Snapshot storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per key. `null` keeps the journey in
    /// memory only.
    #[serde(default = "default_storage_dir")]
    pub dir: Option<PathBuf>,

    /// Key the journey is stored under.
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            key: default_storage_key(),
        }
    }
}

/// Journey tracker settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JourneyConfig {
    /// Interaction log cap; `0` keeps everything.
    #[serde(default = "default_max_interactions")]
    pub max_interactions: usize,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            max_interactions: default_max_interactions(),
        }
    }
}

/// Timer intervals in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// Animation frame.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,

    /// Enlightenment meter ramp in the Philosophy layer.
    #[serde(default = "default_enlightenment_ms")]
    pub enlightenment_ms: u64,

    /// Bubble sort step.
    #[serde(default = "default_sort_ms")]
    pub sort_ms: u64,

    /// Pathfinding step.
    #[serde(default = "default_path_ms")]
    pub path_ms: u64,

    /// Neural network pulse.
    #[serde(default = "default_neural_ms")]
    pub neural_ms: u64,
}

impl TimerConfig {
    /// Every interval with its field name.
    pub const fn intervals(&self) -> [(&'static str, u64); 5] {
        [
            ("frame_ms", self.frame_ms),
            ("enlightenment_ms", self.enlightenment_ms),
            ("sort_ms", self.sort_ms),
            ("path_ms", self.path_ms),
            ("neural_ms", self.neural_ms),
        ]
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
            enlightenment_ms: default_enlightenment_ms(),
            sort_ms: default_sort_ms(),
            path_ms: default_path_ms(),
            neural_ms: default_neural_ms(),
        }
    }
}

/// Decorative geometry settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeometryConfig {
    /// Seed for the randomized shapes, the neural pulse and skill picks.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

#[allow(clippy::unnecessary_wraps)]
fn default_storage_dir() -> Option<PathBuf> {
    Some(PathBuf::from(".infinite-resume"))
}

fn default_storage_key() -> String {
    STORAGE_KEY.to_owned()
}

const fn default_max_interactions() -> usize {
    DEFAULT_MAX_INTERACTIONS
}

const fn default_frame_ms() -> u64 {
    16
}

const fn default_enlightenment_ms() -> u64 {
    100
}

const fn default_sort_ms() -> u64 {
    1_000
}

const fn default_path_ms() -> u64 {
    200
}

const fn default_neural_ms() -> u64 {
    1_000
}

const fn default_seed() -> u64 {
    42
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ResumeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.storage.key, "infinite-resume-storage");
        assert_eq!(config.journey.max_interactions, 10_000);
        assert_eq!(config.timers.enlightenment_ms, 100);
        assert_eq!(config.timers.path_ms, 200);
        assert_eq!(config.sandbox, Budget::default());
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
mode: production
logging:
  level: "infinite_core=trace"
storage:
  dir: "/tmp/journeys"
  key: "visitor-7"
journey:
  max_interactions: 0
sandbox:
  max_steps: 5000
  timeout_ms: 250
timers:
  frame_ms: 33
  sort_ms: 500
geometry:
  seed: 7
"#;
        let config = ResumeConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.log_level(), "infinite_core=trace");
        assert_eq!(config.storage.dir, Some(PathBuf::from("/tmp/journeys")));
        assert_eq!(config.storage.key, "visitor-7");
        assert_eq!(config.journey.max_interactions, 0);
        assert_eq!(config.sandbox.max_steps, 5000);
        assert_eq!(config.sandbox.timeout_ms, 250);
        // Unlisted budget fields keep their defaults.
        assert_eq!(config.sandbox.max_call_depth, Budget::default().max_call_depth);
        assert_eq!(config.timers.frame_ms, 33);
        assert_eq!(config.timers.sort_ms, 500);
        assert_eq!(config.timers.neural_ms, 1_000);
        assert_eq!(config.geometry.seed, 7);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = ResumeConfig::parse("");
        assert!(config.is_ok());
        assert_eq!(config.ok(), Some(ResumeConfig::default()));
    }

    #[test]
    fn null_storage_dir_means_memory() {
        let config = ResumeConfig::parse("storage:\n  dir: ~\n").ok().unwrap_or_default();
        assert_eq!(config.storage.dir, None);
        assert_eq!(config.storage.key, STORAGE_KEY);
    }

    #[test]
    fn production_defaults_to_info() {
        let config = ResumeConfig::parse("mode: production\n").ok().unwrap_or_default();
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = ResumeConfig::parse("timers:\n  path_ms: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { reason }) if reason.contains("path_ms")
        ));
    }

    #[test]
    fn unknown_mode_is_a_yaml_error() {
        assert!(matches!(
            ResumeConfig::parse("mode: staging\n"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ResumeConfig::default();
        let result = config.apply_env_overrides(|var| match var {
            MODE_ENV => Some("production".to_owned()),
            STORAGE_DIR_ENV => Some("/var/lib/resume".to_owned()),
            _ => None,
        });
        assert!(result.is_ok());
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.storage.dir, Some(PathBuf::from("/var/lib/resume")));
    }

    #[test]
    fn bad_mode_override_is_rejected() {
        let mut config = ResumeConfig::default();
        let result = config.apply_env_overrides(|var| (var == MODE_ENV).then(|| "loud".to_owned()));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { var: MODE_ENV, value }) if value == "loud"
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("infinite-config.yaml");
        if path.exists() {
            let config = std::fs::read_to_string(&path)
                .map_err(ConfigError::from)
                .and_then(|yaml| ResumeConfig::parse(&yaml));
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
