//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.
//!
//! Every heuristic the engine applies (merge validity cutoff, year/day caps,
//! default-visible day count, ...) lives in `EngineSettings` so callers and
//! tests can override it.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tunable constants of the processing engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineSettings {
    /// Merged date+time timestamps are used only when strictly more than
    /// this fraction of rows parse
    #[serde(default = "default_merge_validity_threshold")]
    pub merge_validity_threshold: f64,

    /// Most recent distinct years shown in the seasonal view
    #[serde(default = "default_max_years")]
    pub max_years: usize,

    /// Most recent distinct dates shown in the daily pattern view
    #[serde(default = "default_max_days")]
    pub max_days: usize,

    /// Daily overlays visible by default (most recent first)
    #[serde(default = "default_visible_days")]
    pub visible_days: usize,

    /// Distinct hour values required before the daily pattern view is built
    #[serde(default = "default_min_distinct_hours")]
    pub min_distinct_hours: usize,

    /// Number of equal-width histogram bins
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Reject unsupported granularity/reducer names instead of falling back
    #[serde(default)]
    pub strict_options: bool,
}

fn default_merge_validity_threshold() -> f64 {
    0.5
}

fn default_max_years() -> usize {
    8
}

fn default_max_days() -> usize {
    30
}

fn default_visible_days() -> usize {
    5
}

fn default_min_distinct_hours() -> usize {
    2
}

fn default_histogram_bins() -> usize {
    30
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            merge_validity_threshold: default_merge_validity_threshold(),
            max_years: default_max_years(),
            max_days: default_max_days(),
            visible_days: default_visible_days(),
            min_distinct_hours: default_min_distinct_hours(),
            histogram_bins: default_histogram_bins(),
            strict_options: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("seasonlens").join("config.toml")),
            Some(PathBuf::from("/etc/seasonlens/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SEASONLENS_MERGE_THRESHOLD") {
            if let Ok(t) = v.parse() {
                self.engine.merge_validity_threshold = t;
            }
        }
        if let Ok(v) = std::env::var("SEASONLENS_MAX_YEARS") {
            if let Ok(n) = v.parse() {
                self.engine.max_years = n;
            }
        }
        if let Ok(v) = std::env::var("SEASONLENS_MAX_DAYS") {
            if let Ok(n) = v.parse() {
                self.engine.max_days = n;
            }
        }
        if let Ok(v) = std::env::var("SEASONLENS_STRICT_OPTIONS") {
            self.engine.strict_options = matches!(v.as_str(), "1" | "true" | "yes");
        }

        // Logging overrides
        if let Ok(level) = std::env::var("SEASONLENS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SEASONLENS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Seasonlens Configuration
#
# Environment variables override these settings:
# - SEASONLENS_MERGE_THRESHOLD
# - SEASONLENS_MAX_YEARS
# - SEASONLENS_MAX_DAYS
# - SEASONLENS_STRICT_OPTIONS
# - SEASONLENS_LOG_LEVEL
# - SEASONLENS_LOG_FORMAT

[engine]
# Use merged date+time timestamps only when strictly more than this
# fraction of rows parse; otherwise fall back to the date column alone
merge_validity_threshold = 0.5

# Most recent years drawn in the seasonal view
max_years = 8

# Most recent dates drawn in the daily pattern view
max_days = 30

# Daily overlays visible before the user toggles them
visible_days = 5

# Distinct hour values needed for a daily pattern view
min_distinct_hours = 2

# Histogram bin count
histogram_bins = 30

# Fail on unknown granularity/reducer names instead of using raw/mean
strict_options = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
