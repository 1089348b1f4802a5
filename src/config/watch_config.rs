//! Watch Configuration - pipeline tunables as operator-editable TOML values
//!
//! Each struct implements `Default` with the built-in values, so a missing
//! file or a partially filled file behaves exactly like the defaults for
//! every key it does not mention.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one watched display.
///
/// Load with `WatchConfig::load()` which searches:
/// 1. `$COUNTWATCH_CONFIG` env var
/// 2. `./countwatch.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Sanitizer, debounce and output policy
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Indicator output wiring
    #[serde(default)]
    pub indicators: IndicatorConfig,

    /// External reading source settings
    #[serde(default)]
    pub source: SourceConfig,
}

impl WatchConfig {
    /// Load configuration using the standard search order:
    /// 1. `$COUNTWATCH_CONFIG` environment variable
    /// 2. `./countwatch.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded watch config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./countwatch.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded watch config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every section.
    ///
    /// Errors are impossible values that must prevent startup; range
    /// warnings are logged and do not fail validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Pipeline Config
// ============================================================================

/// What a tick without a parsable number does to the pending candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoReadingPolicy {
    /// Leave candidate and confirmed reading untouched
    #[default]
    Retain,
    /// Drop the pending candidate; its timer restarts on the next value
    Clear,
}

/// Indicator output for `Initial` and `NoChange` transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoChangeOutput {
    /// Both indicators off
    #[default]
    AllOff,
    /// Keep whatever the previous confirmation commanded
    RetainPrevious,
}

/// Sanitizer, debounce and output policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum time a candidate must stay unchanged before it is confirmed.
    ///
    /// Keep this above the camera frame interval; very small values make
    /// confirmation effectively immediate and let single-frame misreads through.
    #[serde(default = "default_debounce_window_seconds")]
    pub debounce_window_seconds: f64,

    #[serde(default)]
    pub no_reading_policy: NoReadingPolicy,

    #[serde(default)]
    pub no_change_output: NoChangeOutput,

    /// Digits kept after the first decimal point when the OCR text contains
    /// more than one point. `0` treats every reading as an integer.
    #[serde(default = "default_decimal_digits_kept")]
    pub decimal_digits_kept: u32,
}

fn default_debounce_window_seconds() -> f64 {
    defaults::DEBOUNCE_WINDOW_SECS
}

fn default_decimal_digits_kept() -> u32 {
    defaults::DECIMAL_DIGITS_KEPT
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce_window_seconds: default_debounce_window_seconds(),
            no_reading_policy: NoReadingPolicy::default(),
            no_change_output: NoChangeOutput::default(),
            decimal_digits_kept: default_decimal_digits_kept(),
        }
    }
}

impl PipelineConfig {
    /// Reject values the pipeline cannot run with. Warnings are not reported here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, _warnings) = super::validation::validate_pipeline_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Debounce window as a `Duration`.
    ///
    /// Only meaningful after validation; a non-finite or negative value maps
    /// to zero rather than panicking.
    pub fn debounce_window(&self) -> Duration {
        Duration::try_from_secs_f64(self.debounce_window_seconds).unwrap_or(Duration::ZERO)
    }
}

// ============================================================================
// Indicator Config
// ============================================================================

/// GPIO wiring of the two indicator outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_up_gpio")]
    pub up_gpio: u32,

    #[serde(default = "default_down_gpio")]
    pub down_gpio: u32,

    /// Drive the line low to switch an indicator on
    #[serde(default)]
    pub active_low: bool,

    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: String,
}

fn default_up_gpio() -> u32 {
    defaults::UP_INDICATOR_GPIO
}

fn default_down_gpio() -> u32 {
    defaults::DOWN_INDICATOR_GPIO
}

fn default_sysfs_root() -> String {
    defaults::GPIO_SYSFS_ROOT.to_string()
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            up_gpio: default_up_gpio(),
            down_gpio: default_down_gpio(),
            active_low: false,
            sysfs_root: default_sysfs_root(),
        }
    }
}

// ============================================================================
// Source Config
// ============================================================================

/// External OCR command used by the command source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Program and arguments run once per tick; stdout is the raw reading.
    #[serde(default)]
    pub command: Vec<String>,

    /// Pause between command invocations (ms).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    defaults::COMMAND_POLL_INTERVAL_MS
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
