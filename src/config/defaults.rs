//! System-wide default constants.
//!
//! Centralises the magic numbers used by config defaults, validation and the
//! CLI. Grouped by subsystem for easy discovery.

// ============================================================================
// Pipeline
// ============================================================================

/// Default debounce window (seconds).
///
/// Tunable. Deployments have run anywhere from 10 ms (confirmation is then
/// effectively immediate at camera frame rates) to several hundred ms.
pub const DEBOUNCE_WINDOW_SECS: f64 = 0.5;

/// Windows shorter than this are below a typical camera frame interval and
/// produce a validation warning (seconds).
pub const MIN_EFFECTIVE_DEBOUNCE_SECS: f64 = 0.05;

/// Windows longer than this are almost certainly a unit mistake (seconds).
pub const MAX_SENSIBLE_DEBOUNCE_SECS: f64 = 60.0;

/// Digits kept after the first decimal point when OCR text holds several points.
pub const DECIMAL_DIGITS_KEPT: u32 = 1;

/// Upper bound on `decimal_digits_kept`; f64 cannot represent more reliably.
pub const MAX_DECIMAL_DIGITS_KEPT: u32 = 15;

/// Log a progress line every N ticks.
pub const PROGRESS_LOG_INTERVAL_TICKS: u64 = 100;

// ============================================================================
// Indicators
// ============================================================================

/// GPIO line driving the count-up indicator.
pub const UP_INDICATOR_GPIO: u32 = 17;

/// GPIO line driving the count-down indicator.
pub const DOWN_INDICATOR_GPIO: u32 = 27;

/// Root of the Linux sysfs GPIO interface.
pub const GPIO_SYSFS_ROOT: &str = "/sys/class/gpio";

// ============================================================================
// Sources
// ============================================================================

/// Delay between external OCR command invocations (ms).
pub const COMMAND_POLL_INTERVAL_MS: u64 = 0;

/// Lines buffered between the stdin reader thread and the pipeline.
pub const LINE_CHANNEL_CAPACITY: usize = 64;

/// Config file searched in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "countwatch.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "COUNTWATCH_CONFIG";
