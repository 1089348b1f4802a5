//! Config Validation Tests
//!
//! Typo detection (unknown keys with suggestions), range validation, and
//! loading config files from disk. These exercise the config layer
//! independently from the rest of the pipeline.

use std::io::Write;

use countwatch::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use countwatch::config::{ConfigError, NoReadingPolicy, WatchConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_pipeline_key_warns_with_suggestion() {
    let toml_str = r#"
[pipeline]
no_readng_policy = "clear"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("no_readng_policy"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("pipeline.no_reading_policy")
    );
    assert!(warnings[0].to_string().contains("did you mean"));
}

#[test]
fn typo_in_section_name_warns() {
    let toml_str = r#"
[indicator]
up_gpio = 5
"#;
    let warnings = validate_unknown_keys(toml_str);
    // Both the table and its key are unknown
    assert_eq!(warnings.len(), 2);
    let table = warnings
        .iter()
        .find(|w| w.field == "indicator")
        .expect("warning for the table itself");
    assert_eq!(table.suggestion.as_deref(), Some("indicators"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[pipeline]
debounce_window_seconds = 0.4
no_reading_policy = "retain"
no_change_output = "all_off"
decimal_digits_kept = 2

[indicators]
up_gpio = 5
down_gpio = 6
active_low = true
sysfs_root = "/sys/class/gpio"

[source]
command = ["sh", "-c", "tesseract frame.png stdout --psm 7"]
poll_interval_ms = 100
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "Unexpected warnings: {:?}", warnings);
}

#[test]
fn unrelated_key_gets_no_suggestion() {
    let known = known_config_keys();
    assert!(suggest_correction("completely.unrelated.thing", &known).is_none());
}

#[test]
fn every_known_key_is_accepted() {
    let known = known_config_keys();
    assert!(known.contains("pipeline.debounce_window_seconds"));
    assert!(known.contains("indicators.active_low"));
    assert!(known.contains("source.poll_interval_ms"));
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn negative_window_is_an_error() {
    let mut config = WatchConfig::default();
    config.pipeline.debounce_window_seconds = -0.5;
    let (errors, _) = validate_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("must be > 0"));
}

#[test]
fn infinite_window_is_an_error() {
    let mut config = WatchConfig::default();
    config.pipeline.debounce_window_seconds = f64::INFINITY;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("finite")));
}

#[test]
fn sub_frame_window_only_warns() {
    let mut config = WatchConfig::default();
    config.pipeline.debounce_window_seconds = 0.02;
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 1);
    assert!(config.validate().is_ok(), "warnings must not fail validation");
}

#[test]
fn very_long_window_warns() {
    let mut config = WatchConfig::default();
    config.pipeline.debounce_window_seconds = 120.0;
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings.iter().any(|w| w.message.contains("unusually long")));
}

#[test]
fn too_many_decimal_digits_is_an_error() {
    let mut config = WatchConfig::default();
    config.pipeline.decimal_digits_kept = 40;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("decimal_digits_kept")));
}

#[test]
fn empty_command_program_is_an_error() {
    let mut config = WatchConfig::default();
    config.source.command = vec![" ".to_string(), "--psm".to_string()];
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("source.command")));
}

// ============================================================================
// Loading From Disk
// ============================================================================

#[test]
fn load_from_file_reads_overrides() {
    let file = write_config(
        r#"
[pipeline]
debounce_window_seconds = 1.0
no_reading_policy = "clear"

[indicators]
up_gpio = 23
down_gpio = 24
"#,
    );
    let config = WatchConfig::load_from_file(file.path()).expect("valid config file");
    assert_eq!(config.pipeline.debounce_window_seconds, 1.0);
    assert_eq!(config.pipeline.no_reading_policy, NoReadingPolicy::Clear);
    assert_eq!(config.indicators.up_gpio, 23);
    assert_eq!(config.indicators.down_gpio, 24);
    assert_eq!(config.source.poll_interval_ms, 0);
}

#[test]
fn load_from_file_tolerates_unknown_keys() {
    let file = write_config(
        r#"
[pipeline]
debounce_windw_seconds = 3.0
"#,
    );
    let config = WatchConfig::load_from_file(file.path()).expect("typos only warn");
    // The misspelled key was ignored, so the default applies
    assert_eq!(config.pipeline.debounce_window_seconds, 0.5);
}

#[test]
fn load_from_file_rejects_invalid_values() {
    let file = write_config(
        r#"
[pipeline]
debounce_window_seconds = 0.0
"#,
    );
    match WatchConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("debounce_window_seconds")));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn load_from_file_reports_parse_errors() {
    let file = write_config("[pipeline\ndebounce_window_seconds = ");
    let err = WatchConfig::load_from_file(file.path()).expect_err("broken TOML");
    assert!(matches!(err, ConfigError::Parse(..)));
    assert!(err.to_string().contains("Config parse error"));
}

#[test]
fn load_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope.toml");
    let err = WatchConfig::load_from_file(&missing).expect_err("missing file");
    assert!(matches!(err, ConfigError::Io(..)));
}

#[test]
fn printed_config_loads_back() {
    let mut original = WatchConfig::default();
    original.pipeline.decimal_digits_kept = 3;
    original.indicators.active_low = true;
    let file = write_config(&original.to_toml().expect("serialize"));

    let loaded = WatchConfig::load_from_file(file.path()).expect("reload");
    assert_eq!(loaded.pipeline.decimal_digits_kept, 3);
    assert!(loaded.indicators.active_low);
}
