//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Unknown keys never break a config.

use std::collections::HashSet;

use super::defaults;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for WatchConfig.
///
/// Maintained by hand to match the struct hierarchy in watch_config.rs.
/// Any new field added to WatchConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [pipeline]
        "pipeline",
        "pipeline.debounce_window_seconds",
        "pipeline.no_reading_policy",
        "pipeline.no_change_output",
        "pipeline.decimal_digits_kept",
        // [indicators]
        "indicators",
        "indicators.up_gpio",
        "indicators.down_gpio",
        "indicators.active_low",
        "indicators.sysfs_root",
        // [source]
        "source",
        "source.command",
        "source.poll_interval_ms",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        // Tie-break on the key itself so the answer does not depend on
        // HashSet iteration order.
        let better = match best {
            None => true,
            Some((best_key, best_dist)) => dist < best_dist || (dist == best_dist && k < best_key),
        };
        if better {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed WatchConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_ranges(config: &super::WatchConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let (mut errors, warnings) = validate_pipeline_ranges(&config.pipeline);

    let ind = &config.indicators;
    if ind.up_gpio == ind.down_gpio {
        errors.push(format!(
            "indicators.up_gpio and indicators.down_gpio are both {}; each indicator needs its own line",
            ind.up_gpio
        ));
    }
    if ind.sysfs_root.trim().is_empty() {
        errors.push("indicators.sysfs_root must not be empty".to_string());
    }

    if let Some(program) = config.source.command.first() {
        if program.trim().is_empty() {
            errors.push("source.command program name must not be empty".to_string());
        }
    }

    (errors, warnings)
}

/// Range checks for the `[pipeline]` table alone.
pub fn validate_pipeline_ranges(
    p: &super::PipelineConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let window = p.debounce_window_seconds;

    if !window.is_finite() {
        errors.push(format!(
            "pipeline.debounce_window_seconds = {window} must be a finite number"
        ));
    } else if window <= 0.0 {
        errors.push(format!(
            "pipeline.debounce_window_seconds = {window:.3} must be > 0"
        ));
    } else if window < defaults::MIN_EFFECTIVE_DEBOUNCE_SECS {
        warnings.push(ValidationWarning {
            field: "pipeline.debounce_window_seconds".to_string(),
            message: format!(
                "debounce_window_seconds = {window:.3} is shorter than a typical frame interval ({:.2}s); confirmation will be effectively immediate",
                defaults::MIN_EFFECTIVE_DEBOUNCE_SECS
            ),
            suggestion: None,
        });
    } else if window > defaults::MAX_SENSIBLE_DEBOUNCE_SECS {
        warnings.push(ValidationWarning {
            field: "pipeline.debounce_window_seconds".to_string(),
            message: format!(
                "debounce_window_seconds = {window:.1} is unusually long (> {:.0}s)",
                defaults::MAX_SENSIBLE_DEBOUNCE_SECS
            ),
            suggestion: None,
        });
    }

    if p.decimal_digits_kept > defaults::MAX_DECIMAL_DIGITS_KEPT {
        errors.push(format!(
            "pipeline.decimal_digits_kept = {} exceeds maximum of {}",
            p.decimal_digits_kept,
            defaults::MAX_DECIMAL_DIGITS_KEPT
        ));
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("debounce_widow", "debounce_window"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [pipeline]
            debounce_window_seconds = 0.5
        "#
        .parse()
        .expect("valid toml");
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"pipeline".to_string()));
        assert!(keys.contains(&"pipeline.debounce_window_seconds".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[pipeline]
debounce_window_secnds = 0.5
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("debounce_window_secnds"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("pipeline.debounce_window_seconds")
        );
    }

    #[test]
    fn test_unparsable_toml_yields_no_key_warnings() {
        assert!(validate_unknown_keys("[pipeline\nbroken").is_empty());
    }

    #[test]
    fn test_defaults_clean() {
        let (errors, warnings) = validate_ranges(&WatchConfig::default());
        assert!(errors.is_empty(), "Defaults should produce no errors: {:?}", errors);
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {:?}", warnings);
    }

    #[test]
    fn test_tiny_window_warns_not_errors() {
        let mut config = WatchConfig::default();
        config.pipeline.debounce_window_seconds = 0.01;
        let (errors, warnings) = validate_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "pipeline.debounce_window_seconds"));
    }

    #[test]
    fn test_nan_window_is_error() {
        let mut config = WatchConfig::default();
        config.pipeline.debounce_window_seconds = f64::NAN;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("finite")));
    }

    #[test]
    fn test_shared_gpio_line_is_error() {
        let mut config = WatchConfig::default();
        config.indicators.down_gpio = config.indicators.up_gpio;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("up_gpio")));
    }
}
