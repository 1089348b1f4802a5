//! OCR text sanitizer
//!
//! Turns one frame's recognition text into a numeric reading. Anything that
//! cannot form a valid non-negative number yields `None`, which is an
//! ordinary per-frame outcome rather than an error.

/// Extract a numeric value from noisy OCR text.
///
/// 1. Every character other than an ASCII digit or `.` is dropped.
/// 2. If more than one `.` remains, the text is cut to the segment before the
///    first point, the point, and the first `decimal_digits_kept` digits
///    after it (`"123.4.5"` → `"123.4"` with the default of 1).
/// 3. With `decimal_digits_kept == 0` the point and everything after it is
///    always discarded, so every reading is an integer.
/// 4. Empty text, a leading or trailing point, or no digits yields `None`.
pub fn sanitize(text: &str, decimal_digits_kept: u32) -> Option<f64> {
    let filtered: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let token = truncate_fraction(&filtered, decimal_digits_kept)?;
    parse_token(token)
}

/// Apply the decimal truncation policy. Returns `None` only for an empty result.
fn truncate_fraction(filtered: &str, decimal_digits_kept: u32) -> Option<&str> {
    let first_point = filtered.find('.');

    let token = match first_point {
        // Integer-only readings: fraction is noise.
        Some(idx) if decimal_digits_kept == 0 => &filtered[..idx],
        Some(idx) if filtered[idx + 1..].contains('.') => {
            let after = &filtered[idx + 1..];
            let segment_len = after.find('.').unwrap_or(after.len());
            // Segment is ASCII digits, so byte count == digit count.
            let keep = segment_len.min(decimal_digits_kept as usize);
            &filtered[..=idx + keep]
        }
        _ => filtered,
    };

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn parse_token(token: &str) -> Option<f64> {
    if token.starts_with('.') || token.ends_with('.') {
        return None;
    }
    if !token.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_integer() {
        assert_eq!(sanitize("42", 1), Some(42.0));
        assert_eq!(sanitize("007", 1), Some(7.0));
    }

    #[test]
    fn test_noise_characters_removed() {
        assert_eq!(sanitize(" 1 2\n", 1), Some(12.0));
        assert_eq!(sanitize("O|5a", 1), Some(5.0));
    }

    #[test]
    fn test_multi_point_truncation() {
        assert_eq!(sanitize("1a2b3.4c.5", 1), Some(123.4));
        assert_eq!(sanitize("12.345.6", 1), Some(12.3));
        assert_eq!(sanitize("12.345.6", 2), Some(12.34));
    }

    #[test]
    fn test_single_point_left_untouched() {
        assert_eq!(sanitize("12.345", 1), Some(12.345));
    }

    #[test]
    fn test_multi_point_with_empty_fraction_is_rejected() {
        // "12..5" keeps "12." which has a trailing point
        assert_eq!(sanitize("12..5", 1), None);
    }

    #[test]
    fn test_integer_mode_drops_fraction() {
        assert_eq!(sanitize("12.7", 0), Some(12.0));
        assert_eq!(sanitize("1a2b3.4c.5", 0), Some(123.0));
        assert_eq!(sanitize(".5", 0), None);
    }

    #[test]
    fn test_no_value_cases() {
        assert_eq!(sanitize("", 1), None);
        assert_eq!(sanitize("abc", 1), None);
        assert_eq!(sanitize(".", 1), None);
        assert_eq!(sanitize("...", 1), None);
        assert_eq!(sanitize(".5", 1), None);
        assert_eq!(sanitize("5.", 1), None);
    }

    #[test]
    fn test_negative_sign_is_noise() {
        assert_eq!(sanitize("-8", 1), Some(8.0));
    }

    #[test]
    fn test_non_ascii_digits_are_noise() {
        assert_eq!(sanitize("٣4", 1), Some(4.0));
    }
}
