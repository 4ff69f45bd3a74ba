//! Human-readable byte sizes for disk quotas
//!
//! Quota limits for disk dimensions are configured as strings with a binary
//! unit suffix: `B`, `Ki`, `Mi` or `Gi` (1024-based). Any other suffix is a
//! configuration error, never silently defaulted.

use crate::error::{GovernorError, Result};

/// Bytes suffix
pub const BYTE: &str = "B";
/// Kibibytes suffix (1024 B)
pub const KIBIBYTE: &str = "Ki";
/// Mebibytes suffix (1024 Ki)
pub const MEBIBYTE: &str = "Mi";
/// Gibibytes suffix (1024 Mi)
pub const GIBIBYTE: &str = "Gi";

const KI: i64 = 1024;
const MI: i64 = 1024 * KI;
const GI: i64 = 1024 * MI;

/// Whether a limit string carries one of the recognized unit suffixes
pub fn has_recognized_unit(value: &str) -> bool {
    let value = value.trim();
    value.ends_with(BYTE)
        || value.ends_with(KIBIBYTE)
        || value.ends_with(MEBIBYTE)
        || value.ends_with(GIBIBYTE)
}

/// Parse a human-readable byte size such as `10Mi` or `512B` into bytes.
pub fn human_readable_to_bytes(value: &str) -> Result<i64> {
    let trimmed = value.trim();

    let (number, multiplier) = if let Some(n) = trimmed.strip_suffix(KIBIBYTE) {
        (n, KI)
    } else if let Some(n) = trimmed.strip_suffix(MEBIBYTE) {
        (n, MI)
    } else if let Some(n) = trimmed.strip_suffix(GIBIBYTE) {
        (n, GI)
    } else if let Some(n) = trimmed.strip_suffix(BYTE) {
        (n, 1)
    } else {
        return Err(GovernorError::InvalidQuotaUnit(value.to_string()));
    };

    let parsed: f64 = number
        .trim()
        .parse()
        .map_err(|_| GovernorError::InvalidQuotaValue(value.to_string()))?;

    let scaled = parsed * multiplier as f64;
    if !scaled.is_finite() || scaled < i64::MIN as f64 || scaled > i64::MAX as f64 {
        return Err(GovernorError::InvalidQuotaValue(value.to_string()));
    }

    Ok(scaled as i64)
}

/// Render bytes with the largest unit that keeps the value at or above 1,
/// trimming trailing zeros: `5242880` becomes `5Mi`, `1536` becomes `1.5Ki`.
pub fn bytes_to_human_readable(bytes: i64) -> String {
    let magnitude = bytes.abs();
    let (value, unit) = if magnitude >= GI {
        (bytes as f64 / GI as f64, GIBIBYTE)
    } else if magnitude >= MI {
        (bytes as f64 / MI as f64, MEBIBYTE)
    } else if magnitude >= KI {
        (bytes as f64 / KI as f64, KIBIBYTE)
    } else {
        return format!("{bytes}{BYTE}");
    };

    let rendered = format!("{value:.3}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered}{unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_unit() {
        assert_eq!(human_readable_to_bytes("0B").unwrap(), 0);
        assert_eq!(human_readable_to_bytes("1023B").unwrap(), 1023);
        assert_eq!(human_readable_to_bytes("1Ki").unwrap(), 1024);
        assert_eq!(human_readable_to_bytes("10Mi").unwrap(), 10 * 1024 * 1024);
        assert_eq!(human_readable_to_bytes("2Gi").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_eq!(human_readable_to_bytes("1.5Ki").unwrap(), 1536);
    }

    #[test]
    fn test_unknown_suffix_is_rejected() {
        for bad in ["10MB", "10", "10kb", "10Ti", "Mi"] {
            let result = human_readable_to_bytes(bad);
            assert!(
                matches!(
                    result,
                    Err(GovernorError::InvalidQuotaUnit(_)) | Err(GovernorError::InvalidQuotaValue(_))
                ),
                "{bad:?} should not parse"
            );
        }
        assert!(matches!(
            human_readable_to_bytes("10Ti"),
            Err(GovernorError::InvalidQuotaUnit(_))
        ));
    }

    #[test]
    fn test_format_picks_largest_unit() {
        assert_eq!(bytes_to_human_readable(0), "0B");
        assert_eq!(bytes_to_human_readable(1023), "1023B");
        assert_eq!(bytes_to_human_readable(1024), "1Ki");
        assert_eq!(bytes_to_human_readable(1_048_576), "1Mi");
        assert_eq!(bytes_to_human_readable(1_073_741_824), "1Gi");
        assert_eq!(bytes_to_human_readable(5_242_880), "5Mi");
        assert_eq!(bytes_to_human_readable(1536), "1.5Ki");
    }

    #[test]
    fn test_round_trip_for_canonical_values() {
        for bytes in [0i64, 1023, 1024, 1_048_576, 1_073_741_824] {
            let rendered = bytes_to_human_readable(bytes);
            assert_eq!(human_readable_to_bytes(&rendered).unwrap(), bytes);
        }
    }

    #[test]
    fn test_non_finite_and_overflowing_values_are_rejected() {
        for bad in ["infB", "-infB", "nanB", "1e30Gi", "1e19B"] {
            assert!(
                matches!(
                    human_readable_to_bytes(bad),
                    Err(GovernorError::InvalidQuotaValue(_))
                ),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_recognized_unit_suffixes() {
        assert!(has_recognized_unit("10Mi"));
        assert!(has_recognized_unit("100B"));
        assert!(!has_recognized_unit("10MB2"));
        assert!(!has_recognized_unit("10"));
    }
}
