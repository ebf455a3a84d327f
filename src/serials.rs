//! Serial-number handling.
//!
//! Serials are stored and displayed verbatim but matched in normalized
//! form (trimmed, lower-cased). Ranges like `VCI-0010`..`VCI-0025` are
//! expanded into one serial per value, preserving the shared prefix and
//! the zero-padded width of the numeric tail.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Upper bound on one range expansion; anything larger is a typo, not a
/// real shipment.
pub const MAX_RANGE_SIZE: usize = 10_000;

static SERIAL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)(\d+)$").expect("serial shape regex is valid"));

#[derive(Debug, Error, PartialEq)]
pub enum SerialRangeError {
    #[error("serial '{0}' has no numeric suffix")]
    NoNumericSuffix(String),
    #[error("serial range endpoints have different prefixes: '{0}' vs '{1}'")]
    PrefixMismatch(String, String),
    #[error("serial range is reversed: {0} > {1}")]
    Reversed(u64, u64),
    #[error("serial range spans {0} values; the maximum is {max}", max = MAX_RANGE_SIZE)]
    TooLarge(usize),
}

/// Normalized form used for every serial comparison.
pub fn normalize(serial: &str) -> String {
    serial.trim().to_lowercase()
}

/// Split a serial into its prefix and numeric tail.
fn split(serial: &str) -> Result<(&str, &str), SerialRangeError> {
    let trimmed = serial.trim();
    let caps = SERIAL_SHAPE
        .captures(trimmed)
        .ok_or_else(|| SerialRangeError::NoNumericSuffix(serial.to_string()))?;
    let prefix = caps.get(1).map_or("", |m| m.as_str());
    let digits = caps.get(2).map_or("", |m| m.as_str());
    Ok((prefix, digits))
}

/// Expand a from/to serial range into individual serials.
pub fn expand_range(from: &str, to: &str) -> Result<Vec<String>, SerialRangeError> {
    let (from_prefix, from_digits) = split(from)?;
    let (to_prefix, to_digits) = split(to)?;

    if !from_prefix.eq_ignore_ascii_case(to_prefix) {
        return Err(SerialRangeError::PrefixMismatch(
            from.trim().to_string(),
            to.trim().to_string(),
        ));
    }

    let start: u64 = from_digits
        .parse()
        .map_err(|_| SerialRangeError::NoNumericSuffix(from.to_string()))?;
    let end: u64 = to_digits
        .parse()
        .map_err(|_| SerialRangeError::NoNumericSuffix(to.to_string()))?;

    if start > end {
        return Err(SerialRangeError::Reversed(start, end));
    }

    let count = (end - start + 1) as usize;
    if count > MAX_RANGE_SIZE {
        return Err(SerialRangeError::TooLarge(count));
    }

    let width = from_digits.len();
    Ok((start..=end)
        .map(|n| format!("{}{:0width$}", from_prefix, n, width = width))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("  VCI-0042 ", "vci-0042" ; "trims and lowercases")]
    #[test_case("sn001", "sn001" ; "already normalized")]
    #[test_case("PCB 9 ", "pcb 9" ; "inner whitespace kept")]
    fn normalize_cases(raw: &str, expected: &str) {
        assert_eq!(normalize(raw), expected);
    }

    #[test]
    fn expands_prefixed_range_preserving_width() {
        let serials = expand_range("VCI-0008", "VCI-0011").unwrap();
        assert_eq!(serials, vec!["VCI-0008", "VCI-0009", "VCI-0010", "VCI-0011"]);
    }

    #[test]
    fn expands_bare_numeric_range() {
        let serials = expand_range("98", "102").unwrap();
        assert_eq!(serials, vec!["98", "99", "100", "101", "102"]);
    }

    #[test]
    fn single_value_range_is_one_serial() {
        assert_eq!(expand_range("A7", "A7").unwrap(), vec!["A7"]);
    }

    #[test]
    fn rejects_mismatched_prefixes() {
        assert!(matches!(
            expand_range("VCI-001", "PCB-003"),
            Err(SerialRangeError::PrefixMismatch(_, _))
        ));
    }

    #[test]
    fn rejects_reversed_range() {
        assert_eq!(
            expand_range("S-10", "S-5"),
            Err(SerialRangeError::Reversed(10, 5))
        );
    }

    #[test]
    fn rejects_serial_without_digits() {
        assert!(matches!(
            expand_range("alpha", "beta"),
            Err(SerialRangeError::NoNumericSuffix(_))
        ));
    }

    #[test]
    fn rejects_oversized_range() {
        assert!(matches!(
            expand_range("U-1", "U-20000"),
            Err(SerialRangeError::TooLarge(20000))
        ));
    }
}
