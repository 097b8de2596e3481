//! # Transaction Codes
//!
//! Formatting and parsing of human-readable transaction codes. The counter
//! itself lives in the database (`kasir_db::repository::SequenceRepository`);
//! this module only turns `(prefix, date, number)` into a string and back.
//!
//! ## Code Layout
//! ```text
//!   TRX - 26 10 16 0007
//!   ───   ── ── ── ────
//!    │     │  │  │   └── per-day counter, zero-padded to 4 digits
//!    │     │  │  └────── day
//!    │     │  └───────── month
//!    │     └──────────── two-digit year
//!    └────────────────── prefix (TRX = walk-in, ORD = cart)
//! ```
//!
//! The counter resets implicitly every day because the date key is part of
//! the counter's primary key. Past 9999 the number simply widens
//! (`TRX-26101610000`); codes are never truncated or wrapped.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Maximum prefix length.
pub const MAX_PREFIX_LEN: usize = 8;

/// Width the counter is zero-padded to.
pub const SEQ_WIDTH: usize = 4;

/// Returns the `YYMMDD` key for a calendar day.
///
/// ```rust
/// use chrono::NaiveDate;
/// use kasir_core::sequence::date_key;
///
/// let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
/// assert_eq!(date_key(day), "261016");
/// ```
pub fn date_key(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// Validates a code prefix: 1 to 8 uppercase ASCII letters.
pub fn validate_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(ValidationError::Required {
            field: "prefix".to_string(),
        });
    }

    if prefix.len() > MAX_PREFIX_LEN {
        return Err(ValidationError::TooLong {
            field: "prefix".to_string(),
            max: MAX_PREFIX_LEN,
        });
    }

    if !prefix.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "prefix".to_string(),
            reason: "must contain only uppercase letters A-Z".to_string(),
        });
    }

    Ok(())
}

/// Builds a code from its parts.
///
/// ```rust
/// use chrono::NaiveDate;
/// use kasir_core::sequence::format_code;
///
/// let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
/// assert_eq!(format_code("TRX", day, 7), "TRX-2610160007");
/// ```
pub fn format_code(prefix: &str, date: NaiveDate, number: i64) -> String {
    format!("{}-{}{:0width$}", prefix, date_key(date), number, width = SEQ_WIDTH)
}

/// A code split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCode {
    pub prefix: String,
    pub date: NaiveDate,
    pub number: i64,
}

/// Parses a code produced by [`format_code`].
///
/// Returns `None` for anything that is not `{PREFIX}-{YYMMDD}{N..}` with a
/// valid prefix, a real calendar date and at least four counter digits.
pub fn parse_code(code: &str) -> Option<ParsedCode> {
    let (prefix, rest) = code.split_once('-')?;
    validate_prefix(prefix).ok()?;

    if rest.len() < 6 + SEQ_WIDTH || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (key, seq) = rest.split_at(6);
    let date = NaiveDate::parse_from_str(key, "%y%m%d").ok()?;
    let number = seq.parse::<i64>().ok()?;

    Some(ParsedCode {
        prefix: prefix.to_string(),
        date,
        number,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_and_second_code_of_the_day() {
        let d = day(2026, 1, 5);
        assert_eq!(format_code("TRX", d, 1), "TRX-2601050001");
        assert_eq!(format_code("TRX", d, 2), "TRX-2601050002");
    }

    #[test]
    fn test_counter_widens_past_four_digits() {
        assert_eq!(format_code("ORD", day(2026, 12, 31), 10_000), "ORD-26123110000");
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("TRX").is_ok());
        assert!(validate_prefix("ORD").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("trx").is_err());
        assert!(validate_prefix("TR-X").is_err());
        assert!(validate_prefix("ABCDEFGHI").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_code("TRX2610160001"), None);
        assert_eq!(parse_code("TRX-261016001"), None);
        assert_eq!(parse_code("TRX-2613160001"), None);
        assert_eq!(parse_code("trx-2610160001"), None);
        assert_eq!(parse_code("TRX-26101600a1"), None);
    }

    #[test]
    fn test_parse_widened_code() {
        let parsed = parse_code("ORD-26123110000").unwrap();
        assert_eq!(parsed.prefix, "ORD");
        assert_eq!(parsed.date, day(2026, 12, 31));
        assert_eq!(parsed.number, 10_000);
    }

    proptest! {
        #[test]
        fn parse_inverts_format(
            prefix in "[A-Z]{1,8}",
            days in 0i64..36_000,
            number in 1i64..1_000_000,
        ) {
            let date = day(2000, 1, 1) + chrono::Duration::days(days);
            let code = format_code(&prefix, date, number);
            let parsed = parse_code(&code).unwrap();
            prop_assert_eq!(parsed.prefix, prefix);
            prop_assert_eq!(parsed.number, number);
            prop_assert_eq!(date_key(parsed.date), date_key(date));
        }

        #[test]
        fn codes_of_one_day_sort_by_number(a in 1i64..9_999, b in 1i64..9_999) {
            let d = day(2026, 10, 16);
            let (ca, cb) = (format_code("TRX", d, a), format_code("TRX", d, b));
            prop_assert_eq!(a.cmp(&b), ca.cmp(&cb));
        }
    }
}
