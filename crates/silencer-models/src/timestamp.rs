//! Exact decimal timestamp parsing and formatting.
//!
//! FFmpeg reports silence boundaries as decimal seconds with up to six
//! fractional digits. Timestamps are kept as [`Decimal`] so that
//! `end - duration` is exact over arbitrarily long inputs.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a decimal seconds value such as `1922.306813` or `90`.
///
/// # Examples
/// ```
/// use silencer_models::timestamp::parse_seconds;
/// assert_eq!(parse_seconds("12.5").unwrap().to_string(), "12.5");
/// ```
pub fn parse_seconds(value: &str) -> Result<Decimal, TimestampError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TimestampError::Empty);
    }

    let seconds =
        Decimal::from_str(value).map_err(|_| TimestampError::InvalidValue(value.to_string()))?;
    if seconds.is_sign_negative() && !seconds.is_zero() {
        return Err(TimestampError::Negative);
    }
    Ok(seconds)
}

/// Format seconds into `HH:MM:SS.mmm` for log output.
pub fn format_seconds(seconds: Decimal) -> String {
    let total_ms = (seconds * Decimal::from(1000))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
        .max(0);

    let hours = total_ms / 3_600_000;
    let mins = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampError {
    /// Timestamp string is empty
    Empty,
    /// Timestamp is negative
    Negative,
    /// Value is not a decimal number
    InvalidValue(String),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Timestamp cannot be empty"),
            Self::Negative => write!(f, "Timestamp cannot be negative"),
            Self::InvalidValue(value) => write!(f, "Invalid seconds value: {}", value),
        }
    }
}

impl std::error::Error for TimestampError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("90").unwrap(), Decimal::from(90));
        assert_eq!(parse_seconds(" 1922.306813 ").unwrap().to_string(), "1922.306813");
        assert_eq!(parse_seconds("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_seconds_errors() {
        assert!(matches!(parse_seconds(""), Err(TimestampError::Empty)));
        assert!(matches!(parse_seconds("-1.5"), Err(TimestampError::Negative)));
        assert!(matches!(parse_seconds("abc"), Err(TimestampError::InvalidValue(_))));
    }

    #[test]
    fn test_subtraction_is_exact() {
        let end = parse_seconds("1922.306813").unwrap();
        let duration = parse_seconds("0.7").unwrap();
        assert_eq!((end - duration).to_string(), "1921.606813");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Decimal::ZERO), "00:00:00.000");
        assert_eq!(format_seconds(parse_seconds("90").unwrap()), "00:01:30.000");
        assert_eq!(format_seconds(parse_seconds("3661.2505").unwrap()), "01:01:01.251");
    }
}
