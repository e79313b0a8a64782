//! Conversions between minor-unit integers and human input.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;
use thiserror::Error;

/// Minor units per major unit (kopecks per hryvnia).
pub const MINOR_PER_MAJOR: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("not a number: {0}")]
    Invalid(String),

    #[error("amount must be positive")]
    NonPositive,

    #[error("amount has more than two decimal places")]
    TooPrecise,

    #[error("amount is too large")]
    Overflow,
}

/// Parse an amount in major units (`"150"`, `"99.5"`, `"12,30"`) into
/// minor units.
pub fn parse_major_amount(input: &str) -> Result<i64, AmountParseError> {
    let normalized = input.trim().replace(',', ".");
    let value = Decimal::from_str(&normalized)
        .map_err(|_| AmountParseError::Invalid(input.trim().to_owned()))?
        .normalize();

    if value <= Decimal::ZERO {
        return Err(AmountParseError::NonPositive);
    }
    if value.scale() > 2 {
        return Err(AmountParseError::TooPrecise);
    }

    value
        .checked_mul(Decimal::from(MINOR_PER_MAJOR))
        .and_then(|minor| minor.to_i64())
        .ok_or(AmountParseError::Overflow)
}

/// Format minor units as a major-unit string with two decimals.
pub fn format_minor(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let per = MINOR_PER_MAJOR as u64;
    format!("{sign}{}.{:02}", abs / per, abs % per)
}
