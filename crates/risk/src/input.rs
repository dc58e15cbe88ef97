//! Parsing of raw form text into order inputs.
//!
//! Bad input never propagates: the parser reports a rejection and hands back
//! the previous value, so the caller decides whether to surface feedback.

use core_types::Leverage;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    NotANumber(String),
    Negative,
    OutOfRange(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Empty => write!(f, "no value entered"),
            RejectReason::NotANumber(raw) => write!(f, "'{}' is not a number", raw),
            RejectReason::Negative => write!(f, "value cannot be negative"),
            RejectReason::OutOfRange(detail) => write!(f, "value out of range: {}", detail),
        }
    }
}

/// The result of applying one raw input to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome<T> {
    Accepted(T),
    Rejected { retained: T, reason: RejectReason },
}

impl<T: Copy> InputOutcome<T> {
    /// The value the field holds after the edit.
    pub fn value(&self) -> T {
        match self {
            InputOutcome::Accepted(value) => *value,
            InputOutcome::Rejected { retained, .. } => *retained,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, InputOutcome::Accepted(_))
    }
}

fn parse_non_negative(raw: &str) -> Result<Decimal, RejectReason> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RejectReason::Empty);
    }
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| RejectReason::NotANumber(trimmed.to_string()))?;
    if value < Decimal::ZERO {
        return Err(RejectReason::Negative);
    }
    Ok(value)
}

fn outcome<T>(parsed: Result<T, RejectReason>, previous: T) -> InputOutcome<T> {
    match parsed {
        Ok(value) => InputOutcome::Accepted(value),
        Err(reason) => {
            tracing::debug!(%reason, "Input rejected, keeping previous value");
            InputOutcome::Rejected {
                retained: previous,
                reason,
            }
        }
    }
}

/// Parses the available-funds field.
pub fn parse_funds(raw: &str, previous: Decimal) -> InputOutcome<Decimal> {
    outcome(parse_non_negative(raw), previous)
}

/// Parses the share-count field. A fractional part is truncated (`"12.7"` is 12).
pub fn parse_quantity(raw: &str, previous: u64) -> InputOutcome<u64> {
    let parsed = parse_non_negative(raw).and_then(|value| {
        value
            .trunc()
            .to_u64()
            .ok_or_else(|| RejectReason::OutOfRange(format!("{} shares", value)))
    });
    outcome(parsed, previous)
}

/// Parses the leverage field, which must be an integer in `[1, 5]`.
pub fn parse_leverage(raw: &str, previous: Leverage) -> InputOutcome<Leverage> {
    let trimmed = raw.trim();
    let parsed = if trimmed.is_empty() {
        Err(RejectReason::Empty)
    } else {
        trimmed
            .parse::<i64>()
            .map_err(|_| RejectReason::NotANumber(trimmed.to_string()))
            .and_then(|value| {
                u8::try_from(value)
                    .ok()
                    .and_then(|v| Leverage::new(v).ok())
                    .ok_or_else(|| {
                        RejectReason::OutOfRange(format!(
                            "leverage must be between {} and {}",
                            Leverage::MIN,
                            Leverage::MAX
                        ))
                    })
            })
    };
    outcome(parsed, previous)
}
