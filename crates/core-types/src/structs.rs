use crate::enums::OrderSide;
use crate::error::CoreError;
use crate::instrument::Instrument;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer multiplier on notional exposure, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Leverage(u8);

impl Leverage {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, CoreError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::InvalidInput(
                "leverage".to_string(),
                format!("{} is outside [{}, {}]", value, Self::MIN, Self::MAX),
            ))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl Default for Leverage {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for Leverage {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Leverage> for u8 {
    fn from(leverage: Leverage) -> Self {
        leverage.0
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// The order the user is currently composing.
///
/// Rebuilt from the form inputs on every edit; once submitted, the execution
/// state machine keeps its own copy so later edits cannot touch the in-flight order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub instrument: Instrument,
    pub side: OrderSide,
    pub quantity: u64,
    pub available_funds: Decimal,
    pub leverage: Leverage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leverage_accepts_one_through_five() {
        for value in 1..=5 {
            assert_eq!(Leverage::new(value).unwrap().value(), value);
        }
        assert!(Leverage::new(0).is_err());
        assert!(Leverage::new(6).is_err());
    }

    #[test]
    fn leverage_deserialization_is_range_checked() {
        let ok: Leverage = serde_json::from_str("3").unwrap();
        assert_eq!(ok.value(), 3);
        assert!(serde_json::from_str::<Leverage>("9").is_err());
    }

    #[test]
    fn leverage_displays_as_multiplier() {
        assert_eq!(Leverage::new(4).unwrap().to_string(), "x4");
        assert_eq!(Leverage::default().value(), 1);
    }
}
