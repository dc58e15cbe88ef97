use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// The minimum permitted synthetic price.
pub const PRICE_FLOOR: Decimal = dec!(1);

/// A single daily observation in a price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: Decimal,
}

/// A chronologically ordered daily price history.
///
/// Invariants, enforced by [`PriceSeries::new`]:
/// - at least two points, so "previous" and "current" prices always exist;
/// - one point per calendar day with no gaps or duplicates;
/// - every price is at or above [`PRICE_FLOOR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, CoreError> {
        if points.len() < 2 {
            return Err(CoreError::SeriesTooShort(points.len()));
        }
        for point in &points {
            if point.price < PRICE_FLOOR {
                return Err(CoreError::PriceBelowFloor {
                    date: point.date.to_string(),
                    price: point.price.to_string(),
                    floor: PRICE_FLOOR.to_string(),
                });
            }
        }
        for pair in points.windows(2) {
            if pair[0].date.succ_opt() != Some(pair[1].date) {
                return Err(CoreError::NonConsecutiveDates {
                    previous: pair[0].date.to_string(),
                    next: pair[1].date.to_string(),
                });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    pub fn latest(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    /// The price of the most recent point.
    pub fn current_price(&self) -> Decimal {
        self.latest().price
    }

    /// The price of the second most recent point.
    pub fn previous_price(&self) -> Decimal {
        self.points[self.points.len() - 2].price
    }

    pub fn min_price(&self) -> Decimal {
        self.points
            .iter()
            .map(|p| p.price)
            .fold(self.current_price(), Decimal::min)
    }

    pub fn max_price(&self) -> Decimal {
        self.points
            .iter()
            .map(|p| p.price)
            .fold(self.current_price(), Decimal::max)
    }
}
