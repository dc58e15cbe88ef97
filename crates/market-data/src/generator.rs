use crate::error::MarketDataError;
use crate::random::RandomSource;
use chrono::{Days, NaiveDate, Utc};
use configuration::GeneratorSettings;
use core_types::{Instrument, PRICE_FLOOR, PricePoint, PriceSeries};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// The inputs of a single random walk.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkParams {
    pub days: usize,
    pub start_price: f64,
    pub volatility: f64,
    /// Date of the last point; earlier points fall on the preceding days.
    pub end_date: NaiveDate,
}

impl WalkParams {
    /// 30 days starting at 150 with 2% daily volatility, ending today (UTC).
    pub fn ending_today() -> Self {
        Self {
            days: 30,
            start_price: 150.0,
            volatility: 0.02,
            end_date: Utc::now().date_naive(),
        }
    }
}

/// Produces synthetic daily price histories by a bounded random walk.
pub struct PriceSeriesGenerator {
    settings: GeneratorSettings,
    source: Box<dyn RandomSource>,
}

impl PriceSeriesGenerator {
    pub fn new(settings: GeneratorSettings, source: Box<dyn RandomSource>) -> Self {
        Self { settings, source }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Draws a start price uniformly from `[start_price_min, start_price_min + start_price_span)`.
    pub fn draw_start_price(&mut self) -> f64 {
        self.settings.start_price_min + self.source.next_unit() * self.settings.start_price_span
    }

    /// Generates a fresh history for a newly selected instrument, using the
    /// configured length and volatility and a randomly drawn start price.
    pub fn generate_for(
        &mut self,
        instrument: &Instrument,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError> {
        let params = WalkParams {
            days: self.settings.days,
            start_price: self.draw_start_price(),
            volatility: self.settings.volatility,
            end_date,
        };
        tracing::debug!(
            symbol = %instrument.symbol,
            start_price = params.start_price,
            days = params.days,
            "Generating price history"
        );
        self.generate(&params)
    }

    /// Runs the random walk.
    ///
    /// The first point is the start price. Each later day moves by
    /// `price * volatility * (u - 0.5) * 2` for a uniform `u`, never dropping
    /// below the price floor. The walk keeps full precision; emitted points are
    /// rounded to cents.
    pub fn generate(&mut self, params: &WalkParams) -> Result<PriceSeries, MarketDataError> {
        if params.days < 2 {
            return Err(MarketDataError::TooFewDays(params.days));
        }
        if !params.volatility.is_finite() || params.volatility < 0.0 {
            return Err(MarketDataError::InvalidVolatility(params.volatility));
        }

        let floor = PRICE_FLOOR.to_f64().unwrap_or(1.0);
        let mut price = if params.start_price.is_finite() {
            params.start_price.max(floor)
        } else {
            floor
        };

        let first_date = params
            .end_date
            .checked_sub_days(Days::new(params.days as u64 - 1))
            .ok_or_else(|| MarketDataError::DateOutOfRange {
                days: params.days,
                end_date: params.end_date.to_string(),
            })?;

        let mut points = Vec::with_capacity(params.days);
        let mut date = first_date;
        for day in 0..params.days {
            if day > 0 {
                let shock = (self.source.next_unit() - 0.5) * 2.0;
                let delta = price * params.volatility * shock;
                price = (price + delta).max(floor);
                date = date.succ_opt().ok_or_else(|| MarketDataError::DateOutOfRange {
                    days: params.days,
                    end_date: params.end_date.to_string(),
                })?;
            }
            points.push(PricePoint {
                date,
                price: to_cents(price, day)?,
            });
        }

        Ok(PriceSeries::new(points)?)
    }
}

/// Day 0 is truncated so a start drawn from `[min, min + span)` stays below `min + span`.
fn to_cents(price: f64, day: usize) -> Result<Decimal, MarketDataError> {
    if !price.is_finite() {
        return Err(MarketDataError::NonFinitePrice(day));
    }
    let exact = Decimal::from_f64(price).ok_or(MarketDataError::NonFinitePrice(day))?;
    let strategy = if day == 0 {
        RoundingStrategy::ToZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    Ok(exact.round_dp_with_strategy(2, strategy))
}
