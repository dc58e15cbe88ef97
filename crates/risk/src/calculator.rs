use crate::error::RiskError;
use configuration::CalculatorSettings;
use core_types::{Leverage, OrderRequest, OrderSide, PriceSeries};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Everything the calculator needs, gathered from the latest series and the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionInputs {
    pub current_price: Decimal,
    pub previous_price: Decimal,
    pub available_funds: Decimal,
    pub quantity: u64,
    pub leverage: Leverage,
    pub side: OrderSide,
}

impl PositionInputs {
    pub fn from_request(series: &PriceSeries, request: &OrderRequest) -> Self {
        Self {
            current_price: series.current_price(),
            previous_price: series.previous_price(),
            available_funds: request.available_funds,
            quantity: request.quantity,
            leverage: request.leverage,
            side: request.side,
        }
    }
}

/// Day-over-day movement of the latest price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    pub absolute: Decimal,
    pub percent: Decimal,
}

impl PriceChange {
    pub fn between(previous: Decimal, current: Decimal) -> Result<Self, RiskError> {
        if previous <= Decimal::ZERO {
            return Err(RiskError::InvalidPrice(previous));
        }
        let absolute = current - previous;
        let percent = absolute
            .checked_div(previous)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .ok_or_else(|| {
                RiskError::Calculation("price change percentage overflowed".to_string())
            })?;
        Ok(Self { absolute, percent })
    }

    pub fn is_up(&self) -> bool {
        self.absolute >= Decimal::ZERO
    }

    /// Renders the change as `+1.23 (+0.85%)` or `-0.40 (-0.27%)`.
    pub fn display(&self) -> String {
        let sign = if self.is_up() { "+" } else { "" };
        format!(
            "{sign}{:.2} ({sign}{:.2}%)",
            to_cents(self.absolute),
            to_cents(self.percent),
        )
    }
}

/// The derived, never-stored economics of the order being composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEconomics {
    pub side: OrderSide,
    pub quantity: u64,
    pub leverage: Leverage,
    pub current_price: Decimal,
    pub previous_price: Decimal,
    pub price_change: PriceChange,
    pub max_affordable_quantity: u64,
    pub total_cost: Decimal,
    pub potential_gain: Decimal,
    pub potential_loss: Decimal,
    /// Signed price move (in percent) under which `potential_gain` is realised.
    pub gain_scenario_pct: Decimal,
    /// Signed price move (in percent) under which `potential_loss` is realised.
    pub loss_scenario_pct: Decimal,
    pub is_valid: bool,
}

impl OrderEconomics {
    /// The same figures with every currency amount rounded to cents for display.
    pub fn rounded(&self) -> Self {
        Self {
            current_price: to_cents(self.current_price),
            previous_price: to_cents(self.previous_price),
            price_change: PriceChange {
                absolute: to_cents(self.price_change.absolute),
                percent: to_cents(self.price_change.percent),
            },
            total_cost: to_cents(self.total_cost),
            potential_gain: to_cents(self.potential_gain),
            potential_loss: to_cents(self.potential_loss),
            ..*self
        }
    }
}

pub(crate) fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Turns raw order inputs into validated trade economics.
///
/// This is a pure calculator: it holds only its configuration and must be
/// re-run whenever the instrument, series, funds, quantity, leverage or side change.
#[derive(Debug, Clone)]
pub struct PositionCalculator {
    params: CalculatorSettings,
}

impl PositionCalculator {
    /// Creates a new `PositionCalculator` with the given configuration parameters.
    pub fn new(params: CalculatorSettings) -> Result<Self, RiskError> {
        // Validate that the scenario size is a sensible fraction.
        if params.scenario_move_pct <= dec!(0) || params.scenario_move_pct > dec!(1) {
            return Err(RiskError::InvalidParameters(
                "scenario_move_pct must be in (0, 1]".to_string(),
            ));
        }
        Ok(Self { params })
    }

    pub fn scenario_move_pct(&self) -> Decimal {
        self.params.scenario_move_pct
    }

    pub fn evaluate(&self, inputs: &PositionInputs) -> Result<OrderEconomics, RiskError> {
        // --- 1. Validation ---
        if inputs.current_price <= dec!(0) {
            return Err(RiskError::InvalidPrice(inputs.current_price));
        }
        if inputs.available_funds < dec!(0) {
            return Err(RiskError::NegativeFunds(inputs.available_funds));
        }

        // --- 2. Market Movement ---
        let price_change = PriceChange::between(inputs.previous_price, inputs.current_price)?;

        // --- 3. Sizing ---
        let max_affordable_quantity = (inputs.available_funds / inputs.current_price)
            .floor()
            .to_u64()
            .unwrap_or(u64::MAX);

        let quantity = Decimal::from(inputs.quantity);
        let leverage = inputs.leverage.as_decimal();
        let total_cost = quantity
            .checked_mul(inputs.current_price)
            .and_then(|notional| notional.checked_mul(leverage))
            .ok_or_else(|| RiskError::Calculation("total cost overflowed".to_string()))?;

        // --- 4. Scenario P&L ---
        // Gain and loss share one magnitude; only the direction of the move differs by side.
        let scenario = total_cost
            .checked_mul(self.params.scenario_move_pct)
            .ok_or_else(|| RiskError::Calculation("scenario P&L overflowed".to_string()))?;
        let move_pct = self.params.scenario_move_pct * dec!(100);
        let (gain_scenario_pct, loss_scenario_pct) = match inputs.side {
            OrderSide::Buy => (move_pct, -move_pct),
            OrderSide::Sell => (-move_pct, move_pct),
        };

        // --- 5. Validity ---
        let is_valid = inputs.quantity > 0
            && (inputs.side == OrderSide::Sell || total_cost <= inputs.available_funds);

        tracing::debug!(
            side = %inputs.side,
            quantity = inputs.quantity,
            leverage = inputs.leverage.value(),
            price = %inputs.current_price,
            total_cost = %total_cost,
            is_valid,
            "Order economics evaluated"
        );

        Ok(OrderEconomics {
            side: inputs.side,
            quantity: inputs.quantity,
            leverage: inputs.leverage,
            current_price: inputs.current_price,
            previous_price: inputs.previous_price,
            price_change,
            max_affordable_quantity,
            total_cost,
            potential_gain: scenario,
            potential_loss: scenario,
            gain_scenario_pct,
            loss_scenario_pct,
            is_valid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> PositionCalculator {
        PositionCalculator::new(CalculatorSettings::default()).unwrap()
    }

    fn inputs(funds: Decimal, quantity: u64, leverage: u8, side: OrderSide) -> PositionInputs {
        PositionInputs {
            current_price: dec!(100),
            previous_price: dec!(95),
            available_funds: funds,
            quantity,
            leverage: Leverage::new(leverage).unwrap(),
            side,
        }
    }

    #[test]
    fn affordable_buy_is_valid() {
        let economics = calculator()
            .evaluate(&inputs(dec!(1000), 5, 1, OrderSide::Buy))
            .unwrap();

        assert_eq!(economics.total_cost, dec!(500));
        assert!(economics.is_valid);
        assert_eq!(economics.potential_gain, dec!(50));
        assert_eq!(economics.potential_loss, dec!(50));
        assert_eq!(economics.max_affordable_quantity, 10);
    }

    #[test]
    fn buy_over_funds_is_invalid() {
        let economics = calculator()
            .evaluate(&inputs(dec!(1000), 15, 1, OrderSide::Buy))
            .unwrap();

        assert_eq!(economics.total_cost, dec!(1500));
        assert!(!economics.is_valid);
    }

    #[test]
    fn zero_quantity_is_invalid_regardless_of_funds() {
        for side in [OrderSide::Buy, OrderSide::Sell] {
            let economics = calculator()
                .evaluate(&inputs(dec!(1000000), 0, 1, side))
                .unwrap();
            assert!(!economics.is_valid);
        }
    }

    #[test]
    fn sell_ignores_funds() {
        let economics = calculator()
            .evaluate(&inputs(dec!(0), 15, 5, OrderSide::Sell))
            .unwrap();

        assert_eq!(economics.total_cost, dec!(7500));
        assert!(economics.is_valid);
    }

    #[test]
    fn leverage_scales_cost_and_scenarios() {
        let economics = calculator()
            .evaluate(&inputs(dec!(10000), 5, 3, OrderSide::Buy))
            .unwrap();

        assert_eq!(economics.total_cost, dec!(1500));
        assert_eq!(economics.potential_gain, dec!(150));
        assert_eq!(economics.potential_loss, dec!(150));
    }

    #[test]
    fn leverage_can_push_a_buy_over_funds() {
        let economics = calculator()
            .evaluate(&inputs(dec!(1000), 5, 3, OrderSide::Buy))
            .unwrap();
        assert!(!economics.is_valid);
    }

    #[test]
    fn buy_at_exactly_available_funds_is_valid() {
        let economics = calculator()
            .evaluate(&inputs(dec!(1000), 10, 1, OrderSide::Buy))
            .unwrap();
        assert!(economics.is_valid);
    }

    #[test]
    fn scenario_direction_flips_for_sells() {
        let buy = calculator()
            .evaluate(&inputs(dec!(1000), 1, 1, OrderSide::Buy))
            .unwrap();
        let sell = calculator()
            .evaluate(&inputs(dec!(1000), 1, 1, OrderSide::Sell))
            .unwrap();

        assert_eq!(buy.gain_scenario_pct, dec!(10));
        assert_eq!(buy.loss_scenario_pct, dec!(-10));
        assert_eq!(sell.gain_scenario_pct, dec!(-10));
        assert_eq!(sell.loss_scenario_pct, dec!(10));
        assert_eq!(buy.potential_gain, sell.potential_gain);
    }

    #[test]
    fn max_affordable_quantity_floors() {
        let calc = calculator();
        for (funds, expected) in [
            (dec!(0), 0),
            (dec!(99.99), 0),
            (dec!(100), 1),
            (dec!(1234.56), 12),
        ] {
            let economics = calc.evaluate(&inputs(funds, 1, 1, OrderSide::Buy)).unwrap();
            assert_eq!(economics.max_affordable_quantity, expected, "funds {}", funds);
        }
    }

    #[test]
    fn price_change_is_relative_to_previous() {
        let economics = calculator()
            .evaluate(&inputs(dec!(1000), 1, 1, OrderSide::Buy))
            .unwrap();

        assert_eq!(economics.price_change.absolute, dec!(5));
        assert_eq!(economics.rounded().price_change.percent, dec!(5.26));
        assert_eq!(economics.price_change.display(), "+5.00 (+5.26%)");
    }

    #[test]
    fn falling_price_change_display() {
        let change = PriceChange::between(dec!(150), dec!(149.6)).unwrap();
        assert!(!change.is_up());
        assert_eq!(change.display(), "-0.40 (-0.27%)");
    }

    #[test]
    fn rounded_copy_keeps_full_precision_source() {
        let economics = calculator()
            .evaluate(&PositionInputs {
                current_price: dec!(33.335),
                previous_price: dec!(33),
                available_funds: dec!(1000),
                quantity: 3,
                leverage: Leverage::default(),
                side: OrderSide::Buy,
            })
            .unwrap();

        assert_eq!(economics.total_cost, dec!(100.005));
        assert_eq!(economics.rounded().total_cost, dec!(100.01));
    }

    #[test]
    fn rejects_non_positive_prices_and_negative_funds() {
        let calc = calculator();
        let mut bad_price = inputs(dec!(1000), 1, 1, OrderSide::Buy);
        bad_price.current_price = dec!(0);
        assert_eq!(calc.evaluate(&bad_price), Err(RiskError::InvalidPrice(dec!(0))));

        let bad_funds = inputs(dec!(-1), 1, 1, OrderSide::Buy);
        assert_eq!(calc.evaluate(&bad_funds), Err(RiskError::NegativeFunds(dec!(-1))));
    }

    #[test]
    fn rejects_invalid_scenario_parameters() {
        let params = CalculatorSettings {
            scenario_move_pct: dec!(0),
        };
        assert!(PositionCalculator::new(params).is_err());
    }
}
