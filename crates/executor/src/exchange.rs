use chrono::{DateTime, Utc};
use core_types::{Instrument, Leverage, OrderRequest, OrderSide};
use risk::{OrderEconomics, share_noun};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An order that has passed validation and is waiting for confirmation.
///
/// It is a snapshot: edits to the order form after submission do not reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub request: OrderRequest,
    pub economics: OrderEconomics,
    pub submitted_at: DateTime<Utc>,
}

/// The receipt of a simulated fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedOrder {
    pub ticket_id: Uuid,
    pub instrument: Instrument,
    pub side: OrderSide,
    pub quantity: u64,
    pub leverage: Leverage,
    pub price: Decimal,
    pub total_cost: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl ExecutedOrder {
    /// A one-line confirmation such as `Bought 5 shares of AAPL`.
    pub fn summary(&self) -> String {
        format!(
            "{} {} {} of {}",
            self.side.past_tense(),
            self.quantity,
            share_noun(self.quantity),
            self.instrument.symbol
        )
    }
}

/// Computes the result of filling a confirmed order.
///
/// Implementations only describe the fill; the `ExecutionStateMachine` decides
/// when it happens and owns the resulting state.
pub trait Executor: Send + Sync {
    fn fill(&self, order: &PendingOrder) -> ExecutedOrder;
}

/// The "virtual exchange": fills the whole quantity at the price quoted at submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedExecutor;

impl Executor for SimulatedExecutor {
    fn fill(&self, order: &PendingOrder) -> ExecutedOrder {
        let execution = ExecutedOrder {
            ticket_id: Uuid::new_v4(),
            instrument: order.request.instrument.clone(),
            side: order.request.side,
            quantity: order.request.quantity,
            leverage: order.request.leverage,
            price: order.economics.current_price,
            total_cost: order.economics.total_cost,
            executed_at: Utc::now(),
        };
        tracing::debug!("SimulatedExecutor: Created execution: {:?}", execution);
        execution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn executed(side: OrderSide, quantity: u64) -> ExecutedOrder {
        ExecutedOrder {
            ticket_id: Uuid::new_v4(),
            instrument: Instrument::new("AAPL", "Apple Inc."),
            side,
            quantity,
            leverage: Leverage::default(),
            price: dec!(100),
            total_cost: dec!(100) * Decimal::from(quantity),
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn summaries_read_naturally() {
        assert_eq!(executed(OrderSide::Buy, 5).summary(), "Bought 5 shares of AAPL");
        assert_eq!(executed(OrderSide::Sell, 1).summary(), "Sold 1 share of AAPL");
    }
}
