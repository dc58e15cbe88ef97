use crate::error::EventsError;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{Instrument, PriceSeries};
use executor::{ExecutedOrder, ExecutionState, IgnoreReason};
use risk::OrderEconomics;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The order-form field a raw input was typed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputField {
    Funds,
    Quantity,
    Leverage,
}

/// A compact description of a freshly generated price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub instrument: Instrument,
    pub points: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub current_price: Decimal,
    pub previous_price: Decimal,
}

impl SeriesSummary {
    pub fn new(instrument: &Instrument, series: &PriceSeries) -> Self {
        Self {
            instrument: instrument.clone(),
            points: series.len(),
            first_date: series.first().date,
            last_date: series.latest().date,
            current_price: series.current_price(),
            previous_price: series.previous_price(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRejection {
    pub field: InputField,
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: ExecutionState,
    pub to: ExecutionState,
}

/// Everything a trading session reports to its observers.
///
/// Serialized adjacently tagged, e.g.
/// `{"type":"StateChanged","payload":{"from":"Idle","to":"Confirming"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SessionEvent {
    /// A new history was generated, on start-up or after an instrument switch.
    SeriesRegenerated(SeriesSummary),
    /// The order economics were re-derived after an input or series change.
    QuoteUpdated(OrderEconomics),
    /// Raw form text was refused; the field kept its previous value.
    InputRejected(InputRejection),
    /// A submission was ignored without changing any state.
    OrderIgnored(IgnoreReason),
    /// The execution lifecycle moved to a new state.
    StateChanged(StateChange),
    /// The virtual exchange filled an order.
    OrderExecuted(ExecutedOrder),
    /// A confirming order was abandoned because its instrument was switched away.
    OrderCancelled(Instrument),
}

/// A [`SessionEvent`] stamped with the moment it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub timestamp: DateTime<Utc>,
    pub event: SessionEvent,
}

impl RecordedEvent {
    pub fn now(event: SessionEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn to_json(&self) -> Result<String, EventsError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PricePoint;
    use rust_decimal_macros::dec;

    #[test]
    fn state_changes_serialize_with_type_and_payload() {
        let event = SessionEvent::StateChanged(StateChange {
            from: ExecutionState::Idle,
            to: ExecutionState::Confirming,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "StateChanged",
                "payload": { "from": "Idle", "to": "Confirming" }
            })
        );
    }

    #[test]
    fn recorded_events_round_trip_through_json() {
        let recorded = RecordedEvent::now(SessionEvent::InputRejected(InputRejection {
            field: InputField::Quantity,
            text: "abc".to_string(),
            reason: "'abc' is not a number".to_string(),
        }));
        let json = recorded.to_json().unwrap();
        let back: RecordedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, recorded);
    }

    #[test]
    fn series_summary_reads_the_ends_of_the_series() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let series = PriceSeries::new(vec![
            PricePoint {
                date: start,
                price: dec!(10),
            },
            PricePoint {
                date: start.succ_opt().unwrap(),
                price: dec!(11),
            },
            PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
                price: dec!(12.5),
            },
        ])
        .unwrap();
        let summary = SeriesSummary::new(&Instrument::new("msft", "Microsoft Corp."), &series);

        assert_eq!(summary.instrument.symbol, "MSFT");
        assert_eq!(summary.points, 3);
        assert_eq!(summary.first_date, start);
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(summary.current_price, dec!(12.5));
        assert_eq!(summary.previous_price, dec!(11));
    }
}
