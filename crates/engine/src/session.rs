use crate::error::EngineError;
use chrono::{NaiveDate, Utc};
use configuration::Config;
use core_types::{Instrument, InstrumentCatalog, Leverage, OrderRequest, OrderSide, PriceSeries};
use events::{InputField, InputRejection, RecordedEvent, SeriesSummary, SessionEvent, StateChange};
use executor::{
    ExecutedOrder, ExecutionState, ExecutionStateMachine, PendingOrder, Scheduler, SubmitOutcome,
    TimerToken,
};
use market_data::{ChartProjection, PriceSeriesGenerator, RandomSource};
use risk::{
    InputOutcome, OrderEconomics, PositionCalculator, PositionInputs, PriceChange, RiskError,
    order_button_label, parse_funds, parse_leverage, parse_quantity, total_label,
};
use rust_decimal::Decimal;
use std::fmt;

/// One user's trading screen: the selected instrument, its price history,
/// the order form, the derived economics and the execution lifecycle.
///
/// All methods take `&mut self` and complete synchronously. Timers are armed
/// on the [`Scheduler`] passed in by the caller and come back through
/// [`TradingSession::on_timer`].
pub struct TradingSession {
    catalog: InstrumentCatalog,
    generator: PriceSeriesGenerator,
    calculator: PositionCalculator,
    machine: ExecutionStateMachine,
    cancel_on_instrument_change: bool,
    /// Fixed end date for generated series; `None` means today (UTC).
    end_date: Option<NaiveDate>,

    instrument: Instrument,
    series: PriceSeries,
    request: OrderRequest,
    economics: OrderEconomics,

    events: Vec<RecordedEvent>,
}

impl fmt::Debug for TradingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradingSession")
            .field("instrument", &self.instrument.symbol)
            .field("request", &self.request)
            .field("state", &self.machine.state())
            .finish_non_exhaustive()
    }
}

impl TradingSession {
    /// Opens a session on the configured default instrument with series ending today.
    pub fn new(
        config: &Config,
        catalog: InstrumentCatalog,
        source: Box<dyn RandomSource>,
    ) -> Result<Self, EngineError> {
        Self::build(config, catalog, source, None)
    }

    /// Like [`TradingSession::new`], but every generated series ends on `end_date`.
    pub fn new_at(
        config: &Config,
        catalog: InstrumentCatalog,
        source: Box<dyn RandomSource>,
        end_date: NaiveDate,
    ) -> Result<Self, EngineError> {
        Self::build(config, catalog, source, Some(end_date))
    }

    fn build(
        config: &Config,
        catalog: InstrumentCatalog,
        source: Box<dyn RandomSource>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, EngineError> {
        let instrument = lookup(&catalog, &config.session.default_instrument)?;
        let calculator = PositionCalculator::new(config.calculator.clone())?;
        let mut generator = PriceSeriesGenerator::new(config.generator.clone(), source);

        let funds = config.session.initial_funds;
        if funds < Decimal::ZERO {
            return Err(RiskError::NegativeFunds(funds).into());
        }

        let today = Utc::now().date_naive();
        let series = generator.generate_for(&instrument, end_date.unwrap_or(today))?;
        let request = OrderRequest {
            instrument: instrument.clone(),
            side: OrderSide::default(),
            quantity: 0,
            available_funds: funds,
            leverage: Leverage::default(),
        };
        let economics = calculator.evaluate(&PositionInputs::from_request(&series, &request))?;

        let mut session = Self {
            catalog,
            generator,
            calculator,
            machine: ExecutionStateMachine::new(config.execution.clone()),
            cancel_on_instrument_change: config.execution.cancel_on_instrument_change,
            end_date,
            instrument,
            series,
            request,
            economics,
            events: Vec::new(),
        };
        tracing::info!(
            symbol = %session.instrument.symbol,
            price = %session.series.current_price(),
            "Trading session opened"
        );
        session.record(SessionEvent::SeriesRegenerated(SeriesSummary::new(
            &session.instrument,
            &session.series,
        )));
        session.record(SessionEvent::QuoteUpdated(session.economics));
        Ok(session)
    }

    // --- Instrument selection ---

    /// Switches to `symbol` and generates a fresh history for it. Selecting the
    /// current instrument changes nothing.
    ///
    /// A confirming order is cancelled when `execution.cancel_on_instrument_change`
    /// is set; otherwise it completes against the snapshot taken at submission.
    pub fn select_instrument(
        &mut self,
        symbol: &str,
        scheduler: &mut dyn Scheduler,
    ) -> Result<(), EngineError> {
        let instrument = lookup(&self.catalog, symbol)?;
        if instrument == self.instrument {
            return Ok(());
        }
        let end_date = self.end_date();
        let series = self.generator.generate_for(&instrument, end_date)?;
        let request = OrderRequest {
            instrument: instrument.clone(),
            ..self.request.clone()
        };
        let economics = self
            .calculator
            .evaluate(&PositionInputs::from_request(&series, &request))?;

        if self.cancel_on_instrument_change && self.machine.state() == ExecutionState::Confirming {
            let cancelled = self.instrument.clone();
            if self.machine.cancel_pending(scheduler) {
                self.record(SessionEvent::OrderCancelled(cancelled));
                self.record(SessionEvent::StateChanged(StateChange {
                    from: ExecutionState::Confirming,
                    to: ExecutionState::Idle,
                }));
            }
        }

        tracing::info!(
            from = %self.instrument.symbol,
            to = %instrument.symbol,
            price = %series.current_price(),
            "Instrument switched"
        );
        self.instrument = instrument;
        self.series = series;
        self.request = request;
        self.economics = economics;
        self.record(SessionEvent::SeriesRegenerated(SeriesSummary::new(
            &self.instrument,
            &self.series,
        )));
        self.record(SessionEvent::QuoteUpdated(self.economics));
        Ok(())
    }

    // --- Order form: raw text ---

    pub fn set_funds_text(&mut self, raw: &str) -> Result<InputOutcome<Decimal>, EngineError> {
        let outcome = parse_funds(raw, self.request.available_funds);
        self.note_rejection(InputField::Funds, raw, &outcome);
        if outcome.is_accepted() {
            self.set_funds(outcome.value())?;
        }
        Ok(outcome)
    }

    pub fn set_quantity_text(&mut self, raw: &str) -> Result<InputOutcome<u64>, EngineError> {
        let outcome = parse_quantity(raw, self.request.quantity);
        self.note_rejection(InputField::Quantity, raw, &outcome);
        if outcome.is_accepted() {
            self.set_quantity(outcome.value())?;
        }
        Ok(outcome)
    }

    pub fn set_leverage_text(&mut self, raw: &str) -> Result<InputOutcome<Leverage>, EngineError> {
        let outcome = parse_leverage(raw, self.request.leverage);
        self.note_rejection(InputField::Leverage, raw, &outcome);
        if outcome.is_accepted() {
            self.set_leverage(outcome.value())?;
        }
        Ok(outcome)
    }

    // --- Order form: typed values ---

    pub fn set_funds(&mut self, funds: Decimal) -> Result<(), EngineError> {
        if funds < Decimal::ZERO {
            return Err(RiskError::NegativeFunds(funds).into());
        }
        self.requote(OrderRequest {
            available_funds: funds,
            ..self.request.clone()
        })
    }

    pub fn set_quantity(&mut self, quantity: u64) -> Result<(), EngineError> {
        self.requote(OrderRequest {
            quantity,
            ..self.request.clone()
        })
    }

    pub fn set_leverage(&mut self, leverage: Leverage) -> Result<(), EngineError> {
        self.requote(OrderRequest {
            leverage,
            ..self.request.clone()
        })
    }

    pub fn set_side(&mut self, side: OrderSide) -> Result<(), EngineError> {
        self.requote(OrderRequest {
            side,
            ..self.request.clone()
        })
    }

    // --- Execution ---

    /// Submits the order currently on the form.
    pub fn submit(&mut self, scheduler: &mut dyn Scheduler) -> SubmitOutcome {
        let from = self.machine.state();
        let outcome = self.machine.submit(&self.request, &self.economics, scheduler);
        match outcome {
            SubmitOutcome::Accepted(to) => {
                self.record(SessionEvent::StateChanged(StateChange { from, to }))
            }
            SubmitOutcome::Ignored(reason) => self.record(SessionEvent::OrderIgnored(reason)),
        }
        outcome
    }

    /// Applies a fired timer. Returns the new state, or `None` for a stale token.
    pub fn on_timer(
        &mut self,
        token: TimerToken,
        scheduler: &mut dyn Scheduler,
    ) -> Option<ExecutionState> {
        let from = self.machine.state();
        let to = self.machine.on_timer(token, scheduler)?;
        if let Some(execution) = self.machine.last_execution().cloned() {
            self.record(SessionEvent::OrderExecuted(execution));
        }
        self.record(SessionEvent::StateChanged(StateChange { from, to }));
        Some(to)
    }

    // --- Accessors ---

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn chart(&self) -> ChartProjection {
        ChartProjection::from_series(&self.series)
    }

    pub fn price_change(&self) -> PriceChange {
        self.economics.price_change
    }

    pub fn order_request(&self) -> &OrderRequest {
        &self.request
    }

    pub fn economics(&self) -> &OrderEconomics {
        &self.economics
    }

    pub fn execution_state(&self) -> ExecutionState {
        self.machine.state()
    }

    pub fn in_flight(&self) -> Option<&PendingOrder> {
        self.machine.in_flight()
    }

    /// The fill being displayed; only available while `Succeeded`.
    pub fn last_execution(&self) -> Option<&ExecutedOrder> {
        self.machine.last_execution()
    }

    /// The submit button caption, e.g. `Buy 5 Shares`.
    pub fn order_button_label(&self) -> String {
        order_button_label(self.request.side, self.request.quantity)
    }

    /// `Total Cost` for buys, `Total Value` for sells.
    pub fn total_label(&self) -> &'static str {
        total_label(self.request.side)
    }

    /// Events recorded since the last drain, oldest first.
    pub fn pending_events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<RecordedEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Internals ---

    fn end_date(&self) -> NaiveDate {
        self.end_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn requote(&mut self, request: OrderRequest) -> Result<(), EngineError> {
        let economics = self
            .calculator
            .evaluate(&PositionInputs::from_request(&self.series, &request))?;
        self.request = request;
        self.economics = economics;
        self.record(SessionEvent::QuoteUpdated(economics));
        Ok(())
    }

    fn note_rejection<T>(&mut self, field: InputField, raw: &str, outcome: &InputOutcome<T>) {
        if let InputOutcome::Rejected { reason, .. } = outcome {
            tracing::warn!(?field, input = raw, %reason, "Input rejected");
            self.record(SessionEvent::InputRejected(InputRejection {
                field,
                text: raw.to_string(),
                reason: reason.to_string(),
            }));
        }
    }

    fn record(&mut self, event: SessionEvent) {
        tracing::trace!(?event, "Session event");
        self.events.push(RecordedEvent::now(event));
    }
}

fn lookup(catalog: &InstrumentCatalog, symbol: &str) -> Result<Instrument, EngineError> {
    catalog
        .get(symbol)
        .cloned()
        .map_err(|_| EngineError::UnknownInstrument(symbol.trim().to_uppercase()))
}
