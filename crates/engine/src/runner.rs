use crate::error::EngineError;
use crate::session::TradingSession;
use core_types::{Leverage, OrderSide};
use events::RecordedEvent;
use executor::{ExecutionState, SubmitOutcome, TimerToken, TokioScheduler};
use risk::InputOutcome;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, mpsc};

/// Capacity of the event broadcast; slow subscribers see `Lagged` beyond this.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives a [`TradingSession`] on the tokio runtime.
///
/// The runner owns the real timers. Fired tokens are fed back into the
/// session one at a time, and every event the session records is published
/// on a broadcast channel.
pub struct SessionRunner {
    session: Arc<Mutex<TradingSession>>,
    scheduler: TokioScheduler,
    fired_rx: mpsc::UnboundedReceiver<TimerToken>,
    event_tx: broadcast::Sender<RecordedEvent>,
}

impl SessionRunner {
    pub fn new(session: TradingSession) -> Self {
        let (scheduler, fired_rx) = TokioScheduler::new();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: Arc::new(Mutex::new(session)),
            scheduler,
            fired_rx,
            event_tx,
        }
    }

    /// Shared handle for reading session state from other tasks.
    pub fn session(&self) -> Arc<Mutex<TradingSession>> {
        Arc::clone(&self.session)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecordedEvent> {
        self.event_tx.subscribe()
    }

    /// Publishes whatever the session recorded before the runner was created
    /// or through the shared handle.
    pub async fn flush(&self) {
        let mut session = self.session.lock().await;
        publish(&self.event_tx, &mut session);
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let mut session = self.session.lock().await;
        let outcome = session.submit(&mut self.scheduler);
        publish(&self.event_tx, &mut session);
        outcome
    }

    pub async fn select_instrument(&mut self, symbol: &str) -> Result<(), EngineError> {
        let mut session = self.session.lock().await;
        let result = session.select_instrument(symbol, &mut self.scheduler);
        publish(&self.event_tx, &mut session);
        result
    }

    pub async fn set_funds_text(
        &mut self,
        raw: &str,
    ) -> Result<InputOutcome<Decimal>, EngineError> {
        self.with_session(|session| session.set_funds_text(raw)).await
    }

    pub async fn set_quantity_text(&mut self, raw: &str) -> Result<InputOutcome<u64>, EngineError> {
        self.with_session(|session| session.set_quantity_text(raw)).await
    }

    pub async fn set_leverage_text(
        &mut self,
        raw: &str,
    ) -> Result<InputOutcome<Leverage>, EngineError> {
        self.with_session(|session| session.set_leverage_text(raw)).await
    }

    pub async fn set_funds(&mut self, funds: Decimal) -> Result<(), EngineError> {
        self.with_session(|session| session.set_funds(funds)).await
    }

    pub async fn set_quantity(&mut self, quantity: u64) -> Result<(), EngineError> {
        self.with_session(|session| session.set_quantity(quantity)).await
    }

    pub async fn set_leverage(&mut self, leverage: Leverage) -> Result<(), EngineError> {
        self.with_session(|session| session.set_leverage(leverage)).await
    }

    pub async fn set_side(&mut self, side: OrderSide) -> Result<(), EngineError> {
        self.with_session(|session| session.set_side(side)).await
    }

    /// Waits for the next timer and applies it. Returns the resulting state,
    /// or `None` when the fired token was stale.
    pub async fn step(&mut self) -> Result<Option<ExecutionState>, EngineError> {
        let Some(token) = self.fired_rx.recv().await else {
            let state = self.session.lock().await.execution_state();
            return Err(EngineError::TimersClosed(state));
        };
        let mut session = self.session.lock().await;
        let state = session.on_timer(token, &mut self.scheduler);
        publish(&self.event_tx, &mut session);
        Ok(state)
    }

    /// Applies fired timers until the execution lifecycle is back at `Idle`.
    pub async fn run_until_idle(&mut self) -> Result<(), EngineError> {
        loop {
            let state = self.session.lock().await.execution_state();
            if state == ExecutionState::Idle {
                return Ok(());
            }
            tracing::debug!(%state, "Waiting for the next timer");
            self.step().await?;
        }
    }

    /// Runs a form edit under the lock and publishes what it recorded.
    async fn with_session<T>(&self, edit: impl FnOnce(&mut TradingSession) -> T) -> T {
        let mut session = self.session.lock().await;
        let result = edit(&mut session);
        publish(&self.event_tx, &mut session);
        result
    }
}

fn publish(event_tx: &broadcast::Sender<RecordedEvent>, session: &mut TradingSession) {
    for event in session.drain_events() {
        // Fails only when nobody is subscribed.
        let _ = event_tx.send(event);
    }
}
