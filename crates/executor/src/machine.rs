use crate::exchange::{ExecutedOrder, Executor, PendingOrder, SimulatedExecutor};
use crate::scheduler::{Scheduler, TimerKind, TimerRequest, TimerToken};
use chrono::Utc;
use configuration::ExecutionSettings;
use core_types::OrderRequest;
use risk::OrderEconomics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The externally visible lifecycle state of the simulated order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecutionState {
    #[default]
    Idle,
    Confirming,
    Succeeded,
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionState::Idle => write!(f, "Idle"),
            ExecutionState::Confirming => write!(f, "Confirming"),
            ExecutionState::Succeeded => write!(f, "Succeeded"),
        }
    }
}

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoreReason {
    /// An order is already in flight or its success is still being shown.
    Busy(ExecutionState),
    /// The order economics say the order may not be submitted.
    InvalidOrder,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::Busy(state) => write!(f, "machine is {}", state),
            IgnoreReason::InvalidOrder => write!(f, "order is not valid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    Accepted(ExecutionState),
    Ignored(IgnoreReason),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Confirming {
        order: PendingOrder,
        token: TimerToken,
    },
    Succeeded {
        execution: ExecutedOrder,
        token: TimerToken,
    },
}

/// Governs the lifecycle of a single simulated order.
///
/// `Idle -> Confirming` on a valid submission, `Confirming -> Succeeded` when
/// the confirmation timer fires, `Succeeded -> Idle` when the success-display
/// timer fires. There is no failure branch. The only other transition is
/// [`cancel_pending`](Self::cancel_pending), which the owning session uses
/// when the order's market disappears.
pub struct ExecutionStateMachine {
    settings: ExecutionSettings,
    executor: Box<dyn Executor>,
    phase: Phase,
    generation: u64,
}

impl ExecutionStateMachine {
    pub fn new(settings: ExecutionSettings) -> Self {
        Self::with_executor(settings, Box::new(SimulatedExecutor))
    }

    pub fn with_executor(settings: ExecutionSettings, executor: Box<dyn Executor>) -> Self {
        Self {
            settings,
            executor,
            phase: Phase::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> ExecutionState {
        match self.phase {
            Phase::Idle => ExecutionState::Idle,
            Phase::Confirming { .. } => ExecutionState::Confirming,
            Phase::Succeeded { .. } => ExecutionState::Succeeded,
        }
    }

    /// The order currently awaiting confirmation.
    pub fn in_flight(&self) -> Option<&PendingOrder> {
        match &self.phase {
            Phase::Confirming { order, .. } => Some(order),
            _ => None,
        }
    }

    /// The fill being displayed; only available while `Succeeded`.
    pub fn last_execution(&self) -> Option<&ExecutedOrder> {
        match &self.phase {
            Phase::Succeeded { execution, .. } => Some(execution),
            _ => None,
        }
    }

    /// The token of the timer the machine is waiting for, if any.
    pub fn awaiting(&self) -> Option<TimerToken> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Confirming { token, .. } | Phase::Succeeded { token, .. } => Some(*token),
        }
    }

    pub fn submit(
        &mut self,
        request: &OrderRequest,
        economics: &OrderEconomics,
        scheduler: &mut dyn Scheduler,
    ) -> SubmitOutcome {
        let state = self.state();
        if state != ExecutionState::Idle {
            tracing::warn!(%state, "Submission ignored: an order is already in progress");
            return SubmitOutcome::Ignored(IgnoreReason::Busy(state));
        }
        if !economics.is_valid {
            tracing::warn!(
                quantity = request.quantity,
                total_cost = %economics.total_cost,
                "Submission ignored: order is not valid"
            );
            return SubmitOutcome::Ignored(IgnoreReason::InvalidOrder);
        }

        let token = self.arm(TimerKind::Confirmation, scheduler);
        tracing::info!(
            symbol = %request.instrument.symbol,
            side = %request.side,
            quantity = request.quantity,
            "Order submitted, awaiting confirmation"
        );
        self.phase = Phase::Confirming {
            order: PendingOrder {
                request: request.clone(),
                economics: *economics,
                submitted_at: Utc::now(),
            },
            token,
        };
        SubmitOutcome::Accepted(ExecutionState::Confirming)
    }

    /// Applies a fired timer. Returns the new state, or `None` when the token is
    /// not the one the machine is waiting for.
    pub fn on_timer(
        &mut self,
        token: TimerToken,
        scheduler: &mut dyn Scheduler,
    ) -> Option<ExecutionState> {
        if self.awaiting() != Some(token) {
            tracing::debug!(?token, "Ignoring stale timer");
            return None;
        }

        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Confirming { order, .. } => {
                let execution = self.executor.fill(&order);
                tracing::info!(
                    ticket = %execution.ticket_id,
                    "{} at {}",
                    execution.summary(),
                    execution.price
                );
                let token = self.arm(TimerKind::SuccessDisplay, scheduler);
                self.phase = Phase::Succeeded { execution, token };
                Some(ExecutionState::Succeeded)
            }
            Phase::Succeeded { .. } => {
                tracing::info!("Success indicator cleared, ready for a new order");
                Some(ExecutionState::Idle)
            }
            Phase::Idle => Some(ExecutionState::Idle),
        }
    }

    /// Abandons an order that is still confirming. Returns whether anything was cancelled.
    pub fn cancel_pending(&mut self, scheduler: &mut dyn Scheduler) -> bool {
        let Phase::Confirming { token, order } = &self.phase else {
            return false;
        };
        tracing::info!(
            symbol = %order.request.instrument.symbol,
            "Pending order cancelled"
        );
        scheduler.cancel(*token);
        self.generation += 1;
        self.phase = Phase::Idle;
        true
    }

    fn arm(&mut self, kind: TimerKind, scheduler: &mut dyn Scheduler) -> TimerToken {
        self.generation += 1;
        let delay = match kind {
            TimerKind::Confirmation => self.settings.confirmation_delay(),
            TimerKind::SuccessDisplay => self.settings.success_display(),
        };
        let token = TimerToken {
            generation: self.generation,
            kind,
        };
        scheduler.schedule(TimerRequest { token, delay });
        token
    }
}
