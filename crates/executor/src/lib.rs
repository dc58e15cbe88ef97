//! # Executor Crate
//!
//! This crate owns the lifecycle of a simulated order: submission, a timed
//! confirmation, a fill on the virtual exchange, and a timed success display.
//!
//! ## Architectural Principles
//!
//! - **State vs. Logic Decoupling:** The `Executor` trait is a pure calculator that
//!   describes a fill without mutating anything. The `ExecutionStateMachine` is the
//!   state holder that decides when a fill happens and keeps the resulting receipt.
//! - **Time as a Collaborator:** The state machine never sleeps. It asks a `Scheduler`
//!   to arm timers and reacts when the owner hands a fired `TimerToken` back. The
//!   `ManualScheduler` drives tests on a virtual clock; the `TokioScheduler` arms
//!   real timers on the async runtime.
//!
//! ## Public API
//!
//! - `ExecutionStateMachine`: The `Idle -> Confirming -> Succeeded -> Idle` machine.
//! - `Executor` / `SimulatedExecutor`: Fill computation.
//! - `Scheduler`, `ManualScheduler`, `TokioScheduler`: Timer plumbing.

pub mod exchange;
pub mod machine;
pub mod scheduler;

pub use exchange::{ExecutedOrder, Executor, PendingOrder, SimulatedExecutor};
pub use machine::{ExecutionState, ExecutionStateMachine, IgnoreReason, SubmitOutcome};
pub use scheduler::{
    ManualScheduler, Scheduler, TimerKind, TimerRequest, TimerToken, TokioScheduler,
};
