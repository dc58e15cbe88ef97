//! # Engine Crate
//!
//! The orchestrator of the trade simulator. A [`TradingSession`] wires the
//! price generator, the position calculator and the execution state machine
//! behind one synchronous, single-owner interface. A [`SessionRunner`] puts
//! that session on the tokio runtime with real timers and an event broadcast.
//!
//! ## Public API
//!
//! - `TradingSession`: instrument selection, order form, submission, timers.
//! - `SessionRunner`: the async driver used by the CLI.
//! - `EngineError`: everything that can go wrong while driving a session.

pub mod error;
pub mod runner;
pub mod session;

pub use error::EngineError;
pub use runner::SessionRunner;
pub use session::TradingSession;
