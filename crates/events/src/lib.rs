//! # Session Events
//!
//! This crate defines the notifications a trading session emits whenever its
//! observable state changes: a new price series, a new quote, a rejected
//! input, or a step of the order lifecycle.
//!
//! Events are plain data. The session records them, the runner broadcasts
//! them, and front ends render or serialize them.

pub mod error;
pub mod messages;

pub use error::EventsError;
pub use messages::{
    InputField, InputRejection, RecordedEvent, SeriesSummary, SessionEvent, StateChange,
};
