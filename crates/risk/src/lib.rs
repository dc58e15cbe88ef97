//! # Risk Crate
//!
//! Position sizing and order economics for the trade simulator.
//!
//! `PositionCalculator` is pure: given the latest two prices and the order form
//! it derives cost, affordability, the symmetric gain/loss scenario and whether
//! the order may be submitted. The `input` module turns raw form text into
//! typed values without ever letting bad input through.

pub mod calculator;
pub mod error;
pub mod input;
pub mod labels;

pub use calculator::{OrderEconomics, PositionCalculator, PositionInputs, PriceChange};
pub use error::RiskError;
pub use input::{InputOutcome, RejectReason, parse_funds, parse_leverage, parse_quantity};
pub use labels::{order_button_label, share_noun, total_label};
