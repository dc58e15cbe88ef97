//! # Core Types
//!
//! The shared vocabulary of the trade simulator: instruments, price history,
//! order sides, leverage and the order request. As a Layer 0 crate it depends
//! on nothing else in the workspace.

pub mod enums;
pub mod error;
pub mod instrument;
pub mod series;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::OrderSide;
pub use error::CoreError;
pub use instrument::{Instrument, InstrumentCatalog};
pub use series::{PRICE_FLOOR, PricePoint, PriceSeries};
pub use structs::{Leverage, OrderRequest};
