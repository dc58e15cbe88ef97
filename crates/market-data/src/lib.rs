//! # Market Data
//!
//! Synthetic price histories for the trade simulator. There is no real market
//! feed: every series is a bounded random walk produced by
//! [`PriceSeriesGenerator`] from a pluggable [`RandomSource`].
//!
//! ## Public API
//!
//! - `PriceSeriesGenerator` / `WalkParams`: the random walk.
//! - `RandomSource`, `RngSource`, `ScriptedSource`, `source_for`: randomness.
//! - `ChartProjection`: the bar-chart view of a series.

pub mod chart;
pub mod error;
pub mod generator;
pub mod random;

pub use chart::{BarTrend, ChartBar, ChartProjection};
pub use error::MarketDataError;
pub use generator::{PriceSeriesGenerator, WalkParams};
pub use random::{RandomSource, RngSource, ScriptedSource, source_for};
