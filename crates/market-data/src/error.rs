use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("A price series needs at least 2 days, got {0}")]
    TooFewDays(usize),

    #[error("Volatility must be a finite, non-negative fraction, got {0}")]
    InvalidVolatility(f64),

    #[error("The random walk produced a non-finite price on day {0}")]
    NonFinitePrice(usize),

    #[error("Cannot date a series of {days} days ending on {end_date}")]
    DateOutOfRange { days: usize, end_date: String },

    #[error("Scripted random values must lie in [0, 1): {0}")]
    InvalidScript(String),

    #[error("Generated series violated a core invariant: {0}")]
    Core(#[from] core_types::CoreError),
}
