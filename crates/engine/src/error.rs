use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Instrument '{0}' is not in the catalog.")]
    UnknownInstrument(String),

    #[error("Market data error: {0}")]
    MarketData(#[from] market_data::MarketDataError),

    #[error("Risk management error: {0}")]
    Risk(#[from] risk::RiskError),

    #[error("The timer channel closed while the order was still {0}.")]
    TimersClosed(executor::ExecutionState),
}
