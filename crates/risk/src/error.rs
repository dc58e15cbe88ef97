use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Calculator parameters from configuration are invalid: {0}")]
    InvalidParameters(String),

    #[error("The provided price ({0}) is zero or negative.")]
    InvalidPrice(Decimal),

    #[error("Available funds cannot be negative, got {0}.")]
    NegativeFunds(Decimal),

    #[error("A calculation error occurred: {0}")]
    Calculation(String),
}
