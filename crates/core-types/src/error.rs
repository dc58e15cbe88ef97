use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("A price series needs at least 2 points, got {0}")]
    SeriesTooShort(usize),

    #[error("Price {price} on {date} is below the floor of {floor}")]
    PriceBelowFloor {
        date: String,
        price: String,
        floor: String,
    },

    #[error("Price series dates must be consecutive days: {previous} is followed by {next}")]
    NonConsecutiveDates { previous: String, next: String },

    #[error("Instrument '{0}' is not in the catalog")]
    UnknownInstrument(String),
}
