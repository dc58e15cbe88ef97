use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable security, identified by its ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().trim().to_ascii_uppercase(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.symbol, self.name)
    }
}

/// The fixed list of instruments a session can trade.
///
/// The catalog is supplied by the caller and never changes during a session.
/// Symbols are unique and stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Instrument>", into = "Vec<Instrument>")]
pub struct InstrumentCatalog {
    instruments: Vec<Instrument>,
}

impl InstrumentCatalog {
    pub fn new(instruments: Vec<Instrument>) -> Result<Self, CoreError> {
        let instruments: Vec<Instrument> = instruments
            .into_iter()
            .map(|i| Instrument::new(i.symbol, i.name))
            .collect();
        if instruments.is_empty() {
            return Err(CoreError::InvalidInput(
                "catalog".to_string(),
                "at least one instrument is required".to_string(),
            ));
        }
        for (i, instrument) in instruments.iter().enumerate() {
            if instrument.symbol.is_empty() {
                return Err(CoreError::InvalidInput(
                    "catalog".to_string(),
                    format!("instrument #{} has an empty symbol", i),
                ));
            }
            if instruments[..i].iter().any(|other| other.symbol == instrument.symbol) {
                return Err(CoreError::InvalidInput(
                    "catalog".to_string(),
                    format!("duplicate symbol '{}'", instrument.symbol),
                ));
            }
        }
        tracing::debug!(count = instruments.len(), "Instrument catalog built");
        Ok(Self { instruments })
    }

    /// Looks up an instrument by symbol, ignoring case and surrounding whitespace.
    pub fn get(&self, symbol: &str) -> Result<&Instrument, CoreError> {
        let wanted = symbol.trim().to_ascii_uppercase();
        self.instruments
            .iter()
            .find(|i| i.symbol == wanted)
            .ok_or_else(|| CoreError::UnknownInstrument(symbol.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

impl TryFrom<Vec<Instrument>> for InstrumentCatalog {
    type Error = CoreError;

    fn try_from(instruments: Vec<Instrument>) -> Result<Self, Self::Error> {
        Self::new(instruments)
    }
}

impl From<InstrumentCatalog> for Vec<Instrument> {
    fn from(catalog: InstrumentCatalog) -> Self {
        catalog.instruments
    }
}

impl Default for InstrumentCatalog {
    fn default() -> Self {
        Self {
            instruments: vec![
                Instrument::new("AAPL", "Apple Inc."),
                Instrument::new("MSFT", "Microsoft Corp."),
                Instrument::new("AMZN", "Amazon.com Inc."),
                Instrument::new("GOOGL", "Alphabet Inc."),
                Instrument::new("META", "Meta Platforms Inc."),
                Instrument::new("TSLA", "Tesla Inc."),
                Instrument::new("NVDA", "NVIDIA Corp."),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_seven_instruments() {
        let catalog = InstrumentCatalog::default();
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.iter().next().unwrap().symbol, "AAPL");
        assert_eq!(catalog.get("nvda").unwrap().name, "NVIDIA Corp.");
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let catalog = InstrumentCatalog::default();
        assert_eq!(
            catalog.get("IBM"),
            Err(CoreError::UnknownInstrument("IBM".to_string()))
        );
    }

    #[test]
    fn rejects_empty_and_duplicate_catalogs() {
        assert!(InstrumentCatalog::new(vec![]).is_err());
        let dupes = vec![
            Instrument::new("AAPL", "Apple Inc."),
            Instrument::new("aapl", "Apple again"),
        ];
        assert!(InstrumentCatalog::new(dupes).is_err());
    }

    #[test]
    fn deserializing_goes_through_validation() {
        let catalog: InstrumentCatalog =
            serde_json::from_str(r#"[{"symbol":" tsla ","name":"Tesla Inc."}]"#).unwrap();
        assert_eq!(catalog.get("TSLA").unwrap().symbol, "TSLA");

        let dupes = r#"[{"symbol":"aapl","name":"A"},{"symbol":"AAPL","name":"B"}]"#;
        assert!(serde_json::from_str::<InstrumentCatalog>(dupes).is_err());
        assert!(serde_json::from_str::<InstrumentCatalog>("[]").is_err());
    }

    #[test]
    fn serializes_as_a_plain_list() {
        let catalog = InstrumentCatalog::default();
        let json = serde_json::to_string(&catalog).unwrap();
        assert!(json.starts_with(r#"[{"symbol":"AAPL""#));
        let back: InstrumentCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
