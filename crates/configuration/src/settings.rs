use core_types::{Instrument, InstrumentCatalog};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub generator: GeneratorSettings,
    pub calculator: CalculatorSettings,
    pub execution: ExecutionSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
    /// The fixed catalog of tradable instruments, in display order.
    pub instruments: Vec<InstrumentEntry>,
}

/// Parameters for the synthetic price history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Number of daily points in a generated series.
    pub days: usize,
    /// Maximum fractional move per day (0.02 means up to ±2%).
    pub volatility: f64,
    /// Lower bound of the random start price drawn on instrument change.
    pub start_price_min: f64,
    /// Width of the start price range, so draws land in `[min, min + span)`.
    pub start_price_span: f64,
}

/// Parameters for order economics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorSettings {
    /// The price move used for the potential gain/loss scenario (0.10 = 10%).
    pub scenario_move_pct: Decimal,
}

/// Parameters for the simulated order lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Simulated network/settlement latency before an order is confirmed.
    pub confirmation_delay_ms: u64,
    /// How long the success indicator stays up before the machine re-arms.
    pub success_display_ms: u64,
    /// Whether switching instruments cancels an order that is still confirming.
    pub cancel_on_instrument_change: bool,
}

impl ExecutionSettings {
    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.confirmation_delay_ms)
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }
}

/// Initial form state of a trading session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub default_instrument: String,
    pub initial_funds: Decimal,
    /// Seeds the random walk for reproducible sessions. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    Full,
    Compact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, used when `RUST_LOG` is not set.
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    pub symbol: String,
    pub name: String,
}

impl Config {
    /// Builds the instrument catalog from the configured entries.
    pub fn catalog(&self) -> Result<InstrumentCatalog, core_types::CoreError> {
        InstrumentCatalog::new(
            self.instruments
                .iter()
                .map(|entry| Instrument::new(entry.symbol.as_str(), entry.name.as_str()))
                .collect(),
        )
    }
}

// --- Default Implementations ---
// These mirror the stock simulator so that a missing `simulator.toml` still works.

impl Default for Config {
    fn default() -> Self {
        Self {
            generator: GeneratorSettings::default(),
            calculator: CalculatorSettings::default(),
            execution: ExecutionSettings::default(),
            session: SessionSettings::default(),
            logging: LoggingSettings::default(),
            instruments: InstrumentCatalog::default()
                .iter()
                .map(|i| InstrumentEntry {
                    symbol: i.symbol.clone(),
                    name: i.name.clone(),
                })
                .collect(),
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            days: 30,
            volatility: 0.02,
            start_price_min: 50.0,
            start_price_span: 200.0,
        }
    }
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            scenario_move_pct: dec!(0.10),
        }
    }
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            confirmation_delay_ms: 1_500,
            success_display_ms: 3_000,
            cancel_on_instrument_change: true,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_instrument: "AAPL".to_string(),
            initial_funds: dec!(1000),
            seed: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}
