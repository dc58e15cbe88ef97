use rust_decimal::Decimal;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_logging;
pub use settings::{
    CalculatorSettings, Config, ExecutionSettings, GeneratorSettings, InstrumentEntry, LogFormat,
    LoggingSettings, SessionSettings,
};

/// The file looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "simulator.toml";

/// Prefix for environment overrides, e.g. `TRADESIM__EXECUTION__CONFIRMATION_DELAY_MS=500`.
pub const ENV_PREFIX: &str = "TRADESIM";

/// Longest series `validate` accepts, about ten years of daily points.
pub const MAX_SERIES_DAYS: usize = 3650;

/// Loads the application configuration.
///
/// Sources are layered, later ones winning: built-in defaults, the TOML file
/// (`path`, or `simulator.toml` if present), then `TRADESIM__*` environment
/// variables. An explicit `path` must exist; the default file is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file_source = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(file_source)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    tracing::debug!(
        days = config.generator.days,
        instruments = config.instruments.len(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Checks the cross-field rules that serde cannot express.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let generator = &config.generator;
    if generator.days < 2 {
        return Err(ConfigError::ValidationError(format!(
            "generator.days must be at least 2, got {}",
            generator.days
        )));
    }
    if generator.days > MAX_SERIES_DAYS {
        return Err(ConfigError::ValidationError(format!(
            "generator.days must be at most {}, got {}",
            MAX_SERIES_DAYS, generator.days
        )));
    }
    if !generator.volatility.is_finite() || generator.volatility < 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "generator.volatility must be a non-negative number, got {}",
            generator.volatility
        )));
    }
    if !generator.start_price_min.is_finite() || generator.start_price_min <= 0.0 {
        return Err(ConfigError::ValidationError(
            "generator.start_price_min must be positive".to_string(),
        ));
    }
    if !generator.start_price_span.is_finite() || generator.start_price_span < 0.0 {
        return Err(ConfigError::ValidationError(
            "generator.start_price_span must be non-negative".to_string(),
        ));
    }

    let scenario = config.calculator.scenario_move_pct;
    if scenario <= Decimal::ZERO || scenario > Decimal::ONE {
        return Err(ConfigError::ValidationError(format!(
            "calculator.scenario_move_pct must be in (0, 1], got {}",
            scenario
        )));
    }

    if config.session.initial_funds.is_sign_negative() {
        return Err(ConfigError::ValidationError(
            "session.initial_funds cannot be negative".to_string(),
        ));
    }

    let catalog = config.catalog()?;
    catalog.get(&config.session.default_instrument).map_err(|_| {
        ConfigError::ValidationError(format!(
            "session.default_instrument '{}' is not in the instrument list",
            config.session.default_instrument
        ))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn defaults_match_the_stock_simulator() {
        let config = Config::default();
        validate(&config).unwrap();

        assert_eq!(config.generator.days, 30);
        assert_eq!(config.generator.volatility, 0.02);
        assert_eq!(config.calculator.scenario_move_pct, dec!(0.10));
        assert_eq!(config.execution.confirmation_delay_ms, 1_500);
        assert_eq!(config.execution.success_display_ms, 3_000);
        assert_eq!(config.session.initial_funds, dec!(1000));
        assert_eq!(config.instruments.len(), 7);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[generator]
days = 10

[execution]
confirmation_delay_ms = 250
cancel_on_instrument_change = false

[session]
default_instrument = "TSLA"
initial_funds = 2500
seed = 7
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.generator.days, 10);
        assert_eq!(config.generator.volatility, 0.02);
        assert_eq!(config.execution.confirmation_delay_ms, 250);
        assert!(!config.execution.cancel_on_instrument_change);
        assert_eq!(config.session.default_instrument, "TSLA");
        assert_eq!(config.session.initial_funds, dec!(2500));
        assert_eq!(config.session.seed, Some(7));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = load_config(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn rejects_short_series() {
        let mut config = Config::default();
        config.generator.days = 1;
        assert!(matches!(validate(&config), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn rejects_overlong_series() {
        let mut config = Config::default();
        config.generator.days = MAX_SERIES_DAYS;
        assert!(validate(&config).is_ok());
        config.generator.days = MAX_SERIES_DAYS + 1;
        assert!(matches!(validate(&config), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn rejects_default_instrument_outside_catalog() {
        let mut config = Config::default();
        config.session.default_instrument = "IBM".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn rejects_out_of_range_scenario_move() {
        let mut config = Config::default();
        config.calculator.scenario_move_pct = dec!(0);
        assert!(validate(&config).is_err());
        config.calculator.scenario_move_pct = dec!(1.5);
        assert!(validate(&config).is_err());
    }
}
