use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{
    AlignmentPolicy, AnalysisSettings, BacktestSettings, Config, DatasetSettings,
    LoggingSettings, ModelSettings, WalkForwardSettings,
};

/// Prefix for environment overrides, e.g. `MERIDIAN__BACKTEST__TOP_QUANTILE=0.1`.
const ENV_PREFIX: &str = "MERIDIAN";

/// Loads and validates the application configuration.
///
/// Reads `path` when given, otherwise an optional `config.toml` in the working
/// directory, then layers `MERIDIAN__*` environment variables on top. The
/// returned `Config` has already passed `Config::validate`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config.toml").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(?config, "Configuration loaded");
    Ok(config)
}

/// Parses and validates a configuration from TOML text.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [backtest]
            top_quantile = 0.1
            benchmark_id = "QQQ"

            [analysis]
            alignment = "paired"
            "#,
        )
        .unwrap();

        assert_eq!(config.backtest.top_quantile, 0.1);
        assert_eq!(config.backtest.benchmark_id, "QQQ");
        assert_eq!(config.backtest.transaction_cost_bps, 20.0);
        assert_eq!(config.analysis.alignment, AlignmentPolicy::Paired);
        assert_eq!(config.walk_forward.start_year, 2018);
    }

    #[test]
    fn test_invalid_values_fail_to_load() {
        let result = parse_config(
            r#"
            [walk_forward]
            start_year = 2024
            end_year = 2020
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
