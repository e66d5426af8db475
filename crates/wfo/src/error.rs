use indicatif::style::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WfoError {
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::error::ConfigError),

    #[error("Model error during fold {year}: {source}")]
    Trainer {
        year: i32,
        #[source]
        source: ml_trainer::TrainerError,
    },

    #[error("Backtester error during out-of-sample evaluation: {0}")]
    Backtester(#[from] portfolio_backtester::BacktestError),

    #[error("Classifier returned {got} scores for {expected} rows in fold {year}.")]
    ScoreCountMismatch { year: i32, expected: usize, got: usize },

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<TemplateError> for WfoError {
    fn from(error: TemplateError) -> Self {
        WfoError::ProgressBarTemplate(error.to_string())
    }
}
