use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Backtest parameters are invalid: {0}")]
    InvalidParameters(String),
}
