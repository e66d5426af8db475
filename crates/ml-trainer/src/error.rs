use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Required column '{0}' is missing from the dataset.")]
    MissingColumn(String),

    #[error("Column '{column}' has an unusable value in row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("Cannot train on an empty sample.")]
    EmptyTrainingSet,

    #[error("Labels must be 0 or 1, found {0}.")]
    InvalidLabel(i32),

    #[error("Expected {expected} values, got {got}.")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Feature matrix has an invalid shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Scaler must be fitted before transform.")]
    ScalerNotFitted,

    #[error("Dataset error: {0}")]
    Core(#[from] core_types::CoreError),
}
