//! # Meridian ML Trainer
//!
//! Everything the walk-forward loop needs from the learning side: loading and
//! validating the labelled table, the `Classifier` seam, a logistic-regression
//! implementation of it, and the ROC-AUC validation metric.

pub mod classifier;
pub mod dataset;
pub mod error;
pub mod logistic;
pub mod metrics;
pub mod scaler;

pub use classifier::{Classifier, ScoringModel};
pub use dataset::{
    dataframe_to_dataset, dataframe_to_observations, load_dataset, load_scored_observations,
    read_frame, validate_schema,
};
pub use error::TrainerError;
pub use logistic::{LogisticClassifier, LogisticModel};
pub use metrics::{positive_rate, roc_auc};
pub use scaler::FeatureScaler;
