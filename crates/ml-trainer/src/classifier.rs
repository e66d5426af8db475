use crate::error::TrainerError;

/// Something that can learn a binary scoring function from labelled samples.
///
/// Implementations must not retain the training rows; the walk-forward harness
/// relies on the returned model having seen nothing beyond the arguments.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Fits a model. `features[i]` is the dense feature vector of the sample
    /// labelled `labels[i]` (0 or 1).
    fn train(
        &self,
        features: &[Vec<f64>],
        labels: &[i32],
    ) -> Result<Box<dyn ScoringModel>, TrainerError>;
}

/// A trained model. Scores are in `[0, 1]`; higher means more likely label 1.
pub trait ScoringModel: Send + Sync {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, TrainerError>;
}
