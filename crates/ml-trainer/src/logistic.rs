use crate::classifier::{Classifier, ScoringModel};
use crate::error::TrainerError;
use crate::scaler::FeatureScaler;
use configuration::ModelSettings;
use ndarray::{Array1, Array2};

/// Probabilities are clipped to `[EPS, 1 - EPS]` inside the log-loss.
const EPS: f64 = 1e-15;

/// Binary logistic regression on standardised features, fitted by batch
/// gradient descent with an optional L2 penalty on the coefficients.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    learning_rate: f64,
    max_iterations: usize,
    tolerance: f64,
    l2_penalty: f64,
}

impl Default for LogisticClassifier {
    fn default() -> Self {
        Self::new(&ModelSettings::default())
    }
}

impl LogisticClassifier {
    pub fn new(settings: &ModelSettings) -> Self {
        Self {
            learning_rate: settings.learning_rate,
            max_iterations: settings.max_iterations,
            tolerance: settings.tolerance,
            l2_penalty: settings.l2_penalty,
        }
    }

    /// Fits the model and returns it with its concrete type.
    pub fn fit(&self, features: &[Vec<f64>], labels: &[i32]) -> Result<LogisticModel, TrainerError> {
        if features.is_empty() {
            return Err(TrainerError::EmptyTrainingSet);
        }
        if features.len() != labels.len() {
            return Err(TrainerError::DimensionMismatch {
                expected: features.len(),
                got: labels.len(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&l| l != 0 && l != 1) {
            return Err(TrainerError::InvalidLabel(bad));
        }

        let x = to_matrix(features, None)?;
        let y: Array1<f64> = labels.iter().map(|&l| f64::from(l)).collect();

        let mut scaler = FeatureScaler::new();
        let x = scaler.fit_transform(&x)?;

        let n_samples = x.nrows() as f64;
        let mut coefficients = Array1::<f64>::zeros(x.ncols());
        let mut intercept = 0.0;
        let mut previous_loss = f64::INFINITY;

        for iteration in 0..self.max_iterations {
            let predictions = (x.dot(&coefficients) + intercept).mapv(sigmoid);
            let errors = &predictions - &y;

            let loss = log_loss(&y, &predictions)
                + 0.5 * self.l2_penalty * coefficients.dot(&coefficients);
            if (previous_loss - loss).abs() < self.tolerance {
                tracing::debug!(iteration, loss, "Logistic regression converged");
                break;
            }
            previous_loss = loss;

            let gradient = x.t().dot(&errors) / n_samples + &coefficients * self.l2_penalty;
            let intercept_gradient = errors.sum() / n_samples;

            coefficients = coefficients - gradient * self.learning_rate;
            intercept -= self.learning_rate * intercept_gradient;
        }

        Ok(LogisticModel {
            scaler,
            coefficients,
            intercept,
        })
    }
}

impl Classifier for LogisticClassifier {
    fn name(&self) -> &str {
        "logistic"
    }

    fn train(
        &self,
        features: &[Vec<f64>],
        labels: &[i32],
    ) -> Result<Box<dyn ScoringModel>, TrainerError> {
        Ok(Box::new(self.fit(features, labels)?))
    }
}

#[derive(Debug, Clone)]
pub struct LogisticModel {
    scaler: FeatureScaler,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl ScoringModel for LogisticModel {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, TrainerError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let x = to_matrix(features, Some(self.coefficients.len()))?;
        let x = self.scaler.transform(&x)?;
        Ok((x.dot(&self.coefficients) + self.intercept)
            .mapv(sigmoid)
            .to_vec())
    }
}

/// Packs row vectors into a matrix, checking that every row has the same width.
fn to_matrix(rows: &[Vec<f64>], expected_width: Option<usize>) -> Result<Array2<f64>, TrainerError> {
    let width = expected_width.unwrap_or_else(|| rows.first().map_or(0, Vec::len));
    if let Some(bad) = rows.iter().find(|r| r.len() != width) {
        return Err(TrainerError::DimensionMismatch {
            expected: width,
            got: bad.len(),
        });
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(Array2::from_shape_vec((rows.len(), width), flat)?)
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}

fn log_loss(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    -y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            y * p.ln() + (1.0 - y) * (1.0 - p).ln()
        })
        .sum::<f64>()
        / n
}
