use crate::error::TrainerError;
use ndarray::{Array1, Array2, Axis};

/// Standard deviations below this are replaced by 1.0 so constant features
/// pass through centred but unscaled.
const MIN_STD: f64 = 1e-10;

/// Z-score feature scaler fitted on the training rows only.
#[derive(Debug, Clone, Default)]
pub struct FeatureScaler {
    means: Array1<f64>,
    stds: Array1<f64>,
    fitted: bool,
}

impl FeatureScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, data: &Array2<f64>) -> Result<(), TrainerError> {
        let (n_samples, n_features) = data.dim();
        if n_samples == 0 {
            return Err(TrainerError::EmptyTrainingSet);
        }

        let means = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));

        let stds = if n_samples < 2 {
            Array1::ones(n_features)
        } else {
            // Sample standard deviation.
            data.std_axis(Axis(0), 1.0)
                .mapv(|s| if s.is_finite() && s >= MIN_STD { s } else { 1.0 })
        };

        self.means = means;
        self.stds = stds;
        self.fitted = true;
        Ok(())
    }

    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, TrainerError> {
        if !self.fitted {
            return Err(TrainerError::ScalerNotFitted);
        }
        if data.ncols() != self.means.len() {
            return Err(TrainerError::DimensionMismatch {
                expected: self.means.len(),
                got: data.ncols(),
            });
        }
        Ok((data - &self.means) / &self.stds)
    }

    pub fn fit_transform(&mut self, data: &Array2<f64>) -> Result<Array2<f64>, TrainerError> {
        self.fit(data)?;
        self.transform(data)
    }
}
