use std::path::Path;

use ndarray::{Array1, Array2};
use tracing::{info, warn};

use crate::classifier::dataset::{parse_numeric, Dataset, FEATURE_COUNT, FEATURE_NAMES};
use crate::classifier::logistic::{FitSummary, MultinomialLogistic, NewtonParams};
use crate::errors::{PredictionError, TrainingError};

/// Label returned whenever a prediction cannot be made.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Fitted trait classifier. Immutable once trained; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    labels: Vec<String>,
    regression: MultinomialLogistic,
    summary: FitSummary,
    training_accuracy: f64,
}

impl TrainedModel {
    /// Loads the dataset at `path` and fits a model with default solver settings.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TrainingError> {
        let path = path.as_ref();
        let dataset = Dataset::from_path(path)?;
        info!(
            path = %path.display(),
            kept = dataset.len(),
            dropped = dataset.dropped,
            "Loaded training dataset"
        );
        Self::train(&dataset)
    }

    pub fn train(dataset: &Dataset) -> Result<Self, TrainingError> {
        Self::train_with(dataset, &NewtonParams::default())
    }

    pub fn train_with(dataset: &Dataset, params: &NewtonParams) -> Result<Self, TrainingError> {
        if dataset.is_empty() {
            return Err(TrainingError::NoUsableRows);
        }
        let labels = dataset.labels();
        if labels.len() < 2 {
            return Err(TrainingError::SingleClass(labels.len()));
        }

        let x = Array2::from_shape_fn((dataset.len(), FEATURE_COUNT), |(i, j)| {
            dataset.examples[i].features[j]
        });
        let y: Vec<usize> = dataset
            .examples
            .iter()
            .map(|e| labels.binary_search(&e.label).unwrap_or_default())
            .collect();

        let (regression, summary) = MultinomialLogistic::fit(&x, &y, labels.len(), params);
        if !summary.converged {
            warn!(
                iterations = summary.iterations,
                "Solver stopped before reaching tolerance; using last iterate"
            );
        }

        let correct = x
            .rows()
            .into_iter()
            .zip(&y)
            .filter(|(row, label)| regression.predict(row.view()) == **label)
            .count();
        let training_accuracy = correct as f64 / y.len() as f64;

        info!(
            iterations = summary.iterations,
            objective = summary.objective,
            "Training complete. Model accuracy on train set: {:.2}%",
            training_accuracy * 100.0
        );

        Ok(Self {
            labels,
            regression,
            summary,
            training_accuracy,
        })
    }

    /// Predicts a label from exactly seven raw values in feature order.
    pub fn predict<S: AsRef<str>>(&self, values: &[S]) -> Result<String, PredictionError> {
        if values.len() != FEATURE_COUNT {
            return Err(PredictionError::FeatureCount {
                expected: FEATURE_COUNT,
                actual: values.len(),
            });
        }

        let mut sample = Array1::<f64>::zeros(FEATURE_COUNT);
        for (idx, raw) in values.iter().enumerate() {
            let raw = raw.as_ref();
            sample[idx] = parse_numeric(raw).ok_or_else(|| PredictionError::NonNumeric {
                feature: FEATURE_NAMES[idx],
                value: raw.to_string(),
            })?;
        }

        let class = self.regression.predict(sample.view());
        Ok(self.labels[class].clone())
    }

    /// Fail-soft prediction: any error is logged and replaced by [`UNKNOWN_LABEL`].
    pub fn predict_or_unknown<S: AsRef<str>>(&self, values: &[S]) -> String {
        match self.predict(values) {
            Ok(label) => label,
            Err(e) => {
                warn!("Prediction error: {e}");
                UNKNOWN_LABEL.to_string()
            }
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn training_accuracy(&self) -> f64 {
        self.training_accuracy
    }

    pub fn summary(&self) -> &FitSummary {
        &self.summary
    }
}
