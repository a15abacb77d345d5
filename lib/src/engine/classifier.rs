// lib/src/engine/classifier.rs

use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use models::{validate_feature_names, FeatureVector, LabeledSample, FEATURE_COUNT, FEATURE_NAMES};

use crate::errors::{ClinicalError, Result};

/// Binary anomaly predictor over the fixed feature vector: 0 normal, 1 abnormal.
pub trait Classifier: Send + Sync + 'static {
    fn predict(&self, features: &FeatureVector) -> Result<u8>;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ClassStats {
    label: u8,
    prior: f64,
    means: Vec<f64>,
    variances: Vec<f64>,
}

/// Gaussian naive Bayes, persisted as JSON together with the feature order
/// it was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    feature_names: Vec<String>,
    classes: Vec<ClassStats>,
    var_smoothing: f64,
    training_samples: usize,
    trained_at: DateTime<Utc>,
}

/// Hold-out evaluation of a freshly trained model.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_samples: usize,
    pub test_samples: usize,
    pub accuracy: f64,
    /// `(precision, recall)` indexed by label.
    pub per_class: [(f64, f64); 2],
}

const TEST_FRACTION: f64 = 0.2;
const SMOOTHING_FACTOR: f64 = 1e-9;

impl GaussianNaiveBayes {
    pub fn fit(samples: &[LabeledSample]) -> Result<Self> {
        let mut classes = Vec::with_capacity(2);
        for label in 0..=1u8 {
            let rows: Vec<&FeatureVector> =
                samples.iter().filter(|s| s.is_abnormal == label).map(|s| &s.features).collect();
            if rows.is_empty() {
                return Err(ClinicalError::ClassifierError(format!(
                    "training data has no samples with label {}",
                    label
                )));
            }
            let (means, variances) = moments(&rows);
            classes.push(ClassStats { label, prior: rows.len() as f64 / samples.len() as f64, means, variances });
        }

        let all: Vec<&FeatureVector> = samples.iter().map(|s| &s.features).collect();
        let (_, total_variances) = moments(&all);
        let max_variance = total_variances.iter().cloned().fold(0.0, f64::max);
        let var_smoothing = if max_variance > 0.0 { SMOOTHING_FACTOR * max_variance } else { SMOOTHING_FACTOR };
        for class in &mut classes {
            for v in &mut class.variances {
                *v += var_smoothing;
            }
        }

        Ok(GaussianNaiveBayes {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            classes,
            var_smoothing,
            training_samples: samples.len(),
            trained_at: Utc::now(),
        })
    }

    /// Shuffles with `seed`, fits on 80% of `samples` and scores the rest.
    pub fn train(samples: &[LabeledSample], seed: u64) -> Result<(Self, TrainingReport)> {
        let mut shuffled = samples.to_vec();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
        let test_len = ((shuffled.len() as f64) * TEST_FRACTION).round() as usize;
        let (test, train) = shuffled.split_at(test_len);

        let model = Self::fit(train)?;
        let report = model.evaluate(test, train.len())?;
        info!(
            "Trained {} on {} samples; hold-out accuracy {:.2}% over {} samples",
            model.name(),
            report.train_samples,
            report.accuracy * 100.0,
            report.test_samples
        );
        Ok((model, report))
    }

    fn evaluate(&self, test: &[LabeledSample], train_samples: usize) -> Result<TrainingReport> {
        // confusion[actual][predicted]
        let mut confusion = [[0usize; 2]; 2];
        for sample in test {
            let predicted = self.predict(&sample.features)?;
            confusion[sample.is_abnormal as usize][predicted as usize] += 1;
        }
        let correct = confusion[0][0] + confusion[1][1];
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let per_class = [0usize, 1].map(|c| {
            let predicted_c = confusion[0][c] + confusion[1][c];
            let actual_c = confusion[c][0] + confusion[c][1];
            (ratio(confusion[c][c], predicted_c), ratio(confusion[c][c], actual_c))
        });

        Ok(TrainingReport {
            train_samples,
            test_samples: test.len(),
            accuracy: ratio(correct, test.len()),
            per_class,
        })
    }

    /// Loads a model file, failing fast when it was trained on a different
    /// feature order or arity.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)?;
        let model: GaussianNaiveBayes = serde_json::from_slice(&raw)?;
        validate_feature_names(&model.feature_names)?;

        let labels: Vec<u8> = model.classes.iter().map(|c| c.label).collect();
        if labels != [0, 1] {
            return Err(ClinicalError::ClassifierError(format!("unexpected class labels {:?}", labels)));
        }
        if model
            .classes
            .iter()
            .any(|c| c.means.len() != FEATURE_COUNT || c.variances.len() != FEATURE_COUNT)
        {
            return Err(ClinicalError::SchemaMismatch(format!(
                "model parameters do not have {} features",
                FEATURE_COUNT
            )));
        }
        if model.classes.iter().flat_map(|c| c.variances.iter()).any(|v| !(*v > 0.0)) {
            return Err(ClinicalError::ClassifierError("model variances must be positive".into()));
        }
        Ok(model)
    }

    /// `Ok(None)` when no model file exists yet.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            warn!("Model file {:?} not found; AI diagnosis disabled", path);
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        info!("Model saved to {:?}", path);
        Ok(())
    }
}

impl Classifier for GaussianNaiveBayes {
    fn predict(&self, features: &FeatureVector) -> Result<u8> {
        if features.iter().any(|x| !x.is_finite()) {
            return Err(ClinicalError::ClassifierError("non-finite feature value".into()));
        }

        let mut best = (f64::NEG_INFINITY, 0u8);
        for class in &self.classes {
            let mut log_likelihood = class.prior.ln();
            for ((x, mean), var) in features.iter().zip(&class.means).zip(&class.variances) {
                log_likelihood -= 0.5 * (2.0 * PI * var).ln() + (x - mean).powi(2) / (2.0 * var);
            }
            if log_likelihood > best.0 {
                best = (log_likelihood, class.label);
            }
        }
        Ok(best.1)
    }

    fn name(&self) -> &str {
        "gaussian-naive-bayes"
    }
}

/// Per-feature mean and population variance.
fn moments(rows: &[&FeatureVector]) -> (Vec<f64>, Vec<f64>) {
    let n = rows.len().max(1) as f64;
    let mut means = vec![0.0; FEATURE_COUNT];
    for row in rows {
        for (m, x) in means.iter_mut().zip(row.iter()) {
            *m += x / n;
        }
    }
    let mut variances = vec![0.0; FEATURE_COUNT];
    for row in rows {
        for ((v, x), m) in variances.iter_mut().zip(row.iter()).zip(&means) {
            *v += (x - m).powi(2) / n;
        }
    }
    (means, variances)
}
