// lib/src/engine/training.rs

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ClassifierConfig;
use crate::engine::classifier::{GaussianNaiveBayes, TrainingReport};
use crate::errors::Result;
use crate::simulator::dataset::{generate_augmented, read_training_csv};

/// Trains a classifier from the recorded table (when present) plus the
/// augmented scenarios, then writes it to `config.model_path`.
pub fn train_from_config(config: &ClassifierConfig) -> Result<TrainingReport> {
    let mut samples = if config.training_csv.exists() {
        read_training_csv(&config.training_csv)?
    } else {
        warn!("Training table {:?} not found; using augmented scenarios only", config.training_csv);
        Vec::new()
    };
    let recorded = samples.len();

    let mut rng = StdRng::seed_from_u64(config.seed);
    samples.extend(generate_augmented(config.augmented_samples, &mut rng));
    info!(
        "Training on {} rows ({} recorded, {} augmented)",
        samples.len(),
        recorded,
        samples.len() - recorded
    );

    let (model, report) = GaussianNaiveBayes::train(&samples, config.seed)?;
    for (label, (precision, recall)) in ["normal", "abnormal"].iter().zip(report.per_class.iter()) {
        info!("  {:<8} precision {:.3} recall {:.3}", label, precision, recall);
    }
    model.save(&config.model_path)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::dataset::write_training_csv;
    use models::LabeledSample;

    fn config(dir: &std::path::Path) -> ClassifierConfig {
        ClassifierConfig {
            model_path: dir.join("ml_model").join("model.json"),
            training_csv: dir.join("training_data.csv"),
            augmented_samples: 600,
            seed: 42,
        }
    }

    #[test]
    fn trains_without_a_recorded_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let report = train_from_config(&config).unwrap();
        assert_eq!(report.train_samples + report.test_samples, 600);
        assert!(GaussianNaiveBayes::load(&config.model_path).is_ok());
    }

    #[test]
    fn empty_recorded_table_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        std::fs::write(&config.training_csv, "").unwrap();
        let report = train_from_config(&config).unwrap();
        assert_eq!(report.train_samples + report.test_samples, 600);
    }

    #[test]
    fn recorded_rows_are_added_to_the_augmented_set() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let recorded = vec![LabeledSample::new([36.6, 50.0, 90.0, 150.0, 145.0, 80.0, 0.0, 0.5], 1).unwrap(); 100];
        write_training_csv(&config.training_csv, &recorded).unwrap();
        let report = train_from_config(&config).unwrap();
        assert_eq!(report.train_samples + report.test_samples, 700);
    }
}
