// lib/src/simulator/dataset.rs

use std::fs;
use std::path::Path;

use log::{info, warn};
use rand::Rng;

use models::{FeatureVector, LabeledSample, FEATURE_COUNT, FEATURE_NAMES, LABEL_COLUMN};

use crate::errors::{ClinicalError, Result};

/// The three populations mixed into the augmented training set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Fast heart rate and heavy motion with healthy oxygenation. Labelled normal.
    MotionArtifact,
    AcuteCrisis,
    Healthy,
}

impl Scenario {
    fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<f64>() > 0.7 {
            Scenario::MotionArtifact
        } else if rng.gen::<f64>() > 0.4 {
            Scenario::AcuteCrisis
        } else {
            Scenario::Healthy
        }
    }

    fn label(self) -> u8 {
        match self {
            Scenario::AcuteCrisis => 1,
            Scenario::MotionArtifact | Scenario::Healthy => 0,
        }
    }
}

fn sample_features<R: Rng + ?Sized>(scenario: Scenario, rng: &mut R) -> FeatureVector {
    let (bpm, motion, spo2) = match scenario {
        Scenario::MotionArtifact => (
            rng.gen_range(100.0..130.0),
            rng.gen_range(4.0..7.0),
            rng.gen_range(96.0..99.0),
        ),
        Scenario::AcuteCrisis => (
            rng.gen_range(130.0..180.0),
            rng.gen_range(0.1..1.0),
            rng.gen_range(85.0..92.0),
        ),
        Scenario::Healthy => (
            rng.gen_range(65.0..85.0),
            rng.gen_range(0.1..0.8),
            rng.gen_range(97.0..99.0),
        ),
    };
    [36.7, 50.0, spo2, bpm, 120.0, 80.0, 0.0, motion]
}

/// Synthetic training rows teaching the classifier that motion-driven
/// tachycardia is not a crisis.
pub fn generate_augmented<R: Rng + ?Sized>(samples: usize, rng: &mut R) -> Vec<LabeledSample> {
    (0..samples)
        .map(|_| {
            let scenario = Scenario::draw(rng);
            LabeledSample { features: sample_features(scenario, rng), is_abnormal: scenario.label() }
        })
        .collect()
}

/// Reads a training table with `FEATURE_NAMES` plus `is_abnormal` columns in
/// any order. Rows with missing or unparsable values are dropped; a file
/// without a header row holds no rows.
pub fn read_training_csv(path: &Path) -> Result<Vec<LabeledSample>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        warn!("Training table {:?} is empty", path);
        return Ok(Vec::new());
    }
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ClinicalError::SchemaMismatch(format!("{:?} has no column {}", path, name)))
    };
    let mut feature_columns = [0usize; FEATURE_COUNT];
    for (slot, name) in feature_columns.iter_mut().zip(FEATURE_NAMES.iter()) {
        *slot = column(*name)?;
    }
    let label_column = column(LABEL_COLUMN)?;

    let mut samples = Vec::new();
    let mut dropped = 0usize;
    for row in reader.records() {
        match row.ok().and_then(|r| parse_row(&r, &feature_columns, label_column)) {
            Some(sample) => samples.push(sample),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!("Dropped {} malformed rows from {:?}", dropped, path);
    }
    info!("Loaded {} training rows from {:?}", samples.len(), path);
    Ok(samples)
}

fn parse_row(row: &csv::StringRecord, feature_columns: &[usize; FEATURE_COUNT], label_column: usize) -> Option<LabeledSample> {
    let mut features = [0.0; FEATURE_COUNT];
    for (value, &col) in features.iter_mut().zip(feature_columns.iter()) {
        *value = row.get(col)?.parse::<f64>().ok().filter(|v| v.is_finite())?;
    }
    let label = row.get(label_column)?.parse::<f64>().ok()?;
    let label = if label == 0.0 {
        0
    } else if label == 1.0 {
        1
    } else {
        return None;
    };
    LabeledSample::new(features, label).ok()
}

pub fn write_training_csv(path: &Path, samples: &[LabeledSample]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    let mut header: Vec<&str> = FEATURE_NAMES.to_vec();
    header.push(LABEL_COLUMN);
    writer.write_record(&header)?;
    for sample in samples {
        let mut row: Vec<String> = sample.features.iter().map(|v| v.to_string()).collect();
        row.push(sample.is_abnormal.to_string());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {:?}", samples.len(), path);
    Ok(())
}
