// lib/src/simulator/recordings.rs

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::errors::{ClinicalError, Result};

pub const RPEAKS_EXTENSION: &str = "rpeaks";

const MIN_PLAUSIBLE_BPM: f64 = 40.0;
const MAX_PLAUSIBLE_BPM: f64 = 210.0;

/// Sampling frequency of an annotated ECG record. Congestive heart failure
/// records are sampled at 250 Hz, arrhythmia records at 360 Hz.
pub fn sampling_frequency(record: &str) -> f64 {
    if record.contains("chf") {
        250.0
    } else {
        360.0
    }
}

pub fn rpeaks_path(directory: &Path, record: &str) -> PathBuf {
    directory.join(format!("{}.{}", record, RPEAKS_EXTENSION))
}

/// Instantaneous heart rate between consecutive R-peaks, dropping
/// physiologically implausible beats.
pub fn bpm_from_peaks(peaks: &[u64], fs: f64) -> Vec<f64> {
    peaks
        .windows(2)
        .filter(|w| w[1] > w[0])
        .map(|w| 60.0 / ((w[1] - w[0]) as f64 / fs))
        .filter(|bpm| *bpm > MIN_PLAUSIBLE_BPM && *bpm < MAX_PLAUSIBLE_BPM)
        .collect()
}

/// Parses an R-peak annotation file: one sample index per line, blank lines
/// and `#` comments ignored.
pub fn parse_rpeaks(contents: &str) -> Result<Vec<u64>> {
    contents
        .lines()
        .enumerate()
        .map(|(n, line)| (n, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            line.parse::<u64>().map_err(|e| {
                ClinicalError::InvalidData(format!("line {}: invalid R-peak index {:?}: {}", n + 1, line, e))
            })
        })
        .collect()
}

pub fn load_bpm_series(directory: &Path, record: &str) -> Result<Vec<f64>> {
    let path = rpeaks_path(directory, record);
    let contents = fs::read_to_string(&path)?;
    let bpm = bpm_from_peaks(&parse_rpeaks(&contents)?, sampling_frequency(record));
    if bpm.is_empty() {
        return Err(ClinicalError::InvalidData(format!("{:?} contains no usable beats", path)));
    }
    info!("Loaded {} beats from record {}", bpm.len(), record);
    Ok(bpm)
}

/// Like [`load_bpm_series`], but a missing or unreadable record yields an
/// empty series so the caller falls back to the synthetic baseline.
pub fn load_bpm_series_or_empty(directory: &Path, record: &str) -> Vec<f64> {
    match load_bpm_series(directory, record) {
        Ok(bpm) => bpm,
        Err(e) => {
            warn!("Record {} unavailable, using synthetic heart rate: {}", record, e);
            Vec::new()
        }
    }
}
