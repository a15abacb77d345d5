// lib/src/engine/forecast.rs

use log::{debug, warn};
use thiserror::Error;

use models::{ForecastLabel, VitalRecord};

use crate::config::ClinicalThresholds;

/// Readings compared by the trend rules.
pub const FORECAST_WINDOW: usize = 5;
/// Readings fetched from the store per forecast.
pub const HISTORY_DEPTH: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("trend analysis needs {required} readings, {available} available")]
    InsufficientHistory { available: usize, required: usize },
    #[error("reading {index} has a non-finite {field}")]
    NonFiniteReading { index: usize, field: &'static str },
}

/// Short-horizon trajectory classifier over a patient's most recent readings.
#[derive(Debug, Clone, Default)]
pub struct TrendForecaster {
    thresholds: ClinicalThresholds,
}

impl TrendForecaster {
    pub fn new(thresholds: ClinicalThresholds) -> Self {
        TrendForecaster { thresholds }
    }

    /// Advisory forecast; never fails. Short histories are still being
    /// learned, anything else that goes wrong reads as `Stable`.
    pub fn forecast(&self, history: &[VitalRecord]) -> ForecastLabel {
        match self.try_forecast(history) {
            Ok(label) => label,
            Err(ForecastError::InsufficientHistory { available, .. }) => {
                debug!("Forecast baseline still learning ({} readings)", available);
                ForecastLabel::LearningBaseline
            }
            Err(e) => {
                warn!("Forecast failed, reporting stable: {}", e);
                ForecastLabel::Stable
            }
        }
    }

    /// `history` is newest first. Rules are checked in order and the first
    /// match wins: death spiral, chronic decay, heart-rate velocity.
    pub fn try_forecast(&self, history: &[VitalRecord]) -> Result<ForecastLabel, ForecastError> {
        if history.len() < FORECAST_WINDOW {
            return Err(ForecastError::InsufficientHistory {
                available: history.len(),
                required: FORECAST_WINDOW,
            });
        }

        let window = &history[..FORECAST_WINDOW];
        let mut spo2 = [0.0; FORECAST_WINDOW];
        let mut bpm = [0.0; FORECAST_WINDOW];
        for (index, record) in window.iter().enumerate() {
            spo2[index] = finite(record.spo2(), index, "spo2_percent")?;
            bpm[index] = finite(record.heart_rate(), index, "ecg_bpm")?;
        }

        let t = &self.thresholds;
        let oldest = FORECAST_WINDOW - 1;
        let spo2_drop = spo2[oldest] - spo2[0];
        let bpm_rise = bpm[0] - bpm[oldest];

        // Each newer reading sits at or below the one before it (within tolerance).
        let is_decaying = spo2.windows(2).all(|pair| pair[0] <= pair[1] + t.decay_tolerance);

        let label = if spo2_drop >= t.death_spiral_spo2_drop && bpm_rise >= t.death_spiral_bpm_rise {
            ForecastLabel::CriticalDeathSpiral
        } else if is_decaying && spo2[0] < t.decay_spo2_threshold {
            ForecastLabel::WarningChronicDecay
        } else if bpm_rise >= t.velocity_bpm_rise {
            ForecastLabel::AlertHighHrVelocity
        } else {
            ForecastLabel::Stable
        };
        Ok(label)
    }
}

fn finite(value: f64, index: usize, field: &'static str) -> Result<f64, ForecastError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ForecastError::NonFiniteReading { index, field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use models::VitalInput;
    use uuid::Uuid;

    /// Builds a newest-first history from parallel SpO2 / heart-rate series.
    fn history(spo2: &[f64], bpm: &[f64]) -> Vec<VitalRecord> {
        let now = Utc::now();
        spo2.iter()
            .zip(bpm.iter())
            .enumerate()
            .map(|(i, (s, b))| {
                let input = VitalInput {
                    patient_id: "patient_002".into(),
                    spo2_percent: Some(*s),
                    ecg_bpm: Some(*b),
                    ..Default::default()
                };
                VitalRecord::from_input(input, Uuid::new_v4(), now - Duration::seconds(i as i64)).unwrap()
            })
            .collect()
    }

    fn forecaster() -> TrendForecaster {
        TrendForecaster::new(ClinicalThresholds::default())
    }

    #[test]
    fn fewer_than_five_readings_is_learning_baseline() {
        for n in 0..FORECAST_WINDOW {
            let h = history(&vec![98.0; n], &vec![75.0; n]);
            assert_eq!(forecaster().forecast(&h), ForecastLabel::LearningBaseline);
        }
        assert_eq!(
            forecaster().try_forecast(&history(&[98.0], &[75.0])),
            Err(ForecastError::InsufficientHistory { available: 1, required: 5 })
        );
    }

    #[test]
    fn oxygen_drop_with_heart_rate_rise_is_death_spiral() {
        let h = history(&[90.0, 91.0, 92.0, 93.0, 94.0], &[100.0, 95.0, 90.0, 88.0, 85.0]);
        assert_eq!(forecaster().forecast(&h), ForecastLabel::CriticalDeathSpiral);
    }

    #[test]
    fn steady_decline_without_velocity_is_chronic_decay() {
        let h = history(&[90.0, 91.0, 92.0, 93.0, 94.0], &[80.0; 5]);
        assert_eq!(forecaster().forecast(&h), ForecastLabel::WarningChronicDecay);
    }

    #[test]
    fn decay_tolerates_one_point_of_jitter() {
        let h = history(&[90.0, 92.0, 91.0, 93.0, 94.0], &[80.0; 5]);
        assert_eq!(forecaster().forecast(&h), ForecastLabel::WarningChronicDecay);

        let h = history(&[90.0, 93.0, 91.0, 93.0, 94.0], &[80.0; 5]);
        assert_eq!(forecaster().forecast(&h), ForecastLabel::Stable);
    }

    #[test]
    fn decline_above_threshold_is_stable() {
        let h = history(&[95.0, 96.0, 97.0, 97.0, 98.0], &[80.0; 5]);
        assert_eq!(forecaster().forecast(&h), ForecastLabel::Stable);
    }

    #[test]
    fn fast_heart_rate_rise_alone_is_velocity_alert() {
        let h = history(&[98.0; 5], &[105.0, 100.0, 95.0, 90.0, 85.0]);
        assert_eq!(forecaster().forecast(&h), ForecastLabel::AlertHighHrVelocity);

        let h = history(&[98.0; 5], &[100.0, 95.0, 90.0, 88.0, 85.0]);
        assert_eq!(forecaster().forecast(&h), ForecastLabel::Stable);
    }

    #[test]
    fn only_the_five_newest_readings_count() {
        let mut spo2 = vec![90.0, 91.0, 92.0, 93.0, 94.0];
        spo2.extend([80.0, 99.0, 80.0, 99.0, 80.0]);
        let h = history(&spo2, &[80.0; 10]);
        assert_eq!(forecaster().forecast(&h), ForecastLabel::WarningChronicDecay);
    }

    #[test]
    fn malformed_reading_falls_back_to_stable() {
        let mut h = history(&[90.0, 91.0, 92.0, 93.0, 94.0], &[80.0; 5]);
        h[2].spo2_percent = Some(f64::NAN);
        assert_eq!(
            forecaster().try_forecast(&h),
            Err(ForecastError::NonFiniteReading { index: 2, field: "spo2_percent" })
        );
        assert_eq!(forecaster().forecast(&h), ForecastLabel::Stable);
    }

    #[test]
    fn tunable_velocity_threshold() {
        let thresholds = ClinicalThresholds { velocity_bpm_rise: 10.0, ..Default::default() };
        let h = history(&[98.0; 5], &[100.0, 95.0, 90.0, 88.0, 85.0]);
        assert_eq!(TrendForecaster::new(thresholds).forecast(&h), ForecastLabel::AlertHighHrVelocity);
    }
}
