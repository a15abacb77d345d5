// lib/src/engine/fusion.rs

use log::debug;

use models::{AlertCode, AnomalyReport, ClinicalStatus, ForecastLabel, VitalRecord};

use crate::config::ClinicalThresholds;

/// Layered decision policy. The classifier verdict is the starting point;
/// guardrails then override it in a fixed order and the emergency rule is
/// applied last, so it always wins.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    thresholds: ClinicalThresholds,
}

impl FusionEngine {
    pub fn new(thresholds: ClinicalThresholds) -> Self {
        FusionEngine { thresholds }
    }

    pub fn evaluate(&self, latest: &VitalRecord, classifier_verdict: u8, forecast: ForecastLabel) -> AnomalyReport {
        let t = &self.thresholds;
        let hr = latest.heart_rate();
        let spo2 = latest.spo2();
        let mut verdict = u8::from(classifier_verdict != 0);

        let healthy_band = hr >= t.healthy_hr_min && hr <= t.healthy_hr_max;
        if healthy_band && spo2 >= t.healthy_spo2_min {
            if verdict == 1 {
                debug!("{}: healthy vitals override classifier (hr={}, spo2={})", latest.patient_id, hr, spo2);
            }
            verdict = 0;
        }

        if spo2 >= t.healthy_spo2_min && latest.motion_magnitude > t.motion_noise_threshold {
            if verdict == 1 {
                debug!("{}: motion artifact override (motion={})", latest.patient_id, latest.motion_magnitude);
            }
            verdict = 0;
        }

        let hypoxic = spo2 < t.critical_spo2;
        if hypoxic || forecast.escalates() {
            verdict = 1;
        }

        let mut alerts = Vec::new();
        if verdict == 1 {
            let alert = if hypoxic {
                AlertCode::Hypoxia
            } else if forecast == ForecastLabel::CriticalDeathSpiral {
                AlertCode::DeathSpiral
            } else if hr > t.severe_tachycardia_bpm {
                AlertCode::SevereTachycardia
            } else {
                AlertCode::AnomalyDetected
            };
            alerts.push(alert);
        }

        AnomalyReport { status: ClinicalStatus::from(verdict), alerts, forecast }
    }
}
