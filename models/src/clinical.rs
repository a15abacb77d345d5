// models/src/clinical.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualitative trajectory of a patient's last five readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForecastLabel {
    LearningBaseline,
    CriticalDeathSpiral,
    WarningChronicDecay,
    AlertHighHrVelocity,
    Stable,
}

impl ForecastLabel {
    /// Whether this trajectory forces an abnormal verdict regardless of the classifier.
    pub fn escalates(self) -> bool {
        matches!(
            self,
            ForecastLabel::CriticalDeathSpiral
                | ForecastLabel::WarningChronicDecay
                | ForecastLabel::AlertHighHrVelocity
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ForecastLabel::LearningBaseline => "LEARNING_BASELINE",
            ForecastLabel::CriticalDeathSpiral => "CRITICAL_DEATH_SPIRAL",
            ForecastLabel::WarningChronicDecay => "WARNING_CHRONIC_DECAY",
            ForecastLabel::AlertHighHrVelocity => "ALERT_HIGH_HR_VELOCITY",
            ForecastLabel::Stable => "STABLE",
        }
    }

    /// Dashboard wording for the label.
    pub fn description(self) -> &'static str {
        match self {
            ForecastLabel::LearningBaseline => "Learning baseline signature",
            ForecastLabel::CriticalDeathSpiral => "Critical: death spiral pattern detected",
            ForecastLabel::WarningChronicDecay => "Warning: persistent physiological decay",
            ForecastLabel::AlertHighHrVelocity => "Alert: high heart rate velocity",
            ForecastLabel::Stable => "Stable: normal physiological trends",
        }
    }
}

impl fmt::Display for ForecastLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCode {
    Hypoxia,
    DeathSpiral,
    SevereTachycardia,
    AnomalyDetected,
}

impl AlertCode {
    /// Dashboard wording for the alert.
    pub fn message(self) -> &'static str {
        match self {
            AlertCode::Hypoxia => "CRITICAL: HYPOXIA DETECTED",
            AlertCode::DeathSpiral => "AI: DEATH SPIRAL PREDICTION",
            AlertCode::SevereTachycardia => "ALERT: SEVERE TACHYCARDIA",
            AlertCode::AnomalyDetected => "AI: ANOMALY DETECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClinicalStatus {
    Normal,
    Abnormal,
}

impl From<u8> for ClinicalStatus {
    fn from(verdict: u8) -> Self {
        if verdict == 0 {
            ClinicalStatus::Normal
        } else {
            ClinicalStatus::Abnormal
        }
    }
}

/// Outcome of fusing the classifier verdict, the forecast and the guardrails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub status: ClinicalStatus,
    pub alerts: Vec<AlertCode>,
    pub forecast: ForecastLabel,
}

impl AnomalyReport {
    pub fn is_abnormal(&self) -> bool {
        self.status == ClinicalStatus::Abnormal
    }
}
