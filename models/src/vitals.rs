// models/src/vitals.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::PatientId;

pub const FEATURE_COUNT: usize = 8;

/// Feature order shared by the store schema, the classifier and the
/// generator. The classifier model file records this list and is rejected at
/// load time when it differs.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "body_temperature_C",
    "humidity_percent",
    "spo2_percent",
    "ecg_bpm",
    "bp_systolic_mmHg",
    "bp_diastolic_mmHg",
    "alcohol_mg_L",
    "motion_magnitude",
];

/// Name of the binary target column in training tables.
pub const LABEL_COLUMN: &str = "is_abnormal";

pub const DEFAULT_HUMIDITY_PERCENT: f64 = 50.0;
pub const DEFAULT_ALCOHOL_MG_L: f64 = 0.0;
pub const DEFAULT_MOTION_MAGNITUDE: f64 = 0.5;

/// Heart rate assumed by guardrails and trend analysis when a reading lacks one.
pub const FALLBACK_HEART_RATE: f64 = 75.0;
/// SpO2 assumed by guardrails and trend analysis when a reading lacks one.
pub const FALLBACK_SPO2: f64 = 98.0;

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Checks that a persisted feature list matches `FEATURE_NAMES` in arity and order.
pub fn validate_feature_names<S: AsRef<str>>(names: &[S]) -> ValidationResult<()> {
    let matches = names.len() == FEATURE_COUNT
        && names.iter().zip(FEATURE_NAMES.iter()).all(|(a, b)| a.as_ref() == *b);
    if matches {
        Ok(())
    } else {
        Err(ValidationError::FeatureSchemaMismatch {
            expected: FEATURE_NAMES.join(", "),
            found: names.iter().map(|n| n.as_ref()).collect::<Vec<_>>().join(", "),
        })
    }
}

/// A sensor packet as it arrives at the ingest boundary. Every feature is
/// optional; defaults are filled in by [`VitalRecord::from_input`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalInput {
    pub patient_id: String,
    #[serde(rename = "body_temperature_C", default, skip_serializing_if = "Option::is_none")]
    pub body_temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo2_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecg_bpm: Option<f64>,
    #[serde(rename = "bp_systolic_mmHg", default, skip_serializing_if = "Option::is_none")]
    pub bp_systolic_mmhg: Option<f64>,
    #[serde(rename = "bp_diastolic_mmHg", default, skip_serializing_if = "Option::is_none")]
    pub bp_diastolic_mmhg: Option<f64>,
    #[serde(rename = "alcohol_mg_L", default, skip_serializing_if = "Option::is_none")]
    pub alcohol_mg_l: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_magnitude: Option<f64>,
}

/// A stored reading. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalRecord {
    pub id: Uuid,
    pub patient_id: PatientId,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "body_temperature_C")]
    pub body_temperature_c: Option<f64>,
    pub humidity_percent: f64,
    pub spo2_percent: Option<f64>,
    pub ecg_bpm: Option<f64>,
    #[serde(rename = "bp_systolic_mmHg")]
    pub bp_systolic_mmhg: Option<f64>,
    #[serde(rename = "bp_diastolic_mmHg")]
    pub bp_diastolic_mmhg: Option<f64>,
    #[serde(rename = "alcohol_mg_L")]
    pub alcohol_mg_l: f64,
    pub motion_magnitude: f64,
}

impl VitalRecord {
    /// Validates an ingest packet and fills the humidity, alcohol and motion
    /// defaults. The caller assigns identity and time.
    pub fn from_input(input: VitalInput, id: Uuid, timestamp: DateTime<Utc>) -> ValidationResult<Self> {
        let patient_id = PatientId::new(input.patient_id)?;

        let values = [
            input.body_temperature_c,
            input.humidity_percent,
            input.spo2_percent,
            input.ecg_bpm,
            input.bp_systolic_mmhg,
            input.bp_diastolic_mmhg,
            input.alcohol_mg_l,
            input.motion_magnitude,
        ];
        for (name, value) in FEATURE_NAMES.iter().zip(values.iter()) {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ValidationError::NonFiniteFeature { feature: *name });
                }
            }
        }

        Ok(Self {
            id,
            patient_id,
            timestamp,
            body_temperature_c: input.body_temperature_c,
            humidity_percent: input.humidity_percent.unwrap_or(DEFAULT_HUMIDITY_PERCENT),
            spo2_percent: input.spo2_percent,
            ecg_bpm: input.ecg_bpm,
            bp_systolic_mmhg: input.bp_systolic_mmhg,
            bp_diastolic_mmhg: input.bp_diastolic_mmhg,
            alcohol_mg_l: input.alcohol_mg_l.unwrap_or(DEFAULT_ALCOHOL_MG_L),
            motion_magnitude: input.motion_magnitude.unwrap_or(DEFAULT_MOTION_MAGNITUDE),
        })
    }

    /// Classifier input in `FEATURE_NAMES` order; absent readings become 0.
    pub fn feature_vector(&self) -> FeatureVector {
        [
            self.body_temperature_c.unwrap_or(0.0),
            self.humidity_percent,
            self.spo2_percent.unwrap_or(0.0),
            self.ecg_bpm.unwrap_or(0.0),
            self.bp_systolic_mmhg.unwrap_or(0.0),
            self.bp_diastolic_mmhg.unwrap_or(0.0),
            self.alcohol_mg_l,
            self.motion_magnitude,
        ]
    }

    pub fn heart_rate(&self) -> f64 {
        self.ecg_bpm.unwrap_or(FALLBACK_HEART_RATE)
    }

    pub fn spo2(&self) -> f64 {
        self.spo2_percent.unwrap_or(FALLBACK_SPO2)
    }

    /// ISO-8601 rendering used in the audit fingerprint. Matches the serde
    /// rendering of `timestamp`, so a client can recompute the digest from
    /// the JSON it receives.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// One row of a training table: the eight features plus a binary label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub features: FeatureVector,
    pub is_abnormal: u8,
}

impl LabeledSample {
    pub fn new(features: FeatureVector, is_abnormal: u8) -> ValidationResult<Self> {
        if is_abnormal > 1 {
            return Err(ValidationError::InvalidLabel(is_abnormal));
        }
        Ok(Self { features, is_abnormal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet() -> VitalInput {
        VitalInput {
            patient_id: "patient_001".to_string(),
            body_temperature_c: Some(36.6),
            spo2_percent: Some(98.0),
            ecg_bpm: Some(75.0),
            bp_systolic_mmhg: Some(120.0),
            bp_diastolic_mmhg: Some(80.0),
            ..Default::default()
        }
    }

    #[test]
    fn from_input_fills_ingest_defaults() {
        let record = VitalRecord::from_input(packet(), Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(record.humidity_percent, DEFAULT_HUMIDITY_PERCENT);
        assert_eq!(record.alcohol_mg_l, DEFAULT_ALCOHOL_MG_L);
        assert_eq!(record.motion_magnitude, DEFAULT_MOTION_MAGNITUDE);
        assert_eq!(
            record.feature_vector(),
            [36.6, 50.0, 98.0, 75.0, 120.0, 80.0, 0.0, 0.5]
        );
    }

    #[test]
    fn absent_vitals_use_downstream_fallbacks() {
        let input = VitalInput { patient_id: "patient_009".into(), ..Default::default() };
        let record = VitalRecord::from_input(input, Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(record.heart_rate(), FALLBACK_HEART_RATE);
        assert_eq!(record.spo2(), FALLBACK_SPO2);
        assert_eq!(record.feature_vector()[2], 0.0);
        assert_eq!(record.feature_vector()[3], 0.0);
    }

    #[test]
    fn from_input_rejects_empty_patient_and_non_finite_values() {
        let input = VitalInput { patient_id: String::new(), ..packet() };
        assert_eq!(
            VitalRecord::from_input(input, Uuid::new_v4(), Utc::now()).unwrap_err(),
            ValidationError::InvalidIdentifierLength
        );

        let input = VitalInput { ecg_bpm: Some(f64::NAN), ..packet() };
        assert_eq!(
            VitalRecord::from_input(input, Uuid::new_v4(), Utc::now()).unwrap_err(),
            ValidationError::NonFiniteFeature { feature: "ecg_bpm" }
        );
    }

    #[test]
    fn input_json_uses_sensor_field_names() {
        let json = r#"{"patient_id":"patient_003","body_temperature_C":36.5,"bp_systolic_mmHg":145,"alcohol_mg_L":0.1}"#;
        let input: VitalInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.body_temperature_c, Some(36.5));
        assert_eq!(input.bp_systolic_mmhg, Some(145.0));
        assert_eq!(input.alcohol_mg_l, Some(0.1));
        assert_eq!(input.motion_magnitude, None);
    }

    #[test]
    fn iso_timestamp_matches_serialized_timestamp() {
        let record = VitalRecord::from_input(packet(), Uuid::new_v4(), Utc::now()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["timestamp"], record.timestamp_iso());
        assert!(record.timestamp_iso().ends_with('Z'));
    }

    #[test]
    fn feature_names_are_validated_in_order() {
        assert!(validate_feature_names(&FEATURE_NAMES).is_ok());
        let mut swapped = FEATURE_NAMES;
        swapped.swap(2, 3);
        assert!(validate_feature_names(&swapped).is_err());
        assert!(validate_feature_names(&FEATURE_NAMES[..7]).is_err());
    }

    #[test]
    fn labeled_sample_rejects_non_binary_label() {
        assert_eq!(
            LabeledSample::new([0.0; FEATURE_COUNT], 2).unwrap_err(),
            ValidationError::InvalidLabel(2)
        );
    }
}
