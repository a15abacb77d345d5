// models/src/lib.rs
// Shared record types for the ingest store, the decision engine and the simulator.

pub mod clinical;
pub mod errors;
pub mod identifiers;
pub mod vitals;

pub use clinical::{AlertCode, AnomalyReport, ClinicalStatus, ForecastLabel};
pub use errors::{ValidationError, ValidationResult};
pub use identifiers::PatientId;
pub use vitals::{
    validate_feature_names, FeatureVector, LabeledSample, VitalInput, VitalRecord, FEATURE_COUNT,
    FEATURE_NAMES, LABEL_COLUMN,
};
