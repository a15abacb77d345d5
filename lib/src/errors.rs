// lib/src/errors.rs

use thiserror::Error;

use models::errors::ValidationError;

#[derive(Debug, Error)]
pub enum ClinicalError {
    /// The vital store could not be reached, timed out or failed an operation.
    /// Surfaced to API callers as a degraded-service response.
    #[error("Vital store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Serialization/Deserialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input or data: {0}")]
    InvalidData(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Classifier error: {0}")]
    ClassifierError(String),

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Bincode decode error: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),

    #[error("Bincode encode error: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),

    #[error("JSON serialization/deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, ClinicalError>;

impl From<ValidationError> for ClinicalError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FeatureSchemaMismatch { .. } => ClinicalError::SchemaMismatch(err.to_string()),
            other => ClinicalError::InvalidData(other.to_string()),
        }
    }
}

impl From<sled::Error> for ClinicalError {
    fn from(err: sled::Error) -> Self {
        ClinicalError::StoreUnavailable(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ClinicalError {
    fn from(err: tokio::task::JoinError) -> Self {
        ClinicalError::InternalError(format!("Async task join error: {}", err))
    }
}

impl From<reqwest::Error> for ClinicalError {
    fn from(err: reqwest::Error) -> Self {
        ClinicalError::NetworkError(err.to_string())
    }
}

impl From<config::ConfigError> for ClinicalError {
    fn from(err: config::ConfigError) -> Self {
        ClinicalError::ConfigurationError(err.to_string())
    }
}
