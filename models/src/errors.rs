// models/src/errors.rs

pub use thiserror::Error;

/// A validation error raised at the ingest boundary or when a persisted
/// artifact disagrees with the shared feature schema.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A patient identifier has an invalid length.
    #[error("patient identifier must be between 1 and 255 bytes")]
    InvalidIdentifierLength,
    /// A feature carried a value that is not a finite number.
    #[error("feature {feature} has a non-finite value")]
    NonFiniteFeature { feature: &'static str },
    /// The feature list of a model file or store does not match `FEATURE_NAMES`.
    #[error("feature schema mismatch: expected [{expected}], found [{found}]")]
    FeatureSchemaMismatch { expected: String, found: String },
    /// A training label outside {0, 1}.
    #[error("label must be 0 or 1, found {0}")]
    InvalidLabel(u8),
}

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
