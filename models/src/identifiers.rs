// models/src/identifiers.rs

use core::ops::Deref;
use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use internment::Intern;

use crate::errors::{ValidationError, ValidationResult};

/// The default patient queried when a caller omits `patient_id`.
pub const DEFAULT_PATIENT_ID: &str = "patient_001";

/// A patient identifier: an interned string of 1 to 255 bytes.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatientId(Intern<String>);

impl PatientId {
    /// Creates a new patient identifier.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the `value` is not between 1 and 255
    /// bytes in length (inclusive).
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        let value = value.into();
        if value.is_empty() || value.len() > u8::MAX as usize {
            return Err(ValidationError::InvalidIdentifierLength);
        }

        Ok(Self(Intern::new(value)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

impl Default for PatientId {
    fn default() -> Self {
        Self(Intern::new(DEFAULT_PATIENT_ID.to_string()))
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for PatientId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl FromStr for PatientId {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for PatientId {
    type Error = ValidationError;

    fn try_from(value: String) -> ValidationResult<Self> {
        Self::new(value)
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PatientId> for String {
    fn from(value: PatientId) -> Self {
        value.0.to_string()
    }
}

impl PartialOrd for PatientId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PatientId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{PatientId, DEFAULT_PATIENT_ID};
    use crate::errors::ValidationError;
    use core::str::FromStr;

    #[test]
    fn should_not_create_empty_patient_id() {
        let id = PatientId::new("");
        assert_eq!(id.unwrap_err(), ValidationError::InvalidIdentifierLength);
    }

    #[test]
    fn should_not_create_too_long_patient_id() {
        let id = PatientId::new("p".repeat(256));
        assert_eq!(id.unwrap_err(), ValidationError::InvalidIdentifierLength);
    }

    #[test]
    fn should_convert_patient_id_from_str() {
        let id = PatientId::from_str("patient_002").unwrap();
        assert_eq!(id.as_str(), "patient_002");
        assert_eq!(PatientId::default().as_str(), DEFAULT_PATIENT_ID);
    }

    #[test]
    fn should_reject_empty_patient_id_in_json() {
        let parsed: Result<PatientId, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
        let parsed: PatientId = serde_json::from_str("\"patient_004\"").unwrap();
        assert_eq!(parsed.to_string(), "patient_004");
    }
}
