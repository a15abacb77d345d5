// lib/src/storage_engine/storage_engine.rs

use async_trait::async_trait;

use models::{PatientId, VitalRecord};

use crate::errors::Result;

/// Ordered, append-only persistence of vital records. Implementations must
/// accept concurrent inserts and reads; a read is a snapshot and never
/// observes a partially written record.
#[async_trait]
pub trait VitalStore: Send + Sync + 'static {
    /// Appends a record. Records are never updated or deleted.
    async fn insert(&self, record: &VitalRecord) -> Result<()>;
    /// The `limit` most recent records for a patient, newest first.
    async fn latest(&self, patient_id: &PatientId, limit: usize) -> Result<Vec<VitalRecord>>;
    /// Number of records ever stored for a patient.
    async fn count(&self, patient_id: &PatientId) -> Result<u64>;
    /// Cheap connectivity probe used by the health endpoint.
    async fn ping(&self) -> Result<()>;
    fn get_type(&self) -> &'static str;
}
