// lib/src/storage_engine/inmemory_storage.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use models::{PatientId, VitalRecord};

use super::storage_engine::VitalStore;
use crate::errors::Result;

/// Process-local store for tests and demo runs without a data directory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    records: Arc<RwLock<HashMap<PatientId, Vec<VitalRecord>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VitalStore for InMemoryStorage {
    async fn insert(&self, record: &VitalRecord) -> Result<()> {
        let mut records = self.records.write().await;
        let series = records.entry(record.patient_id.clone()).or_default();
        // Equal timestamps keep arrival order.
        let at = series.partition_point(|r| r.timestamp <= record.timestamp);
        series.insert(at, record.clone());
        Ok(())
    }

    async fn latest(&self, patient_id: &PatientId, limit: usize) -> Result<Vec<VitalRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(patient_id)
            .map(|series| series.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, patient_id: &PatientId) -> Result<u64> {
        let records = self.records.read().await;
        Ok(records.get(patient_id).map_or(0, |series| series.len() as u64))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn get_type(&self) -> &'static str {
        "InMemory"
    }
}
