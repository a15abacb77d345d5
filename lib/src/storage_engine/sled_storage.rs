// lib/src/storage_engine/sled_storage.rs

use std::path::Path;

use async_trait::async_trait;
use log::{debug, error, info};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};

use models::{validate_feature_names, PatientId, VitalRecord, FEATURE_NAMES};

use super::storage_engine::VitalStore;
use super::storage_utils::{
    decode_count, deserialize_record, encode_count, patient_prefix, record_key, serialize_record,
};
use crate::config::StorageConfig;
use crate::errors::{ClinicalError, Result};

const RECORDS_TREE: &str = "vitals";
const COUNTS_TREE: &str = "vital_counts";
const META_TREE: &str = "meta";
const SCHEMA_KEY: &str = "feature_names";

/// Opens (creating if needed) the sled database under `path`.
pub fn open_sled_db(path: &Path, cache_capacity: u64) -> Result<Db> {
    if !path.exists() {
        info!("Creating database directory at {:?}", path);
        std::fs::create_dir_all(path).map_err(|e| {
            error!("Failed to create database directory at {:?}: {}", path, e);
            ClinicalError::StoreUnavailable(format!("Failed to create database directory at {:?}: {}", path, e))
        })?;
    }

    sled::Config::new()
        .path(path)
        .cache_capacity(cache_capacity)
        .open()
        .map_err(|e| {
            error!("Failed to open Sled database at {:?}: {}", path, e);
            ClinicalError::StoreUnavailable(format!("Failed to open Sled database at {:?}: {}", path, e))
        })
}

/// Sled-backed vital store. Records live in one tree keyed for reverse
/// prefix scans; per-patient counts are kept in a second tree and updated in
/// the same transaction as the insert.
#[derive(Debug, Clone)]
pub struct SledStorage {
    db: Db,
    records: Tree,
    counts: Tree,
}

impl SledStorage {
    pub fn new(db: Db) -> Result<Self> {
        let records = db.open_tree(RECORDS_TREE)?;
        let counts = db.open_tree(COUNTS_TREE)?;
        let storage = SledStorage { db, records, counts };
        storage.ensure_schema()?;
        Ok(storage)
    }

    pub fn open(config: &StorageConfig) -> Result<Self> {
        info!("Initializing SledStorage at {:?}", config.data_directory);
        let db = open_sled_db(&config.data_directory, config.cache_capacity)?;
        Self::new(db)
    }

    /// Stamps a fresh database with `FEATURE_NAMES` and refuses to open one
    /// written under a different feature order.
    fn ensure_schema(&self) -> Result<()> {
        let meta = self.db.open_tree(META_TREE)?;
        match meta.get(SCHEMA_KEY)? {
            Some(stored) => {
                let names: Vec<String> = serde_json::from_slice(&stored)?;
                validate_feature_names(&names)?;
                debug!("Sled store schema verified ({} features)", names.len());
            }
            None => {
                let names = serde_json::to_vec(&FEATURE_NAMES)?;
                meta.insert(SCHEMA_KEY, names)?;
                meta.flush()?;
                info!("Sled store stamped with feature schema");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VitalStore for SledStorage {
    async fn insert(&self, record: &VitalRecord) -> Result<()> {
        let sequence = self.db.generate_id()?;
        let key = record_key(record, sequence)?;
        let value = serialize_record(record)?;
        let patient_key = record.patient_id.as_bytes().to_vec();
        let (records, counts) = (self.records.clone(), self.counts.clone());

        tokio::task::spawn_blocking(move || {
            (&records, &counts)
                .transaction(|(records, counts)| {
                    records.insert(key.as_slice(), value.as_slice())?;
                    let current = counts.get(patient_key.as_slice())?.map_or(0, |v| decode_count(&v));
                    counts.insert(patient_key.as_slice(), encode_count(current + 1))?;
                    Ok::<(), ConflictableTransactionError<()>>(())
                })
                .map_err(|e: TransactionError<()>| {
                    ClinicalError::StoreUnavailable(format!("Failed to append vital record: {:?}", e))
                })
        })
        .await?
    }

    async fn latest(&self, patient_id: &PatientId, limit: usize) -> Result<Vec<VitalRecord>> {
        let prefix = patient_prefix(patient_id);
        let records = self.records.clone();

        tokio::task::spawn_blocking(move || {
            records
                .scan_prefix(prefix)
                .rev()
                .take(limit)
                .map(|item| {
                    let (_key, value) = item?;
                    deserialize_record(&value)
                })
                .collect::<Result<Vec<_>>>()
        })
        .await?
    }

    async fn count(&self, patient_id: &PatientId) -> Result<u64> {
        Ok(self
            .counts
            .get(patient_id.as_bytes())?
            .map_or(0, |v| decode_count(&v)))
    }

    async fn ping(&self) -> Result<()> {
        // A read against the meta tree fails once the database is gone.
        self.db.open_tree(META_TREE)?.get(SCHEMA_KEY)?;
        Ok(())
    }

    fn get_type(&self) -> &'static str {
        "Sled"
    }
}
