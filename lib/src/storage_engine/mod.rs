// lib/src/storage_engine/mod.rs

pub mod inmemory_storage;
pub mod sled_storage;
pub mod storage_engine;
pub mod storage_utils;

pub use inmemory_storage::InMemoryStorage;
pub use sled_storage::{open_sled_db, SledStorage};
pub use storage_engine::VitalStore;

use std::sync::Arc;

use crate::config::{StorageConfig, StorageEngineType};
use crate::errors::Result;

/// Creates a vital store instance based on the provided configuration.
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn VitalStore>> {
    match config.engine_type {
        StorageEngineType::Sled => Ok(Arc::new(SledStorage::open(config)?) as Arc<dyn VitalStore>),
        StorageEngineType::InMemory => Ok(Arc::new(InMemoryStorage::new()) as Arc<dyn VitalStore>),
    }
}
