// lib/src/lib.rs
// Clinical decision node: vital stores, trend forecasting, decision fusion,
// classifier and the synthetic ward.

pub mod config;
pub mod engine;
pub mod errors;
pub mod service;
pub mod simulator;
pub mod storage_engine;

pub use crate::errors::{ClinicalError, Result};
pub use crate::service::{baseline_progress, AuditedVitals, ClinicalService, HealthReport, StatusReport};
pub use crate::storage_engine::{create_store, open_sled_db, InMemoryStorage, SledStorage, VitalStore};
