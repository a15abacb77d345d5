// lib/src/service.rs

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

use models::{AnomalyReport, PatientId, VitalInput, VitalRecord};

use crate::config::{AppConfig, ClinicalThresholds};
use crate::engine::{fingerprint_record, Classifier, FusionEngine, GaussianNaiveBayes, TrendForecaster, HISTORY_DEPTH};
use crate::errors::{ClinicalError, Result};
use crate::storage_engine::{create_store, VitalStore};

pub const SERVICE_NAME: &str = "EzyMedi AI Node";
pub const SERVICE_MODE: &str = "Clinical Validation Node";
/// Records needed before the personal baseline counts as fully learned.
pub const BASELINE_TARGET: u64 = 1000;

/// Share of the personal baseline collected so far, in percent with one
/// decimal, capped at 100.
pub fn baseline_progress(count: u64) -> f64 {
    let percent = count as f64 / BASELINE_TARGET as f64 * 100.0;
    ((percent * 10.0).round() / 10.0).min(100.0)
}

/// A stored record together with its audit fingerprint.
#[derive(Debug, Clone, Serialize)]
pub struct AuditedVitals {
    #[serde(flatten)]
    pub record: VitalRecord,
    pub block_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub vitals: AuditedVitals,
    pub anomaly_report: AnomalyReport,
    pub forecast_description: &'static str,
    pub alert_messages: Vec<&'static str>,
    pub abp_progress: f64,
    pub mode: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub database: &'static str,
    pub ai_model: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Request-scoped entry point for ingest and status queries. Holds no
/// per-request state; both handles may be absent and the service degrades
/// instead of failing.
pub struct ClinicalService {
    store: Option<Arc<dyn VitalStore>>,
    classifier: Option<Arc<dyn Classifier>>,
    forecaster: TrendForecaster,
    fusion: FusionEngine,
    store_timeout: Duration,
    last_stamps: Mutex<HashMap<PatientId, DateTime<Utc>>>,
}

/// Next timestamp for a patient whose previous record carries `last`.
/// A clock that stalls or steps backwards is moved one nanosecond past it.
fn next_timestamp(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match last {
        Some(last) if now <= last => last + chrono::Duration::nanoseconds(1),
        _ => now,
    }
}

impl ClinicalService {
    pub fn new(
        store: Option<Arc<dyn VitalStore>>,
        classifier: Option<Arc<dyn Classifier>>,
        thresholds: ClinicalThresholds,
        store_timeout: Duration,
    ) -> Self {
        ClinicalService {
            store,
            classifier,
            forecaster: TrendForecaster::new(thresholds.clone()),
            fusion: FusionEngine::new(thresholds),
            store_timeout,
            last_stamps: Mutex::new(HashMap::new()),
        }
    }

    /// Opens the configured store and classifier. A store that cannot be
    /// opened leaves the service running offline; a store or model whose
    /// feature schema disagrees with this build is fatal.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = match create_store(&config.storage) {
            Ok(store) => {
                info!("Vital store ready: {}", store.get_type());
                Some(store)
            }
            Err(e @ ClinicalError::SchemaMismatch(_)) => return Err(e),
            Err(e) => {
                error!("DATABASE CONNECTION ERROR: {}", e);
                None
            }
        };

        let classifier = match GaussianNaiveBayes::load_optional(&config.classifier.model_path) {
            Ok(Some(model)) => {
                info!("AI model loaded from {:?}", config.classifier.model_path);
                Some(Arc::new(model) as Arc<dyn Classifier>)
            }
            Ok(None) => None,
            Err(e @ ClinicalError::SchemaMismatch(_)) => return Err(e),
            Err(e) => {
                error!("AI model could not be loaded: {}", e);
                None
            }
        };

        Ok(Self::new(store, classifier, config.thresholds.clone(), config.storage.timeout()))
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    fn store(&self) -> Result<&Arc<dyn VitalStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| ClinicalError::StoreUnavailable("No database connection established".into()))
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        timeout(self.store_timeout, operation).await.map_err(|_| {
            ClinicalError::StoreUnavailable(format!("store did not answer within {:?}", self.store_timeout))
        })?
    }

    /// Validates a packet, assigns its id and timestamp and appends it.
    /// Timestamps are strictly increasing per patient.
    pub async fn ingest(&self, input: VitalInput) -> Result<VitalRecord> {
        let store = self.store()?;
        let mut record = VitalRecord::from_input(input, Uuid::new_v4(), Utc::now())?;

        let mut stamps = self.last_stamps.lock().await;
        let last = match stamps.get(&record.patient_id) {
            Some(last) => Some(*last),
            None => self
                .bounded(store.latest(&record.patient_id, 1))
                .await?
                .first()
                .map(|previous| previous.timestamp),
        };
        record.timestamp = next_timestamp(last, record.timestamp);
        self.bounded(store.insert(&record)).await?;
        stamps.insert(record.patient_id.clone(), record.timestamp);
        drop(stamps);

        debug!("Stored vitals {} for {}", record.id, record.patient_id);
        Ok(record)
    }

    /// Evaluates the newest reading of a patient against its recent history.
    pub async fn latest_status(&self, patient_id: &PatientId) -> Result<StatusReport> {
        let store = self.store()?;
        let history = self.bounded(store.latest(patient_id, HISTORY_DEPTH)).await?;
        let latest = history
            .first()
            .cloned()
            .ok_or_else(|| ClinicalError::NotFound(format!("No data found for patient {}", patient_id)))?;
        let count = self.bounded(store.count(patient_id)).await?;

        let forecast = self.forecaster.forecast(&history);
        let verdict = self.classify(&latest);
        let anomaly_report = self.fusion.evaluate(&latest, verdict, forecast);
        if anomaly_report.is_abnormal() {
            info!("{} abnormal: {:?} ({})", patient_id, anomaly_report.alerts, forecast);
        }

        let block_hash = fingerprint_record(&latest);
        Ok(StatusReport {
            vitals: AuditedVitals { record: latest, block_hash },
            forecast_description: anomaly_report.forecast.description(),
            alert_messages: anomaly_report.alerts.iter().map(|alert| alert.message()).collect(),
            anomaly_report,
            abp_progress: baseline_progress(count),
            mode: SERVICE_MODE,
        })
    }

    /// Classifier verdict for one reading; 0 when no model is loaded or the
    /// model fails.
    fn classify(&self, record: &VitalRecord) -> u8 {
        let Some(classifier) = &self.classifier else {
            return 0;
        };
        match classifier.predict(&record.feature_vector()) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("{} prediction failed for {}: {}", classifier.name(), record.id, e);
                0
            }
        }
    }

    pub async fn health(&self) -> HealthReport {
        let database = match &self.store {
            Some(store) => match self.bounded(store.ping()).await {
                Ok(()) => "connected",
                Err(e) => {
                    warn!("Store ping failed: {}", e);
                    "offline"
                }
            },
            None => "offline",
        };
        HealthReport {
            status: "online",
            service: SERVICE_NAME,
            database,
            ai_model: if self.has_classifier() { "loaded" } else { "missing" },
            timestamp: Utc::now(),
        }
    }
}
