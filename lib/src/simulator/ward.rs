// lib/src/simulator/ward.rs

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;
use tokio::time::{interval, MissedTickBehavior};

use models::{PatientId, VitalInput};

use super::generator::{Archetype, SyntheticPatient};
use super::recordings::load_bpm_series_or_empty;
use crate::config::SimulatorConfig;
use crate::errors::{ClinicalError, Result};
use crate::service::ClinicalService;

/// A monitored bed: who lies in it, how they behave and which ECG record
/// drives their heart rate.
#[derive(Debug, Clone, PartialEq)]
pub struct WardBed {
    pub patient_id: PatientId,
    pub archetype: Archetype,
    pub record: Option<String>,
}

impl WardBed {
    pub fn new(patient_id: &str, archetype: Archetype, record: Option<&str>) -> Result<Self> {
        Ok(WardBed {
            patient_id: PatientId::new(patient_id)?,
            archetype,
            record: record.map(str::to_string),
        })
    }
}

pub fn default_ward() -> Result<Vec<WardBed>> {
    Ok(vec![
        WardBed::new("patient_001", Archetype::Stable, Some("100"))?,
        WardBed::new("patient_002", Archetype::Acute, Some("203"))?,
        WardBed::new("patient_003", Archetype::Chronic, Some("chf01"))?,
        WardBed::new("patient_004", Archetype::Noisy, Some("118e_6"))?,
    ])
}

/// Round-robin feeder over a set of synthetic patients.
pub struct Ward {
    patients: Vec<SyntheticPatient>,
    rng: StdRng,
    cursor: usize,
}

impl Ward {
    pub fn new(beds: Vec<WardBed>, recordings_directory: Option<&Path>, seed: Option<u64>) -> Result<Self> {
        if beds.is_empty() {
            return Err(ClinicalError::InvalidData("ward has no patients".into()));
        }
        let patients = beds
            .into_iter()
            .map(|bed| {
                let patient = SyntheticPatient::new(bed.patient_id, bed.archetype);
                match (recordings_directory, bed.record.as_deref()) {
                    (Some(dir), Some(record)) => patient.with_recording(load_bpm_series_or_empty(dir, record)),
                    _ => patient,
                }
            })
            .collect();
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Ward { patients, rng, cursor: 0 })
    }

    pub fn from_config(config: &SimulatorConfig) -> Result<Self> {
        Self::new(default_ward()?, config.recordings_directory.as_deref(), config.seed)
    }

    pub fn patients(&self) -> &[SyntheticPatient] {
        &self.patients
    }

    pub fn next_packet(&mut self) -> VitalInput {
        let bed = self.cursor;
        self.cursor = (self.cursor + 1) % self.patients.len();
        self.patients[bed].next_packet(&mut self.rng).packet
    }
}

/// Destination for generated packets.
#[async_trait]
pub trait PacketSink: Send + Sync {
    async fn deliver(&self, packet: &VitalInput) -> Result<()>;
    fn describe(&self) -> String;
}

/// Posts packets as JSON to a running ingest endpoint.
pub struct HttpSink {
    client: Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpSink { client, url: url.into() })
    }

    pub fn from_config(config: &SimulatorConfig) -> Result<Self> {
        Self::new(config.backend_url.clone(), Duration::from_millis(config.request_timeout_ms))
    }
}

#[async_trait]
impl PacketSink for HttpSink {
    async fn deliver(&self, packet: &VitalInput) -> Result<()> {
        self.client.post(&self.url).json(packet).send().await?.error_for_status()?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Inserts packets straight into an in-process service.
pub struct ServiceSink {
    service: Arc<ClinicalService>,
}

impl ServiceSink {
    pub fn new(service: Arc<ClinicalService>) -> Self {
        ServiceSink { service }
    }
}

#[async_trait]
impl PacketSink for ServiceSink {
    async fn deliver(&self, packet: &VitalInput) -> Result<()> {
        self.service.ingest(packet.clone()).await.map(|_| ())
    }

    fn describe(&self) -> String {
        "in-process service".to_string()
    }
}

/// Feeds the ward one packet per tick until `max_packets` have been
/// attempted, or forever. Delivery failures are logged and skipped.
/// Returns the number of packets delivered.
pub async fn run_ward(mut ward: Ward, sink: &dyn PacketSink, tick: Duration, max_packets: Option<u64>) -> u64 {
    info!(
        "Clinical ward feeding {} patients to {} every {:?}",
        ward.patients().len(),
        sink.describe(),
        tick
    );
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempted = 0u64;
    let mut delivered = 0u64;
    while max_packets.map_or(true, |max| attempted < max) {
        ticker.tick().await;
        let packet = ward.next_packet();
        attempted += 1;
        match sink.deliver(&packet).await {
            Ok(()) => {
                delivered += 1;
                debug!(
                    "[ICU] {} | HR {:?} | SpO2 {:?} | motion {:?}",
                    packet.patient_id, packet.ecg_bpm, packet.spo2_percent, packet.motion_magnitude
                );
            }
            Err(e) => warn!("Failed to deliver packet for {}: {}", packet.patient_id, e),
        }
    }
    info!("Clinical ward stopped after {} of {} packets delivered", delivered, attempted);
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClinicalThresholds;
    use crate::storage_engine::{InMemoryStorage, VitalStore};

    #[test]
    fn default_ward_has_four_archetypes() {
        let beds = default_ward().unwrap();
        let archetypes: Vec<Archetype> = beds.iter().map(|b| b.archetype).collect();
        assert_eq!(archetypes, vec![Archetype::Stable, Archetype::Acute, Archetype::Chronic, Archetype::Noisy]);
        assert_eq!(beds[2].record.as_deref(), Some("chf01"));
    }

    #[test]
    fn packets_rotate_through_patients() {
        let mut ward = Ward::new(default_ward().unwrap(), None, Some(3)).unwrap();
        let ids: Vec<String> = (0..8).map(|_| ward.next_packet().patient_id).collect();
        assert_eq!(&ids[..4], &["patient_001", "patient_002", "patient_003", "patient_004"]);
        assert_eq!(ids[..4], ids[4..]);
    }

    #[test]
    fn empty_ward_is_rejected() {
        assert!(Ward::new(Vec::new(), None, None).is_err());
    }

    #[tokio::test]
    async fn feeds_in_process_service() {
        let store = Arc::new(InMemoryStorage::new());
        let service = Arc::new(ClinicalService::new(
            Some(store.clone() as Arc<dyn VitalStore>),
            None,
            ClinicalThresholds::default(),
            Duration::from_secs(1),
        ));
        let ward = Ward::new(default_ward().unwrap(), None, Some(1)).unwrap();
        let sink = ServiceSink::new(service);
        let delivered = run_ward(ward, &sink, Duration::from_millis(1), Some(8)).await;
        assert_eq!(delivered, 8);
        for id in ["patient_001", "patient_002", "patient_003", "patient_004"] {
            assert_eq!(store.count(&PatientId::new(id).unwrap()).await.unwrap(), 2);
        }
    }

    #[tokio::test]
    async fn failed_deliveries_are_skipped() {
        let service = Arc::new(ClinicalService::new(None, None, ClinicalThresholds::default(), Duration::from_secs(1)));
        let ward = Ward::new(default_ward().unwrap(), None, Some(1)).unwrap();
        let delivered = run_ward(ward, &ServiceSink::new(service), Duration::from_millis(1), Some(3)).await;
        assert_eq!(delivered, 0);
    }
}
