// lib/src/simulator/generator.rs

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use models::{PatientId, VitalInput};

use crate::errors::{ClinicalError, Result};

const INITIAL_SPO2: f64 = 98.5;
const BASE_TEMPERATURE: f64 = 36.6;
const BASELINE_HEART_RATE: f64 = 75.0;

/// Physiological behaviour a synthetic patient follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Stable,
    Acute,
    Chronic,
    Noisy,
}

impl FromStr for Archetype {
    type Err = ClinicalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stable" => Ok(Archetype::Stable),
            "acute" => Ok(Archetype::Acute),
            "chronic" => Ok(Archetype::Chronic),
            "noisy" => Ok(Archetype::Noisy),
            _ => Err(ClinicalError::InvalidData(format!("Unknown patient archetype: {}", s))),
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Archetype::Stable => "Stable",
            Archetype::Acute => "Acute",
            Archetype::Chronic => "Chronic",
            Archetype::Noisy => "Noisy",
        };
        f.write_str(name)
    }
}

/// One generated packet plus the SpO2 value before clamping and truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub packet: VitalInput,
    pub raw_spo2: f64,
}

/// Stateful per-patient vital sign generator. Each instance is owned by a
/// single feeder and is never shared.
#[derive(Debug, Clone)]
pub struct SyntheticPatient {
    patient_id: PatientId,
    archetype: Archetype,
    current_spo2: f64,
    base_temp: f64,
    index: u64,
    bpm_source: Vec<f64>,
}

impl SyntheticPatient {
    pub fn new(patient_id: PatientId, archetype: Archetype) -> Self {
        SyntheticPatient {
            patient_id,
            archetype,
            current_spo2: INITIAL_SPO2,
            base_temp: BASE_TEMPERATURE,
            index: 0,
            bpm_source: Vec::new(),
        }
    }

    /// Replays a recorded beat-to-beat heart rate series instead of the
    /// synthetic baseline.
    pub fn with_recording(mut self, bpm_source: Vec<f64>) -> Self {
        self.bpm_source = bpm_source;
        self
    }

    pub fn patient_id(&self) -> &PatientId {
        &self.patient_id
    }

    pub fn next_packet<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Tick {
        let mut hr = if self.bpm_source.is_empty() {
            BASELINE_HEART_RATE + rng.gen_range(-5..=5) as f64
        } else {
            let recorded = self.bpm_source[(self.index % self.bpm_source.len() as u64) as usize];
            if self.archetype == Archetype::Noisy {
                recorded + rng.gen_range(-5.0..=5.0)
            } else {
                recorded
            }
        };
        self.index += 1;

        self.current_spo2 += rng.gen_range(-0.2..=0.2);
        if self.archetype == Archetype::Stable {
            self.current_spo2 = self.current_spo2.clamp(97.0, 99.4);
        }

        let mut spo2 = self.current_spo2;
        let mut motion = 0.5;
        match self.archetype {
            Archetype::Stable => {}
            Archetype::Acute => {
                if hr > 120.0 {
                    spo2 -= (self.index % 10) as f64 * 0.5;
                }
            }
            Archetype::Chronic => {
                spo2 = 98.0 - self.index as f64 * 0.05;
            }
            Archetype::Noisy => {
                motion = 5.8 + rng.gen_range(0.0..=2.0);
                if rng.gen::<f64>() > 0.8 {
                    spo2 -= rng.gen_range(1.0..=4.0);
                }
            }
        }

        let temperature = round1(self.base_temp + rng.gen_range(-0.1..=0.1));
        let systolic = if hr > 130.0 { 145.0 } else { 120.0 };
        let raw_spo2 = spo2;
        spo2 = spo2.clamp(70.0, 100.0).trunc();
        hr = hr.trunc().max(1.0);

        Tick {
            packet: VitalInput {
                patient_id: self.patient_id.to_string(),
                body_temperature_c: Some(temperature),
                humidity_percent: Some(50.0),
                spo2_percent: Some(spo2),
                ecg_bpm: Some(hr),
                bp_systolic_mmhg: Some(systolic),
                bp_diastolic_mmhg: Some(80.0),
                alcohol_mg_l: Some(0.0),
                motion_magnitude: Some(motion),
            },
            raw_spo2,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
