// lib/src/config/config_structs.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::config_defaults::*;
use crate::errors::{ClinicalError, Result};

/// Top-level configuration, assembled from defaults, an optional YAML file
/// and `EZYMEDI__*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub thresholds: ClinicalThresholds,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.simulator.tick_ms == 0 {
            return Err(ClinicalError::ConfigurationError("simulator.tick_ms must be positive".into()));
        }
        if self.storage.timeout_ms == 0 {
            return Err(ClinicalError::ConfigurationError("storage.timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_rest_host")]
    pub host: String,
    #[serde(default = "default_rest_port")]
    pub port: u16,
}

impl Default for RestConfig {
    fn default() -> Self {
        RestConfig { host: default_rest_host(), port: default_rest_port() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageEngineType {
    Sled,
    #[serde(alias = "in_memory", alias = "memory")]
    InMemory,
}

impl FromStr for StorageEngineType {
    type Err = ClinicalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StorageEngineType::Sled),
            "inmemory" | "in_memory" | "memory" => Ok(StorageEngineType::InMemory),
            _ => Err(ClinicalError::ConfigurationError(format!("Unknown storage engine type: {}", s))),
        }
    }
}

impl fmt::Display for StorageEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageEngineType::Sled => f.write_str("sled"),
            StorageEngineType::InMemory => f.write_str("inmemory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_engine_type")]
    pub engine_type: StorageEngineType,
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    /// Upper bound on any single store call.
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            engine_type: default_storage_engine_type(),
            data_directory: default_data_directory(),
            timeout_ms: default_store_timeout_ms(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_training_csv")]
    pub training_csv: PathBuf,
    #[serde(default = "default_augmented_samples")]
    pub augmented_samples: usize,
    #[serde(default = "default_training_seed")]
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            model_path: default_model_path(),
            training_csv: default_training_csv(),
            augmented_samples: default_augmented_samples(),
            seed: default_training_seed(),
        }
    }
}

/// Cut-offs used by the trend forecaster and the fusion guardrails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalThresholds {
    #[serde(default = "default_healthy_hr_min")]
    pub healthy_hr_min: f64,
    #[serde(default = "default_healthy_hr_max")]
    pub healthy_hr_max: f64,
    #[serde(default = "default_healthy_spo2_min")]
    pub healthy_spo2_min: f64,
    /// Motion magnitude above which a good SpO2 reading is treated as sensor artifact.
    #[serde(default = "default_motion_noise_threshold")]
    pub motion_noise_threshold: f64,
    /// SpO2 strictly below this is hypoxia.
    #[serde(default = "default_critical_spo2")]
    pub critical_spo2: f64,
    #[serde(default = "default_severe_tachycardia_bpm")]
    pub severe_tachycardia_bpm: f64,
    #[serde(default = "default_death_spiral_spo2_drop")]
    pub death_spiral_spo2_drop: f64,
    #[serde(default = "default_death_spiral_bpm_rise")]
    pub death_spiral_bpm_rise: f64,
    #[serde(default = "default_decay_spo2_threshold")]
    pub decay_spo2_threshold: f64,
    #[serde(default = "default_decay_tolerance")]
    pub decay_tolerance: f64,
    #[serde(default = "default_velocity_bpm_rise")]
    pub velocity_bpm_rise: f64,
}

impl Default for ClinicalThresholds {
    fn default() -> Self {
        ClinicalThresholds {
            healthy_hr_min: default_healthy_hr_min(),
            healthy_hr_max: default_healthy_hr_max(),
            healthy_spo2_min: default_healthy_spo2_min(),
            motion_noise_threshold: default_motion_noise_threshold(),
            critical_spo2: default_critical_spo2(),
            severe_tachycardia_bpm: default_severe_tachycardia_bpm(),
            death_spiral_spo2_drop: default_death_spiral_spo2_drop(),
            death_spiral_bpm_rise: default_death_spiral_bpm_rise(),
            decay_spo2_threshold: default_decay_spo2_threshold(),
            decay_tolerance: default_decay_tolerance(),
            velocity_bpm_rise: default_velocity_bpm_rise(),
        }
    }
}

impl ClinicalThresholds {
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.healthy_hr_min,
            self.healthy_hr_max,
            self.healthy_spo2_min,
            self.motion_noise_threshold,
            self.critical_spo2,
            self.severe_tachycardia_bpm,
            self.death_spiral_spo2_drop,
            self.death_spiral_bpm_rise,
            self.decay_spo2_threshold,
            self.decay_tolerance,
            self.velocity_bpm_rise,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ClinicalError::ConfigurationError(
                "clinical thresholds must be finite and non-negative".into(),
            ));
        }
        if self.healthy_hr_min > self.healthy_hr_max {
            return Err(ClinicalError::ConfigurationError(format!(
                "healthy heart-rate band is empty: {} > {}",
                self.healthy_hr_min, self.healthy_hr_max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Directory holding `<record>.rpeaks` beat annotations.
    #[serde(default = "default_recordings_directory")]
    pub recordings_directory: Option<PathBuf>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulatorConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            tick_ms: default_tick_ms(),
            backend_url: default_backend_url(),
            recordings_directory: default_recordings_directory(),
            request_timeout_ms: default_request_timeout_ms(),
            seed: None,
        }
    }
}
