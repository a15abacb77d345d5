// lib/src/config/config_defaults.rs

use std::path::PathBuf;

use crate::config::StorageEngineType;

pub const DEFAULT_CONFIG_FILE: &str = "ezymedi.yaml";
pub const ENV_PREFIX: &str = "EZYMEDI";
pub const DEFAULT_DATA_DIRECTORY: &str = "data/vitals";

pub fn default_rest_host() -> String { "0.0.0.0".to_string() }
pub fn default_rest_port() -> u16 { 5001 }

pub fn default_storage_engine_type() -> StorageEngineType { StorageEngineType::Sled }
pub fn default_data_directory() -> PathBuf { PathBuf::from(DEFAULT_DATA_DIRECTORY) }
pub fn default_store_timeout_ms() -> u64 { 5000 }
pub fn default_cache_capacity() -> u64 { 64 * 1024 * 1024 }

pub fn default_model_path() -> PathBuf { PathBuf::from("ml_model/model.json") }
pub fn default_training_csv() -> PathBuf { PathBuf::from("training_data.csv") }
pub fn default_augmented_samples() -> usize { 3000 }
pub fn default_training_seed() -> u64 { 42 }

pub fn default_healthy_hr_min() -> f64 { 60.0 }
pub fn default_healthy_hr_max() -> f64 { 95.0 }
pub fn default_healthy_spo2_min() -> f64 { 96.0 }
pub fn default_motion_noise_threshold() -> f64 { 4.0 }
pub fn default_critical_spo2() -> f64 { 93.0 }
pub fn default_severe_tachycardia_bpm() -> f64 { 140.0 }
pub fn default_death_spiral_spo2_drop() -> f64 { 3.0 }
pub fn default_death_spiral_bpm_rise() -> f64 { 10.0 }
pub fn default_decay_spo2_threshold() -> f64 { 94.0 }
pub fn default_decay_tolerance() -> f64 { 1.0 }
pub fn default_velocity_bpm_rise() -> f64 { 20.0 }

pub fn default_tick_ms() -> u64 { 300 }
pub fn default_backend_url() -> String { "http://127.0.0.1:5001/api/vitals".to_string() }
pub fn default_recordings_directory() -> Option<PathBuf> { Some(PathBuf::from("backend/mit_bih_data")) }
pub fn default_request_timeout_ms() -> u64 { 5000 }
