// lib/src/simulator/mod.rs
// Synthetic ICU patients, recorded heart-rate replay and training data.

pub mod dataset;
pub mod generator;
pub mod recordings;
pub mod ward;

pub use dataset::{generate_augmented, read_training_csv, write_training_csv, Scenario};
pub use generator::{Archetype, SyntheticPatient, Tick};
pub use recordings::{bpm_from_peaks, load_bpm_series, sampling_frequency};
pub use ward::{default_ward, run_ward, HttpSink, PacketSink, ServiceSink, Ward, WardBed};
