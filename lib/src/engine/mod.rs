// lib/src/engine/mod.rs
// Clinical decision engine: trend forecasting, classifier fusion, audit hashing.

pub mod audit;
pub mod classifier;
pub mod forecast;
pub mod fusion;
pub mod training;

pub use audit::{fingerprint, fingerprint_record};
pub use classifier::{Classifier, GaussianNaiveBayes, TrainingReport};
pub use forecast::{ForecastError, TrendForecaster, FORECAST_WINDOW, HISTORY_DEPTH};
pub use fusion::FusionEngine;
pub use training::train_from_config;
