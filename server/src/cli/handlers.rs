// server/src/cli/handlers.rs

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::oneshot;

use lib::config::{AppConfig, StorageEngineType};
use lib::engine::train_from_config;
use lib::service::ClinicalService;
use lib::simulator::{generate_augmented, run_ward, write_training_csv, HttpSink, ServiceSink, Ward};

use crate::cli::commands::{
    GenerateDatasetArgs, LaunchArgs, ServeArgs, ServerOverrides, SimulateArgs, TrainArgs, WardOverrides,
};

pub fn apply_server_overrides(config: &mut AppConfig, overrides: &ServerOverrides) -> Result<()> {
    if let Some(host) = &overrides.host {
        config.rest.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.rest.port = port;
    }
    if let Some(dir) = &overrides.data_directory {
        config.storage.data_directory = dir.clone();
    }
    if let Some(engine) = &overrides.storage_engine_type {
        config.storage.engine_type = engine.parse::<StorageEngineType>()?;
    }
    if let Some(path) = &overrides.model_path {
        config.classifier.model_path = path.clone();
    }
    Ok(())
}

pub fn apply_ward_overrides(config: &mut AppConfig, overrides: &WardOverrides) {
    if let Some(tick_ms) = overrides.tick_ms {
        config.simulator.tick_ms = tick_ms;
    }
    if let Some(dir) = &overrides.recordings_directory {
        config.simulator.recordings_directory = Some(dir.clone());
    }
    if overrides.seed.is_some() {
        config.simulator.seed = overrides.seed;
    }
}

fn listen_addr(config: &AppConfig) -> Result<SocketAddr> {
    format!("{}:{}", config.rest.host, config.rest.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.rest.host, config.rest.port))
}

/// Resolves on Ctrl-C and fires the server shutdown channel.
fn shutdown_on_ctrl_c() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Ctrl-C received, shutting down.");
        let _ = tx.send(());
    });
    rx
}

pub async fn handle_serve(mut config: AppConfig, args: ServeArgs) -> Result<()> {
    apply_server_overrides(&mut config, &args.server)?;
    config.validate()?;
    let addr = listen_addr(&config)?;
    let service = Arc::new(ClinicalService::from_config(&config).context("Failed to start clinical service")?);
    rest_api::start_server(addr, service, shutdown_on_ctrl_c()).await
}

pub async fn handle_simulate(mut config: AppConfig, args: SimulateArgs) -> Result<()> {
    apply_ward_overrides(&mut config, &args.ward);
    if let Some(url) = args.url {
        config.simulator.backend_url = url;
    }
    config.validate()?;

    let ward = Ward::from_config(&config.simulator)?;
    let sink = HttpSink::from_config(&config.simulator)?;
    info!("--- CLINICAL VALIDATION SIMULATOR ---");
    tokio::select! {
        delivered = run_ward(ward, &sink, config.simulator.tick(), args.ward.count) => {
            info!("Simulator finished, {} packets delivered", delivered);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Simulator stopped.");
        }
    }
    Ok(())
}

pub async fn handle_train(mut config: AppConfig, args: TrainArgs) -> Result<()> {
    if let Some(csv) = args.csv {
        config.classifier.training_csv = csv;
    }
    if let Some(path) = args.model_path {
        config.classifier.model_path = path;
    }
    if let Some(samples) = args.samples {
        config.classifier.augmented_samples = samples;
    }
    if let Some(seed) = args.seed {
        config.classifier.seed = seed;
    }
    let report = train_from_config(&config.classifier).context("Training failed")?;
    println!(
        "Model accuracy: {:.2}% on {} hold-out rows, saved to {:?}",
        report.accuracy * 100.0,
        report.test_samples,
        config.classifier.model_path
    );
    Ok(())
}

pub async fn handle_generate_dataset(config: AppConfig, args: GenerateDatasetArgs) -> Result<()> {
    let output = args.output.unwrap_or_else(|| config.classifier.training_csv.clone());
    let samples = args.samples.unwrap_or(config.classifier.augmented_samples);
    let mut rng = StdRng::seed_from_u64(args.seed.unwrap_or(config.classifier.seed));
    let rows = generate_augmented(samples, &mut rng);
    write_training_csv(&output, &rows).with_context(|| format!("Failed to write {:?}", output))?;
    println!("Wrote {} rows to {:?}", rows.len(), output);
    Ok(())
}

pub async fn handle_launch(mut config: AppConfig, args: LaunchArgs) -> Result<()> {
    apply_server_overrides(&mut config, &args.server)?;
    apply_ward_overrides(&mut config, &args.ward);
    config.validate()?;

    if args.retrain || !config.classifier.model_path.exists() {
        info!("Training classifier before launch...");
        train_from_config(&config.classifier).context("Training failed")?;
    }

    let addr = listen_addr(&config)?;
    let service = Arc::new(ClinicalService::from_config(&config).context("Failed to start clinical service")?);
    if !service.has_store() {
        return Err(anyhow!("Cannot launch the ward without a vital store"));
    }

    let ward = Ward::from_config(&config.simulator)?;
    let sink = ServiceSink::new(service.clone());
    let tick = config.simulator.tick();
    let count = args.ward.count;
    let feeder = tokio::spawn(async move { run_ward(ward, &sink, tick, count).await });

    let result = rest_api::start_server(addr, service, shutdown_on_ctrl_c()).await;
    feeder.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_overrides_replace_config_values() {
        let mut config = AppConfig::default();
        let overrides = ServerOverrides {
            port: Some(6100),
            storage_engine_type: Some("inmemory".into()),
            ..Default::default()
        };
        apply_server_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.rest.port, 6100);
        assert_eq!(config.storage.engine_type, StorageEngineType::InMemory);
        assert_eq!(listen_addr(&config).unwrap().port(), 6100);
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let mut config = AppConfig::default();
        let overrides = ServerOverrides { storage_engine_type: Some("rocksdb".into()), ..Default::default() };
        assert!(apply_server_overrides(&mut config, &overrides).is_err());
    }

    #[test]
    fn ward_overrides_keep_unset_values() {
        let mut config = AppConfig::default();
        let default_tick = config.simulator.tick_ms;
        apply_ward_overrides(&mut config, &WardOverrides { seed: Some(9), ..Default::default() });
        assert_eq!(config.simulator.seed, Some(9));
        assert_eq!(config.simulator.tick_ms, default_tick);
    }

    #[tokio::test]
    async fn generate_dataset_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("training_data.csv");
        let args = GenerateDatasetArgs { output: Some(output.clone()), samples: Some(25), seed: Some(1) };
        handle_generate_dataset(AppConfig::default(), args).await.unwrap();
        let rows = lib::simulator::read_training_csv(&output).unwrap();
        assert_eq!(rows.len(), 25);
    }
}
