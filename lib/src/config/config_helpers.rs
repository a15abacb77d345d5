// lib/src/config/config_helpers.rs

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use log::{debug, info};

use crate::config::config_defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
use crate::config::AppConfig;
use crate::errors::Result;

/// Loads configuration: built-in defaults, then the YAML file (required only
/// when passed explicitly), then `EZYMEDI__SECTION__KEY` variables. A `.env`
/// file in the working directory is honoured.
pub fn load_app_config(config_file: Option<&Path>) -> Result<AppConfig> {
    dotenv::dotenv().ok();

    match config_file {
        Some(path) => load_layered(path, true),
        None => load_layered(&PathBuf::from(DEFAULT_CONFIG_FILE), false),
    }
}

fn load_layered(path: &Path, required: bool) -> Result<AppConfig> {
    debug!("Loading configuration from {:?} (required: {})", path, required);

    let settings = Config::builder()
        .add_source(File::from(path).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    info!(
        "Configuration loaded: storage={} rest={}:{}",
        app_config.storage.engine_type, app_config.rest.host, app_config.rest.port
    );
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageEngineType;
    use std::io::Write;

    #[test]
    fn absent_optional_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_layered(&dir.path().join(DEFAULT_CONFIG_FILE), false).unwrap();
        assert_eq!(cfg.rest.port, 5001);
        assert_eq!(cfg.thresholds.critical_spo2, 93.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn yaml_file_overrides_selected_keys() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "storage:\n  engine_type: inmemory\nthresholds:\n  velocity_bpm_rise: 15\nrest:\n  port: 8088"
        )
        .unwrap();

        let cfg = load_app_config(Some(file.path())).unwrap();
        assert_eq!(cfg.storage.engine_type, StorageEngineType::InMemory);
        assert_eq!(cfg.thresholds.velocity_bpm_rise, 15.0);
        assert_eq!(cfg.thresholds.decay_spo2_threshold, 94.0);
        assert_eq!(cfg.rest.port, 8088);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(load_app_config(Some(Path::new("/nonexistent/ezymedi.yaml"))).is_err());
    }

    #[test]
    fn inverted_heart_rate_band_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.thresholds.healthy_hr_min = 100.0;
        assert!(cfg.validate().is_err());
    }
}
