use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scope::CaptureSettings;
use crate::transport::tcp::DEFAULT_PORT;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub connection: ConnectionSettings,
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    /// Read timeout applied once when the session is built
    pub timeout_ms: u64,
    pub debug: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    pub output_dir: String,
    pub image_buffer_bytes: usize,
    pub record_length: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: 5_000,
            timeout_ms: 10_000,
            debug: false,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let defaults = CaptureSettings::default();
        Self {
            output_dir: defaults.output_dir.to_string_lossy().into_owned(),
            image_buffer_bytes: defaults.image_buffer_bytes,
            record_length: defaults.record_length,
        }
    }
}

impl CaptureConfig {
    pub fn settings(&self) -> CaptureSettings {
        CaptureSettings {
            output_dir: PathBuf::from(&self.output_dir),
            image_buffer_bytes: self.image_buffer_bytes,
            record_length: self.record_length,
        }
    }
}

/// Load configuration from file with layered fallbacks.
///
/// Defaults, then the TOML file (explicit path or `rusty_mdo.toml` in the
/// working directory), then `RUSTY_MDO__SECTION__KEY` environment variables.
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(File::from(path));
        } else {
            return Err(ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    } else if Path::new("rusty_mdo.toml").exists() {
        builder = builder.add_source(File::with_name("rusty_mdo.toml"));
    }

    builder = builder.add_source(
        Environment::with_prefix("RUSTY_MDO")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize::<AppConfig>()
}

/// Load configuration, falling back to defaults on any error
pub fn load_config_or_default(config_path: Option<&Path>) -> AppConfig {
    match load_config(config_path) {
        Ok(config) => {
            log::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            log::warn!("Failed to load config ({}), using defaults", e);
            AppConfig::default()
        }
    }
}
