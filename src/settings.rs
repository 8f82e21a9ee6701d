use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Settings for one SL50 collector, as supplied by the host
#[derive(Debug, Clone, Deserialize)]
pub struct UnitSettings {
    pub host: String,
    pub port: String,
    #[serde(default, rename = "serialnumber")]
    pub serial_number: String,
    pub entity: String,
    pub mappings: String, // JSON-encoded sensor mapping groups
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64, // per-request timeout
    #[serde(default)]
    pub allow_partial: bool, // emit pollutant-only records when the environmental feed is down
    #[serde(default)]
    pub parallel_fetch: bool,
    #[serde(default)]
    pub csv_export: Option<PathBuf>, // directory receiving readings.csv
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl UnitSettings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading settings from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let settings: UnitSettings = serde_json::from_str(text).map_err(ConfigError::Settings)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingSetting("host"));
        }
        if self.port.trim().is_empty() {
            return Err(ConfigError::MissingSetting("port"));
        }
        if self.port.trim().parse::<u16>().is_err() {
            return Err(ConfigError::InvalidPort(self.port.clone()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.entity.trim().is_empty() {
            return Err(ConfigError::MissingSetting("entity"));
        }
        if self.mappings.trim().is_empty() {
            return Err(ConfigError::MissingSetting("mappings"));
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host.trim(), self.port.trim())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
