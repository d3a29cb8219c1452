//! Configuration loading and parsing

use anyhow::{Context, Result};
use carstate_fusion::{FusionConfig, VehicleModel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VehicleConfig {
    pub model: VehicleModel,
    /// Vehicle DBC holding the shift lever value table
    pub dbc: PathBuf,
    /// Stored unit preference
    #[serde(default = "default_true")]
    pub is_metric: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// JSON-lines recording of per-tick signal tables
    pub replay: Option<PathBuf>,
    /// Output file for snapshots (default: stdout)
    pub output: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .fusion
        .validate()
        .with_context(|| format!("Invalid [fusion] section in {:?}", path))?;

    Ok(config)
}
