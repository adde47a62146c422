//! Configuration loading and config file resolution
//!
//! Settings resolve with ENV → TOML file → compiled default priority.
//! The TOML file lives in the platform config directory
//! (e.g. `~/.config/supermango/config.toml` on Linux).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Service configuration as read from the TOML file
///
/// Every field is optional; the service applies ENV overrides and
/// compiled defaults on top (see `mango-api::config`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Address the HTTP listener binds to (e.g. "0.0.0.0:8000")
    pub bind_address: Option<String>,

    /// Path to the frozen ONNX severity model weights
    pub model_path: Option<String>,

    /// Pl@ntNet API key for species verification
    pub plantnet_api_key: Option<String>,

    /// Override for the Pl@ntNet identify endpoint base URL
    pub plantnet_base_url: Option<String>,

    /// Override path for the recommendation table resource
    pub recommendations_path: Option<String>,

    /// Origins allowed by the CORS layer; empty list allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Locate the configuration file for the platform
///
/// Checks the user config directory first, then `/etc/supermango` on
/// Linux. Returns an error when no file exists.
pub fn config_file_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("supermango").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/supermango/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load the platform config file if one exists, empty config otherwise
pub fn load_or_default() -> Result<TomlConfig> {
    match config_file_path() {
        Ok(path) => {
            tracing::info!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        Err(_) => Ok(TomlConfig::default()),
    }
}
