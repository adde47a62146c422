//! Configuration resolution for mango-api
//!
//! Settings resolve with ENV → TOML priority on top of compiled
//! defaults. The model path is the only required setting: the service
//! cannot start without weights.

use mango_common::config::TomlConfig;
use mango_common::{Error, Result};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    /// Frozen ONNX severity weights
    pub model_path: PathBuf,
    pub plantnet_api_key: Option<String>,
    pub plantnet_base_url: Option<String>,
    /// Override for the embedded recommendation table
    pub recommendations_path: Option<PathBuf>,
    /// CORS origins; empty means any origin is allowed
    pub allowed_origins: Vec<String>,
}

impl ServiceConfig {
    /// Resolve the effective configuration from ENV and the TOML file
    pub fn resolve(toml_config: &TomlConfig) -> Result<Self> {
        let model_path = resolve_setting("SUPERMANGO_MODEL_PATH", toml_config.model_path.clone())
            .ok_or_else(|| {
                Error::Config(
                    "model path not configured. Set SUPERMANGO_MODEL_PATH or \
                     model_path in config.toml"
                        .to_string(),
                )
            })?;

        let bind_address =
            resolve_setting("SUPERMANGO_BIND_ADDRESS", toml_config.bind_address.clone())
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let plantnet_api_key = resolve_setting(
            "SUPERMANGO_PLANTNET_API_KEY",
            toml_config.plantnet_api_key.clone(),
        );
        let plantnet_base_url = resolve_setting(
            "SUPERMANGO_PLANTNET_BASE_URL",
            toml_config.plantnet_base_url.clone(),
        );
        let recommendations_path = resolve_setting(
            "SUPERMANGO_RECOMMENDATIONS_PATH",
            toml_config.recommendations_path.clone(),
        )
        .map(PathBuf::from);

        Ok(Self {
            bind_address,
            model_path: PathBuf::from(model_path),
            plantnet_api_key,
            plantnet_base_url,
            recommendations_path,
            allowed_origins: toml_config.allowed_origins.clone(),
        })
    }
}

/// ENV wins over TOML; a warning flags the double configuration
fn resolve_setting(env_var: &str, toml_value: Option<String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_value(v));
    let toml_value = toml_value.filter(|v| is_valid_value(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} set in both environment and TOML config; using environment",
            env_var
        );
    }

    env_value.or(toml_value)
}

/// Validate a setting value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "SUPERMANGO_MODEL_PATH",
            "SUPERMANGO_BIND_ADDRESS",
            "SUPERMANGO_PLANTNET_API_KEY",
            "SUPERMANGO_PLANTNET_BASE_URL",
            "SUPERMANGO_RECOMMENDATIONS_PATH",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn toml_values_resolve_when_env_is_unset() {
        clear_env();
        let toml_config = TomlConfig {
            model_path: Some("/srv/models/severity.onnx".to_string()),
            bind_address: Some("127.0.0.1:9000".to_string()),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(&toml_config).unwrap();
        assert_eq!(config.model_path, PathBuf::from("/srv/models/severity.onnx"));
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert!(config.plantnet_api_key.is_none());
    }

    #[test]
    #[serial]
    fn env_overrides_toml() {
        clear_env();
        std::env::set_var("SUPERMANGO_MODEL_PATH", "/env/severity.onnx");
        let toml_config = TomlConfig {
            model_path: Some("/toml/severity.onnx".to_string()),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(&toml_config).unwrap();
        assert_eq!(config.model_path, PathBuf::from("/env/severity.onnx"));
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_model_path_is_a_configuration_error() {
        clear_env();
        let err = ServiceConfig::resolve(&TomlConfig::default()).unwrap_err();
        assert!(err.to_string().contains("model path"));
    }

    #[test]
    #[serial]
    fn blank_values_do_not_count_as_configured() {
        clear_env();
        std::env::set_var("SUPERMANGO_MODEL_PATH", "   ");
        let toml_config = TomlConfig {
            model_path: Some("/toml/severity.onnx".to_string()),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(&toml_config).unwrap();
        assert_eq!(config.model_path, PathBuf::from("/toml/severity.onnx"));
        clear_env();
    }
}
