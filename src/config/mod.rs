//! Configuration loading.
//!
//! Configuration is an explicit value: load it once and hand it to the
//! loader and the HTTP client. There is no process-wide configuration state.

pub mod schema;

pub use schema::PipelineConfig;

use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io { path: PathBuf, message: String },

    /// The configuration file is neither valid JSON nor valid YAML.
    Parse { path: PathBuf, message: String },

    /// The merged configuration failed validation.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Failed to read config {}: {}", path.display(), message)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "Failed to parse config {}: {}", path.display(), message)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Loads configuration from a JSON value, merged over the defaults.
///
/// Settings that cannot be deserialized are logged and ignored; the result
/// still has to pass validation.
///
/// # Example
///
/// ```
/// use request_mold::config::load_config;
/// use serde_json::json;
///
/// let config = load_config(Some(json!({ "timeout": 60000, "validateSsl": false }))).unwrap();
/// assert_eq!(config.timeout, 60000);
/// assert!(!config.validate_ssl);
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<PipelineConfig, ConfigError> {
    let mut config = PipelineConfig::default();

    if let Some(settings) = settings_json {
        match serde_json::from_value::<PipelineConfig>(settings) {
            Ok(user_config) => config = config.merge(&user_config),
            Err(e) => log::warn!("Failed to parse settings: {}. Using defaults.", e),
        }
    }

    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

/// Loads configuration from a file.
///
/// `.json` files are read as JSON; anything else is read as YAML.
pub fn load_config_file(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let settings: Value = if is_json {
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else if content.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    log::debug!("loaded config from {}", path.display());
    load_config(Some(settings))
}
