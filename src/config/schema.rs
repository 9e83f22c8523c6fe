//! Configuration schema for the pipeline's HTTP collaborator and loader.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings shared by every run.
///
/// Settings are read from a JSON or YAML file, or from a JSON value handed
/// over by an embedding application. Missing settings fall back to defaults.
/// Per-request `options` override the HTTP settings for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Request timeout in milliseconds.
    ///
    /// Maximum time to wait for a complete response. Defaults to 30000ms.
    /// Must be greater than 0.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Whether to automatically follow HTTP redirects. Defaults to true.
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,

    /// Maximum number of redirects to follow.
    ///
    /// Only used when `follow_redirects` is true. Defaults to 10.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Whether to validate SSL/TLS certificates.
    ///
    /// **Warning:** Disabling SSL validation can expose you to security risks.
    #[serde(default = "default_validate_ssl")]
    pub validate_ssl: bool,

    /// Headers added to every request unless the request sets them itself.
    #[serde(default = "default_headers")]
    pub default_headers: BTreeMap<String, String>,

    /// Directory holding profile files, relative to the workspace root.
    #[serde(default = "default_profile_dir")]
    pub profile_dir: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            follow_redirects: default_follow_redirects(),
            max_redirects: default_max_redirects(),
            validate_ssl: default_validate_ssl(),
            default_headers: default_headers(),
            profile_dir: default_profile_dir(),
        }
    }
}

impl PipelineConfig {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// `Ok(())` if all settings are valid, or `Err` with a descriptive error message.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout == 0 {
            return Err("timeout must be greater than 0".to_string());
        }

        if self.profile_dir.trim().is_empty() {
            return Err("profileDir must not be empty".to_string());
        }

        Ok(())
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout)
    }

    /// Merges this configuration with another, using values from `other`.
    ///
    /// Default headers are combined; `other` wins on conflicts.
    pub fn merge(&self, other: &PipelineConfig) -> Self {
        let mut default_headers = self.default_headers.clone();
        default_headers.extend(other.default_headers.clone());

        Self {
            timeout: other.timeout,
            follow_redirects: other.follow_redirects,
            max_redirects: other.max_redirects,
            validate_ssl: other.validate_ssl,
            default_headers,
            profile_dir: other.profile_dir.clone(),
        }
    }
}

// Default value functions for serde

fn default_timeout() -> u64 {
    30000
}

fn default_follow_redirects() -> bool {
    true
}

fn default_max_redirects() -> u32 {
    10
}

fn default_validate_ssl() -> bool {
    true
}

fn default_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(
        "User-Agent".to_string(),
        format!("request-mold/{}", env!("CARGO_PKG_VERSION")),
    );
    headers
}

fn default_profile_dir() -> String {
    "profiles".to_string()
}
