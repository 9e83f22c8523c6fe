//! Per-request execution settings.
//!
//! An [`ExecutionConfig`] starts from the [`PipelineConfig`] and is then
//! adjusted by the request's own options:
//!
//! | option             | type           | effect                         |
//! |--------------------|----------------|--------------------------------|
//! | `timeout`          | number (secs)  | overrides the timeout          |
//! | `follow_redirects` | bool           | overrides redirect following   |
//! | `insecure`         | bool           | skips certificate validation   |
//! | `tls.insecure`     | bool           | same as `insecure`             |
//!
//! Options of the wrong type are ignored with a warning.

use crate::config::PipelineConfig;
use crate::models::Request;
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for executing one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Maximum time for the whole exchange.
    pub timeout: Duration,

    /// Whether 3xx responses are followed.
    pub follow_redirects: bool,

    /// Redirect limit when following.
    pub max_redirects: u32,

    /// Whether certificates are validated.
    pub validate_ssl: bool,

    /// Headers added unless the request already sets them.
    pub default_headers: BTreeMap<String, String>,
}

impl From<&PipelineConfig> for ExecutionConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            timeout: config.timeout_duration(),
            follow_redirects: config.follow_redirects,
            max_redirects: config.max_redirects,
            validate_ssl: config.validate_ssl,
            default_headers: config.default_headers.clone(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl ExecutionConfig {
    /// Applies the request's options on top of this configuration.
    pub fn for_request(&self, request: &Request) -> Self {
        let mut config = self.clone();

        if let Some(value) = request.option("timeout") {
            match value
                .as_f64()
                .filter(|secs| *secs > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            {
                Some(timeout) => config.timeout = timeout,
                None => log::warn!("ignoring invalid timeout option: {}", value),
            }
        }

        if let Some(value) = request.option("follow_redirects") {
            match value.as_bool() {
                Some(follow) => config.follow_redirects = follow,
                None => log::warn!("ignoring invalid follow_redirects option: {}", value),
            }
        }

        for key in ["insecure", "tls.insecure"] {
            if let Some(value) = request.option(key) {
                match value.as_bool() {
                    Some(insecure) => config.validate_ssl = !insecure,
                    None => log::warn!("ignoring invalid {} option: {}", key, value),
                }
            }
        }

        config
    }
}
