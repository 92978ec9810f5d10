//! Configuration loading and validation for the relay service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any variable is missing or invalid.
//! Key material is never part of configuration; it arrives per request.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated relay service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Base URL of the origin holding encrypted resources. Enables `/remote`.
    #[serde(default)]
    pub upstream_base_url: Option<String>,

    /// Directory holding encrypted resources. Enables `/local`.
    #[serde(default)]
    pub local_root: Option<String>,

    /// `Content-Type` sent with relayed bodies.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Request header carrying the base64 AES key.
    #[serde(default = "default_key_header")]
    pub key_header_name: String,

    /// Request header carrying the base64 16-byte IV.
    #[serde(default = "default_iv_header")]
    pub iv_header_name: String,

    /// Upstream TCP/TLS connect timeout (seconds).
    #[serde(default = "default_upstream_connect_timeout")]
    pub upstream_connect_timeout_secs: u64,

    /// Overall upstream request timeout, body included (seconds).
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// Idle pooled connections kept per upstream host.
    #[serde(default = "default_pool_max_idle")]
    pub upstream_pool_max_idle_per_host: usize,

    /// OTLP collector endpoint. Spans are only exported when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_content_type() -> String {
    "application/octet-stream".into()
}
fn default_key_header() -> String {
    "X-Content-Key".into()
}
fn default_iv_header() -> String {
    "X-Content-Iv".into()
}
fn default_upstream_connect_timeout() -> u64 {
    10
}
fn default_upstream_timeout() -> u64 {
    120
}
fn default_pool_max_idle() -> usize {
    16
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        let remote = self.upstream_base_url.as_deref().map(str::trim);
        let local = self.local_root.as_deref().map(str::trim);
        if remote.map_or(true, str::is_empty) && local.map_or(true, str::is_empty) {
            anyhow::bail!("at least one of UPSTREAM_BASE_URL or LOCAL_ROOT must be set");
        }
        if let Some(url) = remote.filter(|u| !u.is_empty()) {
            reqwest::Url::parse(url)
                .with_context(|| format!("UPSTREAM_BASE_URL {url:?} is not a valid URL"))?;
        }

        ensure_non_empty(&self.content_type, "CONTENT_TYPE")?;
        ensure_non_empty(&self.key_header_name, "KEY_HEADER_NAME")?;
        ensure_non_empty(&self.iv_header_name, "IV_HEADER_NAME")?;

        if self.upstream_connect_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_CONNECT_TIMEOUT_SECS must be > 0");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }

    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_connect_timeout_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        listen_port: default_listen_port(),
        upstream_base_url: Some("http://127.0.0.1:9000".into()),
        local_root: Some("/srv/blobs".into()),
        content_type: default_content_type(),
        key_header_name: default_key_header(),
        iv_header_name: default_iv_header(),
        upstream_connect_timeout_secs: default_upstream_connect_timeout(),
        upstream_timeout_secs: default_upstream_timeout(),
        upstream_pool_max_idle_per_host: default_pool_max_idle(),
        otel_exporter_otlp_endpoint: None,
        log_level: default_log_level(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_port(), 8080);
        assert_eq!(default_content_type(), "application/octet-stream");
        assert_eq!(default_key_header(), "X-Content-Key");
        assert_eq!(default_iv_header(), "X-Content-Iv");
        assert_eq!(default_upstream_connect_timeout(), 10);
        assert_eq!(default_upstream_timeout(), 120);
        assert_eq!(default_pool_max_idle(), 16);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_test_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_requires_a_source() {
        let cfg = Config {
            upstream_base_url: None,
            local_root: Some("  ".into()),
            ..test_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_accepts_single_source() {
        let remote_only = Config {
            local_root: None,
            ..test_config()
        };
        assert!(remote_only.validate().is_ok());
        let local_only = Config {
            upstream_base_url: None,
            ..test_config()
        };
        assert!(local_only.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_upstream_url() {
        let cfg = Config {
            upstream_base_url: Some("not a url".into()),
            ..test_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let cfg = Config {
            upstream_timeout_secs: 0,
            ..test_config()
        };
        assert!(cfg.validate().is_err());
        let cfg = Config {
            upstream_connect_timeout_secs: 0,
            ..test_config()
        };
        assert!(cfg.validate().is_err());
    }
}
