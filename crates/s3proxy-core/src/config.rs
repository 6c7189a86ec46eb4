//! Proxy configuration.
//!
//! Provides [`ProxyConfig`], the immutable process-wide settings consumed by the
//! gateway and the request handler. Values are loaded once at startup from
//! environment variables and shared read-only afterwards.

use std::net::{Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ConfigError;

/// Port used when `APP_PORT` is unset or empty.
pub const DEFAULT_APP_PORT: &str = "80";

/// Proxy configuration.
///
/// Storage fields default to empty strings, which leave the corresponding
/// setting to the AWS SDK default chain (endpoint and region) or to an empty
/// value (bucket and key prefix).
///
/// # Examples
///
/// ```
/// use s3proxy_core::config::ProxyConfig;
///
/// let config = ProxyConfig::default();
/// assert_eq!(config.app_port, "80");
/// assert!(config.key_prefix.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Object storage endpoint URL (e.g. `"http://minio:9000"`).
    #[builder(default)]
    pub endpoint: String,

    /// Region identifier passed to the storage client.
    #[builder(default)]
    pub region: String,

    /// Bucket every request is served from.
    #[builder(default)]
    pub bucket: String,

    /// String prepended verbatim to every request path to form the object key.
    #[builder(default)]
    pub key_prefix: String,

    /// Listen port, kept as the raw string read from the environment.
    #[builder(default = String::from(DEFAULT_APP_PORT))]
    pub app_port: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: String::new(),
            bucket: String::new(),
            key_prefix: String::new(),
            app_port: String::from(DEFAULT_APP_PORT),
            log_level: String::from("info"),
        }
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AWS_S3_ENDPOINT` | *(empty)* |
    /// | `AWS_DEFAULT_REGION` | *(empty)* |
    /// | `AWS_S3_BUCKET` | *(empty)* |
    /// | `AWS_S3_KEY_PREFIX` | *(empty)* |
    /// | `APP_PORT` | `80`, also when set but empty |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("AWS_S3_ENDPOINT") {
            config.endpoint = v;
        }
        if let Some(v) = lookup("AWS_DEFAULT_REGION") {
            config.region = v;
        }
        if let Some(v) = lookup("AWS_S3_BUCKET") {
            config.bucket = v;
        }
        if let Some(v) = lookup("AWS_S3_KEY_PREFIX") {
            config.key_prefix = v;
        }
        if let Some(v) = lookup("APP_PORT").filter(|v| !v.is_empty()) {
            config.app_port = v;
        }
        if let Some(v) = lookup("LOG_LEVEL").filter(|v| !v.is_empty()) {
            config.log_level = v;
        }

        config
    }

    /// Parse [`app_port`](Self::app_port) into a TCP port number.
    pub fn port(&self) -> Result<u16, ConfigError> {
        self.app_port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(self.app_port.clone()))
    }

    /// Wildcard IPv4 address the proxy listens on.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port()?)))
    }
}
