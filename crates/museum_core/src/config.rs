//! Process configuration and backend mode selection.
//!
//! # Responsibility
//! - Read portal settings from environment-style key/value lookups.
//! - Decide once whether the gateway runs against the remote store.
//!
//! # Invariants
//! - Missing remote settings are a supported state (local mode), not an
//!   error.
//! - Remote mode requires both an absolute `http(s)` endpoint and a
//!   non-blank access key.

use crate::logging::default_log_level;
use crate::repo::local_store::LocalLatency;
use reqwest::Url;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_REMOTE_URL: &str = "MUSEUM_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "MUSEUM_REMOTE_KEY";
pub const ENV_LOCAL_DB: &str = "MUSEUM_LOCAL_DB";
pub const ENV_SIMULATE_LATENCY: &str = "MUSEUM_SIMULATE_LATENCY";
pub const ENV_ADMIN_PASSCODE: &str = "MUSEUM_ADMIN_PASSCODE";
pub const ENV_LOG_LEVEL: &str = "MUSEUM_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MUSEUM_LOG_DIR";

const DEFAULT_LOCAL_DB_FILE: &str = "museum_portal.sqlite3";

/// Backend the gateway routes every operation to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendMode {
    Remote,
    Local,
}

impl BackendMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

impl Display for BackendMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hosted store coordinates. Only constructed from well-formed input.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    endpoint: String,
    api_key: String,
}

impl RemoteConfig {
    /// Returns `Some` only when both values are present and well-formed.
    pub fn parse(endpoint: Option<&str>, api_key: Option<&str>) -> Option<Self> {
        let endpoint = endpoint.map(str::trim).filter(|value| !value.is_empty())?;
        let api_key = api_key.map(str::trim).filter(|value| !value.is_empty())?;

        let url = Url::parse(endpoint).ok()?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return None;
        }

        Some(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Where the local fallback slot store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalDbLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidFlag { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFlag { key, value } => write!(
                f,
                "{key} must be one of 1|0|true|false|on|off|yes|no, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Complete portal configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// `None` selects local mode.
    pub remote: Option<RemoteConfig>,
    /// Set when remote values were supplied but rejected as incomplete or
    /// malformed.
    pub remote_rejected: bool,
    pub local_db: LocalDbLocation,
    pub simulate_latency: bool,
    pub admin_passcode: Option<String>,
    pub log_level: String,
    /// `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            remote: None,
            remote_rejected: false,
            local_db: LocalDbLocation::File(PathBuf::from(DEFAULT_LOCAL_DB_FILE)),
            simulate_latency: true,
            admin_passcode: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl PortalConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let remote_url = read(ENV_REMOTE_URL);
        let remote_key = read(ENV_REMOTE_KEY);
        let remote = RemoteConfig::parse(remote_url.as_deref(), remote_key.as_deref());
        let remote_rejected = remote.is_none() && (remote_url.is_some() || remote_key.is_some());

        let mut config = Self {
            remote,
            remote_rejected,
            ..Self::default()
        };

        if let Some(path) = read(ENV_LOCAL_DB) {
            config.local_db = if path == ":memory:" {
                LocalDbLocation::Memory
            } else {
                LocalDbLocation::File(PathBuf::from(path))
            };
        }
        if let Some(value) = read(ENV_SIMULATE_LATENCY) {
            config.simulate_latency = parse_flag(ENV_SIMULATE_LATENCY, &value)?;
        }
        config.admin_passcode = read(ENV_ADMIN_PASSCODE);
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);

        Ok(config)
    }

    pub fn mode(&self) -> BackendMode {
        if self.remote.is_some() {
            BackendMode::Remote
        } else {
            BackendMode::Local
        }
    }

    pub fn local_latency(&self) -> LocalLatency {
        if self.simulate_latency {
            LocalLatency::default()
        } else {
            LocalLatency::none()
        }
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BackendMode, ConfigError, LocalDbLocation, PortalConfig, RemoteConfig,
        ENV_ADMIN_PASSCODE, ENV_LOCAL_DB, ENV_REMOTE_KEY, ENV_REMOTE_URL, ENV_SIMULATE_LATENCY,
    };
    use crate::repo::local_store::LocalLatency;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<PortalConfig, ConfigError> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        PortalConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_selects_local_mode() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.mode(), BackendMode::Local);
        assert!(!config.remote_rejected);
        assert_eq!(config.local_latency(), LocalLatency::default());
        assert_eq!(config.admin_passcode, None);
    }

    #[test]
    fn both_remote_values_select_remote_mode() {
        let config = config_from(&[
            (ENV_REMOTE_URL, "https://museum.example.org/"),
            (ENV_REMOTE_KEY, "anon-key"),
        ])
        .unwrap();

        assert_eq!(config.mode(), BackendMode::Remote);
        let remote = config.remote.unwrap();
        assert_eq!(remote.endpoint(), "https://museum.example.org");
        assert_eq!(remote.api_key(), "anon-key");
    }

    #[test]
    fn half_configured_remote_falls_back_to_local() {
        let config = config_from(&[(ENV_REMOTE_URL, "https://museum.example.org")]).unwrap();
        assert_eq!(config.mode(), BackendMode::Local);
        assert!(config.remote_rejected);
    }

    #[test]
    fn malformed_endpoint_is_rejected() {
        assert!(RemoteConfig::parse(Some("museum.example.org"), Some("k")).is_none());
        assert!(RemoteConfig::parse(Some("ftp://museum.example.org"), Some("k")).is_none());
        assert!(RemoteConfig::parse(Some("https://museum.example.org"), Some("  ")).is_none());
    }

    #[test]
    fn local_overrides_are_read() {
        let config = config_from(&[
            (ENV_LOCAL_DB, ":memory:"),
            (ENV_SIMULATE_LATENCY, "off"),
            (ENV_ADMIN_PASSCODE, "open-sesame"),
        ])
        .unwrap();

        assert_eq!(config.local_db, LocalDbLocation::Memory);
        assert_eq!(config.local_latency(), LocalLatency::none());
        assert_eq!(config.admin_passcode.as_deref(), Some("open-sesame"));
    }

    #[test]
    fn unknown_flag_value_is_an_error() {
        let err = config_from(&[(ENV_SIMULATE_LATENCY, "sometimes")]).unwrap_err();
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let remote = RemoteConfig::parse(Some("https://db.example.org"), Some("secret")).unwrap();
        assert!(!format!("{remote:?}").contains("secret"));
    }
}
