//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use diploma_types::IdentityScheme;

use crate::{LogFormat, ServiceError};

/// Configuration for the diploma service.
///
/// Loaded from a TOML file via [`ServiceConfig::from_toml_file`] or built
/// programmatically. Every field has a default, so an empty file is valid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Base URL of the auth service (profiles and wallet directory).
    #[serde(default = "default_auth_service_url")]
    pub auth_service_url: String,

    /// Canonical identity representation: "wallet" or "user_id".
    #[serde(default)]
    pub identity_scheme: IdentityScheme,

    #[serde(default = "default_identity_timeout_secs")]
    pub identity_timeout_secs: u64,

    /// How long KPI snapshots are served from cache.
    #[serde(default = "default_kpi_ttl_secs")]
    pub kpi_ttl_secs: u64,

    /// Credential the anchoring process presents on the confirm callback.
    /// When unset the callback refuses every call.
    #[serde(default)]
    pub anchor_callback_token: Option<String>,

    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter, e.g. "info" or "debug,diploma_workflow=trace".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3003
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./diploma_data")
}

fn default_map_size_mb() -> usize {
    256
}

fn default_auth_service_url() -> String {
    "http://tuvcb-service-auth:3001".to_string()
}

fn default_identity_timeout_secs() -> u64 {
    10
}

fn default_kpi_ttl_secs() -> u64 {
    diploma_kpi::DEFAULT_TTL_SECS
}

fn default_true() -> bool {
    true
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        toml::from_str(s).map_err(|e| ServiceError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ServiceError> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Check values that serde alone cannot.
    pub fn validate(&self) -> Result<(), ServiceError> {
        self.socket_addr()?;
        self.log_format()?;
        if self.map_size_mb == 0 {
            return Err(ServiceError::Config("map_size_mb must be positive".into()));
        }
        if self.auth_service_url.trim().is_empty() {
            return Err(ServiceError::Config(
                "auth_service_url must not be empty".into(),
            ));
        }
        if self.identity_timeout_secs == 0 {
            return Err(ServiceError::Config(
                "identity_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServiceError> {
        let ip: IpAddr = self.listen_addr.trim().parse().map_err(|_| {
            ServiceError::Config(format!("invalid listen_addr: {}", self.listen_addr))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn log_format(&self) -> Result<LogFormat, ServiceError> {
        self.log_format.parse()
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_secs(self.identity_timeout_secs)
    }

    /// The callback credential, ignoring blank values.
    pub fn anchor_callback_token(&self) -> Option<&str> {
        self.anchor_callback_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            auth_service_url: default_auth_service_url(),
            identity_scheme: IdentityScheme::default(),
            identity_timeout_secs: default_identity_timeout_secs(),
            kpi_ttl_secs: default_kpi_ttl_secs(),
            anchor_callback_token: None,
            enable_metrics: default_true(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
