use eabridge_core::DEFAULT_EA_ID;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors raised while loading bridge configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime settings for the bridge server.
///
/// Every field has a default, so an empty TOML file is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Interface to bind (e.g. "127.0.0.1").
    pub host: String,
    /// Port to bind; 0 picks an ephemeral port.
    pub port: u16,
    /// EA id used when a request omits `ea_id`.
    pub default_ea_id: String,
    /// Commands older than this are dropped. `None` keeps them until consumed.
    pub command_ttl_secs: Option<u64>,
    /// How often the expiry sweep runs when a TTL is set.
    pub sweep_interval_secs: u64,
    /// How long shutdown waits for in-flight requests.
    pub shutdown_grace_secs: u64,
    /// Allow cross-origin requests from any origin.
    pub cors_permissive: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            default_ea_id: DEFAULT_EA_ID.to_string(),
            command_ttl_secs: None,
            sweep_interval_secs: 5,
            shutdown_grace_secs: 10,
            cors_permissive: true,
        }
    }
}

impl BridgeConfig {
    /// Parse a TOML document, filling missing fields with defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_ea_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_ea_id must not be empty".to_string(),
            ));
        }
        // Caller-supplied ids are trimmed, so a padded default would never match them.
        if self.default_ea_id.trim() != self.default_ea_id {
            return Err(ConfigError::Invalid(
                "default_ea_id must not have leading or trailing whitespace".to_string(),
            ));
        }
        if self.command_ttl_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "command_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn command_ttl(&self) -> Option<Duration> {
        self.command_ttl_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
