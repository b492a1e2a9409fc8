//! Configuration loading for Pandera.
//! Reads pandera.toml from the current directory or the path in the PANDERA_CONFIG env var.
//! A missing file is not an error: every field has a default.

use pandera_common::{default_cards, ModelCard};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default = "default_cards")]
    pub cards: Vec<ModelCard>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            client: ClientConfig::default(),
            cards: default_cards(),
        }
    }
}

/// Settings for the relay server that forwards compute requests downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_downstream_url")]
    pub downstream_url: String,
    #[serde(default = "default_relay_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host()           -> String { "0.0.0.0".to_string() }
fn default_port()           -> u16    { 3001 }
fn default_downstream_url() -> String { "https://flask.pandera.net/compute".to_string() }
fn default_relay_timeout()  -> u64    { 300 }

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            downstream_url: default_downstream_url(),
            request_timeout_secs: default_relay_timeout(),
        }
    }
}

/// Settings for the form-side client that talks to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    #[serde(default = "default_client_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
}

fn default_relay_url()         -> String { "https://api.pandera.net/api/compute".to_string() }
fn default_client_timeout()    -> u64    { 300 }
fn default_progress_interval() -> u64    { 500 }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            request_timeout_secs: default_client_timeout(),
            progress_interval_ms: default_progress_interval(),
        }
    }
}


impl Config {
    /// Load configuration from pandera.toml, then apply environment overrides.
    /// Checks PANDERA_CONFIG env var first, then current directory.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("PANDERA_CONFIG")
            .unwrap_or_else(|_| "pandera.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            info!(%path, "Loading configuration");
            Self::from_file(&path)?
        } else {
            debug!(%path, "No config file found, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from an environment-like lookup.
    ///
    /// `PORT` wins over the legacy lowercase `port`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT")
            .or_else(|| lookup("port"))
            .and_then(|p| p.trim().parse::<u16>().ok())
        {
            self.relay.port = port;
        }
        if let Some(url) = lookup("PANDERA_DOWNSTREAM_URL") {
            self.relay.downstream_url = url;
        }
        if let Some(url) = lookup("PANDERA_RELAY_URL") {
            self.client.relay_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.progress_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "client.progress_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.relay.downstream_url.trim().is_empty() {
            return Err(ConfigError::Invalid("relay.downstream_url is empty".to_string()));
        }
        Ok(())
    }
}
