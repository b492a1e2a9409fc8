//! Shared application state for the relay server.

use pandera_common::{PanderaError, Result};
use pandera_config::RelayConfig;
use std::sync::Arc;
use std::time::Duration;

/// Shared state injected into every Axum handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    /// Compute service endpoint every request is forwarded to.
    pub downstream_url: String,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        reqwest::Url::parse(&config.downstream_url).map_err(|e| {
            PanderaError::Config(format!("invalid downstream url '{}': {e}", config.downstream_url))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, downstream_url: config.downstream_url.clone() })
    }
}

pub type SharedState = Arc<AppState>;
