//! Client side of the relay boundary.
//!
//! The relay answers with an envelope whose `plotly_json` field is itself a
//! JSON document encoded as a string. Clients unwrap the envelope and hand the
//! inner string to the renderer.

use async_trait::async_trait;
use pandera_config::ClientConfig;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::payload::RequestPayload;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Relay transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Relay responded with status {0}")]
    Status(u16),
    #[error("Relay response is not a valid envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("Relay response carries no visualization spec")]
    MissingSpecification,
}

#[async_trait]
pub trait RelayClient: Send + Sync + 'static {
    /// Submit one payload and return the embedded visualization spec string.
    async fn compute(&self, payload: RequestPayload) -> Result<String, RelayError>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    plotly_json: Option<serde_json::Value>,
}

/// Extract the embedded spec string from a relay response body.
pub fn unwrap_envelope(body: &[u8]) -> Result<String, RelayError> {
    let envelope: Envelope = serde_json::from_slice(body).map_err(RelayError::Envelope)?;
    match envelope.plotly_json {
        Some(serde_json::Value::String(spec)) => Ok(spec),
        _ => Err(RelayError::MissingSpecification),
    }
}

/// reqwest-backed relay client.
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelayClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint: endpoint.into() })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, RelayError> {
        Self::new(
            config.relay_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    #[instrument(skip(self, payload), fields(endpoint = %self.endpoint, kind = %payload.kind()))]
    async fn compute(&self, payload: RequestPayload) -> Result<String, RelayError> {
        let resp = self.client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        debug!(bytes = body.len(), "Relay responded");
        unwrap_envelope(&body)
    }
}
