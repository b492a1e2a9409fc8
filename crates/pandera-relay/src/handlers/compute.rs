//! Compute relay: forwards `{parameters, graphType}` to the compute service.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pandera_common::{PanderaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::state::{AppState, SharedState};

/// The two fields the relay passes through. Anything else in the incoming
/// body is dropped; values are forwarded as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(rename = "graphType", default, skip_serializing_if = "Option::is_none")]
    pub graph_type: Option<Value>,
}

pub async fn compute(
    State(state): State<SharedState>,
    Json(request): Json<ComputeRequest>,
) -> Response {
    info!(graph_type = ?request.graph_type, parameters = ?request.parameters, "Received compute request");

    match forward(&state, &request).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            error!("Error communicating with compute service: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// POST the request downstream and return its JSON body verbatim.
#[instrument(skip(state, request), fields(downstream = %state.downstream_url))]
pub async fn forward(state: &AppState, request: &ComputeRequest) -> Result<Value> {
    let resp = state.client
        .post(&state.downstream_url)
        .json(request)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(PanderaError::Downstream(status.as_u16()));
    }

    let text = resp.text().await?;
    let body: Value = serde_json::from_str(&text)?;
    debug!(bytes = text.len(), "Compute service responded");
    Ok(body)
}
