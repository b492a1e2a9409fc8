//! Visualization payload decoding and result-panel rendering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::orchestrator::LifecycleState;

/// Text shown in the result area before the first submission.
pub const PLACEHOLDER_TEXT: &str = "Graph Visualization Here";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Visualization spec is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Visualization spec has no 'data' array")]
    MissingData,
}

/// A Plotly figure: trace list plus layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub data: Vec<Value>,
    #[serde(default)]
    pub layout: Map<String, Value>,
}

/// Decode the embedded specification string. All or nothing.
pub fn decode(raw: &str) -> Result<PlotSpec, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    match value.get("data") {
        Some(Value::Array(_)) => Ok(serde_json::from_value(value)?),
        _ => Err(DecodeError::MissingData),
    }
}

impl PlotSpec {
    /// Self-contained HTML fragment that draws this figure with plotly.js
    /// into a div with the given id.
    pub fn to_html(&self, element_id: &str) -> String {
        let data = script_json(&Value::Array(self.data.clone()));
        let layout = script_json(&Value::Object(self.layout.clone()));
        let id: String = element_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .collect();
        format!(
            r#"<div id="{id}" style="width:100%;height:100%"></div>
<script>Plotly.newPlot("{id}", {data}, {layout}, {{"responsive": true}});</script>"#,
        )
    }
}

/// JSON safe to embed in a `<script>` body. `<`, `>` and `&` only occur
/// inside string literals, where the `\u` escapes decode to the same text.
fn script_json(value: &Value) -> String {
    value
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// What the result area shows for a lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayPanel<'a> {
    Placeholder(&'static str),
    Loading(String),
    Error(&'a str),
    Plot(&'a PlotSpec),
}

impl<'a> DisplayPanel<'a> {
    pub fn for_state(state: &'a LifecycleState, progress: u8) -> Self {
        match state {
            LifecycleState::Idle => Self::Placeholder(PLACEHOLDER_TEXT),
            LifecycleState::Loading => Self::Loading(format!("Loading{}", ".".repeat(progress as usize))),
            LifecycleState::Failed(message) => Self::Error(message),
            LifecycleState::Succeeded(plot) => Self::Plot(plot),
        }
    }
}
