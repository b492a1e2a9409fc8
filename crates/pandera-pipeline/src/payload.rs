//! Request payload sent to the relay.
//!
//! Wire shape:
//! `{"parameters": {"Ticker": "AAPL", "Start Date": "...", "End Date": "..."}, "graphType": "IVMap"}`

use pandera_common::{ComputationKind, ConstraintSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::selection::{SelectionMap, END_DATE_KEY, START_DATE_KEY};
use crate::slider::format_date;
use crate::window::DateWindow;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("No value for constraint '{0}'")]
    MissingValue(String),
    #[error("Constraint label '{0}' collides with a date parameter")]
    ReservedLabel(String),
    #[error("Parameter '{0}' is not part of the schema")]
    UnexpectedParameter(String),
}

/// Resolved parameters: the two date fields plus one entry per choice
/// constraint, flattened into a single JSON object on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeParameters {
    #[serde(rename = "Start Date", default, skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(rename = "End Date", default, skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
    #[serde(flatten)]
    choices: BTreeMap<String, String>,
}

impl ComputeParameters {
    /// Validates that every schema label is covered exactly once.
    pub fn new(
        schema: &ConstraintSchema,
        dates: Option<(String, String)>,
        choices: BTreeMap<String, String>,
    ) -> Result<Self, PayloadError> {
        for c in schema {
            if c.is_time_period() {
                if dates.is_none() {
                    return Err(PayloadError::MissingValue(c.label.clone()));
                }
            } else if c.label == START_DATE_KEY || c.label == END_DATE_KEY {
                return Err(PayloadError::ReservedLabel(c.label.clone()));
            } else if !choices.contains_key(&c.label) {
                return Err(PayloadError::MissingValue(c.label.clone()));
            }
        }
        if let Some(extra) = choices
            .keys()
            .find(|k| schema.get(k).map_or(true, |c| c.is_time_period()))
        {
            return Err(PayloadError::UnexpectedParameter(extra.clone()));
        }
        if dates.is_some() && !schema.has_time_period() {
            return Err(PayloadError::UnexpectedParameter(START_DATE_KEY.to_string()));
        }

        let (start_date, end_date) = match dates {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };
        Ok(Self { start_date, end_date, choices })
    }

    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    pub fn choice(&self, label: &str) -> Option<&str> {
        self.choices.get(label).map(String::as_str)
    }

    /// Number of wire entries.
    pub fn len(&self) -> usize {
        self.choices.len()
            + usize::from(self.start_date.is_some())
            + usize::from(self.end_date.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable request handed to the relay client by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    parameters: ComputeParameters,
    #[serde(rename = "graphType")]
    kind: ComputationKind,
}

impl RequestPayload {
    /// Freeze the current selections into a payload.
    ///
    /// Time Period takes the selected dates or the window endpoints; every
    /// other constraint takes its selection or its first option.
    pub fn resolve(
        kind: ComputationKind,
        schema: &ConstraintSchema,
        selection: &SelectionMap,
        window: &DateWindow,
    ) -> Result<Self, PayloadError> {
        let mut dates = None;
        let mut choices = BTreeMap::new();
        for c in schema {
            if c.is_time_period() {
                let start = selection
                    .start_date()
                    .map(str::to_string)
                    .unwrap_or_else(|| format_date(window.start()));
                let end = selection
                    .end_date()
                    .map(str::to_string)
                    .unwrap_or_else(|| format_date(window.end()));
                dates = Some((start, end));
            } else {
                let value = selection.get(&c.label).unwrap_or_else(|| c.default_option());
                choices.insert(c.label.clone(), value.to_string());
            }
        }
        Ok(Self {
            parameters: ComputeParameters::new(schema, dates, choices)?,
            kind,
        })
    }

    pub fn parameters(&self) -> &ComputeParameters {
        &self.parameters
    }

    pub fn kind(&self) -> &ComputationKind {
        &self.kind
    }
}
