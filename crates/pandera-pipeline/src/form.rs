//! Constraint form: renders a schema into control descriptors and applies
//! user input to the selection map.
//!
//! Input handling is synchronous and local. Each input touches exactly one
//! selection entry.

use pandera_common::{ConstraintSchema, TIME_PERIOD_LABEL};
use serde::Serialize;
use thiserror::Error;

use crate::selection::{SelectionMap, END_DATE_KEY, START_DATE_KEY};
use crate::slider::{format_date, SliderDateMapper};
use crate::window::DateWindow;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("No constraint labelled '{0}'")]
    UnknownConstraint(String),
    #[error("'{0}' is a date range, not a choice")]
    NotAChoice(String),
    #[error("'{value}' is not an option of '{label}'")]
    UnknownOption { label: String, value: String },
    #[error("This form has no time period")]
    NoTimePeriod,
}

/// One rendered control, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum ControlDescriptor {
    /// Single-choice selector.
    Choice {
        label: String,
        options: Vec<String>,
        selected: String,
    },
    /// Two-handle range over `[min, max]` day offsets.
    Range {
        label: String,
        min: i64,
        max: i64,
        start_offset: i64,
        end_offset: i64,
        start_date: String,
        end_date: String,
    },
}

/// A user gesture on the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormInput {
    Choose { label: String, value: String },
    /// Start handle moved to this day offset.
    DragStart(i64),
    /// End handle moved to this day offset.
    DragEnd(i64),
}

impl FormInput {
    pub fn choose(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Choose { label: label.into(), value: value.into() }
    }
}

/// Effective range as displayed: selected strings or the window endpoints.
#[derive(Debug)]
struct RangeView {
    start_date: String,
    end_date: String,
    start_offset: i64,
    end_offset: i64,
}

fn range_view(selection: &SelectionMap, mapper: &SliderDateMapper, window: &DateWindow) -> RangeView {
    let start_date = selection
        .start_date()
        .map(str::to_string)
        .unwrap_or_else(|| format_date(window.start()));
    let end_date = selection
        .end_date()
        .map(str::to_string)
        .unwrap_or_else(|| format_date(window.end()));
    RangeView {
        start_offset: mapper.offset_of(&start_date).unwrap_or(0),
        end_offset: mapper.offset_of(&end_date).unwrap_or(mapper.total_days()),
        start_date,
        end_date,
    }
}

pub fn render(
    schema: &ConstraintSchema,
    selection: &SelectionMap,
    window: &DateWindow,
) -> Vec<ControlDescriptor> {
    let mapper = SliderDateMapper::new(window);
    schema
        .iter()
        .map(|c| {
            if c.is_time_period() {
                let view = range_view(selection, &mapper, window);
                ControlDescriptor::Range {
                    label: c.label.clone(),
                    min: 0,
                    max: mapper.total_days(),
                    start_offset: view.start_offset,
                    end_offset: view.end_offset,
                    start_date: view.start_date,
                    end_date: view.end_date,
                }
            } else {
                ControlDescriptor::Choice {
                    label: c.label.clone(),
                    options: c.options.clone(),
                    selected: selection
                        .get(&c.label)
                        .unwrap_or_else(|| c.default_option())
                        .to_string(),
                }
            }
        })
        .collect()
}

/// Apply one input. Handles never cross: a drag past the other handle is
/// clamped onto it, even when that handle sits outside the current window.
pub fn apply(
    schema: &ConstraintSchema,
    selection: &mut SelectionMap,
    window: &DateWindow,
    input: FormInput,
) -> Result<(), FormError> {
    match input {
        FormInput::Choose { label, value } => {
            let constraint = schema
                .get(&label)
                .ok_or_else(|| FormError::UnknownConstraint(label.clone()))?;
            if constraint.is_time_period() {
                return Err(FormError::NotAChoice(label));
            }
            if !constraint.has_option(&value) {
                return Err(FormError::UnknownOption { label, value });
            }
            selection.set(label, value);
        }
        FormInput::DragStart(offset) => {
            let mapper = time_period_mapper(schema, window)?;
            let view = range_view(selection, &mapper, window);
            let offset = offset.clamp(0, mapper.total_days()).min(view.end_offset);
            selection.set(START_DATE_KEY, format_date(mapper.offset_to_date(offset)));
        }
        FormInput::DragEnd(offset) => {
            let mapper = time_period_mapper(schema, window)?;
            let view = range_view(selection, &mapper, window);
            let offset = offset.clamp(0, mapper.total_days()).max(view.start_offset);
            selection.set(END_DATE_KEY, format_date(mapper.offset_to_date(offset)));
        }
    }
    Ok(())
}

fn time_period_mapper(schema: &ConstraintSchema, window: &DateWindow) -> Result<SliderDateMapper, FormError> {
    if schema.get(TIME_PERIOD_LABEL).is_none() {
        return Err(FormError::NoTimePeriod);
    }
    Ok(SliderDateMapper::new(window))
}
