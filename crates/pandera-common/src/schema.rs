//! Constraint schemas describing the user-adjustable inputs of a computation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::PanderaError;

/// Label of the constraint rendered as a date range instead of a selector.
pub const TIME_PERIOD_LABEL: &str = "Time Period";

/// A single user-adjustable parameter with a closed set of options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub label: String,
    pub options: Vec<String>,
}

impl Constraint {
    pub fn new<L, I, S>(label: L, options: I) -> Self
    where
        L: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_time_period(&self) -> bool {
        self.label == TIME_PERIOD_LABEL
    }

    /// First option, used whenever the user has not picked one.
    pub fn default_option(&self) -> &str {
        self.options.first().map(String::as_str).unwrap_or_default()
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}

/// Ordered sequence of constraints. Order is the render order.
///
/// Labels are unique and every constraint has at least one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Constraint>", into = "Vec<Constraint>")]
pub struct ConstraintSchema {
    constraints: Vec<Constraint>,
}

impl ConstraintSchema {
    pub fn new(constraints: Vec<Constraint>) -> Result<Self, PanderaError> {
        let mut seen = HashSet::new();
        for c in &constraints {
            if c.options.is_empty() {
                return Err(PanderaError::Schema(format!(
                    "constraint '{}' has no options",
                    c.label
                )));
            }
            if !seen.insert(c.label.as_str()) {
                return Err(PanderaError::Schema(format!(
                    "duplicate constraint label '{}'",
                    c.label
                )));
            }
        }
        Ok(Self { constraints })
    }

    /// Builds a schema already known to satisfy the invariants.
    pub(crate) fn from_trusted(constraints: Vec<Constraint>) -> Self {
        debug_assert!(Self::new(constraints.clone()).is_ok());
        Self { constraints }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn get(&self, label: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.label == label)
    }

    pub fn has_time_period(&self) -> bool {
        self.constraints.iter().any(Constraint::is_time_period)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl TryFrom<Vec<Constraint>> for ConstraintSchema {
    type Error = PanderaError;

    fn try_from(constraints: Vec<Constraint>) -> Result<Self, Self::Error> {
        Self::new(constraints)
    }
}

impl From<ConstraintSchema> for Vec<Constraint> {
    fn from(schema: ConstraintSchema) -> Self {
        schema.constraints
    }
}

impl<'a> IntoIterator for &'a ConstraintSchema {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}
