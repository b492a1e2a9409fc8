//! User selections keyed by constraint label.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selection key holding the range start as `YYYY-MM-DD`.
pub const START_DATE_KEY: &str = "Start Date";
/// Selection key holding the range end as `YYYY-MM-DD`.
pub const END_DATE_KEY: &str = "End Date";

/// Mapping from constraint label (or a date key) to the chosen value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionMap(BTreeMap<String, String>);

impl SelectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Set a single entry, leaving every other entry untouched.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert only when the key has no value yet.
    pub fn set_if_absent(&mut self, key: &str, value: impl Into<String>) {
        self.0.entry(key.to_string()).or_insert_with(|| value.into());
    }

    pub fn start_date(&self) -> Option<&str> {
        self.get(START_DATE_KEY)
    }

    pub fn end_date(&self) -> Option<&str> {
        self.get(END_DATE_KEY)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SelectionMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
