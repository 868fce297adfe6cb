//! Key/value metadata attached to cells and documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key controlling whether a cell may be edited.
pub const EDITABLE: &str = "editable";

/// Key holding the execution counter of the last run.
pub const EXECUTION_ORDER: &str = "executionOrder";

/// Ordered key/value metadata map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

/// Metadata attached to a single cell.
pub type CellMetadata = Metadata;

/// Metadata attached to the whole document.
pub type NotebookMetadata = Metadata;

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Whether the cell may be edited, if set.
    pub fn editable(&self) -> Option<bool> {
        self.0.get(EDITABLE).and_then(Value::as_bool)
    }

    /// Execution counter of the last run, if set.
    pub fn execution_order(&self) -> Option<u32> {
        self.0
            .get(EXECUTION_ORDER)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Merge a patch into this map.
    ///
    /// Keys present in `patch` overwrite existing values, a `null` value
    /// removes the key, and keys absent from `patch` are left untouched.
    pub fn merge(&mut self, patch: &Metadata) {
        for (key, value) in &patch.0 {
            if value.is_null() {
                self.0.remove(key);
            } else {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// Consume into the underlying JSON object.
    pub fn into_json(self) -> serde_json::Map<String, Value> {
        self.0.into_iter().collect()
    }
}

impl From<serde_json::Map<String, Value>> for Metadata {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
