//! Named string inputs for a task render.

use std::collections::BTreeMap;
use std::fmt::Display;

/// Ordered map of placeholder name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInputs {
    values: BTreeMap<String, String>,
}

impl TaskInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Accepts anything printable so rolls and flags
    /// can be passed without manual formatting.
    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Display) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for TaskInputs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut inputs = TaskInputs::new();
        for (k, v) in iter {
            inputs.insert(k, v);
        }
        inputs
    }
}
