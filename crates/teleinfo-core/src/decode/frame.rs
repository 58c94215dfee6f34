use std::collections::{BTreeMap, BTreeSet};

use crate::protocols::value::TypedValue;

/// Fields accumulated for the frame in progress.
///
/// A label appears at most once; a repeated label overwrites the earlier
/// value (the wire protocol tolerates duplicates, last write wins). Checksum
/// failures are tracked per label and follow the value that was kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecord {
    fields: BTreeMap<String, TypedValue>,
    checksum_failures: BTreeSet<String>,
}

impl FrameRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `label`, returning the previous value.
    pub fn insert(&mut self, label: impl Into<String>, value: TypedValue) -> Option<TypedValue> {
        self.fields.insert(label.into(), value)
    }

    pub fn get(&self, label: &str) -> Option<&TypedValue> {
        self.fields.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.fields.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.checksum_failures.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Record a group whose checksum failed and is not exempt from
    /// enforcement.
    pub fn record_checksum_failure(&mut self, label: impl Into<String>) {
        self.checksum_failures.insert(label.into());
    }

    /// Forget an earlier failure for `label` once a group with a valid
    /// checksum replaces it.
    pub fn clear_checksum_failure(&mut self, label: &str) {
        self.checksum_failures.remove(label);
    }

    pub fn checksum_failures(&self) -> &BTreeSet<String> {
        &self.checksum_failures
    }

    pub fn into_parts(self) -> (BTreeMap<String, TypedValue>, Vec<String>) {
        (self.fields, self.checksum_failures.into_iter().collect())
    }
}
