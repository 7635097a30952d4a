//! Per-topic suppression of repeated values.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Remembers the last value written on each topic.
#[derive(Debug, Default)]
pub struct DedupCache {
    last: Mutex<HashMap<String, String>>,
}

impl DedupCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `topic` and report whether it differs from the
    /// previous value, i.e. whether it should actually be written.
    pub fn should_publish(&self, topic: &str, value: &str) -> bool {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.get(topic).is_some_and(|previous| previous == value) {
            return false;
        }
        last.insert(topic.to_string(), value.to_string());
        true
    }

    /// Drop the record for `topic` if it still holds `value`, so the same
    /// value is written again next time (used after a failed write).
    pub fn forget(&self, topic: &str, value: &str) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.get(topic).is_some_and(|current| current == value) {
            last.remove(topic);
        }
    }
}
