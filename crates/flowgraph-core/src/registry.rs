//! The value/range uniqueness registry.
//!
//! Tracks which single values and which "from:to" range tokens are currently
//! claimed by nodes. The registry is an explicit store object passed around
//! by the graph, never ambient state, so tests can construct isolated
//! instances.
//!
//! Allocation is an idempotent set add: allocating a string that is already
//! present leaves a single entry. Deallocation of an unknown entry is a
//! no-op. The registry performs no uniqueness *checks* itself -- callers
//! consult [`is_single_used`](ValueRegistry::is_single_used) /
//! [`is_range_used`](ValueRegistry::is_range_used) before committing a change.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::labels::all_labels;

/// In-memory tracker for claimed single values and range tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRegistry {
    singles: IndexSet<String>,
    ranges: IndexSet<String>,
}

impl ValueRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        ValueRegistry::default()
    }

    /// Claims a single value. Idempotent; returns `true` if newly inserted.
    pub fn allocate_single(&mut self, value: impl Into<String>) -> bool {
        self.singles.insert(value.into())
    }

    /// Releases a single value. No-op if the value was never claimed.
    pub fn deallocate_single(&mut self, value: &str) -> bool {
        self.singles.shift_remove(value)
    }

    /// Claims a "from:to" range token. Idempotent; returns `true` if newly
    /// inserted.
    pub fn allocate_range(&mut self, range: impl Into<String>) -> bool {
        self.ranges.insert(range.into())
    }

    /// Releases a range token. No-op if the token was never claimed.
    pub fn deallocate_range(&mut self, range: &str) -> bool {
        self.ranges.shift_remove(range)
    }

    /// Returns `true` if the single value is currently claimed.
    pub fn is_single_used(&self, value: &str) -> bool {
        self.singles.contains(value)
    }

    /// Returns `true` if the range token is currently claimed.
    pub fn is_range_used(&self, range: &str) -> bool {
        self.ranges.contains(range)
    }

    /// Iterates the claimed single values in allocation order.
    pub fn singles(&self) -> impl Iterator<Item = &str> {
        self.singles.iter().map(String::as_str)
    }

    /// Iterates the claimed range tokens in allocation order.
    pub fn ranges(&self) -> impl Iterator<Item = &str> {
        self.ranges.iter().map(String::as_str)
    }

    /// Releases every allocation.
    pub fn clear(&mut self) {
        self.singles.clear();
        self.ranges.clear();
    }

    /// Generated labels not currently claimed as a single value or range
    /// token, in generation order.
    pub fn available_labels(&self) -> Vec<&'static str> {
        all_labels()
            .iter()
            .map(String::as_str)
            .filter(|label| !self.is_single_used(label) && !self.is_range_used(label))
            .collect()
    }
}
