//! In-memory implementation of [`FlowStore`].
//!
//! [`LocalStore`] keeps serialized documents in a string-to-string map, the
//! same shape as browser local storage. First-class backend for tests and
//! ephemeral sessions.

use std::collections::HashMap;

use flowgraph_core::FlowGraph;

use crate::error::PersistError;
use crate::format::{export_json, import_json};
use crate::traits::FlowStore;

/// String-keyed in-memory document store.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    entries: HashMap<String, String>,
}

impl LocalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        LocalStore::default()
    }

    /// Raw access to a stored document, if present.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl FlowStore for LocalStore {
    fn save_flow(&mut self, key: &str, graph: &FlowGraph) -> Result<(), PersistError> {
        let json = export_json(graph)?;
        self.entries.insert(key.to_string(), json);
        Ok(())
    }

    fn load_flow(&self, key: &str) -> Result<FlowGraph, PersistError> {
        let text = self
            .entries
            .get(key)
            .ok_or_else(|| PersistError::KeyNotFound {
                key: key.to_string(),
            })?;
        import_json(text)
    }

    fn delete_flow(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn list_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}
