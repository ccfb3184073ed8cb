//! The [`FlowStore`] trait defining the keyed-storage contract.
//!
//! Backends hold serialized flow documents under string keys (the browser
//! local-storage convention: a `"flow"` key holding the whole document).
//! All backends are swappable without changing core logic. The trait is
//! synchronous; every flow is loaded and saved whole.

use flowgraph_core::FlowGraph;

use crate::error::PersistError;

/// Keyed storage for flow documents.
pub trait FlowStore {
    /// Serializes and stores `graph` under `key`, replacing any previous
    /// document.
    fn save_flow(&mut self, key: &str, graph: &FlowGraph) -> Result<(), PersistError>;

    /// Loads and reconstructs the flow stored under `key`.
    ///
    /// Fails with [`PersistError::KeyNotFound`] when nothing is stored there;
    /// format and reconstruction errors leave the caller's state untouched.
    fn load_flow(&self, key: &str) -> Result<FlowGraph, PersistError>;

    /// Removes the document under `key`. Removing an absent key is a no-op.
    fn delete_flow(&mut self, key: &str);

    /// Lists keys with a stored document.
    fn list_keys(&self) -> Vec<String>;
}
