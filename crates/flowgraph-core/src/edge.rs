//! Directed edges between flow nodes.

use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NodeId};

/// A directed connection from `source` to `target`.
///
/// Both endpoints must reference nodes that exist in the owning graph; the
/// graph's mutation methods maintain this invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

impl FlowEdge {
    /// Returns `true` if the edge has `node` as either endpoint.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}
