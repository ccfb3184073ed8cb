//! Core error types for flowgraph-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Every error is
//! recoverable at the point of the user action that caused it; a rejected
//! operation leaves the graph and registry unchanged.

use thiserror::Error;

use crate::id::{EdgeId, NodeId};
use crate::node::ProcessKind;

/// Errors produced by graph mutations.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A node ID was not found in the graph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// An edge ID was not found in the graph.
    #[error("edge not found: EdgeId({id})", id = id.0)]
    EdgeNotFound { id: EdgeId },

    /// A connect attempt looped a node back to itself.
    #[error("cannot connect NodeId({id}) to itself", id = id.0)]
    SelfConnection { id: NodeId },

    /// The (from, target) pair is already connected. The upstream endpoint
    /// is named `from` here: thiserror reserves `source` for error chaining.
    #[error("already connected: NodeId({f}) -> NodeId({t})", f = from.0, t = target.0)]
    DuplicateConnection { from: NodeId, target: NodeId },

    /// The single value is already claimed by another node.
    #[error("the value \"{value}\" is already in use")]
    DuplicateValue { value: String },

    /// The range token is already claimed by another node.
    #[error("the range \"{range}\" is already in use")]
    DuplicateRange { range: String },

    /// A field update targeted a node of the wrong kind.
    #[error("NodeId({id}) is not a {expected}", id = id.0)]
    KindMismatch { id: NodeId, expected: &'static str },

    /// A process was chosen with fewer sources than it needs.
    #[error("process {process} needs at least {needed} inputs, have {have}")]
    NotEnoughInputs {
        process: ProcessKind,
        needed: usize,
        have: usize,
    },

    /// An edge failed validation (e.g. a dangling endpoint on import).
    #[error("invalid edge: {reason}")]
    InvalidEdge { reason: String },

    /// A graph-level invariant was violated (e.g. duplicate IDs on import).
    #[error("graph inconsistency: {reason}")]
    Inconsistency { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_render_and_chain_as_std_errors() {
        let err = FlowError::DuplicateConnection {
            from: NodeId(1),
            target: NodeId(2),
        };
        assert_eq!(err.to_string(), "already connected: NodeId(1) -> NodeId(2)");
        // Node ids are plain data, not wrapped causes.
        let err: &dyn std::error::Error = &err;
        assert!(err.source().is_none());
    }
}
