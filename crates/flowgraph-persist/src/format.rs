//! The flow file document format.
//!
//! A flow document is the JSON shape
//! `{ "nodes": [ {id, type, position, data} ], "edges": [ {id, source,
//! target} ] }`. [`FlowFile`] is the serialization boundary between a live
//! [`FlowGraph`] and that shape: export flattens the graph into the two
//! arrays, import validates the shape and rebuilds the graph (including the
//! registry's allocation sets and `connected` flags) via
//! [`FlowGraph::from_parts`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowgraph_core::{FlowEdge, FlowGraph, FlowNode};

use crate::error::PersistError;

/// A parsed flow document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowFile {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowFile {
    /// Flattens a graph into the document shape.
    pub fn from_graph(graph: &FlowGraph) -> Self {
        FlowFile {
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().copied().collect(),
        }
    }

    /// Parses and validates a flow document from JSON text.
    ///
    /// Malformed JSON yields [`PersistError::Parse`]; a well-formed payload
    /// that is not an object with array-valued `nodes` and `edges` keys
    /// yields [`PersistError::InvalidFormat`]. Nothing is mutated on
    /// failure -- the caller's current graph is untouched.
    pub fn parse(text: &str) -> Result<Self, PersistError> {
        let value: Value = serde_json::from_str(text)?;
        let obj = value.as_object().ok_or_else(|| PersistError::InvalidFormat {
            reason: "top level is not an object".into(),
        })?;
        for key in ["nodes", "edges"] {
            match obj.get(key) {
                Some(Value::Array(_)) => {}
                Some(_) => {
                    return Err(PersistError::InvalidFormat {
                        reason: format!("\"{key}\" is not an array"),
                    })
                }
                None => {
                    return Err(PersistError::InvalidFormat {
                        reason: format!("missing \"{key}\" array"),
                    })
                }
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reconstructs a graph, re-deriving the registry and connectivity flags
    /// and validating that every edge references existing nodes.
    pub fn into_graph(self) -> Result<FlowGraph, PersistError> {
        Ok(FlowGraph::from_parts(self.nodes, self.edges)?)
    }
}

/// Convenience: serializes a graph straight to pretty JSON.
pub fn export_json(graph: &FlowGraph) -> Result<String, PersistError> {
    FlowFile::from_graph(graph).to_json()
}

/// Convenience: parses JSON text straight into a graph.
pub fn import_json(text: &str) -> Result<FlowGraph, PersistError> {
    FlowFile::parse(text)?.into_graph()
}
