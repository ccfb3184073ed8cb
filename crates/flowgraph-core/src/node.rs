//! Node types for the flow graph.
//!
//! A [`FlowNode`] wraps a [`NodeKind`] tag, a canvas [`Position`], and a
//! [`NodeData`] bag with the user-editable and derived fields. The kind is a
//! proper tagged variant -- behavior differences are expressed as a match over
//! the tag, never as runtime field-presence checks.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::NodeId;

/// The closed set of node kinds.
///
/// `Plain` is the bare label/value node; `Input` carries a user-entered value
/// (single or range); `Processor` derives its value from upstream sources;
/// `Conditional` holds a branch condition. `Input` nodes promote to
/// `Processor` when their first inbound edge attaches and demote back when
/// the last one detaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Plain,
    Input,
    Processor,
    Conditional,
}

impl NodeKind {
    /// Returns `true` if this kind accepts inbound edges without changing
    /// kind. Non-capable kinds are promoted to `Processor` on first attach.
    pub fn is_processor_capable(self) -> bool {
        matches!(self, NodeKind::Processor | NodeKind::Conditional)
    }

    /// Returns `true` if this kind holds a user-entered value subject to
    /// registry uniqueness.
    pub fn holds_user_value(self) -> bool {
        matches!(self, NodeKind::Plain | NodeKind::Input)
    }
}

/// Whether a node's value is a single token or a "from:to" range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Single,
    Range,
}

/// The process a `Processor` node applies to its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    Sum,
    Subtract,
    Multiply,
    Divide,
    Average,
    Concat,
}

impl ProcessKind {
    /// The name used in derived value expressions, e.g. `Sum(A, B)`.
    pub fn label(self) -> &'static str {
        match self {
            ProcessKind::Sum => "Sum",
            ProcessKind::Subtract => "Subtract",
            ProcessKind::Multiply => "Multiply",
            ProcessKind::Divide => "Divide",
            ProcessKind::Average => "Average",
            ProcessKind::Concat => "Concat",
        }
    }

    /// Minimum number of sources the process is meaningful over.
    pub fn min_inputs(self) -> usize {
        match self {
            ProcessKind::Sum
            | ProcessKind::Subtract
            | ProcessKind::Multiply
            | ProcessKind::Divide => 2,
            ProcessKind::Average | ProcessKind::Concat => 1,
        }
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One upstream entry in a target node's source list.
///
/// Carries a snapshot of the source's label and value; the graph keeps both
/// in sync when the upstream node is renamed or revalued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: NodeId,
    pub label: String,
    pub value: String,
}

impl SourceRef {
    /// The text this source contributes to a derived expression: its value
    /// when set, otherwise its label.
    pub fn display(&self) -> &str {
        if self.value.is_empty() {
            &self.label
        } else {
            &self.value
        }
    }
}

/// 2-D canvas position. Owned by the render layer; the engine only stores it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// The per-node data bag: user-editable fields plus derived state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Display label.
    pub label: String,
    /// A literal, a "from:to" range token, or a derived "Process(...)"
    /// expression depending on kind and data kind.
    #[serde(default)]
    pub value: String,
    /// Single vs range entry mode.
    pub data_kind: DataKind,
    /// Partial range endpoints. Only finalized into `value` once both are
    /// non-empty.
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    /// Chosen process for `Processor` nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessKind>,
    /// Branch condition for `Conditional` nodes, e.g. "A > B".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Upstream sources, in attach order.
    #[serde(default)]
    pub sources: SmallVec<[SourceRef; 4]>,
    /// True iff at least one edge currently targets this node.
    #[serde(default)]
    pub connected: bool,
}

impl NodeData {
    /// An empty data bag with the given label, in single-value mode.
    pub fn with_label(label: impl Into<String>) -> Self {
        NodeData {
            label: label.into(),
            value: String::new(),
            data_kind: DataKind::Single,
            from: String::new(),
            to: String::new(),
            process: None,
            condition: None,
            sources: SmallVec::new(),
            connected: false,
        }
    }

    /// The "from:to" token currently held, when both endpoints are set.
    pub fn range_token(&self) -> Option<String> {
        if self.from.is_empty() || self.to.is_empty() {
            None
        } else {
            Some(format!("{}:{}", self.from, self.to))
        }
    }
}

/// A node in the flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    pub data: NodeData,
}

impl FlowNode {
    /// Creates an input node with the default `Node_{id}` label.
    pub fn input(id: NodeId, position: Position) -> Self {
        FlowNode {
            id,
            kind: NodeKind::Input,
            position,
            data: NodeData::with_label(format!("Node_{id}")),
        }
    }

    /// Creates a plain label/value node.
    pub fn plain(id: NodeId, position: Position) -> Self {
        FlowNode {
            id,
            kind: NodeKind::Plain,
            position,
            data: NodeData::with_label(format!("Node_{id}")),
        }
    }

    /// Creates a conditional node with an empty condition.
    pub fn conditional(id: NodeId, position: Position) -> Self {
        let mut data = NodeData::with_label(format!("Node_{id}"));
        data.condition = Some(String::new());
        FlowNode {
            id,
            kind: NodeKind::Conditional,
            position,
            data,
        }
    }
}

/// Computes a processor's derived value expression from its source list.
///
/// `Sum(A, B)` when a process is chosen, otherwise the default
/// `Process(A, B)`. Each source contributes its value when set, falling back
/// to its label.
pub fn derived_value(process: Option<ProcessKind>, sources: &[SourceRef]) -> String {
    let args: Vec<&str> = sources.iter().map(SourceRef::display).collect();
    let name = process.map_or("Process", ProcessKind::label);
    format!("{}({})", name, args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: u64, label: &str, value: &str) -> SourceRef {
        SourceRef {
            id: NodeId(id),
            label: label.into(),
            value: value.into(),
        }
    }

    #[test]
    fn input_node_default_label() {
        let node = FlowNode::input(NodeId(17), Position::default());
        assert_eq!(node.data.label, "Node_17");
        assert_eq!(node.kind, NodeKind::Input);
        assert_eq!(node.data.data_kind, DataKind::Single);
        assert!(node.data.sources.is_empty());
        assert!(!node.data.connected);
    }

    #[test]
    fn conditional_node_has_empty_condition() {
        let node = FlowNode::conditional(NodeId(1), Position::default());
        assert_eq!(node.data.condition.as_deref(), Some(""));
    }

    #[test]
    fn processor_capable_kinds() {
        assert!(NodeKind::Processor.is_processor_capable());
        assert!(NodeKind::Conditional.is_processor_capable());
        assert!(!NodeKind::Input.is_processor_capable());
        assert!(!NodeKind::Plain.is_processor_capable());
    }

    #[test]
    fn derived_value_default_process() {
        let sources = [source(1, "A", "Value_1"), source(2, "B", "")];
        assert_eq!(derived_value(None, &sources), "Process(Value_1, B)");
    }

    #[test]
    fn derived_value_with_process() {
        let sources = [source(1, "A", "1"), source(2, "B", "2")];
        assert_eq!(
            derived_value(Some(ProcessKind::Sum), &sources),
            "Sum(1, 2)"
        );
    }

    #[test]
    fn derived_value_no_sources() {
        assert_eq!(derived_value(None, &[]), "Process()");
    }

    #[test]
    fn process_min_inputs() {
        assert_eq!(ProcessKind::Sum.min_inputs(), 2);
        assert_eq!(ProcessKind::Divide.min_inputs(), 2);
        assert_eq!(ProcessKind::Average.min_inputs(), 1);
        assert_eq!(ProcessKind::Concat.min_inputs(), 1);
    }

    #[test]
    fn range_token_requires_both_endpoints() {
        let mut data = NodeData::with_label("N");
        assert_eq!(data.range_token(), None);
        data.from = "A".into();
        assert_eq!(data.range_token(), None);
        data.to = "F".into();
        assert_eq!(data.range_token(), Some("A:F".into()));
    }

    #[test]
    fn serde_roundtrip_flow_node() {
        let mut node = FlowNode::input(NodeId(3), Position::new(100.0, 50.0));
        node.data.value = "X".into();
        let json = serde_json::to_string(&node).unwrap();
        let back: FlowNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }

    #[test]
    fn node_kind_serializes_as_type_field() {
        let node = FlowNode::input(NodeId(1), Position::default());
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "input");
    }
}
