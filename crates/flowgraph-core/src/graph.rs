//! FlowGraph: the graph store and mutation protocol.
//!
//! [`FlowGraph`] owns the node and edge collections plus the value/range
//! registry, and is the single entry point for all mutations. Every mutation
//! runs to completion as one atomic step computing the full next state;
//! rejected updates leave the prior state unchanged.
//!
//! # Propagation
//!
//! Connectivity changes recompute derived fields:
//! - On attach, the source's label/value snapshot is appended to the target's
//!   source list, the target is promoted to `Processor` unless already
//!   processor-capable, and its derived value is recomputed.
//! - On detach, the matching source entry is dropped; when the list empties,
//!   the node demotes back to `Input` and its process and derived value are
//!   cleared.
//! - Upstream label/value edits ripple through downstream source lists
//!   transitively, recomputing each affected processor's derived value.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;

use crate::edge::FlowEdge;
use crate::error::FlowError;
use crate::id::{EdgeId, NodeId};
use crate::node::{derived_value, DataKind, FlowNode, NodeKind, Position, ProcessKind, SourceRef};
use crate::registry::ValueRegistry;

/// The flow graph container: nodes, edges, and the allocation registry.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: IndexMap<NodeId, FlowNode>,
    edges: IndexMap<EdgeId, FlowEdge>,
    registry: ValueRegistry,
    next_node_id: u64,
    next_edge_id: u64,
}

impl FlowGraph {
    /// Creates an empty graph with an empty registry.
    pub fn new() -> Self {
        FlowGraph::default()
    }

    /// Reconstructs a graph from loaded node and edge collections.
    ///
    /// Validates that IDs are unique and that every edge references existing
    /// nodes, re-derives the registry's allocated sets by scanning every
    /// node's data kind and value, recomputes `connected` flags from the
    /// edge list, and advances the ID counters past the largest imported ID.
    pub fn from_parts(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Result<Self, FlowError> {
        let mut node_map = IndexMap::with_capacity(nodes.len());
        let mut next_node_id = 0;
        for node in nodes {
            next_node_id = next_node_id.max(node.id.0 + 1);
            let id = node.id;
            if node_map.insert(id, node).is_some() {
                return Err(FlowError::Inconsistency {
                    reason: format!("duplicate node id {id}"),
                });
            }
        }

        let mut edge_map = IndexMap::with_capacity(edges.len());
        let mut seen_pairs = HashSet::with_capacity(edges.len());
        let mut next_edge_id = 0;
        for edge in edges {
            next_edge_id = next_edge_id.max(edge.id.0 + 1);
            for endpoint in [edge.source, edge.target] {
                if !node_map.contains_key(&endpoint) {
                    return Err(FlowError::InvalidEdge {
                        reason: format!(
                            "edge {} references missing node {endpoint}",
                            edge.id
                        ),
                    });
                }
            }
            // Pair uniqueness is the same rule `connect` enforces; a loaded
            // document with parallel edges would desync the source lists.
            if !seen_pairs.insert((edge.source, edge.target)) {
                return Err(FlowError::InvalidEdge {
                    reason: format!(
                        "duplicate connection {} -> {}",
                        edge.source, edge.target
                    ),
                });
            }
            if edge_map.insert(edge.id, edge).is_some() {
                return Err(FlowError::Inconsistency {
                    reason: format!("duplicate edge id {}", edge.id),
                });
            }
        }

        // Re-derive the registry from user-held values only; derived
        // `Process(...)` expressions on processors are not allocations.
        let mut registry = ValueRegistry::new();
        for node in node_map.values() {
            if !node.kind.holds_user_value() || node.data.value.is_empty() {
                continue;
            }
            match node.data.data_kind {
                DataKind::Single => {
                    registry.allocate_single(node.data.value.clone());
                }
                DataKind::Range => {
                    registry.allocate_range(node.data.value.clone());
                }
            }
        }

        let inbound: HashSet<NodeId> = edge_map.values().map(|e| e.target).collect();
        for node in node_map.values_mut() {
            node.data.connected = inbound.contains(&node.id);
        }

        Ok(FlowGraph {
            nodes: node_map,
            edges: edge_map,
            registry,
            next_node_id,
            next_edge_id,
        })
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Looks up a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&FlowNode> {
        self.nodes.get(&id)
    }

    /// Looks up an edge by ID.
    pub fn edge(&self, id: EdgeId) -> Option<&FlowEdge> {
        self.edges.get(&id)
    }

    /// Iterates nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.nodes.values()
    }

    /// Iterates edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &FlowEdge> {
        self.edges.values()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Read-only view of the allocation registry.
    pub fn registry(&self) -> &ValueRegistry {
        &self.registry
    }

    /// Number of edges currently targeting `id`.
    pub fn inbound_count(&self, id: NodeId) -> usize {
        self.edges.values().filter(|e| e.target == id).count()
    }

    /// IDs of edges with `id` as either endpoint.
    pub fn edges_touching(&self, id: NodeId) -> Vec<EdgeId> {
        self.edges
            .values()
            .filter(|e| e.touches(id))
            .map(|e| e.id)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Node mutations
    // -----------------------------------------------------------------------

    /// Adds an input node with a fresh ID and default data bag.
    pub fn add_node(&mut self, position: Position) -> NodeId {
        self.insert_node(|id| FlowNode::input(id, position))
    }

    /// Adds a plain label/value node.
    pub fn add_plain_node(&mut self, position: Position) -> NodeId {
        self.insert_node(|id| FlowNode::plain(id, position))
    }

    /// Adds a conditional node.
    pub fn add_conditional_node(&mut self, position: Position) -> NodeId {
        self.insert_node(|id| FlowNode::conditional(id, position))
    }

    fn insert_node(&mut self, build: impl FnOnce(NodeId) -> FlowNode) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        let node = build(id);
        tracing::debug!(%id, kind = ?node.kind, "node added");
        self.nodes.insert(id, node);
        id
    }

    /// Deletes a node, every edge touching it, and its registry allocation.
    ///
    /// Detach propagation runs on every formerly-downstream neighbor. A
    /// missing ID is a silent no-op returning `None`.
    pub fn delete_node(&mut self, id: NodeId) -> Option<FlowNode> {
        let node = self.nodes.shift_remove(&id)?;
        if node.kind.holds_user_value() {
            release_allocation(&node.data, &mut self.registry);
        }

        for edge_id in self.edges_touching(id) {
            if let Some(edge) = self.edges.shift_remove(&edge_id) {
                if edge.source == id {
                    self.detach(edge.source, edge.target);
                }
            }
        }
        tracing::debug!(%id, "node deleted");
        Some(node)
    }

    /// Removes every node, edge, and allocation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.registry.clear();
        self.next_node_id = 0;
        self.next_edge_id = 0;
    }

    // -----------------------------------------------------------------------
    // Edge mutations
    // -----------------------------------------------------------------------

    /// Connects `source` to `target` and runs attach propagation.
    ///
    /// Rejects self-loops, duplicate (source, target) pairs, and missing
    /// endpoints. On success the target records the source's label/value,
    /// promotes to `Processor` unless already processor-capable, and
    /// recomputes its derived value.
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId, FlowError> {
        if source == target {
            return Err(FlowError::SelfConnection { id: source });
        }
        let (src_label, src_value) = {
            let n = self
                .nodes
                .get(&source)
                .ok_or(FlowError::NodeNotFound { id: source })?;
            (n.data.label.clone(), n.data.value.clone())
        };
        if !self.nodes.contains_key(&target) {
            return Err(FlowError::NodeNotFound { id: target });
        }
        if self
            .edges
            .values()
            .any(|e| e.source == source && e.target == target)
        {
            return Err(FlowError::DuplicateConnection {
                from: source,
                target,
            });
        }

        let edge_id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        self.edges.insert(
            edge_id,
            FlowEdge {
                id: edge_id,
                source,
                target,
            },
        );

        if let Some(node) = self.nodes.get_mut(&target) {
            if !node.data.sources.iter().any(|s| s.id == source) {
                node.data.sources.push(SourceRef {
                    id: source,
                    label: src_label,
                    value: src_value,
                });
            }
            if !node.kind.is_processor_capable() {
                // Promotion: the node's user-held value is superseded by the
                // derived expression, so its allocation is released.
                release_allocation(&node.data, &mut self.registry);
                node.data.from.clear();
                node.data.to.clear();
                node.kind = NodeKind::Processor;
            }
            node.data.connected = true;
            if node.kind == NodeKind::Processor {
                node.data.value = derived_value(node.data.process, &node.data.sources);
            }
            tracing::debug!(%source, %target, sources = node.data.sources.len(), "edge attached");
        }
        self.propagate_from(target);
        Ok(edge_id)
    }

    /// Removes an edge and runs detach propagation on its target.
    ///
    /// Any confirmation step belongs to the interface boundary, not here.
    pub fn disconnect(&mut self, edge_id: EdgeId) -> Result<FlowEdge, FlowError> {
        let edge = self
            .edges
            .shift_remove(&edge_id)
            .ok_or(FlowError::EdgeNotFound { id: edge_id })?;
        self.detach(edge.source, edge.target);
        tracing::debug!(source = %edge.source, target = %edge.target, "edge detached");
        Ok(edge)
    }

    /// Removes `source`'s entry from `target`'s source list after an edge
    /// between them has been removed, demoting when the list empties.
    fn detach(&mut self, source: NodeId, target: NodeId) {
        let inbound = self.inbound_count(target);
        if let Some(node) = self.nodes.get_mut(&target) {
            node.data.sources.retain(|s| s.id != source);
            node.data.connected = inbound > 0;
            if node.data.sources.is_empty() {
                if node.kind == NodeKind::Processor {
                    node.kind = NodeKind::Input;
                    node.data.value.clear();
                }
                node.data.process = None;
            } else if node.kind == NodeKind::Processor {
                node.data.value = derived_value(node.data.process, &node.data.sources);
            }
        }
        self.propagate_from(target);
    }

    // -----------------------------------------------------------------------
    // Field updates
    // -----------------------------------------------------------------------

    /// Renames a node and propagates the new label into every downstream
    /// node's source list.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<(), FlowError> {
        let label = label.into();
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(FlowError::NodeNotFound { id })?;
        node.data.label = label;
        self.propagate_from(id);
        Ok(())
    }

    /// Sets a single-mode user value, enforcing registry uniqueness.
    ///
    /// Rejected with [`FlowError::DuplicateValue`] when the value is already
    /// claimed; the prior state is left unchanged. On success the old value
    /// is deallocated, the new one allocated, and downstream snapshots
    /// updated. An empty value clears the field.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), FlowError> {
        let value = value.into();
        let node = self.nodes.get(&id).ok_or(FlowError::NodeNotFound { id })?;
        if !node.kind.holds_user_value() {
            return Err(FlowError::KindMismatch {
                id,
                expected: "value-holding node",
            });
        }
        if node.data.data_kind != DataKind::Single {
            return Err(FlowError::KindMismatch {
                id,
                expected: "single-valued node",
            });
        }
        let old = node.data.value.clone();
        if old == value {
            return Ok(());
        }
        if !value.is_empty() && self.registry.is_single_used(&value) {
            return Err(FlowError::DuplicateValue { value });
        }

        if !old.is_empty() {
            self.registry.deallocate_single(&old);
        }
        if !value.is_empty() {
            self.registry.allocate_single(value.clone());
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.data.value = value;
        }
        self.propagate_from(id);
        Ok(())
    }

    /// Sets the lower range endpoint. See [`set_to`](Self::set_to).
    pub fn set_from(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), FlowError> {
        self.set_endpoint(id, Endpoint::From, value.into())
    }

    /// Sets the upper range endpoint.
    ///
    /// Endpoints are stored individually; only once both are non-empty is
    /// the "from:to" token built, checked for uniqueness, and allocated
    /// (releasing any previously held token).
    pub fn set_to(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), FlowError> {
        self.set_endpoint(id, Endpoint::To, value.into())
    }

    fn set_endpoint(
        &mut self,
        id: NodeId,
        endpoint: Endpoint,
        value: String,
    ) -> Result<(), FlowError> {
        let node = self.nodes.get(&id).ok_or(FlowError::NodeNotFound { id })?;
        if !node.kind.holds_user_value() || node.data.data_kind != DataKind::Range {
            return Err(FlowError::KindMismatch {
                id,
                expected: "range-valued node",
            });
        }

        let (from, to) = match endpoint {
            Endpoint::From => (value, node.data.to.clone()),
            Endpoint::To => (node.data.from.clone(), value),
        };
        let old_token = node.data.value.clone();

        if from.is_empty() || to.is_empty() {
            // Partial entry: store the endpoint. A previously finalized token
            // is no longer backed by both endpoints, so it is released.
            let mut changed = false;
            if let Some(node) = self.nodes.get_mut(&id) {
                if !node.data.value.is_empty() {
                    self.registry.deallocate_range(&node.data.value);
                    node.data.value.clear();
                    changed = true;
                }
                node.data.from = from;
                node.data.to = to;
            }
            if changed {
                self.propagate_from(id);
            }
            return Ok(());
        }

        let new_range = format!("{from}:{to}");
        if old_token == new_range {
            return Ok(());
        }
        if self.registry.is_range_used(&new_range) {
            return Err(FlowError::DuplicateRange { range: new_range });
        }

        if !old_token.is_empty() {
            self.registry.deallocate_range(&old_token);
        }
        self.registry.allocate_range(new_range.clone());
        if let Some(node) = self.nodes.get_mut(&id) {
            node.data.from = from;
            node.data.to = to;
            node.data.value = new_range;
        }
        self.propagate_from(id);
        Ok(())
    }

    /// Switches between single and range entry modes.
    ///
    /// Switching away from `Range` deallocates the held token and clears the
    /// endpoints; switching away from `Single` deallocates the held value.
    /// Either way the value field is cleared pending new entry.
    pub fn set_data_kind(&mut self, id: NodeId, kind: DataKind) -> Result<(), FlowError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(FlowError::NodeNotFound { id })?;
        if !node.kind.holds_user_value() {
            return Err(FlowError::KindMismatch {
                id,
                expected: "value-holding node",
            });
        }
        if node.data.data_kind == kind {
            return Ok(());
        }
        match kind {
            DataKind::Single => {
                if !node.data.value.is_empty() {
                    self.registry.deallocate_range(&node.data.value);
                }
                node.data.from.clear();
                node.data.to.clear();
            }
            DataKind::Range => {
                if !node.data.value.is_empty() {
                    self.registry.deallocate_single(&node.data.value);
                }
            }
        }
        node.data.value.clear();
        node.data.data_kind = kind;
        self.propagate_from(id);
        Ok(())
    }

    /// Chooses a processor's process and recomputes its derived value.
    ///
    /// Rejects non-processor nodes and processes whose minimum input count
    /// exceeds the current source list.
    pub fn set_process(&mut self, id: NodeId, process: ProcessKind) -> Result<(), FlowError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(FlowError::NodeNotFound { id })?;
        if node.kind != NodeKind::Processor {
            return Err(FlowError::KindMismatch {
                id,
                expected: "processor node",
            });
        }
        let needed = process.min_inputs();
        let have = node.data.sources.len();
        if have < needed {
            return Err(FlowError::NotEnoughInputs {
                process,
                needed,
                have,
            });
        }
        node.data.process = Some(process);
        node.data.value = derived_value(Some(process), &node.data.sources);
        self.propagate_from(id);
        Ok(())
    }

    /// Sets a conditional node's branch condition.
    pub fn set_condition(
        &mut self,
        id: NodeId,
        condition: impl Into<String>,
    ) -> Result<(), FlowError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(FlowError::NodeNotFound { id })?;
        if node.kind != NodeKind::Conditional {
            return Err(FlowError::KindMismatch {
                id,
                expected: "conditional node",
            });
        }
        node.data.condition = Some(condition.into());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Propagation
    // -----------------------------------------------------------------------

    /// Pushes `start`'s current label/value into downstream source lists,
    /// transitively: a processor whose derived value changes is itself a
    /// changed source for its own targets. A visited set bounds the walk on
    /// cyclic graphs.
    fn propagate_from(&mut self, start: NodeId) {
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(source) = queue.pop_front() {
            let (label, value) = match self.nodes.get(&source) {
                Some(n) => (n.data.label.clone(), n.data.value.clone()),
                None => continue,
            };
            let targets: Vec<NodeId> = self
                .edges
                .values()
                .filter(|e| e.source == source)
                .map(|e| e.target)
                .collect();

            for target in targets {
                let mut changed = false;
                if let Some(node) = self.nodes.get_mut(&target) {
                    if let Some(entry) =
                        node.data.sources.iter_mut().find(|s| s.id == source)
                    {
                        if entry.label != label || entry.value != value {
                            entry.label = label.clone();
                            entry.value = value.clone();
                            changed = true;
                        }
                    }
                    if changed && node.kind == NodeKind::Processor {
                        node.data.value = derived_value(node.data.process, &node.data.sources);
                        tracing::debug!(%target, value = %node.data.value, "derived value recomputed");
                    }
                }
                if changed && visited.insert(target) {
                    queue.push_back(target);
                }
            }
        }
    }
}

/// Which range endpoint a field update targets.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    From,
    To,
}

/// Releases whatever registry entry the data bag currently holds.
fn release_allocation(data: &crate::node::NodeData, registry: &mut ValueRegistry) {
    if data.value.is_empty() {
        return;
    }
    match data.data_kind {
        DataKind::Single => {
            registry.deallocate_single(&data.value);
        }
        DataKind::Range => {
            registry.deallocate_range(&data.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_connected_nodes() -> (FlowGraph, NodeId, NodeId) {
        let mut graph = FlowGraph::new();
        let n1 = graph.add_node(Position::default());
        let n2 = graph.add_node(Position::default());
        graph.set_value(n1, "Value_1").unwrap();
        graph.connect(n1, n2).unwrap();
        (graph, n1, n2)
    }

    #[test]
    fn add_node_defaults() {
        let mut graph = FlowGraph::new();
        let id = graph.add_node(Position::new(10.0, 20.0));
        let node = graph.node(id).unwrap();
        assert_eq!(node.kind, NodeKind::Input);
        assert_eq!(node.data.label, format!("Node_{id}"));
        assert_eq!(node.data.data_kind, DataKind::Single);
        assert!(!node.data.connected);
    }

    #[test]
    fn fresh_ids_are_unique() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        let b = graph.add_node(Position::default());
        assert_ne!(a, b);
    }

    #[test]
    fn connect_promotes_target_to_processor() {
        let (graph, n1, n2) = two_connected_nodes();
        let target = graph.node(n2).unwrap();
        assert_eq!(target.kind, NodeKind::Processor);
        assert_eq!(target.data.sources.len(), 1);
        assert_eq!(target.data.sources[0].id, n1);
        assert_eq!(target.data.sources[0].value, "Value_1");
        assert_eq!(target.data.value, "Process(Value_1)");
        assert!(target.data.connected);
    }

    #[test]
    fn connect_rejects_self_loop() {
        let mut graph = FlowGraph::new();
        let n = graph.add_node(Position::default());
        assert!(matches!(
            graph.connect(n, n),
            Err(FlowError::SelfConnection { id }) if id == n
        ));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn connect_rejects_duplicate_pair() {
        let (mut graph, n1, n2) = two_connected_nodes();
        assert!(matches!(
            graph.connect(n1, n2),
            Err(FlowError::DuplicateConnection { from, target }) if from == n1 && target == n2
        ));
        assert_eq!(graph.edge_count(), 1);
        // Reverse direction is a different pair.
        graph.connect(n2, n1).unwrap();
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn connect_rejects_missing_endpoint() {
        let mut graph = FlowGraph::new();
        let n = graph.add_node(Position::default());
        assert!(matches!(
            graph.connect(n, NodeId(999)),
            Err(FlowError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn connect_to_conditional_keeps_kind() {
        let mut graph = FlowGraph::new();
        let n1 = graph.add_node(Position::default());
        let cond = graph.add_conditional_node(Position::default());
        graph.connect(n1, cond).unwrap();
        let node = graph.node(cond).unwrap();
        assert_eq!(node.kind, NodeKind::Conditional);
        assert_eq!(node.data.sources.len(), 1);
        assert!(node.data.connected);
    }

    #[test]
    fn promotion_releases_held_value() {
        let (graph, _, _) = two_connected_nodes();
        // n2 held no value, but a promoted node that did must release it.
        let mut graph = graph;
        let n3 = graph.add_node(Position::default());
        graph.set_value(n3, "Held").unwrap();
        assert!(graph.registry().is_single_used("Held"));
        let n1 = graph.nodes().next().unwrap().id;
        graph.connect(n1, n3).unwrap();
        assert!(!graph.registry().is_single_used("Held"));
    }

    #[test]
    fn disconnect_demotes_when_last_edge_removed() {
        let (mut graph, _, n2) = two_connected_nodes();
        let edge_id = graph.edges().next().unwrap().id;
        graph.set_process(n2, ProcessKind::Concat).unwrap();

        graph.disconnect(edge_id).unwrap();
        let node = graph.node(n2).unwrap();
        assert_eq!(node.kind, NodeKind::Input);
        assert!(node.data.sources.is_empty());
        assert_eq!(node.data.process, None);
        assert_eq!(node.data.value, "");
        assert!(!node.data.connected);
    }

    #[test]
    fn disconnect_keeps_connected_while_other_inbound_remains() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        let b = graph.add_node(Position::default());
        let c = graph.add_node(Position::default());
        let first = graph.connect(a, c).unwrap();
        graph.connect(b, c).unwrap();

        graph.disconnect(first).unwrap();
        let node = graph.node(c).unwrap();
        assert!(node.data.connected);
        assert_eq!(node.kind, NodeKind::Processor);
        assert_eq!(node.data.sources.len(), 1);
        assert_eq!(node.data.sources[0].id, b);
    }

    #[test]
    fn disconnect_unknown_edge_errors() {
        let mut graph = FlowGraph::new();
        assert!(matches!(
            graph.disconnect(EdgeId(4)),
            Err(FlowError::EdgeNotFound { .. })
        ));
    }

    #[test]
    fn delete_node_cascades() {
        let (mut graph, n1, n2) = two_connected_nodes();
        let unrelated_a = graph.add_node(Position::default());
        let unrelated_b = graph.add_node(Position::default());
        let kept = graph.connect(unrelated_a, unrelated_b).unwrap();

        let removed = graph.delete_node(n1).unwrap();
        assert_eq!(removed.id, n1);
        assert!(graph.node(n1).is_none());
        // Exactly the touching edge went away.
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge(kept).is_some());
        // Allocation released.
        assert!(!graph.registry().is_single_used("Value_1"));
        // Downstream neighbor reverted.
        let node = graph.node(n2).unwrap();
        assert_eq!(node.kind, NodeKind::Input);
        assert!(node.data.sources.is_empty());
        assert_eq!(node.data.process, None);
        assert!(!node.data.connected);
    }

    #[test]
    fn delete_missing_node_is_silent_noop() {
        let mut graph = FlowGraph::new();
        assert!(graph.delete_node(NodeId(42)).is_none());
    }

    #[test]
    fn set_value_allocates_and_rejects_duplicates() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        let b = graph.add_node(Position::default());
        graph.set_value(a, "X").unwrap();

        let err = graph.set_value(b, "X").unwrap_err();
        assert!(matches!(err, FlowError::DuplicateValue { ref value } if value == "X"));
        // Rejected update left everything unchanged.
        assert_eq!(graph.node(b).unwrap().data.value, "");
        assert_eq!(graph.registry().singles().count(), 1);

        graph.set_value(a, "Y").unwrap();
        assert!(!graph.registry().is_single_used("X"));
        assert!(graph.registry().is_single_used("Y"));
    }

    #[test]
    fn set_same_value_twice_is_noop() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        graph.set_value(a, "X").unwrap();
        graph.set_value(a, "X").unwrap();
        assert_eq!(graph.registry().singles().count(), 1);
    }

    #[test]
    fn set_value_propagates_to_downstream_sources() {
        let (mut graph, n1, n2) = two_connected_nodes();
        graph.set_value(n1, "Value_2").unwrap();
        let node = graph.node(n2).unwrap();
        assert_eq!(node.data.sources[0].value, "Value_2");
        assert_eq!(node.data.value, "Process(Value_2)");
    }

    #[test]
    fn set_label_propagates_to_downstream_sources() {
        let (mut graph, n1, n2) = two_connected_nodes();
        graph.set_label(n1, "Renamed").unwrap();
        assert_eq!(graph.node(n2).unwrap().data.sources[0].label, "Renamed");
    }

    #[test]
    fn propagation_is_transitive() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        let b = graph.add_node(Position::default());
        let c = graph.add_node(Position::default());
        graph.set_value(a, "1").unwrap();
        graph.connect(a, b).unwrap();
        graph.connect(b, c).unwrap();

        graph.set_value(a, "2").unwrap();
        let mid = graph.node(b).unwrap();
        assert_eq!(mid.data.value, "Process(2)");
        let tail = graph.node(c).unwrap();
        assert_eq!(tail.data.sources[0].value, "Process(2)");
        assert_eq!(tail.data.value, "Process(Process(2))");
    }

    #[test]
    fn propagation_terminates_on_cycles() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        let b = graph.add_node(Position::default());
        graph.connect(a, b).unwrap();
        graph.connect(b, a).unwrap();
        graph.set_label(a, "looped").unwrap();
        assert_eq!(graph.node(b).unwrap().data.sources[0].label, "looped");
    }

    #[test]
    fn range_endpoints_finalize_only_when_both_set() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        graph.set_data_kind(a, DataKind::Range).unwrap();

        graph.set_from(a, "A").unwrap();
        let node = graph.node(a).unwrap();
        assert_eq!(node.data.from, "A");
        assert_eq!(node.data.value, "");
        assert_eq!(graph.registry().ranges().count(), 0);

        graph.set_to(a, "F").unwrap();
        let node = graph.node(a).unwrap();
        assert_eq!(node.data.value, "A:F");
        assert!(graph.registry().is_range_used("A:F"));
    }

    #[test]
    fn changing_range_releases_old_token() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        graph.set_data_kind(a, DataKind::Range).unwrap();
        graph.set_from(a, "A").unwrap();
        graph.set_to(a, "F").unwrap();

        graph.set_to(a, "Z").unwrap();
        assert!(!graph.registry().is_range_used("A:F"));
        assert!(graph.registry().is_range_used("A:Z"));
        assert_eq!(graph.node(a).unwrap().data.value, "A:Z");
    }

    #[test]
    fn clearing_an_endpoint_releases_the_token() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        graph.set_data_kind(a, DataKind::Range).unwrap();
        graph.set_from(a, "A").unwrap();
        graph.set_to(a, "F").unwrap();

        graph.set_from(a, "").unwrap();
        assert!(!graph.registry().is_range_used("A:F"));
        let node = graph.node(a).unwrap();
        assert_eq!(node.data.value, "");
        assert_eq!(node.data.to, "F");
    }

    #[test]
    fn duplicate_range_rejected_without_mutation() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        let b = graph.add_node(Position::default());
        for id in [a, b] {
            graph.set_data_kind(id, DataKind::Range).unwrap();
        }
        graph.set_from(a, "A").unwrap();
        graph.set_to(a, "F").unwrap();

        graph.set_from(b, "A").unwrap();
        let err = graph.set_to(b, "F").unwrap_err();
        assert!(matches!(err, FlowError::DuplicateRange { ref range } if range == "A:F"));
        let node = graph.node(b).unwrap();
        assert_eq!(node.data.to, "");
        assert_eq!(node.data.value, "");
        assert_eq!(graph.registry().ranges().count(), 1);
    }

    #[test]
    fn switching_to_range_releases_single_value() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        graph.set_value(a, "X").unwrap();

        graph.set_data_kind(a, DataKind::Range).unwrap();
        assert!(!graph.registry().is_single_used("X"));
        let node = graph.node(a).unwrap();
        assert_eq!(node.data.value, "");
        assert_eq!(node.data.data_kind, DataKind::Range);
    }

    #[test]
    fn switching_to_single_releases_range() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        graph.set_data_kind(a, DataKind::Range).unwrap();
        graph.set_from(a, "A").unwrap();
        graph.set_to(a, "F").unwrap();

        graph.set_data_kind(a, DataKind::Single).unwrap();
        assert!(!graph.registry().is_range_used("A:F"));
        let node = graph.node(a).unwrap();
        assert_eq!(node.data.from, "");
        assert_eq!(node.data.to, "");
        assert_eq!(node.data.value, "");
    }

    #[test]
    fn set_process_recomputes_derived_value() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        let b = graph.add_node(Position::default());
        let c = graph.add_node(Position::default());
        graph.set_value(a, "1").unwrap();
        graph.set_value(b, "2").unwrap();
        graph.connect(a, c).unwrap();
        graph.connect(b, c).unwrap();

        graph.set_process(c, ProcessKind::Sum).unwrap();
        assert_eq!(graph.node(c).unwrap().data.value, "Sum(1, 2)");
    }

    #[test]
    fn set_process_rejects_non_processor() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        assert!(matches!(
            graph.set_process(a, ProcessKind::Sum),
            Err(FlowError::KindMismatch { .. })
        ));
    }

    #[test]
    fn set_process_rejects_insufficient_inputs() {
        let (mut graph, _, n2) = two_connected_nodes();
        let err = graph.set_process(n2, ProcessKind::Sum).unwrap_err();
        assert!(matches!(
            err,
            FlowError::NotEnoughInputs { needed: 2, have: 1, .. }
        ));
        // Concat is fine with one input.
        graph.set_process(n2, ProcessKind::Concat).unwrap();
        assert_eq!(graph.node(n2).unwrap().data.value, "Concat(Value_1)");
    }

    #[test]
    fn set_condition_on_conditional_only() {
        let mut graph = FlowGraph::new();
        let cond = graph.add_conditional_node(Position::default());
        let input = graph.add_node(Position::default());

        graph.set_condition(cond, "A > B").unwrap();
        assert_eq!(
            graph.node(cond).unwrap().data.condition.as_deref(),
            Some("A > B")
        );
        assert!(matches!(
            graph.set_condition(input, "A > B"),
            Err(FlowError::KindMismatch { .. })
        ));
    }

    #[test]
    fn set_value_rejects_range_mode_node() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Position::default());
        graph.set_data_kind(a, DataKind::Range).unwrap();
        assert!(matches!(
            graph.set_value(a, "X"),
            Err(FlowError::KindMismatch { .. })
        ));
    }

    #[test]
    fn clear_wipes_everything() {
        let (mut graph, _, _) = two_connected_nodes();
        graph.clear();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.registry().singles().count(), 0);
        // Counters restart too.
        let id = graph.add_node(Position::default());
        assert_eq!(id, NodeId(0));
    }

    #[test]
    fn from_parts_rebuilds_registry_and_flags() {
        let (graph, n1, n2) = two_connected_nodes();
        let nodes: Vec<FlowNode> = graph.nodes().cloned().collect();
        let edges: Vec<FlowEdge> = graph.edges().copied().collect();

        let rebuilt = FlowGraph::from_parts(nodes, edges).unwrap();
        assert!(rebuilt.registry().is_single_used("Value_1"));
        // Processor's derived value is not an allocation.
        assert_eq!(rebuilt.registry().singles().count(), 1);
        assert!(!rebuilt.node(n1).unwrap().data.connected);
        assert!(rebuilt.node(n2).unwrap().data.connected);
    }

    #[test]
    fn from_parts_advances_id_counters() {
        let (graph, _, _) = two_connected_nodes();
        let max_id = graph.nodes().map(|n| n.id.0).max().unwrap();
        let nodes: Vec<FlowNode> = graph.nodes().cloned().collect();
        let edges: Vec<FlowEdge> = graph.edges().copied().collect();

        let mut rebuilt = FlowGraph::from_parts(nodes, edges).unwrap();
        let fresh = rebuilt.add_node(Position::default());
        assert!(fresh.0 > max_id);
    }

    #[test]
    fn from_parts_rejects_dangling_edge() {
        let node = FlowNode::input(NodeId(0), Position::default());
        let edge = FlowEdge {
            id: EdgeId(0),
            source: NodeId(0),
            target: NodeId(9),
        };
        assert!(matches!(
            FlowGraph::from_parts(vec![node], vec![edge]),
            Err(FlowError::InvalidEdge { .. })
        ));
    }

    #[test]
    fn from_parts_rejects_parallel_edges() {
        let a = FlowNode::input(NodeId(0), Position::default());
        let b = FlowNode::input(NodeId(1), Position::default());
        let parallel = |id| FlowEdge {
            id: EdgeId(id),
            source: NodeId(0),
            target: NodeId(1),
        };
        assert!(matches!(
            FlowGraph::from_parts(vec![a.clone(), b.clone()], vec![parallel(0), parallel(1)]),
            Err(FlowError::InvalidEdge { .. })
        ));
        // Opposite directions are distinct pairs and load fine.
        let reverse = FlowEdge {
            id: EdgeId(1),
            source: NodeId(1),
            target: NodeId(0),
        };
        FlowGraph::from_parts(vec![a, b], vec![parallel(0), reverse]).unwrap();
    }

    #[test]
    fn from_parts_rejects_duplicate_node_ids() {
        let a = FlowNode::input(NodeId(0), Position::default());
        let b = FlowNode::input(NodeId(0), Position::default());
        assert!(matches!(
            FlowGraph::from_parts(vec![a, b], vec![]),
            Err(FlowError::Inconsistency { .. })
        ));
    }
}
