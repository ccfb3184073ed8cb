pub mod edge;
pub mod error;
pub mod graph;
pub mod id;
pub mod labels;
pub mod node;
pub mod registry;

// Re-export commonly used types
pub use edge::FlowEdge;
pub use error::FlowError;
pub use graph::FlowGraph;
pub use id::{EdgeId, NodeId};
pub use labels::all_labels;
pub use node::{
    derived_value, DataKind, FlowNode, NodeData, NodeKind, Position, ProcessKind, SourceRef,
};
pub use registry::ValueRegistry;
