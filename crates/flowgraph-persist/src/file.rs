//! Flow file save/load on the local filesystem.
//!
//! The file-download / file-picker analogue: a whole flow document written
//! as pretty-printed JSON to a path.

use std::fs;
use std::path::Path;

use flowgraph_core::FlowGraph;

use crate::error::PersistError;
use crate::format::{export_json, import_json};

/// Writes the graph as a pretty-printed flow document at `path`.
pub fn save_to_path(path: impl AsRef<Path>, graph: &FlowGraph) -> Result<(), PersistError> {
    let json = export_json(graph)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads and reconstructs a flow document from `path`.
///
/// On any failure the caller's in-memory state is untouched; a new graph is
/// only produced on success.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<FlowGraph, PersistError> {
    let text = fs::read_to_string(path)?;
    import_json(&text)
}
