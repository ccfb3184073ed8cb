//! Persistence adapter for flow graphs.
//!
//! Serializes the `{nodes, edges}` structure to and from pretty-printed
//! JSON, for files and for keyed string storage. Import validates the
//! document shape, then re-derives the value/range registry and connectivity
//! flags while reconstructing the graph; on any failure the current
//! in-memory state is left untouched.
//!
//! # Modules
//!
//! - [`error`]: PersistError enum with all failure modes
//! - [`format`]: the FlowFile document shape, parse/export
//! - [`traits`]: FlowStore trait definition
//! - [`memory`]: LocalStore keyed in-memory backend
//! - [`file`]: whole-document file save/load

pub mod error;
pub mod file;
pub mod format;
pub mod memory;
pub mod traits;

// Re-export key types for ergonomic use.
pub use error::PersistError;
pub use file::{load_from_path, save_to_path};
pub use format::{export_json, import_json, FlowFile};
pub use memory::LocalStore;
pub use traits::FlowStore;
