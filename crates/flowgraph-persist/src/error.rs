//! Persistence error types.
//!
//! [`PersistError`] covers all anticipated failure modes of the adapter:
//! malformed JSON text, structurally invalid flow documents, storage-key
//! misses, file I/O, and graph reconstruction failures bubbled up from the
//! core. Every error is surfaced to the user and leaves the in-memory state
//! untouched.

use thiserror::Error;

use flowgraph_core::FlowError;

/// Errors produced by the persistence adapter.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The payload is not valid JSON.
    #[error("flow parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The JSON is well-formed but is not a flow document (e.g. missing the
    /// top-level `nodes` or `edges` arrays).
    #[error("invalid flow format: {reason}")]
    InvalidFormat { reason: String },

    /// No flow is stored under the requested key.
    #[error("no flow stored under key \"{key}\"")]
    KeyNotFound { key: String },

    /// Reading or writing a flow file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The document parsed but could not be reconstructed into a valid graph.
    #[error(transparent)]
    Flow(#[from] FlowError),
}
