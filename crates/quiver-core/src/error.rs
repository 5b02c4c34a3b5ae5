//! Error types for Quiver Core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the Quiver [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the graph export adapter
///
/// Every variant is fatal to the current export invocation; nothing is
/// retried or recovered locally.
#[derive(Error, Debug)]
pub enum Error {
    /// The target location already contains an importable store
    #[error(
        "a store named [{db_name}] already exists at the target location; \
         the export can only create new stores"
    )]
    LocationConflict {
        /// Name of the conflicting store
        db_name: String,
    },

    /// The target path exists but is not a directory or is not writable
    #[error("target location '{path}' is not writable: {reason}")]
    LocationUnwritable {
        /// The offending path
        path: PathBuf,
        /// Why the path was rejected
        reason: String,
    },

    /// A bound property's value-slice length disagrees with topology
    /// degree — a storage-integrity bug, never a transient condition
    #[error("corrupt relationship data: {0}")]
    CorruptData(String),

    /// I/O failure during directory setup or the bulk-load stage,
    /// carrying the original cause
    #[error("import I/O failure: {0}")]
    ImportIo(#[from] std::io::Error),

    /// Record or manifest encode/decode failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Graph store lookup failure (unknown type or property key)
    #[error("storage error: {0}")]
    Storage(String),

    /// Importer-internal failure (worker pool, writer hand-off)
    #[error("import error: {0}")]
    Import(String),
}

impl Error {
    /// Create a corrupt-data error
    pub fn corrupt_data(msg: impl Into<String>) -> Self {
        Self::CorruptData(msg.into())
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an importer-internal error
    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import(msg.into())
    }
}
