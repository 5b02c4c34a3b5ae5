//! Bulk importer seam and the reference record-store importer
//!
//! The export pipeline hands an [`ImportInput`](crate::export::ImportInput)
//! to a [`BatchImporter`]; the importer owns the worker pool, consumes
//! the record stream batch by batch, and materializes a new store at
//! the target location. [`RecordStoreImporter`] is the reference
//! implementation: a flat record sink, deliberately not a database
//! engine, that exists to drive exports and verify them end to end via
//! [`StoreReader`].

mod importer;
mod reader;

pub use importer::RecordStoreImporter;
pub use reader::StoreReader;

use crate::error::Result;
use crate::export::ImportInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name of the node record batches
pub const NODES_FILE: &str = "nodes.store";
/// File name of the relationship record batches
pub const RELATIONSHIPS_FILE: &str = "relationships.store";
/// File name of the store manifest; its presence marks a complete store
pub const META_FILE: &str = "store.meta.json";
/// Current record-store format version
pub const STORE_FORMAT_VERSION: u32 = 1;

/// Importer tuning knobs, fixed by the orchestrator per export
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Worker pool size for record materialization
    pub max_threads: usize,
    /// Write-buffer memory budget in bytes
    pub page_cache_memory: u64,
    /// Whether the target medium tolerates aggressive I/O; kept
    /// conservative, controls only end-of-stage fsync behavior
    pub high_io: bool,
    /// Emit a debug event per written batch
    pub debug_log: bool,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            max_threads: 4,
            page_cache_memory: 256 * 1024 * 1024,
            high_io: false,
            debug_log: false,
        }
    }
}

/// Manifest describing a completed record store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    /// Record-store format version
    pub format_version: u32,
    /// Name of the store
    pub db_name: String,
    /// Number of node records
    pub node_count: u64,
    /// Number of relationship records
    pub relationship_count: u64,
}

/// Import statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStats {
    /// Total node records written
    pub nodes_imported: u64,
    /// Total relationship records written
    pub relationships_imported: u64,
    /// Import start time
    pub start_time: DateTime<Utc>,
    /// Import end time
    pub end_time: Option<DateTime<Utc>>,
    /// Import duration in seconds
    pub duration_seconds: Option<f64>,
}

impl ImportStats {
    fn begin() -> Self {
        Self {
            nodes_imported: 0,
            relationships_imported: 0,
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: None,
        }
    }

    fn finish(&mut self) {
        let end = Utc::now();
        self.duration_seconds =
            Some((end - self.start_time).num_milliseconds() as f64 / 1000.0);
        self.end_time = Some(end);
    }
}

/// The external bulk-loader contract
///
/// The import call blocks until the loader completes or fails; there is
/// no cancellation once it begins.
pub trait BatchImporter {
    /// Consume the record stream and materialize a new store
    fn import(&self, input: &ImportInput<'_>) -> Result<ImportStats>;
}
