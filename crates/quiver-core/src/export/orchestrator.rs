//! Export orchestration
//!
//! Drives one export invocation through its phases: validate the target
//! location, build both snapshots, delegate to the bulk importer, and
//! compute the materialized-property summary. Any failure is fatal to
//! the invocation; transient resources are released exactly once on
//! every exit path via a drop-backed lifecycle guard.

use crate::error::{Error, Result};
use crate::export::input::ImportInput;
use crate::export::node_snapshot::NodeSnapshot;
use crate::export::rel_snapshot::RelationshipSnapshot;
use crate::graph::GraphStore;
use crate::loader::{BatchImporter, ImporterConfig, META_FILE, RecordStoreImporter};
use std::fs;
use std::path::{Path, PathBuf};

/// Default importer write-buffer budget
const DEFAULT_PAGE_CACHE_MEMORY: u64 = 256 * 1024 * 1024;
/// Reduced budget for unit/integration test environments
const TEST_PAGE_CACHE_MEMORY: u64 = 8 * 1024 * 1024;

/// Configuration surface of one export invocation
///
/// Values are consumed as given; range validation happens in the
/// declarative configuration layer, not here.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Name of the store to create under the target location
    pub db_name: String,
    /// Number of nodes per record batch
    pub batch_size: usize,
    /// Worker pool size of the import stage
    pub write_concurrency: usize,
    /// Output name substituted for the wildcard relationship type
    pub default_relationship_type: String,
    /// Emit a debug event per written batch
    pub enable_debug_log: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            db_name: "graph".to_string(),
            batch_size: 10_000,
            write_concurrency: 4,
            default_relationship_type: "REL".to_string(),
            enable_debug_log: false,
        }
    }
}

/// Summary of the properties materialized by one export
///
/// Both counts multiply the distinct property-key count by the entity
/// count, which assumes uniform property presence across entities; for
/// sparse presence this is an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportedProperties {
    /// Distinct node property keys × total node count
    pub node_property_count: u64,
    /// Bound relationship property keys × total relationship count
    pub relationship_property_count: u64,
}

/// Phases of one export invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    /// Checking the target location
    Validating,
    /// Building node and relationship snapshots
    Snapshotting,
    /// Bulk loader running
    Importing,
    /// Computing the property summary
    Summarizing,
    /// Export complete
    Done,
    /// Export aborted; reachable from every other phase
    Failed,
}

/// Releases transient export resources exactly once, on every exit path
struct Lifecycle {
    phase: ExportPhase,
    released: bool,
}

impl Lifecycle {
    fn start() -> Self {
        Self {
            phase: ExportPhase::Validating,
            released: false,
        }
    }

    fn enter(&mut self, phase: ExportPhase) {
        tracing::info!(phase = ?phase, "export phase");
        self.phase = phase;
    }

    fn finish(&mut self, terminal: ExportPhase) {
        self.phase = terminal;
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            tracing::debug!(phase = ?self.phase, "export resources released");
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Orchestrates one export of a graph store into a new record store
pub struct GraphStoreExport<'a> {
    store: &'a dyn GraphStore,
    target_dir: PathBuf,
    config: ExportConfig,
}

impl<'a> GraphStoreExport<'a> {
    /// Create an export of `store` into `target_dir`
    pub fn new(
        store: &'a dyn GraphStore,
        target_dir: impl Into<PathBuf>,
        config: ExportConfig,
    ) -> Self {
        Self {
            store,
            target_dir: target_dir.into(),
            config,
        }
    }

    /// Run the export with production buffer sizing
    pub fn run(&self) -> Result<ImportedProperties> {
        self.run_with_budget(DEFAULT_PAGE_CACHE_MEMORY)
    }

    /// Run with defaults geared towards unit/integration test
    /// environments, for example a lower buffer budget
    pub fn run_for_tests(&self) -> Result<ImportedProperties> {
        self.run_with_budget(TEST_PAGE_CACHE_MEMORY)
    }

    fn run_with_budget(&self, page_cache_memory: u64) -> Result<ImportedProperties> {
        let mut lifecycle = Lifecycle::start();
        let result = self.run_phases(page_cache_memory, &mut lifecycle);
        match &result {
            Ok(summary) => {
                lifecycle.finish(ExportPhase::Done);
                tracing::info!(
                    node_properties = summary.node_property_count,
                    relationship_properties = summary.relationship_property_count,
                    "graph export complete"
                );
            }
            Err(error) => {
                lifecycle.finish(ExportPhase::Failed);
                tracing::error!(error = %error, "graph export failed");
            }
        }
        result
    }

    fn run_phases(
        &self,
        page_cache_memory: u64,
        lifecycle: &mut Lifecycle,
    ) -> Result<ImportedProperties> {
        lifecycle.enter(ExportPhase::Validating);
        let db_dir = self.target_dir.join(&self.config.db_name);
        let meta_path = db_dir.join(META_FILE);
        if meta_path.exists() && fs::metadata(&meta_path).is_ok() {
            return Err(Error::LocationConflict {
                db_name: self.config.db_name.clone(),
            });
        }
        ensure_writable_directory(&self.target_dir)?;

        lifecycle.enter(ExportPhase::Snapshotting);
        let node_snapshot = NodeSnapshot::of(self.store);
        let rel_snapshot =
            RelationshipSnapshot::of(self.store, &self.config.default_relationship_type)?;

        lifecycle.enter(ExportPhase::Importing);
        let input = ImportInput::new(&node_snapshot, &rel_snapshot, self.config.batch_size);
        let importer = RecordStoreImporter::new(
            &db_dir,
            &self.config.db_name,
            ImporterConfig {
                max_threads: self.config.write_concurrency,
                page_cache_memory,
                // conservative fixed value; the target medium is unknown
                high_io: false,
                debug_log: self.config.enable_debug_log,
            },
        );
        let importer: &dyn BatchImporter = &importer;
        let stats = importer.import(&input)?;

        lifecycle.enter(ExportPhase::Summarizing);
        tracing::info!(
            nodes = stats.nodes_imported,
            relationships = stats.relationships_imported,
            "bulk import finished"
        );
        Ok(ImportedProperties {
            node_property_count: node_snapshot.property_count() * self.store.node_count(),
            relationship_property_count: rel_snapshot.property_count()
                * self.store.relationship_count(),
        })
    }
}

/// Create the target directory if absent and verify it is a writable
/// directory
fn ensure_writable_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::LocationUnwritable {
                path: path.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }
    } else {
        fs::create_dir_all(path).map_err(|e| Error::LocationUnwritable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    let metadata = fs::metadata(path).map_err(|e| Error::LocationUnwritable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if metadata.permissions().readonly() {
        return Err(Error::LocationUnwritable {
            path: path.to_path_buf(),
            reason: "directory is read-only".to_string(),
        });
    }
    Ok(())
}
