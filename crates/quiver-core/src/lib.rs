//! Quiver core: graph-store snapshots and bulk export
//!
//! Adapts an in-memory property graph to an external bulk loader. The
//! crate freezes read-only node and relationship snapshots of a
//! [`GraphStore`](graph::GraphStore), streams them as batched records,
//! and drives a [`BatchImporter`](loader::BatchImporter) to materialize
//! a new record store on disk.
//!
//! # Quick start
//!
//! ```no_run
//! use quiver_core::export::{ExportConfig, GraphStoreExport};
//! use quiver_core::graph::{InMemoryGraphStore, RelationshipType};
//!
//! # fn main() -> quiver_core::Result<()> {
//! let mut builder = InMemoryGraphStore::builder();
//! let alice = builder.add_node(&["Person"]);
//! let bob = builder.add_node(&["Person"]);
//! builder.add_relationship(RelationshipType::named("KNOWS"), alice, bob, &[]);
//! let store = builder.build();
//!
//! let export = GraphStoreExport::new(&store, "/tmp/exports", ExportConfig::default());
//! let summary = export.run()?;
//! println!("exported {} node properties", summary.node_property_count);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod export;
pub mod graph;
pub mod loader;

pub use error::{Error, Result};
