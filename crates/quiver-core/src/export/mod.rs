//! Export pipeline: snapshots, record stream, and orchestration
//!
//! An export takes immutable snapshots of a [`GraphStore`](crate::graph::GraphStore)'s
//! nodes and relationships, wraps them into a lazy batched record
//! stream, and hands that stream to a bulk importer. The pieces:
//!
//! - [`NodeSnapshot`] / [`RelationshipSnapshot`] — read views over the
//!   store, frozen per export invocation
//! - [`CompositeRelationshipIterator`] — zipped traversal of one
//!   topology and its bound property lists
//! - [`ImportInput`] — node-range chunking and on-demand record batches
//! - [`GraphStoreExport`] — the phase-driven orchestrator

mod input;
mod iterator;
mod node_snapshot;
mod orchestrator;
mod rel_snapshot;

pub use input::{ImportInput, NodeRecord, RelationshipRecord};
pub use iterator::CompositeRelationshipIterator;
pub use node_snapshot::NodeSnapshot;
pub use orchestrator::{ExportConfig, ExportPhase, GraphStoreExport, ImportedProperties};
pub use rel_snapshot::RelationshipSnapshot;
