//! Graph data model: identifiers, compressed adjacency, and the
//! read-only store surface consumed by the export pipeline

mod store;
mod topology;
mod types;

pub use store::{
    GraphStore, GraphStoreBuilder, InMemoryGraphStore, NodePropertyColumn, RelationshipProjection,
};
pub use topology::{PropertyList, Topology};
pub use types::{NodeId, PropertyValue, RelationshipType};
