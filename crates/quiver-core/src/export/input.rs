//! Batch-oriented record stream consumed by the bulk importer
//!
//! `ImportInput` never materializes the full entity set: it hands out
//! node-range chunks and materializes one batch of records per chunk on
//! demand. Relationship batches are read through a caller-owned
//! snapshot copy, so every worker drives its own iterator cursors over
//! the shared storage.

use crate::error::Result;
use crate::export::node_snapshot::NodeSnapshot;
use crate::export::rel_snapshot::RelationshipSnapshot;
use crate::graph::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// One node record of the import stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node identifier
    pub id: u64,
    /// Label names, in store enumeration order
    pub labels: Vec<String>,
    /// Property key/value pairs
    pub properties: BTreeMap<String, PropertyValue>,
}

/// One relationship record of the import stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Source node identifier
    pub source: u64,
    /// Target node identifier
    pub target: u64,
    /// Output relationship type name
    pub rel_type: String,
    /// Property key/value pairs
    pub properties: BTreeMap<String, PropertyValue>,
}

/// Lazy, batched input over both export snapshots
pub struct ImportInput<'a> {
    nodes: &'a NodeSnapshot<'a>,
    relationships: &'a RelationshipSnapshot,
    batch_size: usize,
}

impl<'a> ImportInput<'a> {
    /// Wrap both snapshots into a batched record stream
    pub fn new(
        nodes: &'a NodeSnapshot<'a>,
        relationships: &'a RelationshipSnapshot,
        batch_size: usize,
    ) -> Self {
        Self {
            nodes,
            relationships,
            batch_size,
        }
    }

    /// Total number of nodes
    pub fn node_count(&self) -> u64 {
        self.nodes.node_count()
    }

    /// Total number of relationships
    pub fn relationship_count(&self) -> u64 {
        self.relationships.relationship_count()
    }

    /// The relationship snapshot, for handing workers concurrent copies
    pub fn relationship_snapshot(&self) -> &RelationshipSnapshot {
        self.relationships
    }

    /// Node-range chunks of at most `batch_size` nodes each
    ///
    /// Both record streams are driven per node range; relationship
    /// batches cover the outgoing relationships of the chunk's nodes.
    pub fn chunks(&self) -> Vec<Range<u64>> {
        let node_count = self.node_count();
        let step = self.batch_size.max(1) as u64;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < node_count {
            let end = (start + step).min(node_count);
            chunks.push(start..end);
            start = end;
        }
        chunks
    }

    /// Materialize the node records of one chunk
    pub fn node_batch(&self, chunk: Range<u64>) -> Vec<NodeRecord> {
        chunk
            .map(|id| NodeRecord {
                id,
                labels: self
                    .nodes
                    .labels(id)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                properties: self.nodes.properties(id),
            })
            .collect()
    }

    /// Materialize the relationship records of one chunk through the
    /// caller's snapshot copy
    ///
    /// Records are grouped per output type, then per node in adjacency
    /// order. A degree/value-slice mismatch aborts the batch with the
    /// underlying corruption error.
    pub fn relationship_batch(
        &self,
        snapshot: &mut RelationshipSnapshot,
        chunk: Range<u64>,
    ) -> Result<Vec<RelationshipRecord>> {
        let mut records = Vec::new();
        for (rel_type, iter) in snapshot.iterators_mut() {
            let keys = iter.property_keys().to_vec();
            for node in chunk.clone() {
                iter.for_each_relationship(node, |source, target, values| {
                    records.push(RelationshipRecord {
                        source,
                        target,
                        rel_type: rel_type.clone(),
                        properties: keys
                            .iter()
                            .cloned()
                            .zip(values.iter().map(|value| PropertyValue::Double(*value)))
                            .collect(),
                    });
                })?;
            }
        }
        Ok(records)
    }
}
