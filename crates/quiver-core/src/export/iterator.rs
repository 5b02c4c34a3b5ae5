//! Composite relationship iterator
//!
//! Binds one adjacency topology to zero or more named property lists
//! under a single per-node alignment contract: for every node, each
//! bound list must supply exactly one value per outgoing relationship,
//! positionally aligned to the target order. The iterator owns nothing
//! but a scratch buffer — [`concurrent_copy`](CompositeRelationshipIterator::concurrent_copy)
//! hands each worker thread an independent cursor over the same shared
//! storage.

use crate::error::{Error, Result};
use crate::graph::{NodeId, PropertyList, Topology};
use std::sync::Arc;

/// Iterator over one relationship type's topology and all its bound
/// property lists
#[derive(Debug)]
pub struct CompositeRelationshipIterator {
    topology: Topology,
    property_keys: Arc<Vec<String>>,
    property_lists: Vec<PropertyList>,
    // per-relationship scratch, reused across visits
    buffer: Vec<f64>,
}

impl CompositeRelationshipIterator {
    /// Bind a topology to an ordered set of keyed property lists
    ///
    /// The given key order becomes the iterator's fixed property
    /// enumeration order.
    pub fn new(topology: Topology, properties: Vec<(String, PropertyList)>) -> Self {
        let (property_keys, property_lists): (Vec<_>, Vec<_>) = properties.into_iter().unzip();
        let buffer = Vec::with_capacity(property_lists.len());
        Self {
            topology,
            property_keys: Arc::new(property_keys),
            property_lists,
            buffer,
        }
    }

    /// Number of outgoing relationships of `node`
    pub fn degree(&self, node: NodeId) -> usize {
        self.topology.degree(node)
    }

    /// Number of bound property keys
    pub fn property_count(&self) -> usize {
        self.property_keys.len()
    }

    /// The bound property keys, in enumeration order
    pub fn property_keys(&self) -> &[String] {
        &self.property_keys
    }

    /// The shared topology backing this iterator
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Visit every outgoing relationship of `node` in adjacency order
    ///
    /// The visitor receives `(source, target, values)` where `values`
    /// holds one entry per bound property key, in enumeration order,
    /// aligned to the same target by position. A value slice whose
    /// length disagrees with the node's degree signals storage
    /// corruption: the error is raised before the visitor sees any
    /// relationship of that node, and the caller must abort the export.
    pub fn for_each_relationship<F>(&mut self, node: NodeId, mut visitor: F) -> Result<()>
    where
        F: FnMut(NodeId, NodeId, &[f64]),
    {
        let Self {
            topology,
            property_keys,
            property_lists,
            buffer,
        } = self;

        let degree = topology.degree(node);
        for (key, list) in property_keys.iter().zip(property_lists.iter()) {
            let len = list.values(node).len();
            if len != degree {
                return Err(Error::corrupt_data(format!(
                    "property '{key}' holds {len} values for node {node} \
                     but the topology degree is {degree}"
                )));
            }
        }

        for (position, &target) in topology.targets(node).iter().enumerate() {
            buffer.clear();
            for list in property_lists.iter() {
                buffer.push(list.values(node)[position]);
            }
            visitor(node, target, buffer);
        }
        Ok(())
    }

    /// A new iterator over the same immutable backing arrays with
    /// freshly initialized cursor state
    ///
    /// No relationship or property data is copied; duplicates traverse
    /// disjoint node ranges concurrently without locks.
    pub fn concurrent_copy(&self) -> Self {
        Self {
            topology: self.topology.clone(),
            property_keys: Arc::clone(&self.property_keys),
            property_lists: self.property_lists.clone(),
            buffer: Vec::with_capacity(self.property_lists.len()),
        }
    }
}
