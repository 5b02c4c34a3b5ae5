//! Relationship-side export snapshot
//!
//! Built once per export: resolves every `(type, property)` projection
//! the store declares and merges them into one composite iterator per
//! relationship type. The build runs in two passes — a flat resolution
//! pass followed by a group-by-type pass — so no intermediate state
//! ever holds a type without a topology.

use crate::error::Result;
use crate::export::iterator::CompositeRelationshipIterator;
use crate::graph::{GraphStore, PropertyList, RelationshipProjection, RelationshipType, Topology};
use std::collections::BTreeMap;

/// Read-only relationship extraction for one export invocation
///
/// Keys are final output type names: the `AllTypes` wildcard has
/// already been rewritten to the caller-supplied default.
pub struct RelationshipSnapshot {
    node_count: u64,
    relationship_count: u64,
    iterators: BTreeMap<String, CompositeRelationshipIterator>,
}

/// One `(type, property)` resolution out of the flat first pass
struct Resolution {
    rel_type: RelationshipType,
    property_key: Option<String>,
    projection: RelationshipProjection,
}

impl RelationshipSnapshot {
    /// Extract the relationship snapshot from `store`, rewriting the
    /// wildcard type to `default_relationship_type`
    pub fn of(store: &dyn GraphStore, default_relationship_type: &str) -> Result<Self> {
        // pass 1: flatten the store into (type, property) resolutions
        let mut resolutions = Vec::new();
        for rel_type in store.relationship_types() {
            let keys = store.relationship_property_keys(&rel_type);
            if keys.is_empty() {
                resolutions.push(Resolution {
                    projection: store.get_graph(&rel_type, None)?,
                    rel_type,
                    property_key: None,
                });
            } else {
                for key in keys {
                    resolutions.push(Resolution {
                        projection: store.get_graph(&rel_type, Some(&key))?,
                        rel_type: rel_type.clone(),
                        property_key: Some(key),
                    });
                }
            }
        }

        // pass 2: group by type; the first topology resolution wins and
        // is shared across all of the type's properties
        let mut topologies: BTreeMap<RelationshipType, Topology> = BTreeMap::new();
        let mut properties: BTreeMap<RelationshipType, Vec<(String, PropertyList)>> =
            BTreeMap::new();
        for resolution in resolutions {
            topologies
                .entry(resolution.rel_type.clone())
                .or_insert(resolution.projection.topology);
            if let (Some(key), Some(list)) =
                (resolution.property_key, resolution.projection.properties)
            {
                properties
                    .entry(resolution.rel_type)
                    .or_default()
                    .push((key, list));
            }
        }

        let mut iterators = BTreeMap::new();
        for (rel_type, topology) in topologies {
            let keyed = properties.remove(&rel_type).unwrap_or_default();
            let output_type = rel_type.resolve(default_relationship_type);
            iterators.insert(
                output_type,
                CompositeRelationshipIterator::new(topology, keyed),
            );
        }

        Ok(Self {
            node_count: store.node_count(),
            relationship_count: store.relationship_count(),
            iterators,
        })
    }

    /// Total number of nodes in the source store
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Total number of relationships across all types
    pub fn relationship_count(&self) -> u64 {
        self.relationship_count
    }

    /// Output type names, in deterministic order
    pub fn relationship_types(&self) -> Vec<&str> {
        self.iterators.keys().map(String::as_str).collect()
    }

    /// Sum of bound property keys over all type iterators
    pub fn property_count(&self) -> u64 {
        self.iterators
            .values()
            .map(|iter| iter.property_count() as u64)
            .sum()
    }

    /// The iterator for one output type, if present
    pub fn iterator(&self, output_type: &str) -> Option<&CompositeRelationshipIterator> {
        self.iterators.get(output_type)
    }

    /// Mutable access to every type iterator, for record materialization
    pub fn iterators_mut(
        &mut self,
    ) -> impl Iterator<Item = (&String, &mut CompositeRelationshipIterator)> {
        self.iterators.iter_mut()
    }

    /// A duplicate snapshot whose iterators share the same backing
    /// storage but own independent cursor state
    pub fn concurrent_copy(&self) -> Self {
        Self {
            node_count: self.node_count,
            relationship_count: self.relationship_count,
            iterators: self
                .iterators
                .iter()
                .map(|(output_type, iter)| (output_type.clone(), iter.concurrent_copy()))
                .collect(),
        }
    }
}
