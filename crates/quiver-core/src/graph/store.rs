//! Graph store surface consumed by the export pipeline
//!
//! [`GraphStore`] is exactly the read-only capability set the exporter
//! needs: entity counts, label membership, node property columns, and
//! per-type topology/property projections. The in-memory implementation
//! keeps label membership in roaring bitmaps and relationship data in
//! CSR form, built once and immutable afterwards.

use crate::error::{Error, Result};
use crate::graph::topology::{PropertyList, Topology};
use crate::graph::types::{NodeId, PropertyValue, RelationshipType};
use roaring::RoaringTreemap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// One relationship projection resolved from the store: the type's
/// shared topology plus at most one property list
///
/// This capability pair is the whole contract between storage and the
/// export pipeline; nothing downstream depends on a concrete storage
/// engine type.
#[derive(Debug, Clone)]
pub struct RelationshipProjection {
    /// Adjacency topology of the relationship type
    pub topology: Topology,
    /// The requested property list, if a key was requested
    pub properties: Option<PropertyList>,
}

/// A node property column: one value per node, shared by reference
#[derive(Debug, Clone)]
pub enum NodePropertyColumn {
    /// 64-bit integer column
    Long(Arc<Vec<i64>>),
    /// 64-bit float column
    Double(Arc<Vec<f64>>),
}

impl NodePropertyColumn {
    /// Create an integer column
    pub fn long(values: Vec<i64>) -> Self {
        Self::Long(Arc::new(values))
    }

    /// Create a float column
    pub fn double(values: Vec<f64>) -> Self {
        Self::Double(Arc::new(values))
    }

    /// Number of nodes covered by this column
    pub fn len(&self) -> u64 {
        match self {
            Self::Long(v) => v.len() as u64,
            Self::Double(v) => v.len() as u64,
        }
    }

    /// Whether the column covers no nodes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The property value of `node`
    pub fn value(&self, node: NodeId) -> PropertyValue {
        match self {
            Self::Long(v) => PropertyValue::Long(v[node as usize]),
            Self::Double(v) => PropertyValue::Double(v[node as usize]),
        }
    }
}

/// Read-only graph store surface consumed by one export invocation
///
/// The store is immutable and outlives the export call; everything the
/// exporter derives from it is rebuilt fresh per invocation.
pub trait GraphStore: Send + Sync {
    /// Total number of nodes
    fn node_count(&self) -> u64;

    /// Total number of relationships across all types
    fn relationship_count(&self) -> u64;

    /// All declared node labels, in the store's enumeration order
    ///
    /// Empty when the store contains only the implicit universal label.
    fn node_labels(&self) -> Vec<String>;

    /// Whether `node` carries `label`
    fn has_label(&self, node: NodeId, label: &str) -> bool;

    /// Declared node property keys, grouped per label
    fn node_property_keys(&self) -> BTreeMap<String, Vec<String>>;

    /// The property column for `(label, key)`, if declared
    fn node_property_values(&self, label: &str, key: &str) -> Option<NodePropertyColumn>;

    /// All declared relationship types
    fn relationship_types(&self) -> Vec<RelationshipType>;

    /// Property keys bound to `rel_type` (possibly none)
    fn relationship_property_keys(&self, rel_type: &RelationshipType) -> Vec<String>;

    /// Resolve the topology of `rel_type`, together with the property
    /// list for `property_key` when one is requested
    fn get_graph(
        &self,
        rel_type: &RelationshipType,
        property_key: Option<&str>,
    ) -> Result<RelationshipProjection>;
}

/// An immutable, in-memory compressed graph store
///
/// Built once through [`GraphStoreBuilder`]; all query methods are
/// lock-free reads over shared storage.
pub struct InMemoryGraphStore {
    node_count: u64,
    relationship_count: u64,
    labels: Vec<String>,
    label_members: HashMap<String, RoaringTreemap>,
    node_properties: BTreeMap<String, BTreeMap<String, NodePropertyColumn>>,
    topologies: BTreeMap<RelationshipType, Topology>,
    relationship_properties: BTreeMap<RelationshipType, BTreeMap<String, PropertyList>>,
}

impl InMemoryGraphStore {
    /// Start building a new store
    pub fn builder() -> GraphStoreBuilder {
        GraphStoreBuilder::default()
    }
}

impl GraphStore for InMemoryGraphStore {
    fn node_count(&self) -> u64 {
        self.node_count
    }

    fn relationship_count(&self) -> u64 {
        self.relationship_count
    }

    fn node_labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn has_label(&self, node: NodeId, label: &str) -> bool {
        self.label_members
            .get(label)
            .is_some_and(|members| members.contains(node))
    }

    fn node_property_keys(&self) -> BTreeMap<String, Vec<String>> {
        self.node_properties
            .iter()
            .map(|(label, columns)| (label.clone(), columns.keys().cloned().collect()))
            .collect()
    }

    fn node_property_values(&self, label: &str, key: &str) -> Option<NodePropertyColumn> {
        self.node_properties
            .get(label)
            .and_then(|columns| columns.get(key))
            .cloned()
    }

    fn relationship_types(&self) -> Vec<RelationshipType> {
        self.topologies.keys().cloned().collect()
    }

    fn relationship_property_keys(&self, rel_type: &RelationshipType) -> Vec<String> {
        self.relationship_properties
            .get(rel_type)
            .map(|lists| lists.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn get_graph(
        &self,
        rel_type: &RelationshipType,
        property_key: Option<&str>,
    ) -> Result<RelationshipProjection> {
        let topology = self
            .topologies
            .get(rel_type)
            .cloned()
            .ok_or_else(|| Error::storage(format!("unknown relationship type '{rel_type}'")))?;
        let properties = match property_key {
            None => None,
            Some(key) => Some(
                self.relationship_properties
                    .get(rel_type)
                    .and_then(|lists| lists.get(key))
                    .cloned()
                    .ok_or_else(|| {
                        Error::storage(format!(
                            "relationship type '{rel_type}' has no property '{key}'"
                        ))
                    })?,
            ),
        };
        Ok(RelationshipProjection {
            topology,
            properties,
        })
    }
}

struct PendingRelationship {
    source: NodeId,
    target: NodeId,
    properties: Vec<(String, f64)>,
}

/// Builder for [`InMemoryGraphStore`]
///
/// Labels are registered in first-seen order, which becomes the store's
/// label enumeration order. Adding only unlabeled nodes produces a
/// store with just the implicit universal label.
#[derive(Default)]
pub struct GraphStoreBuilder {
    next_node: u64,
    labels: Vec<String>,
    label_members: HashMap<String, RoaringTreemap>,
    node_properties: BTreeMap<String, BTreeMap<String, NodePropertyColumn>>,
    relationships: BTreeMap<RelationshipType, Vec<PendingRelationship>>,
}

impl GraphStoreBuilder {
    /// Add one node carrying the given labels; returns its id
    pub fn add_node(&mut self, labels: &[&str]) -> NodeId {
        let node = self.next_node;
        self.next_node += 1;
        for &label in labels {
            if !self.labels.iter().any(|known| known == label) {
                self.labels.push(label.to_string());
            }
            self.label_members
                .entry(label.to_string())
                .or_default()
                .insert(node);
        }
        node
    }

    /// Add `count` nodes all carrying the same labels; returns the id
    /// of the first one
    pub fn add_nodes(&mut self, count: u64, labels: &[&str]) -> NodeId {
        let first = self.next_node;
        for _ in 0..count {
            self.add_node(labels);
        }
        first
    }

    /// Attach a property column to a declared label
    ///
    /// The column must cover every node of the finished store.
    pub fn node_property(
        &mut self,
        label: &str,
        key: &str,
        column: NodePropertyColumn,
    ) -> &mut Self {
        self.node_properties
            .entry(label.to_string())
            .or_default()
            .insert(key.to_string(), column);
        self
    }

    /// Add one relationship with its property values
    ///
    /// Per-source adjacency order is insertion order. Keys bound to a
    /// type but absent on an individual relationship are filled with
    /// the storage default (`NaN`) so every property list stays aligned
    /// with the type's topology.
    pub fn add_relationship(
        &mut self,
        rel_type: RelationshipType,
        source: NodeId,
        target: NodeId,
        properties: &[(&str, f64)],
    ) -> &mut Self {
        self.relationships
            .entry(rel_type)
            .or_default()
            .push(PendingRelationship {
                source,
                target,
                properties: properties
                    .iter()
                    .map(|(key, value)| (key.to_string(), *value))
                    .collect(),
            });
        self
    }

    /// Finalize the store, compressing each type's relationships into
    /// CSR form
    pub fn build(self) -> InMemoryGraphStore {
        let node_count = self.next_node;
        let mut relationship_count = 0u64;
        let mut topologies = BTreeMap::new();
        let mut relationship_properties = BTreeMap::new();

        for (rel_type, pending) in self.relationships {
            relationship_count += pending.len() as u64;

            let mut degrees = vec![0u64; node_count as usize];
            for rel in &pending {
                assert!(
                    rel.source < node_count && rel.target < node_count,
                    "relationship endpoint outside node id space"
                );
                degrees[rel.source as usize] += 1;
            }
            let mut offsets = Vec::with_capacity(node_count as usize + 1);
            let mut running = 0u64;
            offsets.push(0);
            for degree in &degrees {
                running += degree;
                offsets.push(running);
            }

            let keys: BTreeSet<String> = pending
                .iter()
                .flat_map(|rel| rel.properties.iter().map(|(key, _)| key.clone()))
                .collect();

            // Place relationships at each source's cursor so per-source
            // insertion order survives the compression.
            let mut cursors: Vec<u64> = offsets[..node_count as usize].to_vec();
            let mut targets = vec![0u64; pending.len()];
            let mut values: BTreeMap<String, Vec<f64>> = keys
                .iter()
                .map(|key| (key.clone(), vec![f64::NAN; pending.len()]))
                .collect();
            for rel in &pending {
                let slot = cursors[rel.source as usize] as usize;
                cursors[rel.source as usize] += 1;
                targets[slot] = rel.target;
                for (key, value) in &rel.properties {
                    if let Some(column) = values.get_mut(key) {
                        column[slot] = *value;
                    }
                }
            }

            let topology = Topology::new(offsets, targets);
            let lists: BTreeMap<String, PropertyList> = values
                .into_iter()
                .map(|(key, column)| {
                    (
                        key,
                        PropertyList::new(Arc::clone(topology.offsets()), column),
                    )
                })
                .collect();
            if !lists.is_empty() {
                relationship_properties.insert(rel_type.clone(), lists);
            }
            topologies.insert(rel_type, topology);
        }

        for (label, columns) in &self.node_properties {
            assert!(
                self.labels.iter().any(|known| known == label),
                "property column attached to undeclared label '{label}'"
            );
            for (key, column) in columns {
                assert_eq!(
                    column.len(),
                    node_count,
                    "column '{key}' on label '{label}' does not cover the node id space"
                );
            }
        }

        InMemoryGraphStore {
            node_count,
            relationship_count,
            labels: self.labels,
            label_members: self.label_members,
            node_properties: self.node_properties,
            topologies,
            relationship_properties,
        }
    }
}
