//! Node-side export snapshot
//!
//! Built once at the start of an export and discarded at its end. The
//! snapshot derives a per-node label-count array and the label-keyed
//! property column maps from the store; label name sequences are
//! materialized on demand per node, in the store's enumeration order.

use crate::graph::{GraphStore, NodeId, NodePropertyColumn, PropertyValue};
use std::collections::BTreeMap;

type LabelColumns = BTreeMap<String, BTreeMap<String, NodePropertyColumn>>;

/// Read-only node extraction for one export invocation
pub struct NodeSnapshot<'a> {
    store: &'a dyn GraphStore,
    node_count: u64,
    label_names: Vec<String>,
    // absent when the store holds only the implicit universal label;
    // then no label array is materialized at all
    label_counts: Option<Vec<u32>>,
    // absent when the store declares no node properties
    properties: Option<LabelColumns>,
}

impl<'a> NodeSnapshot<'a> {
    /// Extract the node snapshot from `store`
    pub fn of(store: &'a dyn GraphStore) -> Self {
        let node_count = store.node_count();
        let label_names = store.node_labels();

        let label_counts = if label_names.is_empty() {
            None
        } else {
            Some(
                (0..node_count)
                    .map(|node| {
                        label_names
                            .iter()
                            .filter(|label| store.has_label(node, label))
                            .count() as u32
                    })
                    .collect(),
            )
        };

        let declared_keys = store.node_property_keys();
        let properties = if declared_keys.is_empty() {
            None
        } else {
            let mut columns: LabelColumns = BTreeMap::new();
            for (label, keys) in declared_keys {
                let per_label = columns.entry(label.clone()).or_default();
                for key in keys {
                    if let Some(column) = store.node_property_values(&label, &key) {
                        per_label.insert(key, column);
                    }
                }
            }
            Some(columns)
        };

        Self {
            store,
            node_count,
            label_names,
            label_counts,
            properties,
        }
    }

    /// Total number of nodes
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Whether the store declared any label beyond the universal one
    pub fn has_labels(&self) -> bool {
        self.label_counts.is_some()
    }

    /// Number of distinct declared property keys, summed per label
    pub fn property_count(&self) -> u64 {
        self.properties
            .as_ref()
            .map(|columns| {
                columns
                    .values()
                    .map(|per_label| per_label.len() as u64)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// The labels of `node`, in the store's enumeration order
    ///
    /// Empty for every node when only the universal label exists.
    pub fn labels(&self, node: NodeId) -> Vec<&str> {
        let Some(counts) = &self.label_counts else {
            return Vec::new();
        };
        let count = counts[node as usize] as usize;
        if count == 0 {
            return Vec::new();
        }
        let mut labels = Vec::with_capacity(count);
        for label in &self.label_names {
            if self.store.has_label(node, label) {
                labels.push(label.as_str());
            }
        }
        labels
    }

    /// The property map of `node`: every key of every label the node
    /// carries
    pub fn properties(&self, node: NodeId) -> BTreeMap<String, PropertyValue> {
        let mut out = BTreeMap::new();
        let Some(columns) = &self.properties else {
            return out;
        };
        for (label, per_label) in columns {
            // with only the universal label, every column applies
            if self.label_counts.is_some() && !self.store.has_label(node, label) {
                continue;
            }
            for (key, column) in per_label {
                out.insert(key.clone(), column.value(node));
            }
        }
        out
    }
}
