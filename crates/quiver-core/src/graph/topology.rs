//! Compressed adjacency structures shared by the export pipeline
//!
//! Both structures are CSR-shaped: a shared offset index (`n + 1`
//! entries) locates each node's slice inside one flat array. They are
//! built once, immutable afterwards, and cheap to clone — clones share
//! the backing arrays by reference.

use crate::graph::NodeId;
use std::sync::Arc;

/// Compressed adjacency topology for one relationship type
///
/// Maps each node to an ordered sequence of target node identifiers.
#[derive(Debug, Clone)]
pub struct Topology {
    offsets: Arc<Vec<u64>>,
    targets: Arc<Vec<u64>>,
}

impl Topology {
    /// Create a topology from a prefix-sum offset index and a flat
    /// target array
    ///
    /// `offsets` must have one entry per node plus a trailing entry
    /// equal to `targets.len()`.
    pub fn new(offsets: Vec<u64>, targets: Vec<u64>) -> Self {
        assert!(!offsets.is_empty(), "offset index must cover node 0");
        assert_eq!(
            offsets[offsets.len() - 1],
            targets.len() as u64,
            "offset index must terminate at the end of the target array"
        );
        Self {
            offsets: Arc::new(offsets),
            targets: Arc::new(targets),
        }
    }

    /// Number of nodes covered by this topology
    pub fn node_count(&self) -> u64 {
        self.offsets.len() as u64 - 1
    }

    /// Total number of relationships in this topology
    pub fn relationship_count(&self) -> u64 {
        self.offsets[self.offsets.len() - 1]
    }

    /// Number of outgoing relationships of `node`
    pub fn degree(&self, node: NodeId) -> usize {
        let start = self.offsets[node as usize];
        let end = self.offsets[node as usize + 1];
        (end - start) as usize
    }

    /// Target node identifiers of `node`, in adjacency order
    pub fn targets(&self, node: NodeId) -> &[u64] {
        let start = self.offsets[node as usize] as usize;
        let end = self.offsets[node as usize + 1] as usize;
        &self.targets[start..end]
    }

    /// The shared offset index, for property lists built against this
    /// topology
    pub fn offsets(&self) -> &Arc<Vec<u64>> {
        &self.offsets
    }
}

/// Offset-aligned property values parallel to a [`Topology`]
///
/// Uses the same offset scheme as its topology: for every node, the
/// value slice is positionally aligned with the node's target slice.
#[derive(Debug, Clone)]
pub struct PropertyList {
    offsets: Arc<Vec<u64>>,
    values: Arc<Vec<f64>>,
}

impl PropertyList {
    /// Create a property list over an existing offset index
    ///
    /// Passing the offsets `Arc` of the owning topology makes the
    /// shared-offset-scheme invariant structural. The constructor does
    /// not verify alignment; the composite iterator checks it per node
    /// and treats a mismatch as storage corruption.
    pub fn new(offsets: Arc<Vec<u64>>, values: Vec<f64>) -> Self {
        Self {
            offsets,
            values: Arc::new(values),
        }
    }

    /// Property values of `node`, aligned to the topology's target
    /// order
    pub fn values(&self, node: NodeId) -> &[f64] {
        let start = self.offsets[node as usize] as usize;
        let end = self.offsets[node as usize + 1] as usize;
        &self.values[start..end]
    }

    /// The offset index this list was built against
    pub fn offsets(&self) -> &Arc<Vec<u64>> {
        &self.offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_topology() -> Topology {
        // node 0 -> [1, 2], node 1 -> [2], node 2 -> []
        Topology::new(vec![0, 2, 3, 3], vec![1, 2, 2])
    }

    #[test]
    fn degree_and_targets() {
        let topo = small_topology();
        assert_eq!(topo.node_count(), 3);
        assert_eq!(topo.relationship_count(), 3);
        assert_eq!(topo.degree(0), 2);
        assert_eq!(topo.degree(2), 0);
        assert_eq!(topo.targets(0), &[1, 2]);
        assert_eq!(topo.targets(2), &[] as &[u64]);
    }

    #[test]
    fn property_list_shares_offset_scheme() {
        let topo = small_topology();
        let props = PropertyList::new(Arc::clone(topo.offsets()), vec![1.0, 2.0, 3.0]);
        assert!(Arc::ptr_eq(topo.offsets(), props.offsets()));
        assert_eq!(props.values(0), &[1.0, 2.0]);
        assert_eq!(props.values(1), &[3.0]);
    }

    #[test]
    fn clones_share_backing_arrays() {
        let topo = small_topology();
        let copy = topo.clone();
        assert!(Arc::ptr_eq(topo.offsets(), copy.offsets()));
    }

    #[test]
    #[should_panic(expected = "terminate at the end")]
    fn rejects_truncated_offsets() {
        Topology::new(vec![0, 2], vec![1, 2, 2]);
    }
}
