//! End-to-end export tests: build a store, export it into a temp
//! directory, and read the record store back.

use quiver_core::error::Error;
use quiver_core::export::{ExportConfig, GraphStoreExport};
use quiver_core::graph::{
    GraphStore, InMemoryGraphStore, NodePropertyColumn, RelationshipProjection, RelationshipType,
};
use quiver_core::loader::{META_FILE, StoreReader};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// 100 nodes labeled `A`, 250 `R` relationships where relationship `i`
/// runs `i % 100 -> (i * 7 + 3) % 100` carrying property `P = i`.
fn sample_store() -> InMemoryGraphStore {
    let mut builder = InMemoryGraphStore::builder();
    builder.add_nodes(100, &["A"]);
    builder.node_property("A", "age", NodePropertyColumn::long((0..100).collect()));
    builder.node_property(
        "A",
        "score",
        NodePropertyColumn::double((0..100).map(|i| i as f64 / 2.0).collect()),
    );
    for i in 0u64..250 {
        builder.add_relationship(
            RelationshipType::named("R"),
            i % 100,
            (i * 7 + 3) % 100,
            &[("P", i as f64)],
        );
    }
    builder.build()
}

fn test_config(db_name: &str) -> ExportConfig {
    ExportConfig {
        db_name: db_name.to_string(),
        ..ExportConfig::default()
    }
}

#[test]
fn export_roundtrips_through_the_record_store() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = sample_store();

    let export = GraphStoreExport::new(&store, dir.path(), test_config("sample"));
    let summary = export.run_for_tests().unwrap();
    // 2 node property keys x 100 nodes, 1 relationship key x 250 rels
    assert_eq!(summary.node_property_count, 200);
    assert_eq!(summary.relationship_property_count, 250);

    let reader = StoreReader::open(dir.path().join("sample")).unwrap();
    assert_eq!(reader.meta().db_name, "sample");
    assert_eq!(reader.meta().node_count, 100);
    assert_eq!(reader.meta().relationship_count, 250);

    let nodes = reader.nodes().unwrap();
    assert_eq!(nodes.len(), 100);
    let ids: Vec<u64> = nodes.iter().map(|record| record.id).collect();
    assert_eq!(ids, (0..100).collect::<Vec<u64>>());
    assert_eq!(nodes[42].labels, vec!["A"]);
    assert_eq!(nodes[42].properties.len(), 2);

    let rels = reader.relationships().unwrap();
    assert_eq!(rels.len(), 250);
    // per source, insertion order survives: node 0 was the source of
    // relationships 0, 100 and 200, all targeting node 3
    let from_zero: Vec<&quiver_core::export::RelationshipRecord> =
        rels.iter().filter(|record| record.source == 0).collect();
    assert_eq!(from_zero.len(), 3);
    for (slot, expected_p) in [(0usize, 0.0), (1, 100.0), (2, 200.0)] {
        assert_eq!(from_zero[slot].target, 3);
        assert_eq!(from_zero[slot].rel_type, "R");
        assert_eq!(
            from_zero[slot].properties["P"],
            quiver_core::graph::PropertyValue::Double(expected_p)
        );
    }
    // nodes 50..99 were only reached twice
    assert_eq!(rels.iter().filter(|record| record.source == 73).count(), 2);
}

#[test]
fn concurrent_export_preserves_record_order() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = sample_store();

    let config = ExportConfig {
        db_name: "ordered".to_string(),
        batch_size: 7,
        write_concurrency: 4,
        ..ExportConfig::default()
    };
    GraphStoreExport::new(&store, dir.path(), config)
        .run_for_tests()
        .unwrap();

    let reader = StoreReader::open(dir.path().join("ordered")).unwrap();
    let ids: Vec<u64> = reader
        .nodes()
        .unwrap()
        .iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(ids, (0..100).collect::<Vec<u64>>());

    let sources: Vec<u64> = reader
        .relationships()
        .unwrap()
        .iter()
        .map(|record| record.source)
        .collect();
    let mut sorted = sources.clone();
    sorted.sort_unstable();
    assert_eq!(sources, sorted);
}

#[test]
fn wildcard_type_is_exported_under_the_default_name() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let mut builder = InMemoryGraphStore::builder();
    builder.add_nodes(3, &[]);
    builder
        .add_relationship(RelationshipType::AllTypes, 0, 1, &[])
        .add_relationship(RelationshipType::AllTypes, 1, 2, &[]);
    let store = builder.build();

    let config = ExportConfig {
        db_name: "wild".to_string(),
        default_relationship_type: "CONNECTED".to_string(),
        ..ExportConfig::default()
    };
    GraphStoreExport::new(&store, dir.path(), config)
        .run_for_tests()
        .unwrap();

    let reader = StoreReader::open(dir.path().join("wild")).unwrap();
    let rels = reader.relationships().unwrap();
    assert_eq!(rels.len(), 2);
    assert!(rels.iter().all(|record| record.rel_type == "CONNECTED"));
}

/// Delegating store that counts snapshot-side calls, to show the
/// conflict check fires before any extraction work.
struct CountingStore {
    inner: InMemoryGraphStore,
    reads: AtomicUsize,
}

impl CountingStore {
    fn new(inner: InMemoryGraphStore) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl GraphStore for CountingStore {
    fn node_count(&self) -> u64 {
        self.inner.node_count()
    }

    fn relationship_count(&self) -> u64 {
        self.inner.relationship_count()
    }

    fn node_labels(&self) -> Vec<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.node_labels()
    }

    fn has_label(&self, node: u64, label: &str) -> bool {
        self.inner.has_label(node, label)
    }

    fn node_property_keys(&self) -> BTreeMap<String, Vec<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.node_property_keys()
    }

    fn node_property_values(&self, label: &str, key: &str) -> Option<NodePropertyColumn> {
        self.inner.node_property_values(label, key)
    }

    fn relationship_types(&self) -> Vec<RelationshipType> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.relationship_types()
    }

    fn relationship_property_keys(&self, rel_type: &RelationshipType) -> Vec<String> {
        self.inner.relationship_property_keys(rel_type)
    }

    fn get_graph(
        &self,
        rel_type: &RelationshipType,
        property_key: Option<&str>,
    ) -> quiver_core::Result<RelationshipProjection> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_graph(rel_type, property_key)
    }
}

#[test]
fn second_export_into_the_same_name_is_a_conflict() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = sample_store();

    GraphStoreExport::new(&store, dir.path(), test_config("dup"))
        .run_for_tests()
        .unwrap();

    let counting = CountingStore::new(sample_store());
    let err = GraphStoreExport::new(&counting, dir.path(), test_config("dup"))
        .run_for_tests()
        .unwrap_err();
    assert!(matches!(err, Error::LocationConflict { db_name } if db_name == "dup"));
    // the conflict was detected before any snapshot was taken
    assert_eq!(counting.reads(), 0);
}

#[test]
fn exports_under_different_names_share_a_target() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = sample_store();

    GraphStoreExport::new(&store, dir.path(), test_config("first"))
        .run_for_tests()
        .unwrap();
    GraphStoreExport::new(&store, dir.path(), test_config("second"))
        .run_for_tests()
        .unwrap();

    assert!(dir.path().join("first").join(META_FILE).exists());
    assert!(dir.path().join("second").join(META_FILE).exists());
}

/// Store whose property lists disagree with their topology's offset
/// scheme, simulating storage corruption.
struct MisalignedStore {
    inner: InMemoryGraphStore,
}

impl GraphStore for MisalignedStore {
    fn node_count(&self) -> u64 {
        self.inner.node_count()
    }

    fn relationship_count(&self) -> u64 {
        self.inner.relationship_count()
    }

    fn node_labels(&self) -> Vec<String> {
        self.inner.node_labels()
    }

    fn has_label(&self, node: u64, label: &str) -> bool {
        self.inner.has_label(node, label)
    }

    fn node_property_keys(&self) -> BTreeMap<String, Vec<String>> {
        self.inner.node_property_keys()
    }

    fn node_property_values(&self, label: &str, key: &str) -> Option<NodePropertyColumn> {
        self.inner.node_property_values(label, key)
    }

    fn relationship_types(&self) -> Vec<RelationshipType> {
        self.inner.relationship_types()
    }

    fn relationship_property_keys(&self, rel_type: &RelationshipType) -> Vec<String> {
        self.inner.relationship_property_keys(rel_type)
    }

    fn get_graph(
        &self,
        rel_type: &RelationshipType,
        property_key: Option<&str>,
    ) -> quiver_core::Result<RelationshipProjection> {
        let mut projection = self.inner.get_graph(rel_type, property_key)?;
        if projection.properties.is_some() {
            // offsets shifted by one relationship: node 0's value slice
            // comes out empty against a degree of 1
            let shifted = vec![0u64, 0, 1];
            projection.properties = Some(quiver_core::graph::PropertyList::new(
                std::sync::Arc::new(shifted),
                vec![1.0],
            ));
        }
        Ok(projection)
    }
}

#[test]
fn misaligned_property_storage_fails_the_export_without_a_manifest() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let mut builder = InMemoryGraphStore::builder();
    builder.add_nodes(2, &[]);
    builder.add_relationship(RelationshipType::named("R"), 0, 1, &[("p", 1.0)]);
    let store = MisalignedStore {
        inner: builder.build(),
    };

    let err = GraphStoreExport::new(&store, dir.path(), test_config("corrupt"))
        .run_for_tests()
        .unwrap_err();
    assert!(matches!(err, Error::CorruptData(_)));
    // the store never completed, so no manifest marks it usable
    assert!(!dir.path().join("corrupt").join(META_FILE).exists());
}

#[cfg(unix)]
#[test]
fn unwritable_target_location_is_rejected() {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("locked");
    std::fs::create_dir(&target).unwrap();
    std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o555)).unwrap();

    let store = sample_store();
    let err = GraphStoreExport::new(&store, &target, test_config("db"))
        .run_for_tests()
        .unwrap_err();
    assert!(matches!(err, Error::LocationUnwritable { .. }));

    std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755)).unwrap();
}
