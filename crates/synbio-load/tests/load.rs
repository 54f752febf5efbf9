//! End-to-end loader tests: JSON files → record trees → in-memory graph.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use synbio_core::{Properties, Record, RelationType, Scalar};
use synbio_graph::{
    GraphStore, GraphWriter, MemoryGraph, MemoryTxn, NodeHandle, StoreError, StoreTxn, WriteError,
};
use synbio_load::config::LoaderConfig;
use synbio_load::demo::demo_trees;
use synbio_load::input::read_all;
use synbio_load::persist::{write_trees, write_with_retry, LoadReport};

/// Refuses the first `outages` transactions, then behaves like the wrapped
/// graph.
struct OutageStore {
    inner: MemoryGraph,
    outages: u32,
    begins: Arc<AtomicU32>,
}

impl OutageStore {
    fn new(inner: MemoryGraph, outages: u32) -> Self {
        Self {
            inner,
            outages,
            begins: Arc::new(AtomicU32::new(0)),
        }
    }
}

#[async_trait]
impl GraphStore for OutageStore {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn, StoreError> {
        let n = self.begins.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.outages {
            return Err(StoreError::Unavailable(format!("outage {n}")));
        }
        self.inner.begin().await
    }
}

fn fast_retry(max_attempts: u32) -> LoaderConfig {
    LoaderConfig {
        max_attempts,
        backoff_base_ms: 1,
        backoff_max_ms: 5,
    }
}

#[tokio::test]
async fn test_demo_trees_share_part_node() {
    let graph = MemoryGraph::new();
    let writer = GraphWriter::new(graph.clone());

    let report = write_trees(&writer, &demo_trees(), &LoaderConfig::default()).await;
    assert_eq!(report.written, 2);
    assert_eq!(report.failed, 0);

    // Project tree: 8 records. Plate tree: Plate, Well, Plasmid 8, Part 3;
    // Part 3 already exists from the project tree.
    assert_eq!(graph.node_count(), 11);
    assert_eq!(graph.edge_count(), 7 + 3);

    let part3 = graph
        .find_node(
            "Part",
            &Properties::from([("id".to_string(), Scalar::from("Part 3"))]),
        )
        .unwrap();
    let incoming: Vec<RelationType> = graph
        .edges()
        .into_iter()
        .filter(|e| e.child == part3)
        .map(|e| e.relation)
        .collect();
    assert_eq!(
        incoming,
        vec![RelationType::from("BUILT_FROM"), RelationType::from("CONTAINS")]
    );
}

#[tokio::test]
async fn test_files_are_written_and_bad_trees_counted() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("plates.json");
    let bad = dir.path().join("orphans.json");
    std::fs::write(
        &good,
        r#"[
            {"label": "Plate", "properties": {"id": "Plate 1"},
             "children": {"CONTAINS": [
                {"label": "Well", "properties": {"loc_well": "A1"}},
                {"label": "Well", "properties": {"loc_well": "A2"}}
             ]}},
            {"label": "Plate", "properties": {"id": "Plate 2"}}
        ]"#,
    )
    .unwrap();
    std::fs::write(&bad, r#"{"label": "Well", "properties": {}}"#).unwrap();

    let trees = read_all(&[good, bad]).unwrap();
    assert_eq!(trees.len(), 3);

    let graph = MemoryGraph::new();
    let writer = GraphWriter::new(graph.clone());
    let report = write_trees(&writer, &trees, &fast_retry(3)).await;

    assert_eq!(
        report,
        LoadReport {
            written: 2,
            failed: 1,
            node_upserts: 4,
            edge_upserts: 2,
        }
    );
    assert_eq!(graph.node_count(), 4);
}

#[tokio::test]
async fn test_retry_recovers_from_outage() {
    let graph = MemoryGraph::new();
    let store = OutageStore::new(graph.clone(), 2);
    let begins = Arc::clone(&store.begins);
    let writer = GraphWriter::new(store);

    let tree = Record::new("Project").with_property("id", "Project 1");
    write_with_retry(&writer, &tree, &fast_retry(3)).await.unwrap();

    assert_eq!(begins.load(Ordering::SeqCst), 3);
    assert_eq!(graph.node_count(), 1);
}

#[tokio::test]
async fn test_retry_gives_up_after_max_attempts() {
    let graph = MemoryGraph::new();
    let store = OutageStore::new(graph.clone(), 10);
    let begins = Arc::clone(&store.begins);
    let writer = GraphWriter::new(store);

    let tree = Record::new("Project").with_property("id", "Project 1");
    let err = write_with_retry(&writer, &tree, &fast_retry(3))
        .await
        .unwrap_err();

    assert!(matches!(err, WriteError::Connection(_)));
    assert_eq!(begins.load(Ordering::SeqCst), 3);
    assert_eq!(graph.node_count(), 0);
}

#[tokio::test]
async fn test_invalid_tree_is_not_retried() {
    let store = OutageStore::new(MemoryGraph::new(), 0);
    let begins = Arc::clone(&store.begins);
    let writer = GraphWriter::new(store);

    let err = write_with_retry(&writer, &Record::new("Project"), &fast_retry(5))
        .await
        .unwrap_err();

    assert!(matches!(err, WriteError::Constraint(_)));
    assert_eq!(begins.load(Ordering::SeqCst), 0);
}

/// A transaction that rejects every edge, to check the loader surfaces
/// transaction errors after retrying them.
struct EdgeRejectingStore(MemoryGraph);

struct EdgeRejectingTxn(MemoryTxn);

#[async_trait]
impl GraphStore for EdgeRejectingStore {
    type Txn = EdgeRejectingTxn;

    async fn begin(&self) -> Result<EdgeRejectingTxn, StoreError> {
        Ok(EdgeRejectingTxn(self.0.begin().await?))
    }
}

#[async_trait]
impl StoreTxn for EdgeRejectingTxn {
    async fn merge_node(
        &mut self,
        label: &str,
        properties: &Properties,
    ) -> Result<NodeHandle, StoreError> {
        self.0.merge_node(label, properties).await
    }

    async fn merge_edge(
        &mut self,
        _parent: &NodeHandle,
        _child: &NodeHandle,
        relation: &RelationType,
        _index: i64,
    ) -> Result<(), StoreError> {
        Err(StoreError::Rejected(format!("{relation} edges are not allowed")))
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.0.commit().await
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.0.rollback().await
    }
}

#[tokio::test]
async fn test_rejected_transaction_is_reported() {
    let graph = MemoryGraph::new();
    let writer = GraphWriter::new(EdgeRejectingStore(graph.clone()));

    let report = write_trees(&writer, &demo_trees(), &fast_retry(2)).await;

    assert_eq!(report.written, 0);
    assert_eq!(report.failed, 2);
    assert_eq!(graph.node_count(), 0);
}
