//! In-process graph store with the same MERGE semantics as the Neo4j store.
//!
//! Used for dry runs of the loader and for tests. A transaction stages its
//! upserts privately and applies them under one lock at commit, so a
//! dropped or rolled-back transaction leaves no trace and concurrent
//! transactions on overlapping identities cannot duplicate nodes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};

use synbio_core::{Properties, RelationType};

use crate::store::{GraphStore, NodeHandle, StoreError, StoreTxn};

/// A node stored in a [`MemoryGraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryNode {
    pub label: String,
    pub properties: Properties,
}

/// An edge stored in a [`MemoryGraph`]. Its fields are also its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryEdge {
    pub parent: NodeHandle,
    pub child: NodeHandle,
    pub relation: RelationType,
    pub index: i64,
}

#[derive(Debug, Default)]
struct GraphState {
    nodes: IndexMap<NodeHandle, MemoryNode>,
    edges: IndexSet<MemoryEdge>,
}

/// Shared in-memory property graph. Clones share the same graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    state: Arc<Mutex<GraphState>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }

    /// All committed nodes in creation order.
    pub fn nodes(&self) -> Vec<MemoryNode> {
        self.lock().nodes.values().cloned().collect()
    }

    /// All committed edges in creation order.
    pub fn edges(&self) -> Vec<MemoryEdge> {
        self.lock().edges.iter().cloned().collect()
    }

    pub fn node(&self, handle: &NodeHandle) -> Option<MemoryNode> {
        self.lock().nodes.get(handle).cloned()
    }

    /// Handle of the committed node with exactly this label and property set.
    pub fn find_node(&self, label: &str, properties: &Properties) -> Option<NodeHandle> {
        let handle = identity(label, properties).ok()?;
        self.lock().nodes.contains_key(&handle).then_some(handle)
    }

    /// Committed edges of one relationship type leaving `parent`, ordered by
    /// `index`.
    pub fn edges_from(&self, parent: &NodeHandle, relation: &str) -> Vec<MemoryEdge> {
        let mut edges: Vec<MemoryEdge> = self
            .lock()
            .edges
            .iter()
            .filter(|e| &e.parent == parent && e.relation.as_str() == relation)
            .cloned()
            .collect();
        edges.sort_by_key(|e| e.index);
        edges
    }

    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn, StoreError> {
        Ok(MemoryTxn {
            graph: self.clone(),
            nodes: IndexMap::new(),
            edges: IndexSet::new(),
        })
    }
}

/// A [`MemoryGraph`] transaction.
pub struct MemoryTxn {
    graph: MemoryGraph,
    nodes: IndexMap<NodeHandle, MemoryNode>,
    edges: IndexSet<MemoryEdge>,
}

#[async_trait]
impl StoreTxn for MemoryTxn {
    async fn merge_node(
        &mut self,
        label: &str,
        properties: &Properties,
    ) -> Result<NodeHandle, StoreError> {
        let handle = identity(label, properties)?;
        let committed = self.graph.lock().nodes.contains_key(&handle);
        if !committed {
            self.nodes
                .entry(handle.clone())
                .or_insert_with(|| MemoryNode {
                    label: label.to_string(),
                    properties: properties.clone(),
                });
        }
        Ok(handle)
    }

    async fn merge_edge(
        &mut self,
        parent: &NodeHandle,
        child: &NodeHandle,
        relation: &RelationType,
        index: i64,
    ) -> Result<(), StoreError> {
        {
            let state = self.graph.lock();
            for handle in [parent, child] {
                if !self.nodes.contains_key(handle) && !state.nodes.contains_key(handle) {
                    return Err(StoreError::Rejected(format!("No node with handle {handle}")));
                }
            }
        }

        let edge = MemoryEdge {
            parent: parent.clone(),
            child: child.clone(),
            relation: relation.clone(),
            index,
        };
        self.edges.insert(edge);
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut state = self.graph.lock();
        for (handle, node) in self.nodes {
            state.nodes.entry(handle).or_insert(node);
        }
        for edge in self.edges {
            state.edges.insert(edge);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Identity key of a node: its label and full property set, serialized.
fn identity(label: &str, properties: &Properties) -> Result<NodeHandle, StoreError> {
    serde_json::to_string(&(label, properties))
        .map(NodeHandle)
        .map_err(|e| StoreError::Rejected(format!("Unencodable properties on {label}: {e}")))
}
