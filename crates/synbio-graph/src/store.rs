//! The store seam between the writer and a property-graph backend.
//!
//! A backend only has to offer two upserts inside a transaction: MERGE a
//! node by label and exact property set, and MERGE an indexed, typed edge
//! between two nodes it has already resolved.

use std::fmt;

use async_trait::async_trait;

use synbio_core::{Properties, RelationType};

/// Errors reported by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached, authenticated against, or could not
    /// open or finish a transaction.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused a statement inside an open transaction.
    #[error("Store rejected statement: {0}")]
    Rejected(String),
}

/// Opaque reference to a node resolved inside the current transaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle(pub String);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A property-graph backend that can open write transactions.
#[async_trait]
pub trait GraphStore: Send + Sync {
    type Txn: StoreTxn;

    /// Open a new write transaction.
    async fn begin(&self) -> Result<Self::Txn, StoreError>;
}

/// An open write transaction.
///
/// Dropping a transaction without calling `commit` must discard everything
/// it staged.
#[async_trait]
pub trait StoreTxn: Send {
    /// Find or create the node with exactly this label and property set.
    async fn merge_node(
        &mut self,
        label: &str,
        properties: &Properties,
    ) -> Result<NodeHandle, StoreError>;

    /// Find or create `(parent)-[:relation {index}]->(child)`.
    ///
    /// Both handles must come from `merge_node` in this transaction.
    async fn merge_edge(
        &mut self,
        parent: &NodeHandle,
        child: &NodeHandle,
        relation: &RelationType,
        index: i64,
    ) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
