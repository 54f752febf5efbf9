//! Transactional, idempotent writes of record trees.
//!
//! Every write is one transaction. Nodes are MERGEd on `(label, properties)`
//! and edges on `(parent, child, type, index)`, so re-writing a tree adds
//! nothing and overlapping trees merge onto shared nodes.

use synbio_core::{ConstraintError, Record};

use crate::plan::WritePlan;
use crate::store::{GraphStore, NodeHandle, StoreError, StoreTxn};

/// Why a write failed. Nothing from a failed write is committed.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Graph store connection error: {0}")]
    Connection(String),

    #[error("Invalid record tree: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Graph transaction rejected: {0}")]
    Transaction(String),
}

impl WriteError {
    /// Whether retrying the same tree could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Constraint(_))
    }
}

impl From<StoreError> for WriteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::Connection(msg),
            StoreError::Rejected(msg) => Self::Transaction(msg),
        }
    }
}

/// Upserts issued by a committed write. These count statements, not newly
/// created graph elements: a repeated write reports the same numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub node_upserts: usize,
    pub edge_upserts: usize,
}

/// Writes record trees into a graph store.
pub struct GraphWriter<S> {
    store: S,
}

impl<S: GraphStore> GraphWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the writer and hand back its store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Write `root` and all its descendants in one transaction.
    ///
    /// The tree is validated before the store is touched. Any failed upsert
    /// rolls the transaction back. Store failures keep the store's own
    /// classification: unreachable is a connection error, rejected is a
    /// transaction error, whether it happens at begin, mid-tree or commit.
    pub async fn write(&self, root: &Record) -> Result<WriteSummary, WriteError> {
        let plan = WritePlan::build(root)?;

        let mut txn = self.store.begin().await?;

        match apply(&mut txn, &plan).await {
            Ok(summary) => {
                txn.commit().await?;
                tracing::debug!(
                    label = %root.label,
                    nodes = summary.node_upserts,
                    edges = summary.edge_upserts,
                    "Committed record tree"
                );
                Ok(summary)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(
                        label = %root.label,
                        error = %rollback_err,
                        "Rollback failed after aborted write"
                    );
                }
                Err(err.into())
            }
        }
    }
}

/// Issue the plan's upserts in order. Each step's parent slot resolves to
/// the handle returned by that parent's own node upsert.
async fn apply<T: StoreTxn>(txn: &mut T, plan: &WritePlan<'_>) -> Result<WriteSummary, StoreError> {
    let mut handles: Vec<NodeHandle> = Vec::with_capacity(plan.node_upserts());
    let mut summary = WriteSummary::default();

    for step in plan.steps() {
        let handle = txn
            .merge_node(&step.record.label, &step.record.properties)
            .await?;
        summary.node_upserts += 1;

        if let Some(attachment) = step.parent {
            let parent = &handles[attachment.slot];
            txn.merge_edge(parent, &handle, attachment.relation, attachment.index as i64)
                .await?;
            summary.edge_upserts += 1;
        }

        handles.push(handle);
    }

    Ok(summary)
}
