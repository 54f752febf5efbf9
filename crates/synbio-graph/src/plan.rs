//! Flattening a record tree into the ordered upserts of one write.
//!
//! The walk threads `(record, parent slot, relation, index)` down the tree
//! and emits one step per record in write order: a record's own step comes
//! before the steps of its children, children follow their relationship
//! types' declaration order, and each list is visited front to back.

use synbio_core::{ConstraintError, Record, RelationType};

/// Where a step's record hangs off its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment<'a> {
    /// Position of the parent's step in the plan.
    pub slot: usize,
    pub relation: &'a RelationType,
    /// Position within the parent's child list.
    pub index: usize,
}

/// One node upsert, plus the edge upsert linking it to its parent.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub record: &'a Record,
    pub parent: Option<Attachment<'a>>,
}

/// The validated, ordered upserts for one record tree.
#[derive(Debug)]
pub struct WritePlan<'a> {
    steps: Vec<Step<'a>>,
}

impl<'a> WritePlan<'a> {
    /// Validate `root` and flatten it. A tree that fails validation yields
    /// no plan at all.
    pub fn build(root: &'a Record) -> Result<Self, ConstraintError> {
        root.validate()?;
        let mut steps = Vec::with_capacity(root.record_count());
        visit(root, None, &mut steps);
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step<'a>] {
        &self.steps
    }

    pub fn node_upserts(&self) -> usize {
        self.steps.len()
    }

    pub fn edge_upserts(&self) -> usize {
        self.steps.iter().filter(|s| s.parent.is_some()).count()
    }
}

fn visit<'a>(record: &'a Record, parent: Option<Attachment<'a>>, steps: &mut Vec<Step<'a>>) {
    let slot = steps.len();
    steps.push(Step { record, parent });

    for (relation, children) in &record.children {
        for (index, child) in children.iter().enumerate() {
            let attachment = Attachment {
                slot,
                relation,
                index,
            };
            visit(child, Some(attachment), steps);
        }
    }
}
