//! synbio-core: Record model for the SYNBIOCHEM lab graph.
//!
//! This crate provides the in-memory tree handed to the graph writer:
//! - `Record`: a labeled node with scalar properties and named, ordered child lists
//! - `RelationType`: the relationship a child list is written under
//! - `Scalar`: the property value types the graph accepts
//! - `ConstraintError`: why a tree cannot be merged into the graph

pub mod error;
pub mod record;

pub use error::ConstraintError;
pub use record::{Properties, Record, RelationType, Scalar, Walk};
