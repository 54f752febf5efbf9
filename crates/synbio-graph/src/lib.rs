//! SYNBIOCHEM Graph: writes record trees into the lab knowledge graph.
//!
//! A `GraphWriter` walks a `Record` tree and MERGEs every node and every
//! parent→child edge inside one transaction, numbering edges by their
//! position in the parent's child list. Writing the same tree twice leaves
//! the graph unchanged.
//!
//! The writer talks to a `GraphStore`. `GraphClient` is the Neo4j store;
//! `MemoryGraph` is an in-process store with the same MERGE semantics.

pub mod client;
pub mod cypher;
pub mod memory;
pub mod plan;
pub mod store;
pub mod writer;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use memory::{MemoryEdge, MemoryGraph, MemoryNode, MemoryTxn};
pub use store::{GraphStore, NodeHandle, StoreError, StoreTxn};
pub use writer::{GraphWriter, WriteError, WriteSummary};
