//! synbio-load: Writes lab record trees into the SYNBIOCHEM graph.
//!
//! Reads record trees (JSON) produced by the spreadsheet transforms, writes
//! each tree as one transaction, and retries transient store failures.

pub mod config;
pub mod demo;
pub mod error;
pub mod input;
pub mod persist;
