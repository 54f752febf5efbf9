//! Graph persistence: write record trees one transaction each, retrying
//! transient store failures with exponential backoff.

use synbio_core::Record;
use synbio_graph::{GraphStore, GraphWriter, WriteError, WriteSummary};

use crate::config::LoaderConfig;
use crate::input::SourcedTree;

/// Outcome of writing a batch of record trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub written: usize,
    pub failed: usize,
    pub node_upserts: usize,
    pub edge_upserts: usize,
}

/// Write one tree, retrying connection and transaction failures up to
/// `max_attempts` times. Invalid trees are never retried.
pub async fn write_with_retry<S: GraphStore>(
    writer: &GraphWriter<S>,
    tree: &Record,
    config: &LoaderConfig,
) -> Result<WriteSummary, WriteError> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match writer.write(tree).await {
            Ok(summary) => return Ok(summary),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = config.backoff(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Write failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Write every tree in order. A failed tree is logged and counted; the
/// remaining trees are still written.
pub async fn write_trees<S: GraphStore>(
    writer: &GraphWriter<S>,
    trees: &[SourcedTree],
    config: &LoaderConfig,
) -> LoadReport {
    let mut report = LoadReport::default();

    for tree in trees {
        match write_with_retry(writer, &tree.record, config).await {
            Ok(summary) => {
                tracing::info!(
                    source = %tree.source,
                    label = %tree.record.label,
                    nodes = summary.node_upserts,
                    edges = summary.edge_upserts,
                    "Wrote record tree"
                );
                report.written += 1;
                report.node_upserts += summary.node_upserts;
                report.edge_upserts += summary.edge_upserts;
            }
            Err(e) => {
                tracing::error!(source = %tree.source, error = %e, "Failed to write record tree");
                report.failed += 1;
            }
        }
    }

    report
}
