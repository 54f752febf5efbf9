//! CLI entry point for the synbio-load graph writer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use synbio_graph::{GraphClient, GraphWriter, MemoryGraph};

use synbio_load::config::{load_graph_config, load_loader_config};
use synbio_load::demo::demo_trees;
use synbio_load::input::read_all;
use synbio_load::persist::write_trees;

#[derive(Parser)]
#[command(name = "synbio-load")]
#[command(about = "Write SYNBIOCHEM record trees into the lab knowledge graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Write into an in-memory graph and report counts instead of Neo4j.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Config file prefix (default: synbio).
    #[arg(short, long, default_value = "synbio", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Write the record trees in each JSON file (one tree or an array of trees).
    Write {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write the sample project and plate trees.
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let loader_config = load_loader_config(&cli.config)?;

    let trees = match &cli.command {
        Command::Write { files } => read_all(files)?,
        Command::Demo => demo_trees(),
    };

    let report = if cli.dry_run {
        let writer = GraphWriter::new(MemoryGraph::new());
        let report = write_trees(&writer, &trees, &loader_config).await;
        let graph = writer.into_inner();
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Dry run complete"
        );
        report
    } else {
        let graph_config = load_graph_config(&cli.config);
        let client = GraphClient::connect(&graph_config).await?;
        let writer = GraphWriter::new(client);
        write_trees(&writer, &trees, &loader_config).await
    };

    tracing::info!(
        written = report.written,
        failed = report.failed,
        node_upserts = report.node_upserts,
        edge_upserts = report.edge_upserts,
        "Load finished"
    );

    if report.failed > 0 {
        anyhow::bail!(
            "{} of {} record trees failed to write",
            report.failed,
            trees.len()
        );
    }

    Ok(())
}
