//! # kisan-cli
//!
//! Operator commands for the government scheme collection: build it from a
//! directory of PDFs, inspect it, query it, and drop it.
//!
//! ```text
//! kisan prepare --documents ./documents --recreate
//! kisan search "PM Kisan eligibility" --top-k 3
//! kisan retrieve "drip irrigation subsidy"
//! kisan info
//! kisan delete
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use kisan_rag::{
    BoundaryChunker, DEFAULT_COLLECTION, RagError, RagService, RetrievalTool,
    StoreAvailability, StoreSettings, connect, prepare_corpus,
};
use tracing::info;

/// Query used to check a freshly prepared collection.
pub const SMOKE_QUERY: &str = "agricultural subsidy schemes for farmers";

const PREVIEW_CHARS: usize = 200;

/// KisanVaani scheme database administration
#[derive(Parser, Debug)]
#[command(name = "kisan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Collection holding the scheme corpus
    #[arg(long, env = "QDRANT_COLLECTION_NAME", default_value = DEFAULT_COLLECTION, global = true)]
    pub collection: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Chunk, embed, and index every PDF in a directory
    Prepare {
        /// Directory containing the scheme PDFs
        #[arg(short, long)]
        documents: PathBuf,

        /// Drop the collection before indexing
        #[arg(long)]
        recreate: bool,
    },

    /// Run a similarity search and print scored matches
    Search {
        /// Natural-language query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,

        /// Minimum similarity score
        #[arg(short, long, default_value_t = 0.6)]
        threshold: f32,
    },

    /// Print what the agent's retrieval tool would return
    Retrieve {
        /// Natural-language query
        query: String,
    },

    /// Show collection statistics
    Info,

    /// Delete the collection
    Delete,
}

/// Execute `cli` against the store configured in the environment.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = StoreSettings::from_env()?;
    settings.collection = cli.collection.clone();

    let availability = connect(&settings, settings.rag_config()?).await;
    let mut out = std::io::stdout().lock();

    match (availability, &cli.command) {
        (StoreAvailability::Available(service), command) => {
            execute(&service, &cli.collection, command, &mut out).await
        }
        // The tool has its own message for a missing store.
        (unavailable, Commands::Retrieve { query }) => {
            let tool = RetrievalTool::new(unavailable, cli.collection.clone());
            writeln!(out, "{}", tool.retrieve_default(query).await)?;
            Ok(())
        }
        (StoreAvailability::Unavailable { reason }, _) => {
            bail!("vector store unavailable: {reason}")
        }
    }
}

/// Execute an administrative command against `service`, writing a report to `out`.
pub async fn execute<W: Write>(
    service: &Arc<RagService>,
    collection: &str,
    command: &Commands,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Commands::Prepare { documents, recreate } => {
            prepare(service, collection, documents, *recreate, out).await
        }
        Commands::Search { query, top_k, threshold } => {
            search(service, collection, query, *top_k, *threshold, out).await
        }
        Commands::Retrieve { query } => {
            let tool = RetrievalTool::new(StoreAvailability::Available(service.clone()), collection);
            writeln!(out, "{}", tool.retrieve_default(query).await)?;
            Ok(())
        }
        Commands::Info => {
            let info = service.collection_info(collection).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?;
            Ok(())
        }
        Commands::Delete => {
            service.delete_collection(collection).await?;
            writeln!(out, "Deleted collection '{collection}'")?;
            Ok(())
        }
    }
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

async fn prepare<W: Write>(
    service: &RagService,
    collection: &str,
    documents: &Path,
    recreate: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    if recreate {
        match service.delete_collection(collection).await {
            Ok(()) | Err(RagError::CollectionNotFound(_)) => {}
            Err(e) => return Err(e).context("failed to drop collection"),
        }
    }
    let status = service.create_collection(collection).await?;
    writeln!(out, "Collection '{collection}': {status:?}")?;

    let config = service.config();
    let chunker = BoundaryChunker::new(config.chunk_size, config.chunk_overlap);
    let corpus = prepare_corpus(documents, &chunker)
        .with_context(|| format!("failed to read {}", documents.display()))?;

    for file in &corpus.files {
        writeln!(out, "  {}: {} chunks", file.filename, file.chunks)?;
    }
    for skipped in &corpus.skipped {
        writeln!(out, "  skipped {}: {}", skipped.filename, skipped.reason)?;
    }
    if corpus.documents.is_empty() {
        bail!("no documents extracted from {}", documents.display());
    }

    let report = service.add_documents(&corpus.documents, collection).await?;
    info!(indexed = report.indexed, "corpus indexed");
    writeln!(
        out,
        "Indexed {} documents ({} degraded, {} skipped)",
        report.indexed,
        report.degraded.len(),
        report.skipped.len()
    )?;

    let info = service.collection_info(collection).await?;
    writeln!(out, "Collection info:")?;
    writeln!(out, "  Name: {}", info.name)?;
    writeln!(out, "  Points: {}", info.points_count)?;
    writeln!(out, "  Status: {}", info.status)?;

    writeln!(out, "Test search: '{SMOKE_QUERY}'")?;
    let results = service.search(SMOKE_QUERY, collection, 3, config.search_threshold).await?;
    if results.is_empty() {
        writeln!(out, "  no results above {}", config.search_threshold)?;
    }
    for (i, result) in results.iter().enumerate() {
        writeln!(out, "  {}. score {:.3} from {}", i + 1, result.score, result.source)?;
        writeln!(out, "     {}", preview(&result.text))?;
    }
    Ok(())
}

async fn search<W: Write>(
    service: &RagService,
    collection: &str,
    query: &str,
    top_k: usize,
    threshold: f32,
    out: &mut W,
) -> anyhow::Result<()> {
    let results = service.search(query, collection, top_k, threshold).await?;
    if results.is_empty() {
        writeln!(out, "No results for '{query}' above {threshold}")?;
        return Ok(());
    }
    for (i, result) in results.iter().enumerate() {
        writeln!(out, "{}. [{:.3}] {} (id {})", i + 1, result.score, result.source, result.id)?;
        writeln!(out, "   {}", preview(&result.text))?;
    }
    Ok(())
}
