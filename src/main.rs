//! # Jarvis CLI (`jarvis`)
//!
//! The `jarvis` binary runs the question-answering API and offers one-shot
//! commands against the same pipeline.
//!
//! ## Usage
//!
//! ```bash
//! jarvis --config ./config/jarvis.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `jarvis serve` | Seed an empty index, then start the HTTP API |
//! | `jarvis seed` | Insert the sample documents if the index is empty |
//! | `jarvis ask "<question>"` | Answer a question and print the sources |
//! | `jarvis upsert <file.json>` | Ingest a JSON array of documents |
//! | `jarvis stats` | Print the vector index size |
//!
//! Credentials come from the environment: `OPENAI_API_KEY`,
//! `PINECONE_API_KEY`, `ANTHROPIC_API_KEY`. Log verbosity follows `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use jarvis::config;
use jarvis::models::Document;
use jarvis::rag::Assistant;
use jarvis::seed::{seed_if_empty, SeedOutcome};
use jarvis::server;

const DEFAULT_CONFIG: &str = "./config/jarvis.toml";

/// Jarvis: retrieval-augmented question answering over a vector index.
#[derive(Parser)]
#[command(name = "jarvis", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/jarvis.toml`; when that file does not exist a
    /// local-only configuration is used instead.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    ///
    /// Runs the seeding step first unless `--no-seed` is given or
    /// `[seed].enabled = false`. A seeding failure is logged, not fatal.
    Serve {
        /// Skip the sample-data seeding step.
        #[arg(long)]
        no_seed: bool,
    },

    /// Insert the sample documents if the index reports zero vectors.
    Seed,

    /// Answer a question from the knowledge base.
    Ask {
        question: String,

        /// Number of documents to retrieve (defaults to `[retrieval].default_top_k`).
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        top_k: Option<u64>,
    },

    /// Ingest documents from a JSON file: `[{"text": ..., "metadata": {...}}, ...]`.
    Upsert { path: PathBuf },

    /// Print vector index statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG))?
        }
        None => {
            warn!(path = DEFAULT_CONFIG, "no config file, using local defaults");
            config::Config::minimal()
        }
    };
    let assistant = Assistant::from_config(&cfg)?;

    match cli.command {
        Commands::Serve { no_seed } => {
            if cfg.seed.enabled && !no_seed {
                if let Err(e) = seed_if_empty(&assistant).await {
                    warn!(error = %format!("{:#}", e), "sample data seeding failed");
                }
            }
            server::run_server(&cfg, assistant).await?;
        }
        Commands::Seed => match seed_if_empty(&assistant).await? {
            SeedOutcome::Seeded(n) => println!("Added {} sample documents.", n),
            SeedOutcome::AlreadyPopulated(n) => {
                println!("Knowledge base already contains {} documents.", n)
            }
        },
        Commands::Ask { question, top_k } => {
            let resp = assistant
                .answer(&question, top_k.map(|k| k as usize))
                .await?;
            println!("{}", resp.response);
            if !resp.sources.is_empty() {
                println!();
                println!("Sources:");
                for source in &resp.sources {
                    println!("  [{:.3}] {}: {}", source.score, source.id, source.text);
                }
            }
        }
        Commands::Upsert { path } => {
            let content = std::fs::read_to_string(&path)?;
            let documents: Vec<Document> = serde_json::from_str(&content)?;
            let added = assistant.ingest(documents).await?;
            println!("Documents added: {}", added);
        }
        Commands::Stats => {
            let stats = assistant.stats().await?;
            println!("Total vectors:  {}", stats.total_vectors);
            println!("Dimension:      {}", stats.dimension);
            println!("Index fullness: {:.4}", stats.index_fullness);
        }
    }

    Ok(())
}
