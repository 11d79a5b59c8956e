//! # Doctriage CLI (`dqa`)
//!
//! The `dqa` binary answers questions about a single PDF document from
//! its text-extraction dump.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dqa tree <extract.json>` | Build the document model and print or persist it |
//! | `dqa ask <extract.json> "<question>"` | Answer a question about the document |
//! | `dqa search <extract.json> "<query>"` | Run retrieval only and print the context |
//!
//! ## Examples
//!
//! ```bash
//! # Inspect the recovered section structure
//! dqa tree report.json
//!
//! # Persist the model for reuse across questions
//! dqa tree report.json --output report-model.json
//!
//! # Ask with the default triage strategy
//! dqa ask report.json "What were the Q3 results?"
//!
//! # Ask against a persisted model with a baseline strategy
//! dqa ask report-model.json --from-model --strategy chunks "Who wrote this?"
//!
//! # Retrieval only
//! dqa search report.json "revenue growth" --strategy pages
//! ```
//!
//! Both OpenAI-backed collaborators read `OPENAI_API_KEY` from the
//! environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use doctriage::config::{load_or_default, Config};
use doctriage::embedding::OpenAiEmbedder;
use doctriage::models::DocumentModel;
use doctriage::oracle::OpenAiOracle;
use doctriage::orchestrator::{answer, metadata_summary, AnswerOptions, AnswerStrategy};
use doctriage::retrieval::{search_chunks, search_pages};
use doctriage::{extract, tree};

/// Doctriage CLI — document-triage question answering over PDF
/// text-extraction dumps.
#[derive(Parser)]
#[command(
    name = "dqa",
    about = "Doctriage — answer questions about a PDF from its text-extraction dump",
    version,
    long_about = "Doctriage recovers a page/section model from a flat PDF text-extraction \
    dump, then answers questions by routing each one to a retrieval action (fetch pages, \
    fetch section, fetch all, or semantic search) before composing the answer with a \
    language model."
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults are used when absent.
    #[arg(long, global = true, default_value = "./config/dqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the document model from an extraction dump.
    ///
    /// Prints a page/section summary, or writes the full model as JSON
    /// with `--output` for reuse across questions.
    Tree {
        /// Extraction dump (JSON with an `elements` array).
        extract: PathBuf,

        /// Write the model as JSON to this path instead of summarizing.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Answer a question about the document.
    Ask {
        /// Extraction dump, or a persisted model with `--from-model`.
        input: PathBuf,

        /// The question to answer.
        question: String,

        /// Answer strategy: triage, truncate, pages, or chunks.
        #[arg(long, default_value = "triage")]
        strategy: String,

        /// Treat the input as a persisted model (from `dqa tree --output`).
        #[arg(long)]
        from_model: bool,
    },

    /// Run retrieval only and print the selected context.
    Search {
        /// Extraction dump, or a persisted model with `--from-model`.
        input: PathBuf,

        /// The search query.
        query: String,

        /// Retrieval strategy: pages or chunks.
        #[arg(long, default_value = "pages")]
        strategy: String,

        /// Treat the input as a persisted model.
        #[arg(long)]
        from_model: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_or_default(&cli.config)?;

    match cli.command {
        Commands::Tree { extract, output } => run_tree(&extract, output.as_deref()),
        Commands::Ask {
            input,
            question,
            strategy,
            from_model,
        } => run_ask(&config, &input, &question, &strategy, from_model).await,
        Commands::Search {
            input,
            query,
            strategy,
            from_model,
        } => run_search(&config, &input, &query, &strategy, from_model).await,
    }
}

/// Load a model either by building it from a dump or by reading a
/// persisted model file.
fn load_model(input: &Path, from_model: bool) -> Result<DocumentModel> {
    if from_model {
        let content = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read model file: {}", input.display()))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse model file")
    } else {
        let fragments = extract::load_extract(input)?;
        Ok(tree::build(&fragments))
    }
}

fn run_tree(extract_path: &Path, output: Option<&Path>) -> Result<()> {
    let model = load_model(extract_path, false)?;

    match output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&model)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write model file: {}", path.display()))?;
            println!(
                "Wrote model with {} sections over {} pages to {}",
                model.sections.len(),
                model.pages.len(),
                path.display()
            );
        }
        None => {
            println!("{}", metadata_summary(&model));
        }
    }

    Ok(())
}

async fn run_ask(
    config: &Config,
    input: &Path,
    question: &str,
    strategy: &str,
    from_model: bool,
) -> Result<()> {
    let strategy: AnswerStrategy = strategy.parse()?;
    let model = load_model(input, from_model)?;

    let embedder = OpenAiEmbedder::new(&config.openai)?;
    let oracle = OpenAiOracle::new(&config.openai)?;
    let opts = AnswerOptions {
        strategy,
        page_k: config.retrieval.page_k,
        chunk_size: config.retrieval.chunk_size,
        truncate_words: config.answer.truncate_words,
        context_words: config.answer.context_words,
    };

    let result = answer(question, &model, &embedder, &oracle, &opts).await?;

    for action in &result.actions {
        println!("→ {} {}", action.verb, action.noun);
    }
    println!("{}", result.text);

    Ok(())
}

async fn run_search(
    config: &Config,
    input: &Path,
    query: &str,
    strategy: &str,
    from_model: bool,
) -> Result<()> {
    let model = load_model(input, from_model)?;
    let embedder = OpenAiEmbedder::new(&config.openai)?;

    let content = match strategy {
        "pages" => search_pages(&model, &embedder, query, config.retrieval.page_k).await?,
        "chunks" => search_chunks(&model, &embedder, query, config.retrieval.chunk_size).await?,
        other => anyhow::bail!("Unknown search strategy: {}. Use pages or chunks.", other),
    };

    if content.is_empty() {
        eprintln!("(no matching content)");
    } else {
        println!("{}", content);
    }

    Ok(())
}
