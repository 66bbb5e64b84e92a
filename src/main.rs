//! # RAG CLI (`rag`)
//!
//! Answers a single Turkish question against a pre-chunked document corpus
//! and prints the answer with its citations.
//!
//! ## Usage
//!
//! ```bash
//! rag --config ./config/rag.example.yaml --q "Kayıt için danışman onayı gerekli mi?"
//! ```
//!
//! On success the answer is printed to stdout as
//! `Answer: <text> See: <citation>, <citation>` and the process exits 0.
//! A missing config file, an unknown stage implementation, or a stage
//! failure is reported on stderr with a non-zero exit code. Each run also
//! appends one JSON trace record per stage to
//! `<logs_dir>/run-<timestamp>.jsonl`.

use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;

use rag_pipeline::{config, loader, pipeline};

/// Retrieval-augmented answering over Turkish departmental documents.
#[derive(Parser)]
#[command(
    name = "rag",
    about = "Answer a Turkish question from a pre-chunked document corpus",
    version
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// The question to answer.
    #[arg(long)]
    q: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)
        .with_context(|| format!("cannot load config {}", cli.config.display()))?;
    let store = loader::load_chunks(&cfg.chunk_store)?;

    let ctx = pipeline::run_question(&cfg, &cli.q, store)?;

    match ctx.final_answer {
        Some(answer) => println!("Answer: {}", answer.to_single_line()),
        None => println!("Answer: (no answer generated)"),
    }
    Ok(())
}
