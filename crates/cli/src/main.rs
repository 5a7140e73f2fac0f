use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::{CliConfig, EmbedMode, Overrides, EMBEDDING_MODE_ENV};
use semchunk_chunker::{ChunkingStats, Document, DocumentChunk, DocumentChunker, Language};
use serde::Serialize;
use std::env;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;

#[derive(Parser)]
#[command(name = "semchunk")]
#[command(about = "Split source files into embedding-ready code chunks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML config file with [chunker] and [embedding] tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Token count above which a node is split into its children
    #[arg(long, global = true)]
    oversize_tokens: Option<usize>,

    /// Merge neighbouring chunks whose cosine similarity exceeds this
    #[arg(long, global = true)]
    similarity_threshold: Option<f64>,

    /// Also merge the file's top-level chunks
    #[arg(long, global = true)]
    merge_top_level: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk files and print one JSON record per chunk
    Chunk(ChunkArgs),

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct ChunkArgs {
    /// Files to chunk, in output order
    #[arg(required = true, num_args = 1..)]
    files: Vec<PathBuf>,

    /// Repository namespace stamped on every chunk
    #[arg(long, default_value_t = 0)]
    repo_id: i64,

    /// Language for every file instead of detecting it from the extension
    #[arg(long, short = 'l')]
    language: Option<String>,

    /// Include embedding vectors in the output
    #[arg(long)]
    with_embeddings: bool,

    /// Print chunking statistics to stderr
    #[arg(long)]
    stats: bool,
}

/// One output line
#[derive(Serialize)]
struct ChunkRecord<'a> {
    path: &'a str,
    repo_id: i64,
    language: &'a str,
    index: usize,
    first_line_number: usize,
    hash: &'a str,
    token_count: usize,
    context: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding: Option<&'a [f32]>,
}

impl<'a> ChunkRecord<'a> {
    fn new(chunk: &'a DocumentChunk, with_embeddings: bool) -> Self {
        Self {
            path: &chunk.path,
            repo_id: chunk.repo_id,
            language: &chunk.language,
            index: chunk.index,
            first_line_number: chunk.first_line_number,
            hash: &chunk.hash,
            token_count: chunk.token_count,
            context: &chunk.context,
            content: &chunk.content,
            embedding: with_embeddings.then_some(chunk.embedding.as_slice()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // Always silence ort crate unless verbose mode (ORT is extremely noisy)
    if !cli.verbose {
        builder.filter_module("ort", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();

    let overrides = Overrides {
        embed_mode: cli.embed_mode,
        oversize_tokens: cli.oversize_tokens,
        similarity_threshold: cli.similarity_threshold,
        merge_top_level: cli.merge_top_level,
    };
    let env_mode = env::var(EMBEDDING_MODE_ENV).ok();
    let config = CliConfig::load(cli.config.as_deref())?.resolve(env_mode.as_deref(), &overrides)?;

    match cli.command {
        Commands::Chunk(args) => run_chunk(args, config),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn run_chunk(args: ChunkArgs, config: CliConfig) -> Result<()> {
    let language = match args.language.as_deref() {
        Some(name) => match Language::from_name(name) {
            Language::Unknown => bail!("Unsupported language: {name}"),
            language => Some(language),
        },
        None => None,
    };

    let model = config.embedding.build_model()?;
    let chunker = DocumentChunker::new(config.chunker, model)?;

    let mut documents = Vec::with_capacity(args.files.len());
    let mut unreadable = 0;
    for path in &args.files {
        match fs::read_to_string(path) {
            Ok(text) => {
                let mut document = Document::new(path.display().to_string(), text, args.repo_id);
                if let Some(language) = language {
                    document = document.with_language(language);
                }
                documents.push(document);
            }
            Err(e) => {
                log::warn!("Failed to read {}: {e}", path.display());
                unreadable += 1;
            }
        }
    }

    let report = chunker.process_documents(&documents);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for chunk in &report.chunks {
        serde_json::to_writer(&mut out, &ChunkRecord::new(chunk, args.with_embeddings))
            .context("Failed to serialize chunk")?;
        writeln!(out)?;
    }
    out.flush()?;

    if args.stats {
        eprintln!("{}", ChunkingStats::from_chunks(&report.chunks));
    }

    let failed = report.failures.len() + unreadable;
    if failed > 0 {
        bail!("{failed} of {} files failed", args.files.len());
    }
    Ok(())
}
