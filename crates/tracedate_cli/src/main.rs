//! Tracedate CLI - date Python tracebacks against a library's history.

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use tracedate_core::TraceError;

mod commands;

#[derive(Parser)]
#[command(name = "tracedate")]
#[command(about = "Find the library versions a traceback could have come from", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "tracedate.toml")]
    config: PathBuf,
    /// Index file (overrides [storage].index_file)
    #[arg(long, global = true)]
    index: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every commit reachable from a reference
    Build {
        /// Branch, tag or commit to walk
        reference: String,
        /// Git working copy of the library
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Re-read commit metadata and references without rescanning
    Refresh {
        /// Git working copy of the library
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Date a traceback
    Query {
        /// File holding the traceback (stdin if omitted)
        file: Option<PathBuf>,
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show index statistics and stored references
    Show,
}

fn main() -> Result<()> {
    // Respects RUST_LOG (e.g., RUST_LOG=tracedate_core=info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = commands::Context::load(&cli.config, cli.index).and_then(|ctx| match cli.command {
        Commands::Build { reference, repo } => commands::build::run(&ctx, &reference, &repo),
        Commands::Refresh { repo } => commands::refresh::run(&ctx, &repo),
        Commands::Query { file, format } => commands::query::run(&ctx, file.as_deref(), &format),
        Commands::Show => commands::show::run(&ctx),
    });

    if let Err(err) = &result {
        let hint = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<TraceError>())
            .and_then(TraceError::recovery_suggestion);
        if let Some(hint) = hint {
            eprintln!("{} {}", style("hint:").cyan().bold(), hint);
        }
    }
    result
}
