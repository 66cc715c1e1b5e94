//! CycleSage — ingestion of medical documents and segment content generation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cyclesage_core::CycleSageConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "cyclesage")]
#[command(about = "Menstrual-health content generation pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate every standard content type for every segment
    GenerateAll {
        /// Generate without retrieved context instead of requiring Chroma
        #[arg(long)]
        no_context: bool,
    },
    /// Generate content for one segment
    GenerateSegment {
        #[arg(long)]
        segment_id: String,
        /// Content types to generate (default: the six standard types)
        #[arg(long, num_args = 1..)]
        content_types: Vec<String>,
        #[arg(long)]
        no_context: bool,
    },
    /// List segments grouped by category
    ListSegments,
    /// Write the catalog snapshot as JSON
    ExportCatalog {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Process the documents of a folder into the knowledge store
    Ingest {
        #[arg(long)]
        folder: Option<PathBuf>,
    },
    /// Check segment emotion labels against the vocabulary
    ValidateEmotions,
    /// Check connectivity to Ollama and Chroma
    Check,
}

fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = CycleSageConfig::from_env();

    let result = match cli.command {
        Command::GenerateAll { no_context } => commands::generate_all(&config, no_context),
        Command::GenerateSegment {
            segment_id,
            content_types,
            no_context,
        } => commands::generate_segment(&config, &segment_id, &content_types, no_context),
        Command::ListSegments => commands::list_segments(),
        Command::ExportCatalog { output } => commands::export_catalog(&config, output),
        Command::Ingest { folder } => commands::ingest(&config, folder),
        Command::ValidateEmotions => commands::validate_emotions(),
        Command::Check => commands::check(&config),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
