//! Subcommand implementations.
//!
//! Each returns `Ok(true)` on success, `Ok(false)` on a run-level failure
//! that was already reported, and `Err` on fatal initialization errors.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use cyclesage_chat::{Generator, OllamaClient};
use cyclesage_core::CycleSageConfig;
use cyclesage_infer::{create_embedder, EmbedderBackend};
use cyclesage_ingest::DocumentProcessor;
use cyclesage_runtime::{ContentOrchestrator, RunOutcome};
use cyclesage_segments::{emotions, Catalog, ContentType};
use cyclesage_store::{ChromaStore, KnowledgeStore};
use tracing::{info, warn};

const CATALOG_EXPORT_NAME: &str = "expanded_segments_database.json";

/// Build the embedder and make sure the model answers before any work.
fn checked_embedder(config: &CycleSageConfig) -> anyhow::Result<Arc<dyn EmbedderBackend>> {
    let embedder = create_embedder(config);
    embedder.health_check().with_context(|| {
        format!(
            "embedding model {} unreachable at {}",
            config.embedding_model,
            config.embedding.base_url()
        )
    })?;
    Ok(embedder)
}

fn connect_store(
    config: &CycleSageConfig,
    embedder: Arc<dyn EmbedderBackend>,
) -> anyhow::Result<Arc<dyn KnowledgeStore>> {
    let store = ChromaStore::connect(config.chroma.base_url(), &config.collection, embedder)
        .with_context(|| format!("cannot reach Chroma at {}", config.chroma.base_url()))?;
    Ok(Arc::new(store))
}

fn orchestrator(
    config: &CycleSageConfig,
    no_context: bool,
) -> anyhow::Result<ContentOrchestrator> {
    config.data_paths.ensure_dirs()?;
    let catalog = Catalog::builtin()?;
    let generator = OllamaClient::new(config.ollama.base_url(), config.ollama_model.clone())?;
    if !generator.test_connection() {
        bail!("Ollama is not reachable at {}", config.ollama.base_url());
    }
    let store = if no_context {
        warn!("Generating without retrieved context");
        None
    } else {
        Some(connect_store(config, checked_embedder(config)?)?)
    };
    Ok(ContentOrchestrator::new(
        catalog,
        store,
        Arc::new(generator),
        config.data_paths.exports.clone(),
    ))
}

fn report(outcome: &RunOutcome) -> anyhow::Result<bool> {
    match outcome {
        RunOutcome::Success {
            total_count,
            export_path,
            statistics,
            ..
        } => {
            println!("Generated {} pieces -> {}", total_count, export_path.display());
            println!("{}", serde_json::to_string_pretty(statistics)?);
            Ok(true)
        }
        RunOutcome::Failure { error, .. } => {
            eprintln!("Generation failed: {error}");
            Ok(false)
        }
    }
}

pub fn generate_all(config: &CycleSageConfig, no_context: bool) -> anyhow::Result<bool> {
    let orch = orchestrator(config, no_context)?;
    report(&orch.run_all())
}

pub fn generate_segment(
    config: &CycleSageConfig,
    segment_id: &str,
    content_types: &[String],
    no_context: bool,
) -> anyhow::Result<bool> {
    let orch = orchestrator(config, no_context)?;
    let content_types: Vec<ContentType> = content_types
        .iter()
        .map(|t| ContentType::from(t.as_str()))
        .collect();
    report(&orch.run_segment(segment_id, &content_types))
}

pub fn list_segments() -> anyhow::Result<bool> {
    let catalog = Catalog::builtin()?;
    println!("{} segments", catalog.len());
    for (category, count) in catalog.category_counts() {
        println!();
        println!("{category} ({count})");
        for segment in catalog.by_category(category) {
            println!(
                "  {:<28} {} [{}{}]",
                segment.id,
                segment.name,
                segment.phase,
                segment
                    .emotional_primary
                    .as_deref()
                    .map(|e| format!(", {e}"))
                    .unwrap_or_default()
            );
        }
    }
    Ok(true)
}

pub fn export_catalog(config: &CycleSageConfig, output: Option<PathBuf>) -> anyhow::Result<bool> {
    let catalog = Catalog::builtin()?;
    let path = output.unwrap_or_else(|| config.data_paths.exports.join(CATALOG_EXPORT_NAME));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    catalog.save_to_file(&path)?;
    println!("Catalog with {} segments written to {}", catalog.len(), path.display());
    Ok(true)
}

pub fn ingest(config: &CycleSageConfig, folder: Option<PathBuf>) -> anyhow::Result<bool> {
    config.data_paths.ensure_dirs()?;
    let folder = folder.unwrap_or_else(|| config.data_paths.pdfs.clone());
    if !folder.is_dir() {
        bail!("folder not found: {}", folder.display());
    }
    let embedder = checked_embedder(config)?;
    let store = connect_store(config, embedder.clone())?;
    let processor = DocumentProcessor::from_config(config, embedder, store.clone());

    let report = processor.process_folder(&folder, &config.data_paths.processed)?;
    for (name, chunks) in &report.processed {
        println!("  ok    {name}: {chunks} chunks");
    }
    for (name, err) in &report.failed {
        println!("  FAIL  {name}: {err}");
    }
    println!(
        "{} processed, {} failed, {} chunks; collection now holds {} records",
        report.processed.len(),
        report.failed.len(),
        report.total_chunks(),
        store.count()
    );
    // only a folder where every document failed counts as a failed run
    Ok(!(report.processed.is_empty() && !report.failed.is_empty()))
}

pub fn validate_emotions() -> anyhow::Result<bool> {
    let catalog = Catalog::builtin()?;
    let validation = catalog.validate_emotions();

    println!("Valid emotion references:   {}", validation.valid.len());
    println!("Invalid emotion references: {}", validation.invalid.len());
    for entry in &validation.invalid {
        println!("  - {entry}");
    }

    println!();
    println!("Vocabulary ({} emotions):", emotions::EMOTIONS.len());
    for category in emotions::CATEGORIES {
        let labels: Vec<&str> = emotions::by_category(category)
            .iter()
            .map(|e| e.label)
            .collect();
        println!("  {category}: {}", labels.join(", "));
    }

    println!();
    println!("Segments by category:");
    for (category, count) in catalog.category_counts() {
        println!("  {category}: {count}");
    }
    println!("Segments by phase:");
    for (phase, count) in catalog.phase_counts() {
        println!("  {phase}: {count}");
    }

    Ok(validation.invalid.is_empty())
}

pub fn check(config: &CycleSageConfig) -> anyhow::Result<bool> {
    let generator = OllamaClient::new(config.ollama.base_url(), config.ollama_model.clone())?;
    let ollama_ok = generator.test_connection();
    println!(
        "Ollama ({}, model {}): {}",
        config.ollama.base_url(),
        config.ollama_model,
        if ollama_ok { "ok" } else { "unreachable" }
    );

    let embedding_ok = match checked_embedder(config) {
        Ok(_) => {
            println!(
                "Embeddings ({}, model {}): ok",
                config.embedding.base_url(),
                config.embedding_model
            );
            true
        }
        Err(e) => {
            println!("Embeddings: {:#}", e);
            false
        }
    };

    let chroma_ok = match connect_store(config, create_embedder(config)) {
        Ok(store) => {
            println!(
                "Chroma ({}, collection {}): ok, {} records",
                config.chroma.base_url(),
                config.collection,
                store.count()
            );
            true
        }
        Err(e) => {
            println!("Chroma ({}): {:#}", config.chroma.base_url(), e);
            false
        }
    };

    info!(
        "Connectivity check: ollama={} embeddings={} chroma={}",
        ollama_ok, embedding_ok, chroma_ok
    );
    Ok(ollama_ok && embedding_ok && chroma_ok)
}
