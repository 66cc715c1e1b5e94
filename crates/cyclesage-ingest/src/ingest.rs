//! Document ingestion pipeline: file → text → chunks → embeddings → store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cyclesage_core::{CycleSageConfig, Error, Result};
use cyclesage_infer::EmbedderBackend;
use cyclesage_store::{ContentChunk, KnowledgeStore};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::chunking::Chunker;
use crate::extract::{SourceKind, TextExtractor};
use crate::tagging::Tagger;

/// Outcome of processing a folder.
#[derive(Debug, Default, Serialize)]
pub struct FolderReport {
    /// (file name, chunks produced)
    pub processed: Vec<(String, usize)>,
    /// (file name, error message)
    pub failed: Vec<(String, String)>,
}

impl FolderReport {
    pub fn total_chunks(&self) -> usize {
        self.processed.iter().map(|(_, n)| n).sum()
    }
}

/// Extracts, chunks, embeds and stores medical documents.
pub struct DocumentProcessor {
    extractor: TextExtractor,
    chunker: Chunker,
    embedder: Arc<dyn EmbedderBackend>,
    store: Arc<dyn KnowledgeStore>,
}

impl DocumentProcessor {
    pub fn new(
        embedder: Arc<dyn EmbedderBackend>,
        store: Arc<dyn KnowledgeStore>,
        tagger: Tagger,
        max_words: usize,
    ) -> Self {
        Self {
            extractor: TextExtractor::new(),
            chunker: Chunker::new(embedder.clone(), tagger, max_words),
            embedder,
            store,
        }
    }

    pub fn from_config(
        config: &CycleSageConfig,
        embedder: Arc<dyn EmbedderBackend>,
        store: Arc<dyn KnowledgeStore>,
    ) -> Self {
        Self::new(
            embedder,
            store,
            Tagger::new(config.min_chunk_words),
            config.max_chunk_words,
        )
    }

    /// Process one document end to end and return its chunks.
    ///
    /// Fails when extraction fails, or when the document produced chunks
    /// and none of them reached the store. Partial writes succeed.
    pub fn process_document(&self, path: &Path) -> Result<Vec<ContentChunk>> {
        info!("Processing document: {}", path.display());
        let document = self.extractor.extract(path)?;
        info!(
            "Extracted {} characters ({})",
            document.text.len(),
            document.metadata.extraction_method
        );

        let mut chunks = self.chunker.chunk(&document.text, &document.metadata);
        info!("Created {} chunks", chunks.len());

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts);
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding.map(|e| e.embedding);
        }

        let stored = self.store.add(&chunks);
        if stored == 0 && !chunks.is_empty() {
            return Err(Error::VectorStore(format!(
                "none of the {} chunks of {} were stored",
                chunks.len(),
                document.metadata.source_file
            )));
        }
        info!(
            "Document {} processed: {} chunks, {} stored",
            document.metadata.source_file,
            chunks.len(),
            stored
        );
        Ok(chunks)
    }

    /// Process every supported document in `folder` (not recursive), moving
    /// each successfully processed file into `processed_dir`.
    pub fn process_folder(&self, folder: &Path, processed_dir: &Path) -> Result<FolderReport> {
        let mut report = FolderReport::default();
        let files = supported_files(folder)?;
        if files.is_empty() {
            warn!("No documents found in {}", folder.display());
            return Ok(report);
        }
        std::fs::create_dir_all(processed_dir)?;
        info!("Processing {} documents...", files.len());

        for path in files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            match self.process_document(&path) {
                Ok(chunks) => {
                    if let Err(e) = move_file(&path, &processed_dir.join(&name)) {
                        warn!("Could not move {} to {}: {}", name, processed_dir.display(), e);
                    }
                    report.processed.push((name, chunks.len()));
                }
                Err(e) => {
                    error!("Failed to process {}: {}", name, e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        info!(
            "Folder done: {} processed, {} failed, {} chunks",
            report.processed.len(),
            report.failed.len(),
            report.total_chunks()
        );
        Ok(report)
    }
}

fn supported_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && SourceKind::from_path(p).is_some())
        .collect();
    files.sort();
    Ok(files)
}

fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        // rename fails across filesystems
        Err(_) => {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclesage_infer::{EmbeddingResult, NoopEmbedder};
    use cyclesage_store::QueryHit;
    use ndarray::array;
    use parking_lot::Mutex;

    /// In-memory store that keeps what it was asked to add.
    #[derive(Default)]
    struct Recorder {
        added: Mutex<Vec<ContentChunk>>,
    }

    impl KnowledgeStore for Recorder {
        fn add(&self, chunks: &[ContentChunk]) -> usize {
            let valid: Vec<_> = chunks.iter().filter(|c| c.has_embedding()).cloned().collect();
            let n = valid.len();
            self.added.lock().extend(valid);
            n
        }

        fn query_many(&self, _texts: &[&str], _k: usize) -> Vec<QueryHit> {
            Vec::new()
        }

        fn count(&self) -> usize {
            self.added.lock().len()
        }
    }

    /// Fails on any text mentioning "sin vector".
    struct PickyEmbedder;

    impl EmbedderBackend for PickyEmbedder {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            if text.contains("sin vector") {
                return None;
            }
            Some(EmbeddingResult {
                embedding: array![0.6, 0.8],
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            2
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn processor(embedder: Arc<dyn EmbedderBackend>, store: Arc<Recorder>) -> DocumentProcessor {
        DocumentProcessor::new(embedder, store, Tagger::default(), 400)
    }

    #[test]
    fn test_process_document_embeds_and_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guia.txt");
        std::fs::write(
            &path,
            "La progesterona domina la fase lútea.\n\nEste párrafo queda sin vector.",
        )
        .unwrap();

        let store = Arc::new(Recorder::default());
        let chunks = processor(Arc::new(PickyEmbedder), store.clone())
            .process_document(&path)
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].has_embedding());
        assert!(!chunks[1].has_embedding());
        assert_eq!(chunks[0].metadata.applicable_phases, ["lutea"]);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_process_folder_moves_successes() {
        let dir = tempfile::tempdir().unwrap();
        let inbox = dir.path().join("pdfs");
        let done = dir.path().join("processed");
        std::fs::create_dir_all(&inbox).unwrap();
        std::fs::write(inbox.join("a.txt"), "Nutrición y dieta en el ciclo.").unwrap();
        std::fs::write(inbox.join("roto.pdf"), b"not a pdf").unwrap();
        std::fs::write(inbox.join("ignorado.csv"), "x,y").unwrap();

        let store = Arc::new(Recorder::default());
        let report = processor(Arc::new(PickyEmbedder), store.clone())
            .process_folder(&inbox, &done)
            .unwrap();

        assert_eq!(report.processed, vec![("a.txt".to_string(), 1)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "roto.pdf");
        assert!(done.join("a.txt").exists());
        assert!(!inbox.join("a.txt").exists());
        assert!(inbox.join("roto.pdf").exists());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_unembedded_document_stays_in_inbox() {
        let dir = tempfile::tempdir().unwrap();
        let inbox = dir.path().join("pdfs");
        let done = dir.path().join("processed");
        std::fs::create_dir_all(&inbox).unwrap();
        std::fs::write(inbox.join("guia.txt"), "Nutrición y dieta en el ciclo.").unwrap();

        let store = Arc::new(Recorder::default());
        let report = processor(Arc::new(NoopEmbedder::new(0)), store.clone())
            .process_folder(&inbox, &done)
            .unwrap();

        assert!(report.processed.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].1.contains("none of the 1 chunks"));
        assert!(inbox.join("guia.txt").exists());
        assert!(!done.join("guia.txt").exists());
        assert_eq!(store.count(), 0);
    }

    /// Accepts nothing, like a store whose add call fails.
    struct RefusingStore;

    impl KnowledgeStore for RefusingStore {
        fn add(&self, _chunks: &[ContentChunk]) -> usize {
            0
        }

        fn query_many(&self, _texts: &[&str], _k: usize) -> Vec<QueryHit> {
            Vec::new()
        }

        fn count(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_rejected_write_fails_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guia.txt");
        std::fs::write(&path, "La progesterona domina la fase lútea.").unwrap();

        let processor = DocumentProcessor::new(
            Arc::new(PickyEmbedder),
            Arc::new(RefusingStore),
            Tagger::default(),
            400,
        );
        let err = processor.process_document(&path).unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
    }

    #[test]
    fn test_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Recorder::default());
        let report = processor(Arc::new(NoopEmbedder::new(0)), store)
            .process_folder(dir.path(), &dir.path().join("processed"))
            .unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(report.total_chunks(), 0);
    }
}
