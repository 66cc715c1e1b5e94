//! Text chunking.
//!
//! Paragraphs (blank-line separated) are grouped greedily into sections
//! while each paragraph is related to the one before it; sections are then
//! cut into fixed word windows with no overlap. Relatedness has two
//! branches: cosine similarity of sentence embeddings when both paragraphs
//! could be embedded, otherwise a shared-word test.

use std::collections::HashSet;
use std::sync::Arc;

use cyclesage_infer::{cosine_similarity, EmbedderBackend};
use cyclesage_store::{ContentChunk, DocumentMetadata};
use ndarray::Array1;
use tracing::debug;

use crate::tagging::Tagger;

/// Paragraphs with embeddings closer than this belong to the same section.
pub const SIMILARITY_THRESHOLD: f32 = 0.7;
/// Without embeddings, paragraphs must share more than this many words.
pub const SHARED_WORDS_THRESHOLD: usize = 3;

/// Non-empty, trimmed paragraphs in document order.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Lexical relatedness: more than three distinct lowercase words in common.
pub fn lexically_related(a: &str, b: &str) -> bool {
    let lower_a = a.to_lowercase();
    let lower_b = b.to_lowercase();
    let words_a: HashSet<&str> = lower_a.split_whitespace().collect();
    let words_b: HashSet<&str> = lower_b.split_whitespace().collect();
    words_a.intersection(&words_b).count() > SHARED_WORDS_THRESHOLD
}

pub fn semantically_related(a: &Array1<f32>, b: &Array1<f32>) -> bool {
    cosine_similarity(a, b) > SIMILARITY_THRESHOLD
}

/// How two neighbouring paragraphs were judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relatedness {
    Semantic(bool),
    Lexical(bool),
}

impl Relatedness {
    pub fn related(self) -> bool {
        match self {
            Self::Semantic(related) | Self::Lexical(related) => related,
        }
    }
}

/// Judge two paragraphs, using their embeddings when both are present.
pub fn relatedness(
    a: &str,
    b: &str,
    emb_a: Option<&Array1<f32>>,
    emb_b: Option<&Array1<f32>>,
) -> Relatedness {
    match (emb_a, emb_b) {
        (Some(ea), Some(eb)) => Relatedness::Semantic(semantically_related(ea, eb)),
        _ => Relatedness::Lexical(lexically_related(a, b)),
    }
}

/// Split a section into windows of at most `max_words` words.
pub fn split_words(section: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = section.split_whitespace().collect();
    words
        .chunks(max_words.max(1))
        .map(|window| window.join(" "))
        .filter(|window| !window.is_empty())
        .collect()
}

/// Turns document text into tagged chunks.
pub struct Chunker {
    embedder: Arc<dyn EmbedderBackend>,
    tagger: Tagger,
    max_words: usize,
}

impl Chunker {
    pub fn new(embedder: Arc<dyn EmbedderBackend>, tagger: Tagger, max_words: usize) -> Self {
        Self {
            embedder,
            tagger,
            max_words: max_words.max(1),
        }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Group paragraphs into sections joined by blank lines.
    pub fn sections(&self, text: &str) -> Vec<String> {
        let paragraphs = split_paragraphs(text);
        if paragraphs.is_empty() {
            return Vec::new();
        }

        let embeddings: Vec<Option<Array1<f32>>> = if self.embedder.is_available() {
            self.embedder
                .embed_batch(&paragraphs)
                .into_iter()
                .map(|r| r.map(|r| r.embedding))
                .collect()
        } else {
            vec![None; paragraphs.len()]
        };

        let mut sections = Vec::new();
        let mut current: Vec<&str> = vec![paragraphs[0]];
        let mut semantic = 0usize;

        for i in 1..paragraphs.len() {
            let verdict = relatedness(
                paragraphs[i - 1],
                paragraphs[i],
                embeddings[i - 1].as_ref(),
                embeddings[i].as_ref(),
            );
            if matches!(verdict, Relatedness::Semantic(_)) {
                semantic += 1;
            }
            if verdict.related() {
                current.push(paragraphs[i]);
            } else {
                sections.push(current.join("\n\n"));
                current = vec![paragraphs[i]];
            }
        }
        sections.push(current.join("\n\n"));

        debug!(
            "{} paragraphs -> {} sections ({} of {} comparisons by embedding)",
            paragraphs.len(),
            sections.len(),
            semantic,
            paragraphs.len() - 1
        );
        sections
    }

    /// Chunk and tag a document. Embeddings are not computed here.
    pub fn chunk(&self, text: &str, document: &DocumentMetadata) -> Vec<ContentChunk> {
        self.sections(text)
            .iter()
            .flat_map(|section| split_words(section, self.max_words))
            .map(|window| {
                let metadata = self.tagger.analyze(&window);
                ContentChunk::new(window, metadata, document.clone())
            })
            .collect()
    }
}
