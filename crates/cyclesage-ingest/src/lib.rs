//! CycleSage Ingest — document extraction, chunking, tagging, storage.
//!
//! Write path: source file → text → paragraph sections → word windows →
//! tagged chunks → embeddings → knowledge store.

pub mod chunking;
pub mod extract;
pub mod ingest;
pub mod tagging;

pub use chunking::Chunker;
pub use extract::{ExtractedDocument, TextExtractor};
pub use ingest::{DocumentProcessor, FolderReport};
pub use tagging::Tagger;
