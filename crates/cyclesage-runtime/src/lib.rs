//! CycleSage Runtime — batch content generation.
//!
//! Combines the segment catalog, context retrieval from the knowledge
//! store and a text generator, and writes timestamped export files with
//! run statistics.

pub mod context;
pub mod orchestrator;
pub mod types;

pub use context::{query_terms, ContextRetriever};
pub use orchestrator::ContentOrchestrator;
pub use types::*;
