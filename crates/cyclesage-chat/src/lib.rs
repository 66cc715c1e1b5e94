//! CycleSage Chat — prompt assembly and text generation.
//!
//! Prompts are built from a segment record, a content type and retrieved
//! context. Generation goes to a local Ollama server; failures come back as
//! an empty completion, never as an error.

pub mod client;
pub mod prompt;

pub use client::{Generator, OllamaClient};
pub use prompt::{build_prompt, content_instructions, GENERIC_INSTRUCTIONS};
