//! CycleSage Segments — the static audience catalog.
//!
//! Segments are parsed once from an embedded JSON table and never mutated.
//! Each segment carries demographic, hormonal and emotional attributes plus
//! a per-content-type priority used by the batch generator.

pub mod catalog;
pub mod content_type;
pub mod emotions;
pub mod types;

pub use catalog::{Catalog, EmotionValidation};
pub use content_type::ContentType;
pub use emotions::{emotion_id, Emotion, EMOTIONS};
pub use types::*;
