//! The segment catalog: immutable lookup over the shipped segment table.

use std::collections::BTreeMap;
use std::path::Path;

use cyclesage_core::{Error, Result};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::content_type::ContentType;
use crate::emotions;
use crate::types::Segment;

const BUILTIN_SEGMENTS: &str = include_str!("../data/segments.json");

/// Longest content the generation rules allow, in words.
pub const MAX_CONTENT_LENGTH: usize = 600;

/// Outcome of checking every emotion label in the catalog against the
/// vocabulary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmotionValidation {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    segments: BTreeMap<String, Segment>,
}

impl Catalog {
    /// Parse the segment table embedded in the binary.
    pub fn builtin() -> Result<Self> {
        let segments: BTreeMap<String, Segment> = serde_json::from_str(BUILTIN_SEGMENTS)?;
        debug!("Loaded {} built-in segments", segments.len());
        Ok(Self { segments })
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            segments: segments.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Segment> {
        self.segments.get(id)
    }

    pub fn all(&self) -> &BTreeMap<String, Segment> {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn by_category(&self, category: &str) -> Vec<&Segment> {
        self.segments
            .values()
            .filter(|s| s.category == category)
            .collect()
    }

    pub fn by_phase(&self, phase: &str) -> Vec<&Segment> {
        self.segments.values().filter(|s| s.phase == phase).collect()
    }

    /// Segment counts per category.
    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for segment in self.segments.values() {
            *counts.entry(segment.category.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Segment counts per phase.
    pub fn phase_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for segment in self.segments.values() {
            *counts.entry(segment.phase.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Check every emotion label used by every segment. Reporting only.
    pub fn validate_emotions(&self) -> EmotionValidation {
        let mut report = EmotionValidation::default();
        let mut check = |entry: String, label: &str| {
            if emotions::is_known(label) {
                report.valid.push(entry);
            } else {
                report.invalid.push(entry);
            }
        };

        for (id, segment) in &self.segments {
            for label in [&segment.emotional_primary, &segment.emotional_secondary]
                .into_iter()
                .flatten()
            {
                check(format!("{id}: {label}"), label);
            }
            let traits = &segment.emotional_characteristics;
            for label in &traits.primary_emotions {
                check(format!("{id} (primary): {label}"), label);
            }
            for label in &traits.secondary_emotions {
                check(format!("{id} (secondary): {label}"), label);
            }
        }
        report
    }

    /// Search keywords used to retrieve knowledge for a segment.
    pub fn search_keywords(segment: &Segment) -> Vec<String> {
        let mut keywords = Vec::new();
        if let Some(primary) = &segment.emotional_primary {
            keywords.push(format!("{} {}", segment.phase, primary));
        }
        keywords.extend(segment.common_symptoms(3).iter().cloned());
        let traits = &segment.emotional_characteristics;
        keywords.extend(traits.primary_emotions.iter().take(2).cloned());
        keywords.extend(segment.hormonal_profile.sensitivity_factors.iter().take(2).cloned());
        keywords
    }

    /// Retrieval metadata attached to generated content, `None` for an
    /// unknown segment.
    pub fn segment_metadata(&self, id: &str) -> Option<serde_json::Value> {
        let segment = self.get(id)?;
        let prefs = &segment.content_preferences;
        let applicable = |content_type: ContentType| {
            json!({
                "priority": segment.priority(&content_type),
                "focus_areas": prefs.focus_areas,
                "tone": prefs.tone,
            })
        };

        Some(json!({
            "id": segment.id,
            "name": segment.name,
            "category": segment.category,
            "phase": segment.phase,
            "emotional_primary": segment.emotional_primary,
            "intensity_level": segment.intensity_level,
            "applicable_content": {
                "lesson_3min": applicable(ContentType::Lesson3Min),
                "whats_happening": applicable(ContentType::WhatsHappening),
                "nutrition_guide": applicable(ContentType::NutritionGuide),
            },
            "search_keywords": Self::search_keywords(segment),
            "related_segments": segment.related_segments,
            "content_generation_rules": {
                "max_length": MAX_CONTENT_LENGTH,
                "min_validation": true,
                "include_practical_tips": true,
                "avoid_medical_diagnosis": true,
                "tone": prefs.tone,
                "urgency": prefs.urgency,
            },
        }))
    }

    /// Write the catalog as a JSON object keyed by segment id.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.segments)?;
        std::fs::write(path, json)?;
        info!("Saved {} segments to {}", self.segments.len(), path.display());
        Ok(())
    }

    /// Read a catalog snapshot written by [`Catalog::save_to_file`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let segments: BTreeMap<String, Segment> = serde_json::from_str(&raw)?;
        if let Some((key, segment)) = segments.iter().find(|(k, s)| **k != s.id) {
            return Err(Error::Config(format!(
                "snapshot key {key} does not match segment id {}",
                segment.id
            )));
        }
        info!("Loaded {} segments from {}", segments.len(), path.display());
        Ok(Self { segments })
    }
}
