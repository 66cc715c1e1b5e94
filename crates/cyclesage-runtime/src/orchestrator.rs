//! Batch orchestrator: segments × content types → prompts → generation →
//! export file.
//!
//! Everything runs sequentially on the calling thread. A failed pair is
//! logged and skipped; only a run that produces nothing at all fails.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use cyclesage_chat::{build_prompt, Generator};
use cyclesage_core::{Error, Result};
use cyclesage_segments::{Catalog, ContentType, Segment};
use cyclesage_store::KnowledgeStore;
use tracing::{error, info, warn};

use crate::context::ContextRetriever;
use crate::types::*;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NO_CONTENT: &str = "no content generated";

/// Drives content generation over the segment catalog.
pub struct ContentOrchestrator {
    catalog: Catalog,
    retriever: ContextRetriever,
    generator: Arc<dyn Generator>,
    exports_dir: PathBuf,
}

impl ContentOrchestrator {
    pub fn new(
        catalog: Catalog,
        store: Option<Arc<dyn KnowledgeStore>>,
        generator: Arc<dyn Generator>,
        exports_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            retriever: ContextRetriever::new(store),
            generator,
            exports_dir: exports_dir.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn exports_dir(&self) -> &Path {
        &self.exports_dir
    }

    /// Generate one piece of content. `None` means the segment is unknown or
    /// the generator returned nothing.
    pub fn generate_for_segment(
        &self,
        segment_id: &str,
        content_type: &ContentType,
    ) -> Option<String> {
        let Some(segment) = self.catalog.get(segment_id) else {
            error!("Segment {} not found", segment_id);
            return None;
        };
        self.generate(segment, content_type)
    }

    fn generate(&self, segment: &Segment, content_type: &ContentType) -> Option<String> {
        let priority = segment.priority(content_type);
        if priority < RECOMMENDED_PRIORITY {
            warn!(
                "Content type {} not recommended for {} (priority {:.2})",
                content_type, segment.id, priority
            );
        }

        let context = self.retriever.context(segment, content_type);
        let prompt = build_prompt(segment, content_type, &context);
        let content = self.generator.generate(&prompt);
        if content.is_empty() {
            error!("Generation failed for {} / {}", segment.id, content_type);
            return None;
        }
        info!("Generated {} / {}", segment.id, content_type);
        Some(content)
    }

    fn record(
        &self,
        segment: &Segment,
        content_type: &ContentType,
        content: String,
        with_metadata: bool,
    ) -> GeneratedContentRecord {
        GeneratedContentRecord {
            segment_id: segment.id.clone(),
            segment_name: segment.name.clone(),
            segment_category: segment.category.clone(),
            segment_phase: segment.phase.clone(),
            content_type: content_type.to_string(),
            content_priority: segment.priority(content_type),
            content,
            generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            segment_metadata: if with_metadata {
                self.catalog.segment_metadata(&segment.id)
            } else {
                None
            },
        }
    }

    /// Generate every standard content type for every segment and export
    /// the results to `expanded_content_<unix>.json`.
    pub fn run_all(&self) -> RunOutcome {
        let content_types = ContentType::standard();
        let segments: Vec<&Segment> = self.catalog.all().values().collect();
        let total = segments.len() * content_types.len();
        info!(
            "Generating content for {} segments ({} combinations)",
            segments.len(),
            total
        );

        let mut records = Vec::new();
        let mut attempted = 0;
        for segment in segments {
            info!("Processing segment {} ({})", segment.name, segment.id);
            for content_type in &content_types {
                attempted += 1;
                info!("Progress {}/{}: {} / {}", attempted, total, segment.id, content_type);
                match self.generate(segment, content_type) {
                    Some(content) => {
                        let record = self.record(segment, content_type, content, true);
                        info!(
                            "{} / {} generated (priority {:.2})",
                            segment.id, content_type, record.content_priority
                        );
                        records.push(record);
                    }
                    None => warn!("{} / {} skipped", segment.id, content_type),
                }
            }
        }

        let name = format!("expanded_content_{}.json", unix_now());
        self.finish(records, attempted, &name)
    }

    /// Generate the given content types (the standard six when empty) for
    /// one segment and export to `<segment_id>_content_<unix>.json`.
    pub fn run_segment(&self, segment_id: &str, content_types: &[ContentType]) -> RunOutcome {
        let Some(segment) = self.catalog.get(segment_id) else {
            let err = Error::NotFound(format!("segment {segment_id}"));
            error!("{}", err);
            return RunOutcome::failure(err.to_string());
        };
        info!(
            "Generating for {} ({}, phase {}, emotion {})",
            segment.name,
            segment.category,
            segment.phase,
            segment.emotional_primary.as_deref().unwrap_or("n/a")
        );

        let content_types = if content_types.is_empty() {
            ContentType::standard()
        } else {
            content_types.to_vec()
        };

        let mut records = Vec::new();
        for content_type in &content_types {
            info!("Generating {}...", content_type);
            match self.generate(segment, content_type) {
                Some(content) => records.push(self.record(segment, content_type, content, false)),
                None => warn!("{} not generated", content_type),
            }
        }

        let name = format!("{}_content_{}.json", segment.id, unix_now());
        self.finish(records, content_types.len(), &name)
    }

    fn finish(
        &self,
        records: Vec<GeneratedContentRecord>,
        attempted: usize,
        file_name: &str,
    ) -> RunOutcome {
        if records.is_empty() {
            error!("No content generated ({} attempts)", attempted);
            return RunOutcome::failure(NO_CONTENT);
        }
        let statistics = RunStatistics::from_records(&records, attempted);
        match self.export(&records, file_name) {
            Ok(path) => {
                info!("{} pieces exported to {}", records.len(), path.display());
                info!(
                    "Statistics: {} generated, {} skipped, priorities {:?}",
                    statistics.total_pieces, statistics.skipped, statistics.priority_distribution
                );
                RunOutcome::success(path, statistics)
            }
            Err(e) => {
                error!("Export failed: {}", e);
                RunOutcome::failure(e.to_string())
            }
        }
    }

    /// Write records as a pretty-printed JSON array into the exports dir.
    ///
    /// Never overwrites: if `file_name` is taken, `_1`, `_2`, ... is
    /// appended to its stem.
    pub fn export(&self, records: &[GeneratedContentRecord], file_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.exports_dir)?;
        let json = serde_json::to_string_pretty(records)?;
        let (stem, ext) = file_name.rsplit_once('.').unwrap_or((file_name, "json"));

        let mut attempt = 0;
        loop {
            let name = if attempt == 0 {
                file_name.to_string()
            } else {
                format!("{stem}_{attempt}.{ext}")
            };
            let path = self.exports_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Answers from a script, one entry per call; empty means failure.
    struct ScriptedGenerator {
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl Generator for ScriptedGenerator {
        fn generate(&self, prompt: &str) -> String {
            self.prompts.lock().push(prompt.to_string());
            self.replies.lock().pop().unwrap_or_default()
        }

        fn test_connection(&self) -> bool {
            true
        }
    }

    fn one_segment_catalog() -> Catalog {
        let builtin = Catalog::builtin().unwrap();
        let segment = builtin.get("SEG011_LUT_ANXIOUS").unwrap().clone();
        Catalog::from_segments([segment])
    }

    #[test]
    fn test_partial_failure_still_exports() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(&["Contenido de la lección.", ""]));
        let orch =
            ContentOrchestrator::new(one_segment_catalog(), None, generator.clone(), dir.path());

        let outcome = orch.run_segment(
            "SEG011_LUT_ANXIOUS",
            &[ContentType::Lesson3Min, ContentType::NutritionGuide],
        );
        let RunOutcome::Success {
            export_path,
            statistics,
            total_count,
            ..
        } = outcome
        else {
            panic!("expected success");
        };
        assert_eq!(total_count, 1);
        assert_eq!(statistics.total_pieces, 1);
        assert_eq!(statistics.skipped, 1);
        assert_eq!(generator.prompts.lock().len(), 2);

        let name = export_path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("SEG011_LUT_ANXIOUS_content_"));
        assert!(name.ends_with(".json"));

        let written: Vec<GeneratedContentRecord> =
            serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].content_type, "lesson_3min");
        assert_eq!(written[0].content, "Contenido de la lección.");
        assert_eq!(written[0].generated_at.len(), 19);
    }

    #[test]
    fn test_run_all_embeds_metadata_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let replies = ["uno", "dos", "", "cuatro", "cinco", "seis"];
        let generator = Arc::new(ScriptedGenerator::new(&replies));
        let orch = ContentOrchestrator::new(one_segment_catalog(), None, generator, dir.path());

        let outcome = orch.run_all();
        assert!(outcome.is_success());
        let RunOutcome::Success {
            export_path,
            statistics,
            ..
        } = outcome
        else {
            unreachable!();
        };
        assert_eq!(statistics.attempted, 6);
        assert_eq!(statistics.total_pieces, 5);
        assert_eq!(statistics.by_segment["SEG011_LUT_ANXIOUS"], 5);
        assert!(!statistics.by_content_type.contains_key("cycle_day_info"));
        assert!(export_path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("expanded_content_")));

        let raw = std::fs::read_to_string(&export_path).unwrap();
        // non-ASCII kept as-is
        assert!(!raw.contains("\\u00"));
        let written: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(written[0]["segment_metadata"]["id"], "SEG011_LUT_ANXIOUS");
    }

    #[test]
    fn test_nothing_generated_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(&[]));
        let orch = ContentOrchestrator::new(one_segment_catalog(), None, generator, dir.path());

        let outcome = orch.run_all();
        assert!(!outcome.is_success());
        assert!(matches!(outcome, RunOutcome::Failure { ref error, .. } if error == NO_CONTENT));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unknown_segment() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(&["x"]));
        let orch =
            ContentOrchestrator::new(one_segment_catalog(), None, generator.clone(), dir.path());
        assert!(!orch.run_segment("SEG999", &[]).is_success());
        assert!(orch.generate_for_segment("SEG999", &ContentType::Lesson3Min).is_none());
        assert!(generator.prompts.lock().is_empty());
    }

    #[test]
    fn test_low_priority_still_generates() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(&["texto"]));
        let orch = ContentOrchestrator::new(one_segment_catalog(), None, generator, dir.path());
        // unknown content types have priority 0.0
        let content_type = ContentType::from("chart_explanation");
        let content = orch.generate_for_segment("SEG011_LUT_ANXIOUS", &content_type);
        assert_eq!(content.as_deref(), Some("texto"));
    }

    #[test]
    fn test_export_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(&[]));
        let orch = ContentOrchestrator::new(one_segment_catalog(), None, generator, dir.path());

        let first = orch.export(&[], "expanded_content_1700000000.json").unwrap();
        let second = orch.export(&[], "expanded_content_1700000000.json").unwrap();
        assert_ne!(first, second);
        assert!(second.ends_with("expanded_content_1700000000_1.json"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
