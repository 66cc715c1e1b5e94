//! Runtime types: generated records, run statistics and outcomes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Priority at or above which a piece counts as high priority.
pub const HIGH_PRIORITY: f64 = 0.8;
/// Below this priority a content type is not recommended for a segment.
pub const RECOMMENDED_PRIORITY: f64 = 0.5;

/// One generated piece of content, as written to the export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContentRecord {
    pub segment_id: String,
    pub segment_name: String,
    pub segment_category: String,
    pub segment_phase: String,
    pub content_type: String,
    pub content_priority: f64,
    pub content: String,
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub generated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityDistribution {
    pub fn record(&mut self, priority: f64) {
        if priority >= HIGH_PRIORITY {
            self.high += 1;
        } else if priority >= RECOMMENDED_PRIORITY {
            self.medium += 1;
        } else {
            self.low += 1;
        }
    }
}

/// Counts over the records of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_pieces: usize,
    /// Segment × content-type pairs tried.
    pub attempted: usize,
    /// Pairs that produced nothing.
    pub skipped: usize,
    pub by_segment: BTreeMap<String, usize>,
    pub by_content_type: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_phase: BTreeMap<String, usize>,
    pub priority_distribution: PriorityDistribution,
}

impl RunStatistics {
    pub fn from_records(records: &[GeneratedContentRecord], attempted: usize) -> Self {
        let mut stats = Self {
            total_pieces: records.len(),
            attempted,
            skipped: attempted.saturating_sub(records.len()),
            ..Self::default()
        };
        for record in records {
            *stats.by_segment.entry(record.segment_id.clone()).or_default() += 1;
            *stats
                .by_content_type
                .entry(record.content_type.clone())
                .or_default() += 1;
            *stats
                .by_category
                .entry(record.segment_category.clone())
                .or_default() += 1;
            *stats.by_phase.entry(record.segment_phase.clone()).or_default() += 1;
            stats.priority_distribution.record(record.content_priority);
        }
        stats
    }
}

/// Result of a batch run. A run with at least one record is a success even
/// when some pairs were skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RunOutcome {
    Success {
        success: bool,
        total_count: usize,
        export_path: PathBuf,
        statistics: RunStatistics,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl RunOutcome {
    pub fn success(export_path: PathBuf, statistics: RunStatistics) -> Self {
        Self::Success {
            success: true,
            total_count: statistics.total_pieces,
            export_path,
            statistics,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(segment: &str, content_type: &str, priority: f64) -> GeneratedContentRecord {
        GeneratedContentRecord {
            segment_id: segment.into(),
            segment_name: "Nombre".into(),
            segment_category: "base_phase_emotional".into(),
            segment_phase: "folicular".into(),
            content_type: content_type.into(),
            content_priority: priority,
            content: "texto".into(),
            generated_at: "2024-01-01 10:00:00".into(),
            segment_metadata: None,
        }
    }

    #[test]
    fn test_priority_buckets() {
        let mut dist = PriorityDistribution::default();
        for p in [0.95, 0.8, 0.79, 0.5, 0.49, 0.0] {
            dist.record(p);
        }
        assert_eq!(dist, PriorityDistribution { high: 2, medium: 2, low: 2 });
    }

    #[test]
    fn test_statistics_counts() {
        let records = vec![
            record("SEG_A", "lesson_3min", 0.9),
            record("SEG_A", "nutrition_guide", 0.6),
            record("SEG_B", "lesson_3min", 0.3),
        ];
        let stats = RunStatistics::from_records(&records, 4);
        assert_eq!(stats.total_pieces, 3);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.by_segment["SEG_A"], 2);
        assert_eq!(stats.by_content_type["lesson_3min"], 2);
        assert_eq!(stats.by_phase["folicular"], 3);
        assert_eq!(stats.priority_distribution.low, 1);
    }

    #[test]
    fn test_record_omits_missing_metadata() {
        let json = serde_json::to_value(record("SEG_A", "lesson_3min", 0.9)).unwrap();
        assert!(json.get("segment_metadata").is_none());
        assert_eq!(json["generated_at"], "2024-01-01 10:00:00");
    }

    #[test]
    fn test_outcome_serialization() {
        let failure = serde_json::to_value(RunOutcome::failure("no content generated")).unwrap();
        assert_eq!(failure["success"], false);
        assert_eq!(failure["error"], "no content generated");
    }
}
