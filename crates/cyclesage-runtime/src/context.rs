//! Retrieval of medical context for a segment and content type.

use std::sync::Arc;

use cyclesage_segments::{ContentType, Segment};
use cyclesage_store::KnowledgeStore;
use tracing::debug;

/// Documents retrieved per prompt.
pub const CONTEXT_RESULTS: usize = 5;

/// Fixed search words per standard content type.
pub fn content_type_terms(content_type: &ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Lesson3Min => &["lección", "educación", "aprendizaje", "consejos"],
        ContentType::WhatsHappening => {
            &["qué está pasando", "explicación", "cambios", "cuerpo", "mente"]
        }
        ContentType::NutritionGuide => {
            &["nutrición", "alimentación", "dieta", "vitaminas", "minerales"]
        }
        ContentType::CycleDayInfo => &["ciclo menstrual", "fase", "día", "duración", "timing"],
        ContentType::HormoneLevels => {
            &["hormonas", "estrógeno", "progesterona", "FSH", "hormonal"]
        }
        ContentType::StressLevels => &["estrés", "cortisol", "ansiedad", "tensión", "calma"],
        ContentType::Other(_) => &[],
    }
}

/// Query texts for one segment and content type, in order: phase with
/// primary emotion, up to three common symptoms, up to two focus areas,
/// then the content type's search words.
pub fn query_terms(segment: &Segment, content_type: &ContentType) -> Vec<String> {
    let mut terms = Vec::new();
    if let Some(emotion) = &segment.emotional_primary {
        terms.push(format!("{} {}", segment.phase, emotion));
    }
    let symptoms = segment.common_symptoms(3);
    if !symptoms.is_empty() {
        terms.push(symptoms.join(" "));
    }
    let focus = &segment.content_preferences.focus_areas;
    if !focus.is_empty() {
        terms.push(focus[..focus.len().min(2)].join(" "));
    }
    terms.extend(content_type_terms(content_type).iter().map(|t| t.to_string()));
    terms
}

/// Builds the context block of a prompt from the knowledge store.
#[derive(Clone)]
pub struct ContextRetriever {
    store: Option<Arc<dyn KnowledgeStore>>,
    k: usize,
}

impl ContextRetriever {
    pub fn new(store: Option<Arc<dyn KnowledgeStore>>) -> Self {
        Self {
            store,
            k: CONTEXT_RESULTS,
        }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Nearest documents for every query term, joined by blank lines.
    /// Empty without a store or when nothing matches.
    pub fn context(&self, segment: &Segment, content_type: &ContentType) -> String {
        let Some(store) = &self.store else {
            return String::new();
        };
        let terms = query_terms(segment, content_type);
        if terms.is_empty() {
            return String::new();
        }
        let refs: Vec<&str> = terms.iter().map(String::as_str).collect();
        let hits = store.query_many(&refs, self.k);
        debug!(
            "{} query terms for {} / {} -> {} documents",
            terms.len(),
            segment.id,
            content_type,
            hits.len()
        );
        hits.into_iter()
            .map(|hit| hit.document)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclesage_segments::Catalog;
    use cyclesage_store::{ContentChunk, QueryHit};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FixedStore {
        queries: Mutex<Vec<(Vec<String>, usize)>>,
    }

    impl KnowledgeStore for FixedStore {
        fn add(&self, _chunks: &[ContentChunk]) -> usize {
            0
        }

        fn query_many(&self, texts: &[&str], k: usize) -> Vec<QueryHit> {
            self.queries
                .lock()
                .push((texts.iter().map(|t| t.to_string()).collect(), k));
            ["Primer documento.", "Segundo documento."]
                .iter()
                .enumerate()
                .map(|(i, doc)| QueryHit {
                    id: format!("id{i}"),
                    document: doc.to_string(),
                    metadata: serde_json::Map::new(),
                    distance: i as f32,
                })
                .collect()
        }

        fn count(&self) -> usize {
            2
        }
    }

    fn segment(id: &str) -> Segment {
        Catalog::builtin().unwrap().get(id).unwrap().clone()
    }

    #[test]
    fn test_query_terms_order() {
        let seg = segment("SEG001_FOL_STRESS_CHRONIC");
        let terms = query_terms(&seg, &ContentType::HormoneLevels);
        let primary = seg.emotional_primary.clone().unwrap();
        assert_eq!(terms[0], format!("folicular {primary}"));
        assert_eq!(
            &terms[terms.len() - 5..],
            ["hormonas", "estrógeno", "progesterona", "FSH", "hormonal"]
        );
    }

    #[test]
    fn test_query_terms_without_emotion() {
        let seg = segment("SEG_PREMEN_001");
        let terms = query_terms(&seg, &ContentType::from("custom"));
        assert!(terms.iter().all(|t| !t.starts_with("pre_menstrual ")));
        let focus = &seg.content_preferences.focus_areas;
        if !focus.is_empty() {
            assert!(terms.contains(&focus[..focus.len().min(2)].join(" ")));
        }
    }

    #[test]
    fn test_context_joins_documents() {
        let store = Arc::new(FixedStore::default());
        let retriever = ContextRetriever::new(Some(store.clone()));
        let seg = segment("SEG011_LUT_ANXIOUS");

        let context = retriever.context(&seg, &ContentType::StressLevels);
        assert_eq!(context, "Primer documento.\n\nSegundo documento.");

        let queries = store.queries.lock();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].1, CONTEXT_RESULTS);
        assert_eq!(queries[0].0, query_terms(&seg, &ContentType::StressLevels));
    }

    #[test]
    fn test_no_store_means_empty_context() {
        let retriever = ContextRetriever::new(None);
        assert!(!retriever.has_store());
        let seg = segment("SEG011_LUT_ANXIOUS");
        assert_eq!(retriever.context(&seg, &ContentType::Lesson3Min), "");
    }
}
