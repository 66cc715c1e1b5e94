//! Rule-based chunk tagging: cycle phases, emotional relevance, applicable
//! segments, content type and a confidence score.
//!
//! All matching is lowercase substring matching against fixed keyword lists.

use cyclesage_store::ChunkMetadata;
use once_cell::sync::Lazy;
use regex::Regex;

/// Phase keyword lists, Spanish and English terms alike.
pub static PHASE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "folicular",
        &[
            "renovación",
            "energía creciente",
            "estrógeno",
            "motivación",
            "nuevos proyectos",
            "crecimiento",
            "renewal",
            "growing energy",
            "estrogen",
            "motivation",
            "new projects",
            "growth",
        ],
    ),
    (
        "ovulatoria",
        &[
            "pico hormonal",
            "fertilidad",
            "confianza",
            "comunicación",
            "liderazgo",
            "atracción",
            "hormonal peak",
            "fertility",
            "confidence",
            "communication",
            "leadership",
            "attraction",
        ],
    ),
    (
        "lutea",
        &[
            "progesterona",
            "introspección",
            "sensibilidad",
            "perfeccionismo",
            "nesting",
            "preparación",
            "progesterone",
            "introspection",
            "sensitivity",
            "perfectionism",
            "preparation",
        ],
    ),
    (
        "menstrual",
        &[
            "renovación",
            "descanso",
            "intuición",
            "reflexión",
            "liberación",
            "limpieza",
            "renewal",
            "rest",
            "intuition",
            "reflection",
            "liberation",
            "cleaning",
        ],
    ),
];

pub static EMOTION_KEYWORDS: &[(&str, &[&str])] = &[
    ("ansiedad", &["ansiedad", "estrés", "preocupación", "nerviosismo"]),
    ("tristeza", &["tristeza", "melancolía", "depresión", "desánimo"]),
    ("energía", &["energía", "vitalidad", "motivación", "entusiasmo"]),
    ("confianza", &["confianza", "seguridad", "autoestima", "empoderamiento"]),
    ("conexión", &["conexión", "socialización", "empatía", "comunicación"]),
];

/// (phase, emotion) → segment codes. Deliberately partial: only these four
/// combinations are mapped.
pub static SEGMENT_MAP: &[((&str, &str), &[&str])] = &[
    (("folicular", "ansiedad"), &["SEG001"]),
    (("folicular", "energía"), &["SEG003"]),
    (("lutea", "ansiedad"), &["SEG011"]),
    (("menstrual", "tristeza"), &["SEG017"]),
];

/// Content-type rules in priority order; the first match wins.
pub static CONTENT_TYPE_RULES: &[(&str, &[&str])] = &[
    ("lesson", &["explicación", "información", "educativo", "aprender"]),
    ("nutrition", &["nutrición", "alimentación", "dieta", "vitaminas"]),
    ("exercise", &["ejercicio", "actividad física", "deporte", "movimiento"]),
    ("symptoms", &["síntomas", "signos", "molestias", "dolor"]),
    ("wellness", &["bienestar", "cuidado", "autocuidado", "equilibrio"]),
];

pub const DEFAULT_CONTENT_TYPE: &str = "educational";

pub const MEDICAL_TERMS: &[&str] = &[
    "hormona",
    "ciclo",
    "menstruación",
    "estrógeno",
    "progesterona",
];

const BASE_CONFIDENCE: f64 = 0.5;
const LENGTH_BONUS: f64 = 0.2;
const TERM_BONUS: f64 = 0.1;
const MAX_TERM_BONUS: f64 = 0.3;
const STRUCTURE_BONUS: f64 = 0.1;
/// Upper end of the well-sized word range.
pub const MAX_WELL_SIZED_WORDS: usize = 500;

static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.$").expect("valid regex"));

fn matches_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

/// Phases whose keywords occur in the text, in fixed phase order.
pub fn applicable_phases(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    PHASE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| matches_any(&lower, keywords))
        .map(|(phase, _)| phase.to_string())
        .collect()
}

pub fn emotional_relevance(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    EMOTION_KEYWORDS
        .iter()
        .filter(|(_, keywords)| matches_any(&lower, keywords))
        .map(|(emotion, _)| emotion.to_string())
        .collect()
}

/// Segment codes mapped from every (phase, emotion) pair, deduplicated.
pub fn applicable_segments(phases: &[String], emotions: &[String]) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for phase in phases {
        for emotion in emotions {
            let mapped = SEGMENT_MAP
                .iter()
                .find(|((p, e), _)| *p == phase.as_str() && *e == emotion.as_str())
                .map(|(_, codes)| *codes)
                .unwrap_or_default();
            for code in mapped {
                if !segments.iter().any(|s| s == code) {
                    segments.push(code.to_string());
                }
            }
        }
    }
    segments
}

pub fn classify_content_type(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    CONTENT_TYPE_RULES
        .iter()
        .find(|(_, keywords)| matches_any(&lower, keywords))
        .map(|(content_type, _)| *content_type)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Whether any whitespace-separated token is a bullet, a dash item, a
/// numbered item (`1.`) or an ordinal lead-in (`Primero`, `Segundo`).
pub fn has_structure_markers(text: &str) -> bool {
    text.split_whitespace().any(|token| {
        let word = token.trim_end_matches([',', ':', ';']);
        token == "-"
            || token.starts_with('•')
            || NUMBERED_ITEM.is_match(token)
            || word == "Primero"
            || word == "Segundo"
    })
}

/// Tags chunk text and scores its confidence.
#[derive(Debug, Clone)]
pub struct Tagger {
    /// Lower end of the well-sized word range.
    pub min_words: usize,
}

impl Default for Tagger {
    fn default() -> Self {
        Self {
            min_words: cyclesage_core::config::DEFAULT_MIN_CHUNK_WORDS,
        }
    }
}

impl Tagger {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }

    /// Confidence in `[0, 1]`: 0.5 base, +0.2 when well sized, +0.1 per
    /// medical term (at most +0.3), +0.1 for list structure.
    pub fn confidence(&self, text: &str) -> f64 {
        let mut score = BASE_CONFIDENCE;

        let words = text.split_whitespace().count();
        if (self.min_words..=MAX_WELL_SIZED_WORDS).contains(&words) {
            score += LENGTH_BONUS;
        }

        let lower = text.to_lowercase();
        let terms = MEDICAL_TERMS.iter().filter(|t| lower.contains(*t)).count();
        score += (terms as f64 * TERM_BONUS).min(MAX_TERM_BONUS);

        if has_structure_markers(text) {
            score += STRUCTURE_BONUS;
        }

        score.min(1.0)
    }

    pub fn analyze(&self, text: &str) -> ChunkMetadata {
        let applicable_phases = applicable_phases(text);
        let emotional_relevance = emotional_relevance(text);
        let applicable_segments = applicable_segments(&applicable_phases, &emotional_relevance);

        ChunkMetadata {
            applicable_segments,
            content_type: classify_content_type(text).to_string(),
            confidence_score: self.confidence(text),
            applicable_phases,
            emotional_relevance,
            ..ChunkMetadata::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["palabra"; n].join(" ")
    }

    #[test]
    fn test_phases_match_both_languages() {
        assert_eq!(applicable_phases("El estrógeno creciente"), ["folicular"]);
        assert_eq!(applicable_phases("Rising ESTROGEN levels"), ["folicular"]);
        // "renovación" belongs to two phases
        assert_eq!(applicable_phases("Renovación"), ["folicular", "menstrual"]);
        assert!(applicable_phases("nada relevante").is_empty());
    }

    #[test]
    fn test_emotions_and_segments() {
        let text = "Estrés y vitalidad durante la renovación del estrógeno";
        let phases = applicable_phases(text);
        let emotions = emotional_relevance(text);
        assert_eq!(emotions, ["ansiedad", "energía"]);
        assert_eq!(applicable_segments(&phases, &emotions), ["SEG001", "SEG003"]);
    }

    #[test]
    fn test_segments_deduplicated_and_partial() {
        let phases = vec!["folicular".to_string(), "folicular".to_string()];
        let emotions = vec!["ansiedad".to_string()];
        assert_eq!(applicable_segments(&phases, &emotions), ["SEG001"]);

        let unmapped =
            applicable_segments(&["ovulatoria".to_string()], &["confianza".to_string()]);
        assert!(unmapped.is_empty());
    }

    #[test]
    fn test_content_type_priority() {
        assert_eq!(classify_content_type("Dieta y dolor"), "nutrition");
        assert_eq!(classify_content_type("Información sobre la dieta"), "lesson");
        assert_eq!(classify_content_type("Actividad física diaria"), "exercise");
        assert_eq!(classify_content_type("Texto neutro"), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_structure_markers() {
        assert!(has_structure_markers("Pasos: 1. respirar 2. caminar"));
        assert!(has_structure_markers("• dormir bien"));
        assert!(has_structure_markers("Primero, descansa."));
        assert!(has_structure_markers("lista\n- agua\n- sueño"));
        assert!(!has_structure_markers("--- Página 1 ---\nauto-cuidado diario"));
        assert!(!has_structure_markers("dosis de 1.5 mg"));
    }

    #[test]
    fn test_confidence_components() {
        let tagger = Tagger::default();
        assert_eq!(tagger.confidence("texto corto"), 0.5);
        assert!((tagger.confidence(&words(150)) - 0.7).abs() < 1e-9);
        let terms = "hormona ciclo menstruación estrógeno progesterona";
        // capped at +0.3
        assert!((tagger.confidence(terms) - 0.8).abs() < 1e-9);
        let everything = format!("{} {} 1. uno", words(150), terms);
        assert_eq!(tagger.confidence(&everything), 1.0);
    }

    #[test]
    fn test_confidence_word_range_bounds() {
        let tagger = Tagger::default();
        assert_eq!(tagger.confidence(&words(99)), 0.5);
        assert!((tagger.confidence(&words(100)) - 0.7).abs() < 1e-9);
        assert!((tagger.confidence(&words(500)) - 0.7).abs() < 1e-9);
        assert_eq!(tagger.confidence(&words(501)), 0.5);
    }

    #[test]
    fn test_analyze_defaults() {
        let meta = Tagger::default().analyze("Texto neutro");
        assert_eq!(meta.content_type, "educational");
        assert_eq!(meta.urgency_level, "normal");
        assert_eq!(meta.processing_method, "local_extraction");
        assert!(meta.primary_topics.is_empty());
        assert!(meta.applicable_segments.is_empty());
    }
}
