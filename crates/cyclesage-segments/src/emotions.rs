//! Closed emotion vocabulary shared with the mobile app.
//!
//! Labels are lowercase with underscores for spaces. FEEL033 is retired and
//! intentionally absent.

/// One entry of the emotion vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emotion {
    pub label: &'static str,
    pub id: &'static str,
    pub category: &'static str,
}

const fn e(label: &'static str, id: &'static str, category: &'static str) -> Emotion {
    Emotion {
        label,
        id,
        category,
    }
}

const STRESS: &str = "Estrés y ansiedad";
const LOW_MOOD: &str = "Ánimo bajo";
const PHYSICAL: &str = "Físico y energía";
const SELF_ESTEEM: &str = "Autoestima";
const RELATIONAL: &str = "Relacional";

pub static EMOTIONS: &[Emotion] = &[
    e("ansiosa", "FEEL001", STRESS),
    e("abrumada", "FEEL002", STRESS),
    e("nerviosa", "FEEL003", STRESS),
    e("impaciente", "FEEL004", STRESS),
    e("tensa", "FEEL005", STRESS),
    e("frustrada", "FEEL006", STRESS),
    e("preocupada", "FEEL007", STRESS),
    e("estresada", "FEEL008", STRESS),
    e("cansada_mentalmente", "FEEL009", STRESS),
    e("insegura", "FEEL010", STRESS),
    e("triste", "FEEL011", LOW_MOOD),
    e("vacía", "FEEL012", LOW_MOOD),
    e("sensible", "FEEL013", LOW_MOOD),
    e("desmotivada", "FEEL014", LOW_MOOD),
    e("aislada", "FEEL015", LOW_MOOD),
    e("lloro_fácil", "FEEL016", LOW_MOOD),
    e("nostálgica", "FEEL017", LOW_MOOD),
    e("melancólica", "FEEL018", LOW_MOOD),
    e("incomprendida", "FEEL019", LOW_MOOD),
    e("desesperanzada", "FEEL020", LOW_MOOD),
    e("cansada_físicamente", "FEEL021", PHYSICAL),
    e("energética", "FEEL022", PHYSICAL),
    e("letárgica", "FEEL023", PHYSICAL),
    e("inflamada", "FEEL024", PHYSICAL),
    e("dolorida", "FEEL025", PHYSICAL),
    e("irritable_físicamente", "FEEL026", PHYSICAL),
    e("con_hambre_excesiva", "FEEL027", PHYSICAL),
    e("liviana", "FEEL028", PHYSICAL),
    e("activa", "FEEL029", PHYSICAL),
    e("aletargada", "FEEL030", PHYSICAL),
    e("poderosa", "FEEL031", SELF_ESTEEM),
    e("atractiva", "FEEL032", SELF_ESTEEM),
    e("desconectada", "FEEL034", SELF_ESTEEM),
    e("confiada", "FEEL035", SELF_ESTEEM),
    e("inadecuada", "FEEL036", SELF_ESTEEM),
    e("en_paz_conmigo", "FEEL037", SELF_ESTEEM),
    e("con_culpa", "FEEL038", SELF_ESTEEM),
    e("orgullosa_de_mí", "FEEL039", SELF_ESTEEM),
    e("frágil", "FEEL040", SELF_ESTEEM),
    e("amada", "FEEL041", RELATIONAL),
    e("ignorada", "FEEL042", RELATIONAL),
    e("conectada", "FEEL043", RELATIONAL),
    e("en_conflicto", "FEEL044", RELATIONAL),
    e("valorada", "FEEL045", RELATIONAL),
    e("sola", "FEEL046", RELATIONAL),
    e("cuidada", "FEEL047", RELATIONAL),
    e("rechazada", "FEEL048", RELATIONAL),
    e("agradecida", "FEEL049", RELATIONAL),
    e("acompañada", "FEEL050", RELATIONAL),
];

/// Vocabulary categories in display order.
pub const CATEGORIES: [&str; 5] = [STRESS, LOW_MOOD, PHYSICAL, SELF_ESTEEM, RELATIONAL];

/// Look up the `FEELnnn` identifier of a label.
pub fn emotion_id(label: &str) -> Option<&'static str> {
    EMOTIONS.iter().find(|e| e.label == label).map(|e| e.id)
}

pub fn is_known(label: &str) -> bool {
    emotion_id(label).is_some()
}

/// Entries of one category, in vocabulary order.
pub fn by_category(category: &str) -> Vec<&'static Emotion> {
    EMOTIONS.iter().filter(|e| e.category == category).collect()
}
