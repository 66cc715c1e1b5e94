//! Kinds of generated content.

use serde::{Deserialize, Serialize};

/// A category of generated output, each with its own prompt template and a
/// per-segment priority.
///
/// Names outside the six standard kinds are kept verbatim in `Other`; they
/// get a generic prompt instruction and a priority of 0.0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    Lesson3Min,
    WhatsHappening,
    NutritionGuide,
    CycleDayInfo,
    HormoneLevels,
    StressLevels,
    Other(String),
}

impl ContentType {
    /// The six content types every segment has a priority for, in run order.
    pub fn standard() -> Vec<ContentType> {
        vec![
            Self::Lesson3Min,
            Self::WhatsHappening,
            Self::NutritionGuide,
            Self::CycleDayInfo,
            Self::HormoneLevels,
            Self::StressLevels,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Lesson3Min => "lesson_3min",
            Self::WhatsHappening => "whats_happening",
            Self::NutritionGuide => "nutrition_guide",
            Self::CycleDayInfo => "cycle_day_info",
            Self::HormoneLevels => "hormone_levels",
            Self::StressLevels => "stress_levels",
            Self::Other(name) => name,
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for ContentType {
    fn from(name: &str) -> Self {
        match name.trim() {
            "lesson_3min" => Self::Lesson3Min,
            "whats_happening" => Self::WhatsHappening,
            "nutrition_guide" => Self::NutritionGuide,
            "cycle_day_info" => Self::CycleDayInfo,
            "hormone_levels" => Self::HormoneLevels,
            "stress_levels" => Self::StressLevels,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ContentType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ContentType> for String {
    fn from(content_type: ContentType) -> Self {
        content_type.as_str().to_string()
    }
}

impl std::str::FromStr for ContentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
