//! Segment record types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::content_type::ContentType;

/// One audience slice: a cycle phase (or life stage) combined with an
/// emotional, hormonal and demographic profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub name: String,
    pub category: String,
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_combination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_count: Option<String>,

    pub demographics: Demographics,
    pub hormonal_profile: HormonalProfile,
    pub emotional_characteristics: EmotionalCharacteristics,
    /// Absent symptoms are written as three empty lists; an empty `common`
    /// list reads back as absent.
    #[serde(
        default,
        serialize_with = "write_symptoms",
        deserialize_with = "read_symptoms"
    )]
    pub physical_symptoms: Option<PhysicalSymptoms>,
    pub content_preferences: ContentPreferences,
    pub recommended_content_types: RecommendedContentTypes,
    #[serde(default)]
    pub intervention_priorities: Vec<String>,
    #[serde(default)]
    pub related_segments: Vec<String>,
}

impl Segment {
    /// Recommended priority of a content type for this segment, 0.0 for
    /// types outside the standard six.
    pub fn priority(&self, content_type: &ContentType) -> f64 {
        self.recommended_content_types.priority(content_type)
    }

    /// First `n` common physical symptoms, empty when the segment has none.
    pub fn common_symptoms(&self, n: usize) -> &[String] {
        match &self.physical_symptoms {
            Some(symptoms) => &symptoms.common[..symptoms.common.len().min(n)],
            None => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age_groups: Vec<String>,
    pub life_stages: Vec<String>,
    #[serde(default)]
    pub common_triggers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_concerns: Option<Vec<String>>,
}

/// Qualitative hormone levels ("creciente", "bajo", "fluctuante", ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HormonalProfile {
    pub estrogen_level: String,
    pub progesterone_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cortisol_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development_stage: Option<String>,
    #[serde(default)]
    pub sensitivity_factors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionalCharacteristics {
    pub primary_emotions: Vec<String>,
    pub secondary_emotions: Vec<String>,
    /// Valence range as `[low, high]`.
    pub emotional_range: [f64; 2],
    pub volatility: String,
    pub recovery_time: String,
}

/// Physical symptoms bucketed by severity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSymptoms {
    #[serde(default)]
    pub common: Vec<String>,
    #[serde(default)]
    pub moderate: Vec<String>,
    #[serde(default)]
    pub severe: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPreferences {
    pub tone: String,
    pub depth: String,
    pub urgency: String,
    pub focus_areas: Vec<String>,
    pub avoid_topics: Vec<String>,
}

/// Per-content-type priority scores in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendedContentTypes {
    pub lesson_3min: f64,
    pub whats_happening: f64,
    pub nutrition_guide: f64,
    pub cycle_day_info: f64,
    pub hormone_levels: f64,
    pub stress_levels: f64,
}

impl RecommendedContentTypes {
    pub fn priority(&self, content_type: &ContentType) -> f64 {
        match content_type {
            ContentType::Lesson3Min => self.lesson_3min,
            ContentType::WhatsHappening => self.whats_happening,
            ContentType::NutritionGuide => self.nutrition_guide,
            ContentType::CycleDayInfo => self.cycle_day_info,
            ContentType::HormoneLevels => self.hormone_levels,
            ContentType::StressLevels => self.stress_levels,
            ContentType::Other(_) => 0.0,
        }
    }
}

fn write_symptoms<S>(symptoms: &Option<PhysicalSymptoms>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match symptoms {
        Some(symptoms) => symptoms.serialize(serializer),
        None => PhysicalSymptoms::default().serialize(serializer),
    }
}

fn read_symptoms<'de, D>(deserializer: D) -> Result<Option<PhysicalSymptoms>, D::Error>
where
    D: Deserializer<'de>,
{
    let symptoms = Option::<PhysicalSymptoms>::deserialize(deserializer)?;
    Ok(symptoms.filter(|s| !s.common.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "id": "SEG_TEST",
            "name": "Test",
            "category": "base_phase_emotional",
            "phase": "lutea",
            "demographics": {"age_groups": ["30-39"], "life_stages": ["reproductiva"]},
            "hormonal_profile": {"estrogen_level": "bajo", "progesterone_level": "alto"},
            "emotional_characteristics": {
                "primary_emotions": ["triste"],
                "secondary_emotions": [],
                "emotional_range": [-1.5, 0.0],
                "volatility": "moderada",
                "recovery_time": "moderado"
            },
            "content_preferences": {
                "tone": "empático", "depth": "intermedio", "urgency": "media",
                "focus_areas": ["validación"], "avoid_topics": []
            },
            "recommended_content_types": {
                "lesson_3min": 0.7, "whats_happening": 0.9, "nutrition_guide": 0.4,
                "cycle_day_info": 0.6, "hormone_levels": 0.8, "stress_levels": 0.5
            }
        })
    }

    #[test]
    fn test_optional_fields_default() {
        let segment: Segment = serde_json::from_value(minimal()).unwrap();
        assert!(segment.emotional_primary.is_none());
        assert!(segment.physical_symptoms.is_none());
        assert!(segment.demographics.common_triggers.is_empty());
        assert!(segment.related_segments.is_empty());
        assert!(segment.common_symptoms(3).is_empty());
    }

    #[test]
    fn test_absent_symptoms_written_as_empty_lists() {
        let segment: Segment = serde_json::from_value(minimal()).unwrap();
        let value = serde_json::to_value(&segment).unwrap();
        assert_eq!(
            value["physical_symptoms"],
            json!({"common": [], "moderate": [], "severe": []})
        );
        let back: Segment = serde_json::from_value(value).unwrap();
        assert!(back.physical_symptoms.is_none());
    }

    #[test]
    fn test_priority_lookup() {
        let segment: Segment = serde_json::from_value(minimal()).unwrap();
        assert_eq!(segment.priority(&ContentType::WhatsHappening), 0.9);
        assert_eq!(segment.priority(&ContentType::NutritionGuide), 0.4);
        assert_eq!(segment.priority(&ContentType::from("podcast_script")), 0.0);
    }
}
