//! Prompt construction for segment content.
//!
//! The prompt is plain Spanish text: a persona line, the segment profile,
//! retrieved medical context, instructions for the requested content type
//! and ten fixed requirements. Construction is pure and deterministic.

use cyclesage_segments::{ContentType, Segment};

/// Instructions used for content types without a dedicated template.
pub const GENERIC_INSTRUCTIONS: &str = "Genera contenido relevante y útil para este segmento.";

const PERSONA: &str = "Eres una experta en salud femenina y bienestar menstrual. \
Generas contenido personalizado y empático para mujeres en las distintas fases \
de su ciclo menstrual.";

const NOT_AVAILABLE: &str = "N/A";

fn list(items: &[String]) -> String {
    items.join(", ")
}

fn or_na(value: Option<&String>) -> &str {
    value.map(String::as_str).unwrap_or(NOT_AVAILABLE)
}

/// How the instructions refer to the segment's emotional state.
fn feeling(segment: &Segment) -> &str {
    segment.emotional_primary.as_deref().unwrap_or("así")
}

fn segment_block(segment: &Segment) -> String {
    let prefs = &segment.content_preferences;
    format!(
        "SEGMENTO: {} ({})\n\
         FASE: {}\n\
         CATEGORÍA: {}\n\
         ESTADO EMOCIONAL: {}\n\
         INTENSIDAD: {}\n\
         TONO RECOMENDADO: {}\n\
         URGENCIA: {}\n\
         ÁREAS DE ENFOQUE: {}\n\
         TEMAS A EVITAR: {}\n",
        segment.name,
        segment.id,
        segment.phase,
        segment.category,
        or_na(segment.emotional_primary.as_ref()),
        or_na(segment.intensity_level.as_ref()),
        prefs.tone,
        prefs.urgency,
        list(&prefs.focus_areas),
        list(&prefs.avoid_topics),
    )
}

fn emotional_block(segment: &Segment) -> String {
    let em = &segment.emotional_characteristics;
    format!(
        "CARACTERÍSTICAS EMOCIONALES:\n\
         - Emociones principales: {}\n\
         - Emociones secundarias: {}\n\
         - Rango emocional: [{}, {}]\n\
         - Volatilidad: {}\n\
         - Tiempo de recuperación: {}\n",
        list(&em.primary_emotions),
        list(&em.secondary_emotions),
        em.emotional_range[0],
        em.emotional_range[1],
        em.volatility,
        em.recovery_time,
    )
}

fn hormonal_block(segment: &Segment) -> String {
    let hp = &segment.hormonal_profile;
    format!(
        "PERFIL HORMONAL:\n\
         - Estradiol: {}\n\
         - Progesterona: {}\n\
         - Cortisol: {}\n\
         - Factores de sensibilidad: {}\n",
        hp.estrogen_level,
        hp.progesterone_level,
        or_na(hp.cortisol_level.as_ref()),
        list(&hp.sensitivity_factors),
    )
}

fn symptoms_block(segment: &Segment) -> String {
    match &segment.physical_symptoms {
        Some(ps) => format!(
            "SÍNTOMAS FÍSICOS:\n\
             - Comunes: {}\n\
             - Moderados: {}\n\
             - Severos: {}\n",
            list(&ps.common),
            list(&ps.moderate),
            list(&ps.severe),
        ),
        None => String::new(),
    }
}

fn demographics_block(segment: &Segment) -> String {
    let d = &segment.demographics;
    format!(
        "DEMOGRAFÍA:\n\
         - Grupos de edad: {}\n\
         - Etapas de vida: {}\n\
         - Desencadenantes comunes: {}\n",
        list(&d.age_groups),
        list(&d.life_stages),
        list(&d.common_triggers),
    )
}

/// Per-content-type instructions. Each template fixes its own length and
/// structure; unknown types get [`GENERIC_INSTRUCTIONS`].
pub fn content_instructions(content_type: &ContentType, segment: &Segment) -> String {
    let phase = &segment.phase;
    let feeling = feeling(segment);
    match content_type {
        ContentType::Lesson3Min => format!(
            "Escribe una lección educativa de como MÁXIMO 3 MINUTOS DE LECTURA \
             (entre 400 y 500 palabras) que explique:\n\
             - Qué ocurre a nivel hormonal en la fase {phase}\n\
             - Qué relación tiene con sentirse {feeling}\n\
             - Estrategias prácticas para manejar los síntomas\n\
             - Validación de sus emociones y experiencias\n\
             - Consejos concretos para: {ages}\n\
             - Ejemplos prácticos que pueda aplicar hoy\n\n\
             FORMATO: texto corrido en párrafos cortos y fáciles de leer.",
            ages = list(&segment.demographics.age_groups),
        ),
        ContentType::WhatsHappening => format!(
            "Escribe un texto de MÁXIMO 4 RENGLONES que explique brevemente:\n\
             - Qué pasa en tu cuerpo durante la fase {phase}\n\
             - Por qué te sientes {feeling}\n\
             - Cómo los cambios hormonales afectan tu mente y tu cuerpo\n\
             - Que sentirse así es completamente normal\n\n\
             FORMATO: cuatro líneas como máximo, directas y empáticas, hablando de tú.\n\
             EJEMPLO:\n\
             \"Durante la fase folicular tus niveles de estrógeno van en aumento...\n\
             Por eso puedes sentirte con más energía y también algo ansiosa...\n\
             Tu cuerpo se prepara para la ovulación y es normal notar estos cambios...\n\
             Forman parte natural de tu ciclo y pasarán en unos días.\""
        ),
        ContentType::NutritionGuide => format!(
            "Da información nutricional para la fase {phase} y para cuando te sientes {feeling}.\n\n\
             Incluye:\n\
             - Entre 5 y 7 alimentos recomendados para esta fase y este estado emocional\n\
             - Los nutrientes clave que tu cuerpo necesita ahora (vitaminas y minerales)\n\
             - 3 o 4 alimentos que conviene evitar o limitar\n\
             - Horarios de comida recomendados para esta fase\n\
             - Consejos de hidratación\n\
             - 1 o 2 suplementos que podrían ayudar, si aplica\n\n\
             FORMATO: lista ordenada con una explicación breve de por qué cada \
             recomendación importa en tu fase actual."
        ),
        ContentType::CycleDayInfo => format!(
            "Da información sobre el momento del ciclo en la fase {phase}.\n\n\
             Incluye:\n\
             - En qué días del ciclo suele ocurrir esta fase\n\
             - Cuánto dura normalmente (rango de días)\n\
             - Qué esperar en los próximos días\n\
             - Cómo varía entre mujeres dentro de rangos normales\n\
             - Señales físicas y emocionales típicas de esta fase\n\
             - Cuándo debería terminar y qué fase sigue\n\n\
             FORMATO: información clara y estructurada sobre la duración y la \
             progresión de la fase actual."
        ),
        ContentType::HormoneLevels => format!(
            "Explica los niveles hormonales durante la fase {phase}.\n\n\
             Incluye:\n\
             - ESTRÓGENO {estrogen}: qué significa y cómo afecta tu cuerpo y tus emociones\n\
             - PROGESTERONA {progesterone}: su función y sus efectos ahora\n\
             - FSH (hormona folículo estimulante): qué está haciendo en este momento\n\
             - Cómo estos niveles se relacionan con sentirse {feeling}\n\
             - Qué cambios hormonales esperar en los próximos días\n\
             - Cómo influyen en tu energía, tu estado de ánimo y tus síntomas físicos\n\n\
             FORMATO: explicación educativa pero accesible de la actividad hormonal actual.",
            estrogen = segment.hormonal_profile.estrogen_level,
            progesterone = segment.hormonal_profile.progesterone_level,
        ),
        ContentType::StressLevels => format!(
            "Explica el nivel de estrés asociado al cortisol durante la fase {phase}.\n\n\
             Incluye:\n\
             - CORTISOL {cortisol}: qué significa este nivel\n\
             - Cómo interactúa el cortisol con tus hormonas sexuales en esta fase\n\
             - Por qué te sientes {feeling} en relación con el estrés\n\
             - Señales físicas de estrés que puedes estar notando\n\
             - Estrategias para bajar el cortisol en esta fase\n\
             - Cómo el estrés puede alterar tu ciclo menstrual\n\
             - Las técnicas de manejo del estrés que mejor te funcionan ahora\n\n\
             FORMATO: información práctica sobre la relación entre estrés, cortisol y tu fase.",
            cortisol = segment
                .hormonal_profile
                .cortisol_level
                .as_deref()
                .unwrap_or("variable"),
        ),
        ContentType::Other(_) => GENERIC_INSTRUCTIONS.to_string(),
    }
}

fn requirements(segment: &Segment) -> String {
    let prefs = &segment.content_preferences;
    format!(
        "REQUISITOS OBLIGATORIOS:\n\
         1. Usa un tono {}\n\
         2. Mantén una profundidad {}\n\
         3. Céntrate en: {}\n\
         4. EVITA: {}\n\
         5. RESPETA ESTRICTAMENTE el límite de longitud indicado para este tipo de contenido\n\
         6. Incluye consejos prácticos y validación emocional\n\
         7. NO hagas diagnósticos médicos\n\
         8. Usa un lenguaje empático y comprensivo\n\
         9. Apóyate en la información médica proporcionada\n\
         10. Habla directamente a la usuaria de tú\n",
        prefs.tone,
        prefs.depth,
        list(&prefs.focus_areas),
        list(&prefs.avoid_topics),
    )
}

/// Build the full generation prompt for one segment and content type.
pub fn build_prompt(segment: &Segment, content_type: &ContentType, context: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(PERSONA);
    prompt.push_str("\n\n");

    for block in [
        segment_block(segment),
        emotional_block(segment),
        hormonal_block(segment),
        symptoms_block(segment),
        demographics_block(segment),
    ] {
        if !block.is_empty() {
            prompt.push_str(&block);
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!(
        "PRIORIDADES DE INTERVENCIÓN:\n{}\n\n",
        list(&segment.intervention_priorities)
    ));
    prompt.push_str(&format!("CONTEXTO MÉDICO RELEVANTE:\n{}\n\n", context));
    prompt.push_str(&format!(
        "INSTRUCCIONES ESPECÍFICAS PARA {}:\n{}\n\n",
        content_type.as_str().to_uppercase(),
        content_instructions(content_type, segment)
    ));
    prompt.push_str(&requirements(segment));
    prompt.push_str("\nGenera el contenido ahora:\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclesage_segments::Catalog;

    fn segment(id: &str) -> Segment {
        Catalog::builtin().unwrap().get(id).unwrap().clone()
    }

    #[test]
    fn test_prompt_sections_in_order() {
        let seg = segment("SEG001_FOL_STRESS_CHRONIC");
        let prompt = build_prompt(&seg, &ContentType::Lesson3Min, "El estrógeno sube.");

        let order = [
            "SEGMENTO: ",
            "CARACTERÍSTICAS EMOCIONALES:",
            "PERFIL HORMONAL:",
            "DEMOGRAFÍA:",
            "PRIORIDADES DE INTERVENCIÓN:",
            "CONTEXTO MÉDICO RELEVANTE:\nEl estrógeno sube.",
            "INSTRUCCIONES ESPECÍFICAS PARA LESSON_3MIN:",
            "REQUISITOS OBLIGATORIOS:",
            "Genera el contenido ahora:",
        ];
        let mut last = 0;
        for marker in order {
            let at = prompt[last..]
                .find(marker)
                .unwrap_or_else(|| panic!("missing or out of order: {marker}"));
            last += at;
        }
        assert!(prompt.contains("SEG001_FOL_STRESS_CHRONIC"));
        assert!(prompt.contains("400 y 500 palabras"));
    }

    #[test]
    fn test_ten_requirements() {
        let seg = segment("SEG011_LUT_ANXIOUS");
        let prompt = build_prompt(&seg, &ContentType::WhatsHappening, "");
        let requirements = &prompt[prompt.find("REQUISITOS OBLIGATORIOS:").unwrap()..];
        for n in 1..=10 {
            assert!(requirements.contains(&format!("\n{n}. ")), "missing requirement {n}");
        }
        assert!(!requirements.contains("\n11. "));
        assert!(requirements.contains(&seg.content_preferences.tone));
        assert!(prompt.contains("MÁXIMO 4 RENGLONES"));
    }

    #[test]
    fn test_unknown_content_type_uses_generic_instructions() {
        let seg = segment("SEG011_LUT_ANXIOUS");
        let custom = ContentType::from("meditation_script");
        assert_eq!(content_instructions(&custom, &seg), GENERIC_INSTRUCTIONS);
        let prompt = build_prompt(&seg, &custom, "");
        assert!(prompt.contains("INSTRUCCIONES ESPECÍFICAS PARA MEDITATION_SCRIPT:"));
    }

    #[test]
    fn test_instructions_differ_by_type() {
        let seg = segment("SEG002_FOL_ENERGETIC");
        let texts: Vec<String> = ContentType::standard()
            .iter()
            .map(|ct| content_instructions(ct, &seg))
            .collect();
        for (i, a) in texts.iter().enumerate() {
            assert!(a.contains(&seg.phase));
            for b in &texts[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_segment_without_primary_emotion() {
        let seg = segment("SEG_PREMEN_001");
        assert!(seg.emotional_primary.is_none());
        let prompt = build_prompt(&seg, &ContentType::StressLevels, "");
        assert!(prompt.contains("ESTADO EMOCIONAL: N/A"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let seg = segment("SEG_PERI_001");
        let a = build_prompt(&seg, &ContentType::HormoneLevels, "ctx");
        let b = build_prompt(&seg, &ContentType::HormoneLevels, "ctx");
        assert_eq!(a, b);
    }
}
