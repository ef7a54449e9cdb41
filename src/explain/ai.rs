use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::explain::template::deterministic_explanation;
use crate::models::{Student, Tutor};

#[derive(Serialize)]
struct PromptStudent<'a> {
    id: i64,
    name: &'a str,
    preferences: Option<&'a str>,
    city: Option<&'a str>,
    max_hourly_rate: Option<f64>,
}

#[derive(Serialize)]
struct PromptTutor<'a> {
    tutor_id: i64,
    name: &'a str,
    subjects: Vec<String>,
    hourly_rate: f64,
    rating: f64,
}

#[derive(Deserialize)]
struct GeneratedExplanation {
    #[serde(default)]
    tutor_id: serde_json::Value,
    #[serde(default)]
    explanation: Option<String>,
}

/// One explanation per tutor, in the same order as `tutors`.
///
/// Asks the language model for all explanations in one call. Any tutor the
/// model skipped, and every tutor when the call or the parsing fails, gets
/// the deterministic template instead. Never fails.
pub async fn explain_recommendations(
    client: &reqwest::Client,
    config: &LlmConfig,
    student: &Student,
    tutors: &[Tutor],
) -> Vec<String> {
    if tutors.is_empty() {
        return Vec::new();
    }

    let generated = if config.is_enabled() {
        let prompt = build_prompt(student, tutors);
        match crate::llm::generate(client, config, &prompt).await {
            Ok(text) => {
                let parsed = parse_explanations(&text);
                tracing::info!(
                    "LLM returned {} explanations for {} tutors",
                    parsed.len(),
                    tutors.len()
                );
                parsed
            }
            Err(e) => {
                tracing::warn!("Explanation generation failed, using template: {e:#}");
                HashMap::new()
            }
        }
    } else {
        HashMap::new()
    };

    merge_with_fallback(student, tutors, generated)
}

fn merge_with_fallback(
    student: &Student,
    tutors: &[Tutor],
    mut generated: HashMap<i64, String>,
) -> Vec<String> {
    tutors
        .iter()
        .map(|t| {
            generated
                .remove(&t.id)
                .unwrap_or_else(|| deterministic_explanation(student, t))
        })
        .collect()
}

pub(crate) fn build_prompt(student: &Student, tutors: &[Tutor]) -> String {
    let student_info = PromptStudent {
        id: student.id,
        name: &student.name,
        preferences: student.preferred_subjects.as_deref(),
        city: student.city.as_deref(),
        max_hourly_rate: student.max_hourly_rate,
    };
    let rows: Vec<PromptTutor<'_>> = tutors
        .iter()
        .map(|t| PromptTutor {
            tutor_id: t.id,
            name: &t.name,
            subjects: t.subject_names(),
            hourly_rate: t.hourly_rate,
            rating: t.overall_rating,
        })
        .collect();

    let student_json = serde_json::to_string(&student_info).unwrap_or_default();
    let tutors_json = serde_json::to_string(&rows).unwrap_or_default();

    format!(
        "You will receive a student and a list of tutors.\n\
         Return a JSON array. Each element must have:\n\
         - tutor_id (matching the tutor_id from input)\n\
         - explanation (2 short sentences, friendly, explaining why this tutor fits the student).\n\
         Do NOT include anything other than the JSON array.\n\n\
         Student:\n{student_json}\n\
         Tutors:\n{tutors_json}"
    )
}

/// Pull `tutor_id → explanation` pairs out of model output. Tolerates
/// prose or code fences around the array; ids may be numbers or numeric
/// strings. Unusable output yields an empty map.
pub(crate) fn parse_explanations(content: &str) -> HashMap<i64, String> {
    let json_str = match (content.find('['), content.rfind(']')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content.trim(),
    };

    let items: Vec<GeneratedExplanation> = match serde_json::from_str(json_str) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Failed to parse generated explanations: {e}");
            return HashMap::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| {
            let id = match &item.tutor_id {
                serde_json::Value::Number(n) => n.as_i64(),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }?;
            let text = item.explanation?.trim().to_string();
            (!text.is_empty()).then_some((id, text))
        })
        .collect()
}
