use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{StoreError, StoreResult};
use crate::explain;
use crate::matching;
use crate::models::{ChatRequest, ChatResponse, Student, Tutor, TutorCard};
use crate::state::AppState;

/// Load the student and their ranked tutors in one blocking call.
async fn load_recommendations(
    state: &AppState,
    student_id: i64,
) -> StoreResult<(Student, Vec<Tutor>)> {
    state
        .db_call(move |db| {
            let student = db
                .get_student(student_id)?
                .ok_or(StoreError::NotFound("Student"))?;
            let tutors = db.list_tutors()?;
            let ranked = matching::recommend_for_student(
                &student,
                &tutors,
                matching::DEFAULT_RECOMMENDATIONS,
            );
            Ok((student, ranked))
        })
        .await
}

/// GET /api/students/{id}/recommendations - Template explanations only
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TutorCard>>, (StatusCode, String)> {
    let (student, tutors) = load_recommendations(&state, id).await?;

    let cards = tutors
        .iter()
        .map(|t| TutorCard {
            explanation: Some(explain::deterministic_explanation(&student, t)),
            ..TutorCard::from(t)
        })
        .collect();
    Ok(Json(cards))
}

/// POST /api/chat
///
/// The reply text is always the deterministic chat message. Card
/// explanations come from the language model when `use_ai` is set and a
/// provider is configured, otherwise from the template.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let (student, tutors) = load_recommendations(&state, req.student_id).await?;
    tracing::info!(
        "Chat for student {} ({} chars): {} tutors matched",
        student.id,
        req.message.chars().count(),
        tutors.len()
    );

    let explanations = if req.use_ai {
        explain::explain_recommendations(&state.http_client, &state.config.llm, &student, &tutors)
            .await
    } else {
        tutors
            .iter()
            .map(|t| explain::deterministic_explanation(&student, t))
            .collect()
    };

    let cards = tutors
        .iter()
        .zip(explanations)
        .map(|(t, explanation)| TutorCard {
            explanation: Some(explanation),
            ..TutorCard::from(t)
        })
        .collect();

    Ok(Json(ChatResponse {
        reply: explain::chat_reply(&student, &tutors),
        tutors: cards,
    }))
}
