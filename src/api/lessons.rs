use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::models::{LessonRequest, LessonRequestCreate, LessonStatusUpdate};
use crate::state::AppState;

/// POST /api/lesson-requests - Starts out `pending`
pub async fn create_lesson_request(
    State(state): State<AppState>,
    Json(req): Json<LessonRequestCreate>,
) -> Result<(StatusCode, Json<LessonRequest>), (StatusCode, String)> {
    let lesson = state
        .db_call(move |db| db.create_lesson_request(req))
        .await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// GET /api/students/{id}/lesson-requests
pub async fn list_for_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<Json<Vec<LessonRequest>>, (StatusCode, String)> {
    let lessons = state
        .db_call(move |db| db.list_lesson_requests_for_student(student_id))
        .await?;
    Ok(Json(lessons))
}

/// PUT /api/lesson-requests/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<LessonStatusUpdate>,
) -> Result<Json<LessonRequest>, (StatusCode, String)> {
    let lesson = state
        .db_call(move |db| db.update_lesson_request_status(id, req.status))
        .await?;
    Ok(Json(lesson))
}
