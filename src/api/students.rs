use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::StoreError;
use crate::models::{Deleted, Student, StudentCreate, StudentSaved, StudentUpdate};
use crate::state::AppState;

/// GET /api/students
pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<Student>>, (StatusCode, String)> {
    let students = state.db_call(|db| db.list_students()).await?;
    Ok(Json(students))
}

/// POST /api/students - 409 when the email is already registered
pub async fn create_student(
    State(state): State<AppState>,
    Json(req): Json<StudentCreate>,
) -> Result<(StatusCode, Json<StudentSaved>), (StatusCode, String)> {
    let student = state.db_call(move |db| db.create_student(req)).await?;
    Ok((StatusCode::CREATED, Json(StudentSaved::from(&student))))
}

/// GET /api/students/{id}
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Student>, (StatusCode, String)> {
    let student = state
        .db_call(move |db| db.get_student(id)?.ok_or(StoreError::NotFound("Student")))
        .await?;
    Ok(Json(student))
}

/// PUT /api/students/{id}
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(updates): Json<StudentUpdate>,
) -> Result<Json<StudentSaved>, (StatusCode, String)> {
    let student = state.db_call(move |db| db.update_student(id, updates)).await?;
    Ok(Json(StudentSaved::from(&student)))
}

/// DELETE /api/students/{id} - Also removes the student's reviews and lesson requests
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>, (StatusCode, String)> {
    state.db_call(move |db| db.delete_student(id)).await?;
    tracing::info!("Deleted student {id}");
    Ok(Json(Deleted { deleted: true }))
}
