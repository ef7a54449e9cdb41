//! Axum HTTP handlers, one module per resource.

pub mod lessons;
pub mod recommend;
pub mod reviews;
pub mod students;
pub mod subjects;
pub mod tutors;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// All routes, mounted under `/api`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/subjects", get(subjects::list_subjects))
        .route("/cities", get(subjects::list_cities))
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/students/{id}",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route(
            "/students/{id}/recommendations",
            get(recommend::recommendations),
        )
        .route(
            "/students/{id}/lesson-requests",
            get(lessons::list_for_student),
        )
        .route("/tutors", get(tutors::list_tutors).post(tutors::create_tutor))
        .route("/tutors/search", get(tutors::search_tutors))
        .route(
            "/tutors/{id}",
            get(tutors::get_tutor)
                .put(tutors::update_tutor)
                .delete(tutors::delete_tutor),
        )
        .route("/tutors/{id}/similar", get(tutors::similar_tutors))
        .route("/tutors/{id}/reviews", post(reviews::create_review))
        .route("/lesson-requests", post(lessons::create_lesson_request))
        .route("/lesson-requests/{id}/status", put(lessons::update_status))
        .route("/chat", post(recommend::chat));

    Router::new().nest("/api", api).with_state(state)
}

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
