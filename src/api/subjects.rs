use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::Subject;
use crate::state::AppState;

/// GET /api/subjects
pub async fn list_subjects(
    State(state): State<AppState>,
) -> Result<Json<Vec<Subject>>, (StatusCode, String)> {
    let subjects = state.db_call(|db| db.list_subjects()).await?;
    Ok(Json(subjects))
}

/// GET /api/cities - Distinct tutor cities for the filter dropdown
pub async fn list_cities(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let cities = state.db_call(|db| db.list_cities()).await?;
    Ok(Json(cities))
}
