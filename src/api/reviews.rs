use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::models::{Review, ReviewCreate};
use crate::state::AppState;

/// POST /api/tutors/{id}/reviews
///
/// Stores the review only. The tutor's `overall_rating` and
/// `number_of_reviews` are maintained separately and stay as they were.
pub async fn create_review(
    State(state): State<AppState>,
    Path(tutor_id): Path<i64>,
    Json(req): Json<ReviewCreate>,
) -> Result<(StatusCode, Json<Review>), (StatusCode, String)> {
    let review = state
        .db_call(move |db| db.create_review(tutor_id, req))
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
