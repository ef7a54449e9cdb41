use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::matching;
use crate::models::{
    Deleted, ReviewView, SearchParams, Tutor, TutorCard, TutorCreate, TutorDetail, TutorHit,
    TutorSaved, TutorUpdate,
};
use crate::state::AppState;

/// GET /api/tutors
pub async fn list_tutors(
    State(state): State<AppState>,
) -> Result<Json<Vec<Tutor>>, (StatusCode, String)> {
    let tutors = state.db_call(|db| db.list_tutors()).await?;
    Ok(Json(tutors))
}

/// GET /api/tutors/search
///
/// An unknown `student_id` is ignored; results then carry no distances.
pub async fn search_tutors(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<TutorHit>>, (StatusCode, String)> {
    let student_id = params.student_id;
    let (tutors, student) = state
        .db_call(move |db| {
            let student = match student_id {
                Some(id) => db.get_student(id)?,
                None => None,
            };
            Ok((db.list_tutors()?, student))
        })
        .await?;

    let hits = matching::search_tutors(&tutors, &params, student.as_ref());
    tracing::debug!("Tutor search matched {} of {}", hits.len(), tutors.len());
    Ok(Json(hits))
}

/// POST /api/tutors
pub async fn create_tutor(
    State(state): State<AppState>,
    Json(req): Json<TutorCreate>,
) -> Result<(StatusCode, Json<TutorSaved>), (StatusCode, String)> {
    let tutor = state.db_call(move |db| db.create_tutor(req)).await?;
    Ok((StatusCode::CREATED, Json(TutorSaved::from(&tutor))))
}

/// GET /api/tutors/{id} - Full profile with subjects and reviews
pub async fn get_tutor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TutorDetail>, (StatusCode, String)> {
    let (tutor, reviews) = state
        .db_call(move |db| db.get_tutor_with_reviews(id))
        .await?;

    let subjects = tutor.subject_names();
    Ok(Json(TutorDetail {
        id: tutor.id,
        name: tutor.name,
        email: tutor.email,
        phone: tutor.phone,
        city: tutor.city,
        address: tutor.address,
        latitude: tutor.latitude,
        longitude: tutor.longitude,
        hourly_rate: tutor.hourly_rate,
        teaching_mode: tutor.teaching_mode,
        bio: tutor.bio,
        overall_rating: tutor.overall_rating,
        number_of_reviews: tutor.number_of_reviews,
        subjects,
        reviews: reviews
            .into_iter()
            .map(|r| ReviewView {
                rating: r.rating,
                comment: r.comment,
                created_at: r.created_at,
            })
            .collect(),
    }))
}

/// PUT /api/tutors/{id}
pub async fn update_tutor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(updates): Json<TutorUpdate>,
) -> Result<Json<TutorSaved>, (StatusCode, String)> {
    let tutor = state.db_call(move |db| db.update_tutor(id, updates)).await?;
    Ok(Json(TutorSaved::from(&tutor)))
}

/// DELETE /api/tutors/{id} - Removes reviews, subject links and lesson requests too
pub async fn delete_tutor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>, (StatusCode, String)> {
    state.db_call(move |db| db.delete_tutor(id)).await?;
    tracing::info!("Deleted tutor {id}");
    Ok(Json(Deleted { deleted: true }))
}

/// GET /api/tutors/{id}/similar - Empty list for an unknown tutor
pub async fn similar_tutors(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TutorCard>>, (StatusCode, String)> {
    let tutors = state.db_call(|db| db.list_tutors()).await?;
    let Some(base) = tutors.iter().find(|t| t.id == id) else {
        return Ok(Json(Vec::new()));
    };

    let similar = matching::similar_tutors(base, &tutors, matching::DEFAULT_SIMILAR);
    Ok(Json(similar.iter().map(TutorCard::from).collect()))
}
