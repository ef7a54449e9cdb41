use chrono::Utc;
use rusqlite::{params, Connection};

use super::{non_empty, students, tutors, Db};
use crate::error::{StoreError, StoreResult};
use crate::models::{Review, ReviewCreate};

impl Db {
    /// Store a review. The tutor's `overall_rating` / `number_of_reviews`
    /// are left as they are.
    pub fn create_review(&self, tutor_id: i64, req: ReviewCreate) -> StoreResult<Review> {
        let conn = self.conn.lock();
        insert_review(&conn, tutor_id, req)
    }

    pub fn list_reviews_for_tutor(&self, tutor_id: i64) -> StoreResult<Vec<Review>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, student_id, tutor_id, rating, comment, created_at \
             FROM reviews WHERE tutor_id = ?1 ORDER BY id",
        )?;
        let reviews = stmt
            .query_map(params![tutor_id], |row| {
                Ok(Review {
                    id: row.get(0)?,
                    student_id: row.get(1)?,
                    tutor_id: row.get(2)?,
                    rating: row.get(3)?,
                    comment: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }
}

pub(super) fn insert_review(
    conn: &Connection,
    tutor_id: i64,
    req: ReviewCreate,
) -> StoreResult<Review> {
    if !(1..=5).contains(&req.rating) {
        return Err(StoreError::Invalid(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    if !tutors::exists(conn, tutor_id)? {
        return Err(StoreError::NotFound("Tutor"));
    }
    if !students::exists(conn, req.student_id)? {
        return Err(StoreError::NotFound("Student"));
    }

    let created_at = Utc::now();
    let comment = non_empty(req.comment);
    conn.execute(
        "INSERT INTO reviews (student_id, tutor_id, rating, comment, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![req.student_id, tutor_id, req.rating, comment, created_at],
    )?;

    Ok(Review {
        id: conn.last_insert_rowid(),
        student_id: req.student_id,
        tutor_id,
        rating: req.rating,
        comment,
        created_at,
    })
}
