use rusqlite::{params, OptionalExtension, Row};

use super::{non_empty, parse_column, students, subjects, tutors, Db};
use crate::error::{StoreError, StoreResult};
use crate::models::{LessonRequest, LessonRequestCreate, LessonStatus};

const LESSON_COLUMNS: &str =
    "id, student_id, tutor_id, subject_id, status, requested_date, notes";

fn lesson_from_row(row: &Row<'_>) -> rusqlite::Result<LessonRequest> {
    Ok(LessonRequest {
        id: row.get(0)?,
        student_id: row.get(1)?,
        tutor_id: row.get(2)?,
        subject_id: row.get(3)?,
        status: parse_column(row.get(4)?, 4)?,
        requested_date: row.get(5)?,
        notes: row.get(6)?,
    })
}

impl Db {
    pub fn create_lesson_request(&self, req: LessonRequestCreate) -> StoreResult<LessonRequest> {
        let conn = self.conn.lock();
        if !students::exists(&conn, req.student_id)? {
            return Err(StoreError::NotFound("Student"));
        }
        if !tutors::exists(&conn, req.tutor_id)? {
            return Err(StoreError::NotFound("Tutor"));
        }
        if !subjects::exists(&conn, req.subject_id)? {
            return Err(StoreError::NotFound("Subject"));
        }

        let status = LessonStatus::default();
        let notes = non_empty(req.notes);
        conn.execute(
            "INSERT INTO lesson_requests (student_id, tutor_id, subject_id, status, requested_date, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                req.student_id,
                req.tutor_id,
                req.subject_id,
                status.as_str(),
                req.requested_date,
                notes,
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(
            "Student {} requested a lesson with tutor {} (request {id})",
            req.student_id,
            req.tutor_id
        );

        Ok(LessonRequest {
            id,
            student_id: req.student_id,
            tutor_id: req.tutor_id,
            subject_id: req.subject_id,
            status,
            requested_date: req.requested_date,
            notes,
        })
    }

    pub fn list_lesson_requests_for_student(
        &self,
        student_id: i64,
    ) -> StoreResult<Vec<LessonRequest>> {
        let conn = self.conn.lock();
        if !students::exists(&conn, student_id)? {
            return Err(StoreError::NotFound("Student"));
        }
        let mut stmt = conn.prepare(&format!(
            "SELECT {LESSON_COLUMNS} FROM lesson_requests WHERE student_id = ?1 ORDER BY id"
        ))?;
        let lessons = stmt
            .query_map(params![student_id], lesson_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lessons)
    }

    pub fn update_lesson_request_status(
        &self,
        request_id: i64,
        status: LessonStatus,
    ) -> StoreResult<LessonRequest> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE lesson_requests SET status = ?1 WHERE id = ?2",
            params![status.as_str(), request_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("Lesson request"));
        }
        let lesson = conn
            .query_row(
                &format!("SELECT {LESSON_COLUMNS} FROM lesson_requests WHERE id = ?1"),
                params![request_id],
                lesson_from_row,
            )
            .optional()?;
        lesson.ok_or(StoreError::NotFound("Lesson request"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StudentCreate, TutorCreate};

    fn setup() -> (Db, i64, i64, i64) {
        let db = Db::open_in_memory().unwrap();
        let tutor = db
            .create_tutor(TutorCreate {
                name: "Omar".to_string(),
                email: "omar@example.com".to_string(),
                subjects: Some(vec!["Programming".to_string()]),
                ..Default::default()
            })
            .unwrap();
        let student = db
            .create_student(StudentCreate {
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
                ..Default::default()
            })
            .unwrap();
        let subject_id = tutor.subjects[0].id;
        (db, student.id, tutor.id, subject_id)
    }

    #[test]
    fn test_new_request_is_pending() {
        let (db, student_id, tutor_id, subject_id) = setup();
        let lesson = db
            .create_lesson_request(LessonRequestCreate {
                student_id,
                tutor_id,
                subject_id,
                requested_date: None,
                notes: Some("Evenings please".to_string()),
            })
            .unwrap();
        assert_eq!(lesson.status, LessonStatus::Pending);

        let listed = db.list_lesson_requests_for_student(student_id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].notes.as_deref(), Some("Evenings please"));
    }

    #[test]
    fn test_status_update() {
        let (db, student_id, tutor_id, subject_id) = setup();
        let lesson = db
            .create_lesson_request(LessonRequestCreate {
                student_id,
                tutor_id,
                subject_id,
                requested_date: None,
                notes: None,
            })
            .unwrap();
        let updated = db
            .update_lesson_request_status(lesson.id, LessonStatus::Accepted)
            .unwrap();
        assert_eq!(updated.status, LessonStatus::Accepted);

        assert!(matches!(
            db.update_lesson_request_status(lesson.id + 1, LessonStatus::Declined),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_subject_rejected() {
        let (db, student_id, tutor_id, subject_id) = setup();
        let err = db
            .create_lesson_request(LessonRequestCreate {
                student_id,
                tutor_id,
                subject_id: subject_id + 10,
                requested_date: None,
                notes: None,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Subject")));
    }
}
