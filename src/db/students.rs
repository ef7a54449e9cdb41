use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{map_constraint, non_empty, require_email, require_name, require_rate, Db};
use crate::error::{StoreError, StoreResult};
use crate::models::{Student, StudentCreate, StudentUpdate};

const STUDENT_COLUMNS: &str = "id, name, email, city, address, preferred_subjects, \
     max_hourly_rate, latitude, longitude, created_at";

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        city: row.get(3)?,
        address: row.get(4)?,
        preferred_subjects: row.get(5)?,
        max_hourly_rate: row.get(6)?,
        latitude: row.get(7)?,
        longitude: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn optional_budget(rate: Option<f64>) -> StoreResult<Option<f64>> {
    rate.map(|r| require_rate(r, "max_hourly_rate")).transpose()
}

impl Db {
    pub fn create_student(&self, req: StudentCreate) -> StoreResult<Student> {
        let conn = self.conn.lock();
        let id = insert_student(&conn, req)?;
        let student = load_student(&conn, id)?.ok_or(StoreError::NotFound("Student"))?;
        tracing::info!("Created student {id} ({})", student.name);
        Ok(student)
    }

    pub fn get_student(&self, student_id: i64) -> StoreResult<Option<Student>> {
        let conn = self.conn.lock();
        load_student(&conn, student_id)
    }

    pub fn list_students(&self) -> StoreResult<Vec<Student>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY id"))?;
        let students = stmt
            .query_map([], student_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    pub fn update_student(&self, student_id: i64, updates: StudentUpdate) -> StoreResult<Student> {
        let conn = self.conn.lock();
        let mut student =
            load_student(&conn, student_id)?.ok_or(StoreError::NotFound("Student"))?;

        if let Some(name) = updates.name {
            student.name = require_name(&name)?;
        }
        if let Some(email) = updates.email {
            student.email = require_email(&email)?;
        }
        if let Some(city) = updates.city {
            student.city = non_empty(city);
        }
        if let Some(address) = updates.address {
            student.address = non_empty(address);
        }
        if let Some(prefs) = updates.preferred_subjects {
            student.preferred_subjects = non_empty(prefs);
        }
        if let Some(budget) = updates.max_hourly_rate {
            student.max_hourly_rate = optional_budget(budget)?;
        }
        if let Some(latitude) = updates.latitude {
            student.latitude = latitude;
        }
        if let Some(longitude) = updates.longitude {
            student.longitude = longitude;
        }

        conn.execute(
            "UPDATE students SET name = ?1, email = ?2, city = ?3, address = ?4, \
             preferred_subjects = ?5, max_hourly_rate = ?6, latitude = ?7, longitude = ?8 \
             WHERE id = ?9",
            params![
                student.name,
                student.email,
                student.city,
                student.address,
                student.preferred_subjects,
                student.max_hourly_rate,
                student.latitude,
                student.longitude,
                student_id,
            ],
        )
        .map_err(|e| map_constraint(e, "A student with this email"))?;

        tracing::info!("Updated student {student_id}");
        Ok(student)
    }

    /// Remove a student together with their reviews and lesson requests.
    pub fn delete_student(&self, student_id: i64) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        if !exists(&conn, student_id)? {
            return Err(StoreError::NotFound("Student"));
        }

        let tx = conn.transaction()?;
        let reviews = tx.execute(
            "DELETE FROM reviews WHERE student_id = ?1",
            params![student_id],
        )?;
        let lessons = tx.execute(
            "DELETE FROM lesson_requests WHERE student_id = ?1",
            params![student_id],
        )?;
        tx.execute("DELETE FROM students WHERE id = ?1", params![student_id])?;
        tx.commit()?;

        tracing::info!("Deleted student {student_id} ({reviews} reviews, {lessons} lesson requests)");
        Ok(())
    }
}

/// Insert a student row; a taken email is a conflict.
pub(super) fn insert_student(conn: &Connection, req: StudentCreate) -> StoreResult<i64> {
    let name = require_name(&req.name)?;
    let email = require_email(&req.email)?;
    let max_hourly_rate = optional_budget(req.max_hourly_rate)?;

    conn.execute(
        "INSERT INTO students (name, email, city, address, preferred_subjects, \
         max_hourly_rate, latitude, longitude, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            name,
            email,
            non_empty(req.city),
            non_empty(req.address),
            non_empty(req.preferred_subjects),
            max_hourly_rate,
            req.latitude,
            req.longitude,
            Utc::now(),
        ],
    )
    .map_err(|e| map_constraint(e, "A student with this email"))?;
    Ok(conn.last_insert_rowid())
}

pub(super) fn exists(conn: &Connection, student_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM students WHERE id = ?1)",
        params![student_id],
        |row| row.get(0),
    )
}

fn load_student(conn: &Connection, student_id: i64) -> StoreResult<Option<Student>> {
    let student = conn
        .query_row(
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
            params![student_id],
            student_from_row,
        )
        .optional()?;
    Ok(student)
}
