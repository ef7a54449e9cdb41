//! SQLite-backed relational store for tutors, students, subjects, reviews
//! and lesson requests.
//!
//! A single connection sits behind a mutex. Handlers reach the store through
//! [`crate::state::AppState::db_call`], which runs the closure on the
//! blocking pool.

mod lessons;
mod reviews;
mod seed;
mod students;
mod subjects;
mod tutors;

use std::path::Path;
use std::str::FromStr;

use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode};

use crate::error::{StoreError, StoreResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS subjects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    city TEXT,
    address TEXT,
    preferred_subjects TEXT,
    max_hourly_rate REAL,
    latitude REAL,
    longitude REAL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tutors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT,
    city TEXT,
    address TEXT,
    latitude REAL,
    longitude REAL,
    hourly_rate REAL NOT NULL DEFAULT 0.0,
    teaching_mode TEXT NOT NULL DEFAULT 'online',
    bio TEXT,
    overall_rating REAL NOT NULL DEFAULT 0.0,
    number_of_reviews INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tutor_subjects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tutor_id INTEGER NOT NULL REFERENCES tutors(id),
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    UNIQUE (tutor_id, subject_id)
);

CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES students(id),
    tutor_id INTEGER NOT NULL REFERENCES tutors(id),
    rating INTEGER NOT NULL,
    comment TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lesson_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES students(id),
    tutor_id INTEGER NOT NULL REFERENCES tutors(id),
    subject_id INTEGER NOT NULL REFERENCES subjects(id),
    status TEXT NOT NULL DEFAULT 'pending',
    requested_date TEXT,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_tutor_subjects_tutor ON tutor_subjects(tutor_id);
CREATE INDEX IF NOT EXISTS idx_reviews_tutor ON reviews(tutor_id);
CREATE INDEX IF NOT EXISTS idx_reviews_student ON reviews(student_id);
CREATE INDEX IF NOT EXISTS idx_lessons_student ON lesson_requests(student_id);
"#;

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!("Opened SQLite store at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of rows in `table`. Only used with the fixed table names below.
    fn count(&self, table: &'static str) -> StoreResult<i64> {
        let conn = self.conn.lock();
        let n = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn tutor_count(&self) -> StoreResult<i64> {
        self.count("tutors")
    }

    pub fn student_count(&self) -> StoreResult<i64> {
        self.count("students")
    }

    pub fn review_count(&self) -> StoreResult<i64> {
        self.count("reviews")
    }

    pub fn tutor_subject_link_count(&self) -> StoreResult<i64> {
        self.count("tutor_subjects")
    }

    pub fn lesson_request_count(&self) -> StoreResult<i64> {
        self.count("lesson_requests")
    }
}

/// Read a TEXT column holding an enum name.
fn parse_column<T>(value: String, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

/// Turn a UNIQUE violation into a 409 instead of a 500.
fn map_constraint(err: rusqlite::Error, what: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Conflict(format!("{what} already exists"))
        }
        _ => StoreError::Sqlite(err),
    }
}

fn require_name(name: &str) -> StoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Invalid("Name is required".to_string()));
    }
    Ok(name.to_string())
}

/// Minimal address check: one `@`, non-empty local part, dotted domain.
fn require_email(email: &str) -> StoreResult<String> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(StoreError::Invalid(format!("Invalid email address: {email}")));
    }
    Ok(email.to_string())
}

fn require_rate(rate: f64, field: &str) -> StoreResult<f64> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(StoreError::Invalid(format!("{field} must be a non-negative number")));
    }
    Ok(rate)
}

/// Empty strings from form inputs are stored as NULL.
fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let t = v.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}
