use rusqlite::{params, Connection, OptionalExtension};

use super::Db;
use crate::error::StoreResult;
use crate::models::Subject;

impl Db {
    pub fn list_subjects(&self) -> StoreResult<Vec<Subject>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, name FROM subjects ORDER BY id")?;
        let subjects = stmt
            .query_map([], |row| {
                Ok(Subject {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }

    /// Find a subject by name (case-insensitive) or insert it.
    /// Blank names yield `None`.
    pub fn create_or_get_subject(&self, name: &str) -> StoreResult<Option<Subject>> {
        let conn = self.conn.lock();
        create_or_get(&conn, name)
    }
}

pub(super) fn find_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Subject>> {
    conn.query_row(
        "SELECT id, name FROM subjects WHERE name = ?1 COLLATE NOCASE",
        params![name],
        |row| {
            Ok(Subject {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
}

pub(super) fn create_or_get(conn: &Connection, name: &str) -> StoreResult<Option<Subject>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    if let Some(existing) = find_by_name(conn, name)? {
        return Ok(Some(existing));
    }
    conn.execute("INSERT INTO subjects (name) VALUES (?1)", params![name])?;
    tracing::debug!("Created subject {name}");
    Ok(Some(Subject {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    }))
}

pub(super) fn exists(conn: &Connection, subject_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM subjects WHERE id = ?1)",
        params![subject_id],
        |row| row.get(0),
    )
}
