use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{non_empty, parse_column, require_email, require_name, require_rate, subjects, Db};
use crate::error::{StoreError, StoreResult};
use crate::models::{Review, Subject, Tutor, TutorCreate, TutorUpdate};

const TUTOR_COLUMNS: &str = "id, name, email, phone, city, address, latitude, longitude, \
     hourly_rate, teaching_mode, bio, overall_rating, number_of_reviews, created_at";

fn tutor_from_row(row: &Row<'_>) -> rusqlite::Result<Tutor> {
    Ok(Tutor {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        city: row.get(4)?,
        address: row.get(5)?,
        latitude: row.get(6)?,
        longitude: row.get(7)?,
        hourly_rate: row.get(8)?,
        teaching_mode: parse_column(row.get(9)?, 9)?,
        bio: row.get(10)?,
        overall_rating: row.get(11)?,
        number_of_reviews: row.get(12)?,
        created_at: row.get(13)?,
        subjects: Vec::new(),
    })
}

impl Db {
    pub fn create_tutor(&self, req: TutorCreate) -> StoreResult<Tutor> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let id = insert_tutor(&tx, req)?;
        tx.commit()?;

        let tutor = load_tutor(&conn, id)?.ok_or(StoreError::NotFound("Tutor"))?;
        tracing::info!("Created tutor {id} ({})", tutor.name);
        Ok(tutor)
    }

    pub fn get_tutor(&self, tutor_id: i64) -> StoreResult<Option<Tutor>> {
        let conn = self.conn.lock();
        load_tutor(&conn, tutor_id)
    }

    /// Tutor plus all of its reviews, oldest first.
    pub fn get_tutor_with_reviews(&self, tutor_id: i64) -> StoreResult<(Tutor, Vec<Review>)> {
        let tutor = self
            .get_tutor(tutor_id)?
            .ok_or(StoreError::NotFound("Tutor"))?;
        let reviews = self.list_reviews_for_tutor(tutor_id)?;
        Ok((tutor, reviews))
    }

    /// Every tutor with its subjects attached, in insertion order.
    pub fn list_tutors(&self) -> StoreResult<Vec<Tutor>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {TUTOR_COLUMNS} FROM tutors ORDER BY id"))?;
        let mut tutors = stmt
            .query_map([], tutor_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_tutor = subjects_by_tutor(&conn)?;
        for tutor in &mut tutors {
            tutor.subjects = by_tutor.remove(&tutor.id).unwrap_or_default();
        }
        Ok(tutors)
    }

    /// Distinct non-empty tutor cities, alphabetical.
    pub fn list_cities(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT city FROM tutors \
             WHERE city IS NOT NULL AND TRIM(city) <> '' ORDER BY city",
        )?;
        let cities = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(cities)
    }

    /// Overwrite the fields present in `updates`. A present `subjects` list
    /// replaces the tutor's whole subject set.
    pub fn update_tutor(&self, tutor_id: i64, updates: TutorUpdate) -> StoreResult<Tutor> {
        let mut conn = self.conn.lock();
        let mut tutor = load_tutor(&conn, tutor_id)?.ok_or(StoreError::NotFound("Tutor"))?;

        if let Some(name) = updates.name {
            tutor.name = require_name(&name)?;
        }
        if let Some(email) = updates.email {
            tutor.email = require_email(&email)?;
        }
        if let Some(phone) = updates.phone {
            tutor.phone = non_empty(phone);
        }
        if let Some(city) = updates.city {
            tutor.city = non_empty(city);
        }
        if let Some(address) = updates.address {
            tutor.address = non_empty(address);
        }
        if let Some(latitude) = updates.latitude {
            tutor.latitude = latitude;
        }
        if let Some(longitude) = updates.longitude {
            tutor.longitude = longitude;
        }
        if let Some(rate) = updates.hourly_rate {
            tutor.hourly_rate = require_rate(rate, "hourly_rate")?;
        }
        if let Some(mode) = updates.teaching_mode {
            tutor.teaching_mode = mode;
        }
        if let Some(bio) = updates.bio {
            tutor.bio = non_empty(bio);
        }

        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE tutors SET name = ?1, email = ?2, phone = ?3, city = ?4, address = ?5, \
             latitude = ?6, longitude = ?7, hourly_rate = ?8, teaching_mode = ?9, bio = ?10 \
             WHERE id = ?11",
            params![
                tutor.name,
                tutor.email,
                tutor.phone,
                tutor.city,
                tutor.address,
                tutor.latitude,
                tutor.longitude,
                tutor.hourly_rate,
                tutor.teaching_mode.as_str(),
                tutor.bio,
                tutor_id,
            ],
        )?;
        if let Some(subject_names) = updates.subjects {
            tx.execute(
                "DELETE FROM tutor_subjects WHERE tutor_id = ?1",
                params![tutor_id],
            )?;
            attach_subjects(&tx, tutor_id, subject_names.as_deref().unwrap_or_default())?;
        }
        tx.commit()?;

        tracing::info!("Updated tutor {tutor_id}");
        load_tutor(&conn, tutor_id)?.ok_or(StoreError::NotFound("Tutor"))
    }

    /// Remove a tutor together with its reviews, subject links and lesson
    /// requests.
    pub fn delete_tutor(&self, tutor_id: i64) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        if !exists(&conn, tutor_id)? {
            return Err(StoreError::NotFound("Tutor"));
        }

        let tx = conn.transaction()?;
        let reviews = tx.execute("DELETE FROM reviews WHERE tutor_id = ?1", params![tutor_id])?;
        let links = tx.execute(
            "DELETE FROM tutor_subjects WHERE tutor_id = ?1",
            params![tutor_id],
        )?;
        let lessons = tx.execute(
            "DELETE FROM lesson_requests WHERE tutor_id = ?1",
            params![tutor_id],
        )?;
        tx.execute("DELETE FROM tutors WHERE id = ?1", params![tutor_id])?;
        tx.commit()?;

        tracing::info!(
            "Deleted tutor {tutor_id} ({reviews} reviews, {links} subject links, {lessons} lesson requests)"
        );
        Ok(())
    }

    /// Overwrite the stored rating aggregates. Reviews never touch these.
    pub fn set_tutor_rating(
        &self,
        tutor_id: i64,
        overall_rating: f64,
        number_of_reviews: i64,
    ) -> StoreResult<()> {
        let conn = self.conn.lock();
        set_rating(&conn, tutor_id, overall_rating, number_of_reviews)
    }
}

/// Insert the tutor row and its subject links. Callers own the transaction.
pub(super) fn insert_tutor(conn: &Connection, req: TutorCreate) -> StoreResult<i64> {
    let name = require_name(&req.name)?;
    let email = require_email(&req.email)?;
    let hourly_rate = require_rate(req.hourly_rate, "hourly_rate")?;
    let teaching_mode = req.teaching_mode.unwrap_or_default();

    conn.execute(
        "INSERT INTO tutors (name, email, phone, city, address, latitude, longitude, \
         hourly_rate, teaching_mode, bio, overall_rating, number_of_reviews, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0.0, 0, ?11)",
        params![
            name,
            email,
            non_empty(req.phone),
            non_empty(req.city),
            non_empty(req.address),
            req.latitude,
            req.longitude,
            hourly_rate,
            teaching_mode.as_str(),
            non_empty(req.bio),
            Utc::now(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    attach_subjects(conn, id, req.subjects.as_deref().unwrap_or_default())?;
    Ok(id)
}

pub(super) fn set_rating(
    conn: &Connection,
    tutor_id: i64,
    overall_rating: f64,
    number_of_reviews: i64,
) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE tutors SET overall_rating = ?1, number_of_reviews = ?2 WHERE id = ?3",
        params![overall_rating, number_of_reviews, tutor_id],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("Tutor"));
    }
    Ok(())
}

pub(super) fn exists(conn: &Connection, tutor_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tutors WHERE id = ?1)",
        params![tutor_id],
        |row| row.get(0),
    )
}

fn load_tutor(conn: &Connection, tutor_id: i64) -> StoreResult<Option<Tutor>> {
    let tutor = conn
        .query_row(
            &format!("SELECT {TUTOR_COLUMNS} FROM tutors WHERE id = ?1"),
            params![tutor_id],
            tutor_from_row,
        )
        .optional()?;

    let Some(mut tutor) = tutor else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT s.id, s.name FROM tutor_subjects ts \
         JOIN subjects s ON s.id = ts.subject_id \
         WHERE ts.tutor_id = ?1 ORDER BY ts.id",
    )?;
    tutor.subjects = stmt
        .query_map(params![tutor_id], |row| {
            Ok(Subject {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(tutor))
}

fn subjects_by_tutor(conn: &Connection) -> rusqlite::Result<HashMap<i64, Vec<Subject>>> {
    let mut stmt = conn.prepare(
        "SELECT ts.tutor_id, s.id, s.name FROM tutor_subjects ts \
         JOIN subjects s ON s.id = ts.subject_id ORDER BY ts.id",
    )?;
    let mut map: HashMap<i64, Vec<Subject>> = HashMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            Subject {
                id: row.get(1)?,
                name: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (tutor_id, subject) = row?;
        map.entry(tutor_id).or_default().push(subject);
    }
    Ok(map)
}

/// Link `names` to the tutor, creating subjects on first use. Blank names
/// and duplicates are ignored.
fn attach_subjects(conn: &Connection, tutor_id: i64, names: &[String]) -> StoreResult<()> {
    for name in names {
        if let Some(subject) = subjects::create_or_get(conn, name)? {
            conn.execute(
                "INSERT OR IGNORE INTO tutor_subjects (tutor_id, subject_id) VALUES (?1, ?2)",
                params![tutor_id, subject.id],
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeachingMode;

    fn tutor_req(name: &str, subjects: &[&str]) -> TutorCreate {
        TutorCreate {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            city: Some("Beirut".to_string()),
            hourly_rate: 25.0,
            subjects: Some(subjects.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_tutor_defaults() {
        let db = Db::open_in_memory().unwrap();
        let tutor = db.create_tutor(tutor_req("Tamer", &["Math"])).unwrap();
        assert_eq!(tutor.teaching_mode, TeachingMode::Online);
        assert_eq!(tutor.overall_rating, 0.0);
        assert_eq!(tutor.number_of_reviews, 0);
        assert_eq!(tutor.subject_names(), vec!["Math"]);
    }

    #[test]
    fn test_create_tutor_dedupes_subjects() {
        let db = Db::open_in_memory().unwrap();
        let tutor = db
            .create_tutor(tutor_req("Lina", &["Physics", "physics", " ", "Math"]))
            .unwrap();
        assert_eq!(tutor.subject_names(), vec!["Physics", "Math"]);
        assert_eq!(db.list_subjects().unwrap().len(), 2);
    }

    #[test]
    fn test_create_tutor_rejects_bad_input() {
        let db = Db::open_in_memory().unwrap();
        let mut req = tutor_req("Omar", &[]);
        req.email = "not-an-email".to_string();
        assert!(matches!(db.create_tutor(req), Err(StoreError::Invalid(_))));

        let mut req = tutor_req("Omar", &[]);
        req.hourly_rate = -5.0;
        assert!(matches!(db.create_tutor(req), Err(StoreError::Invalid(_))));

        let mut req = tutor_req("Omar", &[]);
        req.name = "   ".to_string();
        assert!(matches!(db.create_tutor(req), Err(StoreError::Invalid(_))));
    }

    #[test]
    fn test_update_only_touches_present_fields() {
        let db = Db::open_in_memory().unwrap();
        let tutor = db.create_tutor(tutor_req("Sara", &["Chemistry"])).unwrap();

        let updated = db
            .update_tutor(
                tutor.id,
                TutorUpdate {
                    hourly_rate: Some(40.0),
                    city: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.hourly_rate, 40.0);
        assert_eq!(updated.city, None);
        assert_eq!(updated.name, "Sara");
        assert_eq!(updated.subject_names(), vec!["Chemistry"]);
    }

    #[test]
    fn test_update_replaces_subject_set() {
        let db = Db::open_in_memory().unwrap();
        let tutor = db.create_tutor(tutor_req("Rami", &["Economics", "Math"])).unwrap();
        let updated = db
            .update_tutor(
                tutor.id,
                TutorUpdate {
                    subjects: Some(Some(vec!["Biology".to_string()])),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.subject_names(), vec!["Biology"]);

        let cleared = db
            .update_tutor(
                tutor.id,
                TutorUpdate {
                    subjects: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(cleared.subjects.is_empty());
    }

    #[test]
    fn test_update_missing_tutor() {
        let db = Db::open_in_memory().unwrap();
        let err = db.update_tutor(99, TutorUpdate::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Tutor")));
    }

    #[test]
    fn test_list_tutors_attaches_subjects() {
        let db = Db::open_in_memory().unwrap();
        db.create_tutor(tutor_req("A", &["Math"])).unwrap();
        db.create_tutor(tutor_req("B", &["Physics", "Math"])).unwrap();
        db.create_tutor(tutor_req("C", &[])).unwrap();

        let tutors = db.list_tutors().unwrap();
        assert_eq!(tutors.len(), 3);
        assert_eq!(tutors[1].subject_names(), vec!["Physics", "Math"]);
        assert!(tutors[2].subjects.is_empty());
    }

    #[test]
    fn test_list_cities_distinct_and_non_empty() {
        let db = Db::open_in_memory().unwrap();
        db.create_tutor(tutor_req("A", &[])).unwrap();
        db.create_tutor(tutor_req("B", &[])).unwrap();
        let mut req = tutor_req("C", &[]);
        req.city = Some("Jounieh".to_string());
        db.create_tutor(req).unwrap();
        let mut req = tutor_req("D", &[]);
        req.city = Some("".to_string());
        db.create_tutor(req).unwrap();

        assert_eq!(db.list_cities().unwrap(), vec!["Beirut", "Jounieh"]);
    }

    #[test]
    fn test_delete_tutor_missing() {
        let db = Db::open_in_memory().unwrap();
        assert!(matches!(
            db.delete_tutor(7),
            Err(StoreError::NotFound("Tutor"))
        ));
    }
}
