use rusqlite::Connection;

use super::{reviews, students, subjects, tutors, Db};
use crate::error::StoreResult;
use crate::models::{ReviewCreate, StudentCreate, TeachingMode, TutorCreate};

const SUBJECTS: [&str; 7] = [
    "Math",
    "Physics",
    "Chemistry",
    "Programming",
    "English",
    "Biology",
    "Economics",
];

struct DemoTutor {
    name: &'static str,
    city: &'static str,
    address: &'static str,
    lat: f64,
    lng: f64,
    rate: f64,
    mode: TeachingMode,
    bio: &'static str,
    subjects: &'static [&'static str],
}

const TUTORS: [DemoTutor; 12] = [
    DemoTutor {
        name: "Tamer",
        city: "Beirut",
        address: "Corniche",
        lat: 33.8886,
        lng: 35.4955,
        rate: 25.0,
        mode: TeachingMode::Online,
        bio: "Experienced Math tutor",
        subjects: &["Math"],
    },
    DemoTutor {
        name: "Lina",
        city: "Beirut",
        address: "Hamra",
        lat: 33.897,
        lng: 35.487,
        rate: 35.0,
        mode: TeachingMode::InPerson,
        bio: "Physics MSc",
        subjects: &["Physics", "Math"],
    },
    DemoTutor {
        name: "Omar",
        city: "Antelias",
        address: "Antelias Center",
        lat: 33.888,
        lng: 35.530,
        rate: 20.0,
        mode: TeachingMode::Hybrid,
        bio: "Programming tutor",
        subjects: &["Programming"],
    },
    DemoTutor {
        name: "Sara",
        city: "Beirut",
        address: "Ashrafieh",
        lat: 33.8938,
        lng: 35.5035,
        rate: 28.0,
        mode: TeachingMode::InPerson,
        bio: "Chemistry specialist",
        subjects: &["Chemistry"],
    },
    DemoTutor {
        name: "Nadine",
        city: "Jounieh",
        address: "Jounieh Mall",
        lat: 34.318,
        lng: 35.649,
        rate: 30.0,
        mode: TeachingMode::Online,
        bio: "English literature",
        subjects: &["English"],
    },
    DemoTutor {
        name: "Hassan",
        city: "Beirut",
        address: "Dora",
        lat: 33.920,
        lng: 35.500,
        rate: 22.0,
        mode: TeachingMode::Online,
        bio: "Biology tutor",
        subjects: &["Biology"],
    },
    DemoTutor {
        name: "Rami",
        city: "Beirut",
        address: "Verdun",
        lat: 33.892,
        lng: 35.493,
        rate: 45.0,
        mode: TeachingMode::InPerson,
        bio: "Economics and Math",
        subjects: &["Economics", "Math"],
    },
    DemoTutor {
        name: "Maya",
        city: "Tripoli",
        address: "Tripoli Center",
        lat: 34.433,
        lng: 35.849,
        rate: 18.0,
        mode: TeachingMode::Online,
        bio: "Entry-level Programming",
        subjects: &["Programming"],
    },
    DemoTutor {
        name: "Youssef",
        city: "Beirut",
        address: "Hamra",
        lat: 33.897,
        lng: 35.487,
        rate: 50.0,
        mode: TeachingMode::InPerson,
        bio: "Senior Math tutor",
        subjects: &["Math"],
    },
    DemoTutor {
        name: "Rita",
        city: "Jounieh",
        address: "Old Souk",
        lat: 34.318,
        lng: 35.649,
        rate: 26.0,
        mode: TeachingMode::Hybrid,
        bio: "Physics tutor",
        subjects: &["Physics"],
    },
    DemoTutor {
        name: "Khaled",
        city: "Beirut",
        address: "Zalka",
        lat: 33.900,
        lng: 35.540,
        rate: 15.0,
        mode: TeachingMode::Online,
        bio: "Programming and Math",
        subjects: &["Programming", "Math"],
    },
    DemoTutor {
        name: "Mira",
        city: "Beirut",
        address: "Badaro",
        lat: 33.885,
        lng: 35.502,
        rate: 32.0,
        mode: TeachingMode::InPerson,
        bio: "Chemistry and Biology",
        subjects: &["Chemistry", "Biology"],
    },
];

impl Db {
    /// Load the demo dataset. Does nothing (returns `false`) when any tutor
    /// or student already exists. All rows go in one transaction, so a
    /// failed seed leaves the store empty.
    pub fn seed_demo_data(&self) -> StoreResult<bool> {
        self.seed_with(&TUTORS)
    }

    fn seed_with(&self, demo_tutors: &[DemoTutor]) -> StoreResult<bool> {
        let mut conn = self.conn.lock();
        if has_people(&conn)? {
            tracing::info!("Store already has data, skipping demo seed");
            return Ok(false);
        }

        let tx = conn.transaction()?;
        for name in SUBJECTS {
            subjects::create_or_get(&tx, name)?;
        }

        let student_ids = [
            students::insert_student(
                &tx,
                StudentCreate {
                    name: "Alice".to_string(),
                    email: "alice@example.com".to_string(),
                    city: Some("Beirut".to_string()),
                    address: Some("Hamra".to_string()),
                    preferred_subjects: Some("Math,Physics".to_string()),
                    max_hourly_rate: Some(30.0),
                    ..Default::default()
                },
            )?,
            students::insert_student(
                &tx,
                StudentCreate {
                    name: "Bob".to_string(),
                    email: "bob@example.com".to_string(),
                    city: Some("Beirut".to_string()),
                    address: Some("Antelias".to_string()),
                    preferred_subjects: Some("Programming,Math".to_string()),
                    max_hourly_rate: Some(40.0),
                    ..Default::default()
                },
            )?,
        ];

        let mut review_count = 0;
        for (i, demo) in demo_tutors.iter().enumerate() {
            let tutor_id = tutors::insert_tutor(
                &tx,
                TutorCreate {
                    name: demo.name.to_string(),
                    email: format!("{}@example.com", demo.name.to_lowercase()),
                    phone: None,
                    city: Some(demo.city.to_string()),
                    address: Some(demo.address.to_string()),
                    latitude: Some(demo.lat),
                    longitude: Some(demo.lng),
                    hourly_rate: demo.rate,
                    teaching_mode: Some(demo.mode),
                    bio: Some(demo.bio.to_string()),
                    subjects: Some(demo.subjects.iter().map(|s| s.to_string()).collect()),
                },
            )?;
            tutors::set_rating(&tx, tutor_id, 4.0, 5)?;

            // Two reviews per tutor, ratings cycling through 3..=5
            for j in 0..2 {
                reviews::insert_review(
                    &tx,
                    tutor_id,
                    ReviewCreate {
                        student_id: student_ids[(i + j) % student_ids.len()],
                        rating: ((i + j) % 3 + 3) as i64,
                        comment: Some("Good session".to_string()),
                    },
                )?;
                review_count += 1;
            }
        }
        tx.commit()?;

        tracing::info!(
            "Seeded {} subjects, {} students, {} tutors, {review_count} reviews",
            SUBJECTS.len(),
            student_ids.len(),
            demo_tutors.len()
        );
        Ok(true)
    }
}

fn has_people(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tutors) OR EXISTS(SELECT 1 FROM students)",
        [],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_once() {
        let db = Db::open_in_memory().unwrap();
        assert!(db.seed_demo_data().unwrap());
        assert_eq!(db.list_subjects().unwrap().len(), 7);
        assert_eq!(db.student_count().unwrap(), 2);
        assert_eq!(db.tutor_count().unwrap(), 12);
        assert_eq!(db.review_count().unwrap(), 24);

        assert!(!db.seed_demo_data().unwrap());
        assert_eq!(db.tutor_count().unwrap(), 12);
    }

    #[test]
    fn test_seeded_tutors_carry_aggregates() {
        let db = Db::open_in_memory().unwrap();
        db.seed_demo_data().unwrap();
        let tutors = db.list_tutors().unwrap();
        assert!(tutors
            .iter()
            .all(|t| t.overall_rating == 4.0 && t.number_of_reviews == 5));
        let lina = tutors.iter().find(|t| t.name == "Lina").unwrap();
        assert_eq!(lina.subject_names(), vec!["Physics", "Math"]);
        assert_eq!(lina.teaching_mode, TeachingMode::InPerson);
    }

    #[test]
    fn test_failed_seed_leaves_store_empty() {
        let db = Db::open_in_memory().unwrap();
        let broken = [
            DemoTutor {
                name: "Tamer",
                city: "Beirut",
                address: "Corniche",
                lat: 33.8886,
                lng: 35.4955,
                rate: 25.0,
                mode: TeachingMode::Online,
                bio: "Math tutor",
                subjects: &["Math"],
            },
            DemoTutor {
                name: "Ghost",
                city: "Beirut",
                address: "Hamra",
                lat: 33.897,
                lng: 35.487,
                rate: -1.0,
                mode: TeachingMode::Online,
                bio: "Negative rate is rejected",
                subjects: &["Physics"],
            },
        ];

        assert!(db.seed_with(&broken).is_err());
        assert_eq!(db.tutor_count().unwrap(), 0);
        assert_eq!(db.student_count().unwrap(), 0);
        assert_eq!(db.review_count().unwrap(), 0);
        assert!(db.list_subjects().unwrap().is_empty());

        // a later seed is not blocked by leftovers
        assert!(db.seed_demo_data().unwrap());
        assert_eq!(db.tutor_count().unwrap(), 12);
    }
}
