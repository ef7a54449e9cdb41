//! Tutor search, recommendation and similarity ranking.
//!
//! Everything here is a pure filter → sort → truncate pass over tutors
//! already loaded from the store.

pub mod geo;
pub mod recommend;
pub mod search;

pub use geo::haversine_km;
pub use recommend::{
    recommend_for_student, similar_tutors, DEFAULT_RECOMMENDATIONS, DEFAULT_SIMILAR,
};
pub use search::search_tutors;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::models::{Student, Subject, TeachingMode, Tutor};

    /// Subject ids are derived from the name so equal names share an id.
    fn subject(name: &str) -> Subject {
        let id = name
            .bytes()
            .fold(0i64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as i64));
        Subject {
            id,
            name: name.to_string(),
        }
    }

    pub fn tutor(id: i64, name: &str, city: &str, rate: f64, rating: f64, subjects: &[&str]) -> Tutor {
        Tutor {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            city: Some(city.to_string()),
            address: None,
            latitude: None,
            longitude: None,
            hourly_rate: rate,
            teaching_mode: TeachingMode::Online,
            bio: None,
            overall_rating: rating,
            number_of_reviews: 5,
            created_at: Utc::now(),
            subjects: subjects.iter().map(|s| subject(s)).collect(),
        }
    }

    pub fn student(
        name: &str,
        prefs: Option<&str>,
        city: Option<&str>,
        budget: Option<f64>,
    ) -> Student {
        Student {
            id: 1,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            city: city.map(str::to_string),
            address: None,
            preferred_subjects: prefs.map(str::to_string),
            max_hourly_rate: budget,
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
        }
    }
}
