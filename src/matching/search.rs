use std::cmp::Ordering;

use crate::matching::geo::{distance_between, round2};
use crate::models::{SearchParams, SortBy, Student, Tutor, TutorHit};

/// Filter, then sort the tutor list for `GET /api/tutors/search`.
///
/// Text filters are case-insensitive substring matches: `subject` against
/// any of the tutor's subject names, `city` against the tutor's city.
/// Distances are only known when both the student and the tutor carry
/// coordinates.
pub fn search_tutors(
    tutors: &[Tutor],
    params: &SearchParams,
    student: Option<&Student>,
) -> Vec<TutorHit> {
    let subject = normalized(params.subject.as_deref());
    let city = normalized(params.city.as_deref());
    let origin = student.and_then(Student::coordinates);

    let mut hits: Vec<TutorHit> = tutors
        .iter()
        .filter(|t| match &subject {
            Some(needle) => t
                .subjects
                .iter()
                .any(|s| s.name.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .filter(|t| match &city {
            Some(needle) => contains_ci(t.city.as_deref(), needle),
            None => true,
        })
        .filter(|t| params.max_hourly_rate.map_or(true, |max| t.hourly_rate <= max))
        .filter(|t| params.min_rating.map_or(true, |min| t.overall_rating >= min))
        .filter(|t| params.teaching_mode.map_or(true, |mode| t.teaching_mode == mode))
        .map(|t| TutorHit {
            id: t.id,
            name: t.name.clone(),
            city: t.city.clone(),
            hourly_rate: t.hourly_rate,
            teaching_mode: t.teaching_mode,
            overall_rating: t.overall_rating,
            number_of_reviews: t.number_of_reviews,
            subjects: t.subject_names(),
            distance_km: distance_between(origin, t.coordinates()).map(round2),
        })
        .collect();

    match params.sort_by.unwrap_or_default() {
        SortBy::PriceAsc => hits.sort_by(|a, b| cmp_f64(a.hourly_rate, b.hourly_rate)),
        SortBy::DistanceAsc => hits.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => cmp_f64(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        SortBy::Rating => hits.sort_by(|a, b| {
            cmp_f64(b.overall_rating, a.overall_rating)
                .then_with(|| cmp_f64(a.hourly_rate, b.hourly_rate))
        }),
    }

    hits
}

pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Lowercased, trimmed filter value; blank filters count as absent.
fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

pub(crate) fn contains_ci(haystack: Option<&str>, lowered_needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(lowered_needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::{student, tutor};
    use crate::models::TeachingMode;

    fn catalog() -> Vec<Tutor> {
        vec![
            tutor(1, "Tamer", "Beirut", 25.0, 4.0, &["Math"]),
            tutor(2, "Lina", "Beirut", 35.0, 4.8, &["Physics", "Math"]),
            tutor(3, "Omar", "Antelias", 20.0, 3.2, &["Programming"]),
            tutor(4, "Nadine", "Jounieh", 30.0, 4.8, &["English"]),
            tutor(5, "Khaled", "Beirut", 15.0, 4.0, &["Programming", "Math"]),
        ]
    }

    fn ids(hits: &[TutorHit]) -> Vec<i64> {
        hits.iter().map(|h| h.id).collect()
    }

    #[test]
    fn test_default_sort_rating_desc_then_price_asc() {
        let hits = search_tutors(&catalog(), &SearchParams::default(), None);
        // 4.8: Nadine(30) before Lina(35); 4.0: Khaled(15) before Tamer(25); then Omar
        assert_eq!(ids(&hits), vec![4, 2, 5, 1, 3]);
    }

    #[test]
    fn test_subject_filter_is_case_insensitive_substring() {
        let params = SearchParams {
            subject: Some("MAT".to_string()),
            ..Default::default()
        };
        let hits = search_tutors(&catalog(), &params, None);
        assert_eq!(ids(&hits), vec![2, 5, 1]);
    }

    #[test]
    fn test_city_rate_and_rating_filters() {
        let params = SearchParams {
            city: Some("beir".to_string()),
            max_hourly_rate: Some(30.0),
            min_rating: Some(4.0),
            ..Default::default()
        };
        let hits = search_tutors(&catalog(), &params, None);
        assert_eq!(ids(&hits), vec![5, 1]);
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let params = SearchParams {
            subject: Some("  ".to_string()),
            city: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(search_tutors(&catalog(), &params, None).len(), 5);
    }

    #[test]
    fn test_teaching_mode_filter() {
        let mut tutors = catalog();
        tutors[2].teaching_mode = TeachingMode::Hybrid;
        let params = SearchParams {
            teaching_mode: Some(TeachingMode::Hybrid),
            ..Default::default()
        };
        assert_eq!(ids(&search_tutors(&tutors, &params, None)), vec![3]);
    }

    #[test]
    fn test_price_sort() {
        let params = SearchParams {
            sort_by: Some(SortBy::PriceAsc),
            ..Default::default()
        };
        let hits = search_tutors(&catalog(), &params, None);
        assert_eq!(ids(&hits), vec![5, 3, 1, 4, 2]);
    }

    #[test]
    fn test_distance_sort_puts_unknown_last() {
        let mut tutors = catalog();
        tutors[0].latitude = Some(33.8886);
        tutors[0].longitude = Some(35.4955);
        tutors[3].latitude = Some(34.318);
        tutors[3].longitude = Some(35.649);

        let mut me = student("Alice", Some("Math"), None, None);
        me.latitude = Some(34.30);
        me.longitude = Some(35.64);

        let params = SearchParams {
            sort_by: Some(SortBy::DistanceAsc),
            ..Default::default()
        };
        let hits = search_tutors(&tutors, &params, Some(&me));
        assert_eq!(hits[0].id, 4);
        assert_eq!(hits[1].id, 1);
        assert!(hits[0].distance_km.unwrap() < hits[1].distance_km.unwrap());
        assert!(hits[2..].iter().all(|h| h.distance_km.is_none()));
    }

    #[test]
    fn test_no_student_means_no_distance() {
        let mut tutors = catalog();
        tutors[0].latitude = Some(33.8886);
        tutors[0].longitude = Some(35.4955);
        let hits = search_tutors(&tutors, &SearchParams::default(), None);
        assert!(hits.iter().all(|h| h.distance_km.is_none()));
    }
}
