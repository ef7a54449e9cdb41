use std::collections::HashSet;

use crate::matching::geo::distance_between;
use crate::matching::search::{cmp_f64, contains_ci};
use crate::models::{Student, Tutor};

pub const DEFAULT_RECOMMENDATIONS: usize = 8;
pub const DEFAULT_SIMILAR: usize = 6;

/// Minimum rating for a tutor to be suggested as "similar".
const SIMILAR_MIN_RATING: f64 = 3.5;

/// Stand-in distance for tutors without coordinates, so they rank after
/// every tutor whose distance is known.
const UNKNOWN_DISTANCE_KM: f64 = 1e6;

/// Top tutors for a student.
///
/// Tutors must teach at least one preferred subject (if the student listed
/// any), be in a city containing the student's city (if set) and charge no
/// more than the student's budget (if set). Survivors are ordered by number
/// of matching subjects, then rating, then distance.
pub fn recommend_for_student(student: &Student, tutors: &[Tutor], limit: usize) -> Vec<Tutor> {
    let prefs: HashSet<String> = student
        .preferred_subject_list()
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect();
    let city = student
        .city
        .as_deref()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty());
    let origin = student.coordinates();

    let mut scored: Vec<(usize, f64, f64, &Tutor)> = tutors
        .iter()
        .filter(|t| match &city {
            Some(c) => contains_ci(t.city.as_deref(), c),
            None => true,
        })
        .filter(|t| {
            student
                .max_hourly_rate
                .map_or(true, |max| t.hourly_rate <= max)
        })
        .filter_map(|t| {
            let overlap = subject_overlap(t, &prefs);
            if !prefs.is_empty() && overlap == 0 {
                return None;
            }
            let distance =
                distance_between(origin, t.coordinates()).unwrap_or(UNKNOWN_DISTANCE_KM);
            Some((overlap, t.overall_rating, distance, t))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| cmp_f64(b.1, a.1))
            .then_with(|| cmp_f64(a.2, b.2))
    });

    scored
        .into_iter()
        .take(limit)
        .map(|(_, _, _, t)| t.clone())
        .collect()
}

/// Tutors sharing at least one subject with `base`, rated 3.5 or higher,
/// ordered by shared subjects, rating, then closeness in price.
pub fn similar_tutors(base: &Tutor, tutors: &[Tutor], limit: usize) -> Vec<Tutor> {
    let base_subjects: HashSet<i64> = base.subjects.iter().map(|s| s.id).collect();

    let mut scored: Vec<(usize, f64, f64, &Tutor)> = tutors
        .iter()
        .filter(|t| t.id != base.id && t.overall_rating >= SIMILAR_MIN_RATING)
        .filter_map(|t| {
            let overlap = t
                .subjects
                .iter()
                .filter(|s| base_subjects.contains(&s.id))
                .count();
            if overlap == 0 {
                return None;
            }
            let price_diff = (t.hourly_rate - base.hourly_rate).abs();
            Some((overlap, t.overall_rating, price_diff, t))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| cmp_f64(b.1, a.1))
            .then_with(|| cmp_f64(a.2, b.2))
    });

    scored
        .into_iter()
        .take(limit)
        .map(|(_, _, _, t)| t.clone())
        .collect()
}

/// Number of the tutor's subjects the student asked for (names compared
/// case-insensitively, `prefs` already lowercased).
pub fn subject_overlap(tutor: &Tutor, prefs: &HashSet<String>) -> usize {
    if prefs.is_empty() {
        return 0;
    }
    tutor
        .subjects
        .iter()
        .map(|s| s.name.to_lowercase())
        .collect::<HashSet<_>>()
        .intersection(prefs)
        .count()
}
