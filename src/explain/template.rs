use std::collections::HashSet;

use crate::models::{Student, Tutor};

/// Rating at or above which a tutor is called out as highly rated.
const HIGHLY_RATED: f64 = 4.2;
const MAX_REASONS: usize = 3;

const EXPLANATION_TEMPLATE: &str = "{STUDENT_NAME}, based on your interests in \
{STUDENT_PREFERENCES} and your location in {STUDENT_CITY}, Tutor {TUTOR_NAME} looks like a \
strong match. They teach {TUTOR_SUBJECTS}, have an average rating of {TUTOR_RATING}, and their \
hourly rate of ${TUTOR_HOURLY_RATE} is a good fit for your profile.\n\n\
Why this match: {MATCH_REASONS}";

/// Render a number the way it is shown to users: always with a decimal
/// part (`25.0`, `27.5`).
pub fn format_amount(x: f64) -> String {
    format!("{x:?}")
}

/// Reasons this tutor suits the student, most specific first.
pub fn match_reasons(student: &Student, tutor: &Tutor) -> Vec<String> {
    let mut reasons = Vec::new();

    let prefs: HashSet<String> = student
        .preferred_subject_list()
        .iter()
        .map(|p| p.to_lowercase())
        .collect();
    let overlap: Vec<&str> = tutor
        .subjects
        .iter()
        .map(|s| s.name.as_str())
        .filter(|name| prefs.contains(&name.to_lowercase()))
        .collect();
    if !overlap.is_empty() {
        reasons.push(format!("Matches your subjects: {}", overlap.join(", ")));
    }

    if let (Some(sc), Some(tc)) = (student.city.as_deref(), tutor.city.as_deref()) {
        if sc.eq_ignore_ascii_case(tc) {
            reasons.push(format!("Located in the same city ({tc})"));
        }
    }

    if let Some(budget) = student.max_hourly_rate {
        let rate = format_amount(tutor.hourly_rate);
        if tutor.hourly_rate <= budget {
            reasons.push(format!("Within your budget (${rate}/hr)"));
        } else {
            reasons.push(format!("Slightly above your budget (${rate}/hr)"));
        }
    }

    if tutor.overall_rating >= HIGHLY_RATED {
        reasons.push(format!("Highly rated ({:.1}★)", tutor.overall_rating));
    }

    if reasons.is_empty() {
        reasons.push("Good general fit based on available profile data".to_string());
    }
    reasons
}

/// Template explanation used when no language model is available. Always
/// mentions the tutor's name and hourly rate.
pub fn deterministic_explanation(student: &Student, tutor: &Tutor) -> String {
    let prefs = student.preferred_subject_list();
    let subjects = tutor.subject_names();
    let reasons = match_reasons(student, tutor);

    let fill = |value: &str, default: &str| -> String {
        if value.trim().is_empty() {
            default.to_string()
        } else {
            value.to_string()
        }
    };

    EXPLANATION_TEMPLATE
        .replace("{STUDENT_NAME}", &fill(&student.name, "Student"))
        .replace(
            "{STUDENT_PREFERENCES}",
            &fill(&prefs.join(", "), "your selected subjects"),
        )
        .replace(
            "{STUDENT_CITY}",
            &fill(student.city.as_deref().unwrap_or_default(), "your area"),
        )
        .replace("{TUTOR_NAME}", &fill(&tutor.name, "Tutor"))
        .replace(
            "{TUTOR_SUBJECTS}",
            &fill(&subjects.join(", "), "their subjects"),
        )
        .replace("{TUTOR_HOURLY_RATE}", &format_amount(tutor.hourly_rate))
        .replace("{TUTOR_RATING}", &format_amount(tutor.overall_rating))
        .replace(
            "{MATCH_REASONS}",
            &reasons
                .iter()
                .take(MAX_REASONS)
                .cloned()
                .collect::<Vec<_>>()
                .join("; "),
        )
        .trim()
        .to_string()
}

/// Conversational reply shown in the chat bubble. Independent of the
/// per-tutor explanations.
pub fn chat_reply(student: &Student, tutors: &[Tutor]) -> String {
    let first_name = student.name.split_whitespace().next().unwrap_or("there");

    if tutors.is_empty() {
        return format!(
            "Hi {first_name}! I couldn't find any tutors that match this student's current \
             profile. Try changing their preferred subjects, city, or maximum hourly rate and \
             ask me again."
        );
    }

    let subjects = student
        .preferred_subjects
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("your subjects");
    let city = student
        .city
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("your area");
    let budget = student
        .max_hourly_rate
        .map(|b| format!("${}/hr", format_amount(b)))
        .unwrap_or_else(|| "your budget".to_string());
    let names = tutors
        .iter()
        .take(3)
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Hi {first_name}! Based on what you said and this student's profile \
         ({subjects}, {city}, budget around {budget}), I've found {} tutors. \
         A few strong options are: {names}. You can click their cards for more details \
         or tell me if you'd prefer someone cheaper, closer, or in a different subject.",
        tutors.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::{student, tutor};

    #[test]
    fn test_format_amount_keeps_decimal() {
        assert_eq!(format_amount(25.0), "25.0");
        assert_eq!(format_amount(27.5), "27.5");
    }

    #[test]
    fn test_explanation_contains_name_and_rate() {
        let s = student("Alice", Some("Math,Physics"), Some("Beirut"), Some(30.0));
        let t = tutor(1, "Tamer", "Beirut", 25.0, 4.0, &["Math"]);
        let text = deterministic_explanation(&s, &t);
        assert!(text.contains("Tamer"));
        assert!(text.contains("$25.0"));
        assert!(text.starts_with("Alice, based on your interests in Math, Physics"));
        assert!(text.contains("Why this match: Matches your subjects: Math; Located in the same city (Beirut); Within your budget ($25.0/hr)"));
    }

    #[test]
    fn test_subject_overlap_ignores_case() {
        let s = student("Nour", Some("math, PHYSICS"), Some("Tripoli"), None);
        let t = tutor(4, "Lina", "Beirut", 20.0, 3.0, &["Math", "Physics", "Chemistry"]);
        assert_eq!(
            match_reasons(&s, &t),
            vec!["Matches your subjects: Math, Physics".to_string()]
        );

        let text = deterministic_explanation(&s, &t);
        assert!(text.contains("Why this match: Matches your subjects: Math, Physics"));
        assert!(text.contains("$20.0"));
    }

    #[test]
    fn test_explanation_defaults_for_sparse_profile() {
        let s = student("Bob", None, None, None);
        let t = tutor(2, "Maya", "Tripoli", 18.0, 3.0, &[]);
        let text = deterministic_explanation(&s, &t);
        assert!(text.contains("your selected subjects"));
        assert!(text.contains("your area"));
        assert!(text.contains("They teach their subjects"));
        assert!(text.contains("Good general fit based on available profile data"));
        assert!(text.contains("Maya"));
        assert!(text.contains("18.0"));
    }

    #[test]
    fn test_reasons_over_budget_and_highly_rated() {
        let s = student("Carl", Some("Physics"), Some("beirut"), Some(20.0));
        let t = tutor(3, "Lina", "Beirut", 35.0, 4.76, &["Physics", "Math"]);
        let reasons = match_reasons(&s, &t);
        assert_eq!(
            reasons,
            vec![
                "Matches your subjects: Physics".to_string(),
                "Located in the same city (Beirut)".to_string(),
                "Slightly above your budget ($35.0/hr)".to_string(),
                "Highly rated (4.8★)".to_string(),
            ]
        );
        // only the first three make it into the text
        let text = deterministic_explanation(&s, &t);
        assert!(!text.contains("Highly rated"));
    }

    #[test]
    fn test_chat_reply_names_top_three() {
        let s = student("Alice Smith", Some("Math"), Some("Beirut"), Some(30.0));
        let tutors = vec![
            tutor(1, "Khaled", "Beirut", 15.0, 4.2, &["Math"]),
            tutor(2, "Tamer", "Beirut", 25.0, 4.0, &["Math"]),
            tutor(3, "Sara", "Beirut", 28.0, 3.9, &["Math"]),
            tutor(4, "Rami", "Beirut", 29.0, 3.5, &["Math"]),
        ];
        let reply = chat_reply(&s, &tutors);
        assert!(reply.starts_with("Hi Alice!"));
        assert!(reply.contains("I've found 4 tutors"));
        assert!(reply.contains("Khaled, Tamer, Sara."));
        assert!(!reply.contains("Rami"));
        assert!(reply.contains("budget around $30.0/hr"));
    }

    #[test]
    fn test_chat_reply_without_matches() {
        let s = student("Bob", None, None, None);
        let reply = chat_reply(&s, &[]);
        assert!(reply.starts_with("Hi Bob! I couldn't find any tutors"));
    }
}
