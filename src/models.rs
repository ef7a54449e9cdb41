use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// How a tutor delivers lessons.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TeachingMode {
    #[default]
    Online,
    InPerson,
    Hybrid,
}

impl TeachingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::InPerson => "in_person",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for TeachingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeachingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "in_person" | "in-person" => Ok(Self::InPerson),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!("Unknown teaching mode: {other}")),
        }
    }
}

/// Lifecycle of a lesson request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Cancelled,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for LessonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown lesson status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub city: Option<String>,
    pub address: Option<String>,
    /// Comma-separated subject names, e.g. "Math,Physics"
    pub preferred_subjects: Option<String>,
    pub max_hourly_rate: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Preferred subjects split on commas, trimmed, empties dropped.
    pub fn preferred_subject_list(&self) -> Vec<String> {
        self.preferred_subjects
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tutor {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub hourly_rate: f64,
    pub teaching_mode: TeachingMode,
    pub bio: Option<String>,
    pub overall_rating: f64,
    pub number_of_reviews: i64,
    pub created_at: DateTime<Utc>,
    pub subjects: Vec<Subject>,
}

impl Tutor {
    pub fn subject_names(&self) -> Vec<String> {
        self.subjects.iter().map(|s| s.name.clone()).collect()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub student_id: i64,
    pub tutor_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRequest {
    pub id: i64,
    pub student_id: i64,
    pub tutor_id: i64,
    pub subject_id: i64,
    pub status: LessonStatus,
    pub requested_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

// ─── Request bodies ──────────────────────────────────────

/// Create-tutor request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TutorCreate {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub hourly_rate: f64,
    pub teaching_mode: Option<TeachingMode>,
    pub bio: Option<String>,
    pub subjects: Option<Vec<String>>,
}

/// Update-tutor request. Only fields present in the body are overwritten;
/// for nullable columns an explicit `null` clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TutorUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_coordinate")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present_coordinate")]
    pub longitude: Option<Option<f64>>,
    pub hourly_rate: Option<f64>,
    pub teaching_mode: Option<TeachingMode>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
    /// Replaces the full subject set when present (`null` clears it)
    #[serde(default, deserialize_with = "present")]
    pub subjects: Option<Option<Vec<String>>>,
}

/// Create-student request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentCreate {
    pub name: String,
    pub email: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub preferred_subjects: Option<String>,
    pub max_hourly_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
}

/// Update-student request, same presence rules as [`TutorUpdate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub preferred_subjects: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub max_hourly_rate: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present_coordinate")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present_coordinate")]
    pub longitude: Option<Option<f64>>,
}

/// Add-review request
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCreate {
    pub student_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
}

/// Create-lesson-request request
#[derive(Debug, Clone, Deserialize)]
pub struct LessonRequestCreate {
    pub student_id: i64,
    pub tutor_id: i64,
    pub subject_id: i64,
    pub requested_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonStatusUpdate {
    pub status: LessonStatus,
}

/// Query string of `GET /api/tutors/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub subject: Option<String>,
    pub city: Option<String>,
    pub max_hourly_rate: Option<f64>,
    pub min_rating: Option<f64>,
    pub teaching_mode: Option<TeachingMode>,
    pub student_id: Option<i64>,
    pub sort_by: Option<SortBy>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Rating descending, then price ascending
    #[default]
    Rating,
    PriceAsc,
    DistanceAsc,
}

/// Chat request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub student_id: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_true")]
    pub use_ai: bool,
}

fn default_true() -> bool {
    true
}

// ─── Responses ───────────────────────────────────────────

/// Search result row
#[derive(Debug, Clone, Serialize)]
pub struct TutorHit {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub hourly_rate: f64,
    pub teaching_mode: TeachingMode,
    pub overall_rating: f64,
    pub number_of_reviews: i64,
    pub subjects: Vec<String>,
    pub distance_km: Option<f64>,
}

/// Review as embedded in the tutor detail view
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full tutor profile
#[derive(Debug, Clone, Serialize)]
pub struct TutorDetail {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub hourly_rate: f64,
    pub teaching_mode: TeachingMode,
    pub bio: Option<String>,
    pub overall_rating: f64,
    pub number_of_reviews: i64,
    pub subjects: Vec<String>,
    pub reviews: Vec<ReviewView>,
}

/// Returned by tutor create / update
#[derive(Debug, Clone, Serialize)]
pub struct TutorSaved {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub hourly_rate: f64,
    pub subjects: Vec<String>,
}

impl From<&Tutor> for TutorSaved {
    fn from(t: &Tutor) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            email: t.email.clone(),
            hourly_rate: t.hourly_rate,
            subjects: t.subject_names(),
        }
    }
}

/// Returned by student create / update
#[derive(Debug, Clone, Serialize)]
pub struct StudentSaved {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&Student> for StudentSaved {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            email: s.email.clone(),
        }
    }
}

/// Compact tutor card used by similar-tutor and recommendation lists
#[derive(Debug, Clone, Serialize)]
pub struct TutorCard {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub hourly_rate: f64,
    pub overall_rating: f64,
    pub number_of_reviews: i64,
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl From<&Tutor> for TutorCard {
    fn from(t: &Tutor) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            city: t.city.clone(),
            hourly_rate: t.hourly_rate,
            overall_rating: t.overall_rating,
            number_of_reviews: t.number_of_reviews,
            subjects: t.subject_names(),
            explanation: None,
        }
    }
}

/// Chat response: a conversational reply plus explained tutor cards
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub tutors: Vec<TutorCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

// ─── Serde helpers ───────────────────────────────────────

/// Distinguishes "field absent" (outer `None`, via `#[serde(default)]`)
/// from "field is null" (`Some(None)`).
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Form inputs send coordinates as numbers, numeric strings, or `""`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawCoordinate>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawCoordinate::Number(n)) => Ok(Some(n)),
        Some(RawCoordinate::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawCoordinate::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn present_coordinate<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_coordinate(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teaching_mode_serializes_to_snake_case() {
        let json = serde_json::to_value(TeachingMode::InPerson).unwrap();
        assert_eq!(json, "in_person");
    }

    #[test]
    fn test_teaching_mode_from_str_accepts_dash() {
        assert_eq!("In-Person".parse::<TeachingMode>().unwrap(), TeachingMode::InPerson);
        assert!("telepathy".parse::<TeachingMode>().is_err());
    }

    #[test]
    fn test_preferred_subject_list_trims_and_drops_empty() {
        let student = Student {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            city: None,
            address: None,
            preferred_subjects: Some(" Math, ,Physics ,".to_string()),
            max_hourly_rate: None,
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
        };
        assert_eq!(student.preferred_subject_list(), vec!["Math", "Physics"]);
    }

    #[test]
    fn test_tutor_create_empty_coordinates_become_none() {
        let body = r#"{"name":"Tamer","email":"t@example.com","latitude":"","longitude":"35.5"}"#;
        let req: TutorCreate = serde_json::from_str(body).unwrap();
        assert_eq!(req.latitude, None);
        assert_eq!(req.longitude, Some(35.5));
        assert_eq!(req.hourly_rate, 0.0);
    }

    #[test]
    fn test_update_distinguishes_absent_from_null() {
        let req: TutorUpdate = serde_json::from_str(r#"{"city":null,"bio":"New bio"}"#).unwrap();
        assert_eq!(req.city, Some(None));
        assert_eq!(req.bio, Some(Some("New bio".to_string())));
        assert_eq!(req.phone, None);
        assert!(req.subjects.is_none());
    }

    #[test]
    fn test_update_coordinates_null_and_string() {
        let req: StudentUpdate =
            serde_json::from_str(r#"{"latitude":null,"longitude":"33.9"}"#).unwrap();
        assert_eq!(req.latitude, Some(None));
        assert_eq!(req.longitude, Some(Some(33.9)));
        assert_eq!(req.max_hourly_rate, None);
    }

    #[test]
    fn test_chat_request_defaults_use_ai() {
        let req: ChatRequest = serde_json::from_str(r#"{"student_id":3,"message":"hi"}"#).unwrap();
        assert!(req.use_ai);
    }

    #[test]
    fn test_tutor_card_skips_missing_explanation() {
        let card = TutorCard {
            id: 1,
            name: "Lina".to_string(),
            city: None,
            hourly_rate: 35.0,
            overall_rating: 4.0,
            number_of_reviews: 5,
            subjects: vec![],
            explanation: None,
        };
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("explanation").is_none());
    }
}
