//! Data types shared across the catalog, selection, and task subsystems.
//!
//! The upstream service is loose about scalar shapes: course ids arrive as
//! JSON numbers or strings depending on the endpoint, and headcount fields
//! occasionally come back as `"?"`. The deserializers here absorb that at
//! the edge so the rest of the library works with one canonical form
//! (string ids, zero-defaulted counts).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Minimum allowed delay between enrollment attempts in a task.
pub const MIN_GRAB_DELAY: Duration = Duration::from_millis(500);

pub(crate) fn id_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got {other}"
        ))),
    }
}

fn lenient_i64<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// One catalog entry as returned by a page fetch.
///
/// Identity is `id`; every other field is display data and defaults when
/// the server omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    /// Course ID. Canonically a string even when the wire sends a number.
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub category: String,
    /// Number of students already enrolled.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub chosen: i64,
    /// Enrollment cap.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub limit: i64,
    /// Course origin (0 = academic system, 1 = custom).
    #[serde(default, deserialize_with = "lenient_i64")]
    pub source: i64,
    #[serde(default)]
    pub note: String,
}

/// One scheduled lesson as returned by the lessons endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Lesson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub term: String,
    /// Teaching week this lesson occurs in.
    #[serde(default)]
    pub week: Option<u32>,
    /// Day of week, 1-7.
    #[serde(default)]
    pub day: Option<u8>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub location_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub teachers: Vec<String>,
    /// Class period numbers within the day.
    #[serde(default)]
    pub sessions: Vec<u32>,
}

/// A class-period boundary: a known period number, or the `"?"` sentinel
/// preserved verbatim from the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionBound {
    Period(u32),
    Unknown(String),
}

impl SessionBound {
    pub fn unknown() -> Self {
        SessionBound::Unknown("?".to_string())
    }
}

impl Default for SessionBound {
    fn default() -> Self {
        SessionBound::unknown()
    }
}

impl std::fmt::Display for SessionBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionBound::Period(n) => write!(f, "{n}"),
            SessionBound::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// First and last class period of a lesson.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionRange {
    #[serde(default)]
    pub start: SessionBound,
    #[serde(default)]
    pub end: SessionBound,
}

/// Scheduling detail for a course, assembled from its lesson list.
///
/// A course with no scheduled lessons gets [`LessonDetail::unknown`] -- an
/// explicit sentinel, never a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonDetail {
    #[serde(default = "unknown_str")]
    pub term: String,
    /// Teaching weeks, unique and ascending.
    #[serde(default)]
    pub weeks: Vec<u32>,
    /// Day of week, 1-7, when known.
    #[serde(default)]
    pub day: Option<u8>,
    #[serde(default = "unknown_str")]
    pub content_type: String,
    #[serde(default = "unknown_str")]
    pub location_type: String,
    #[serde(default = "unspecified_str")]
    pub location: String,
    #[serde(default)]
    pub sessions: SessionRange,
}

fn unknown_str() -> String {
    "unknown".to_string()
}

fn unspecified_str() -> String {
    "unspecified".to_string()
}

impl LessonDetail {
    /// Sentinel detail for a course with no scheduled lessons.
    pub fn unknown() -> Self {
        Self {
            term: unknown_str(),
            weeks: Vec::new(),
            day: None,
            content_type: unknown_str(),
            location_type: unknown_str(),
            location: unspecified_str(),
            sessions: SessionRange::default(),
        }
    }

    /// Merge a lesson list into one detail record.
    ///
    /// Scalar fields come from the first lesson; `weeks` is collected
    /// across all lessons, deduplicated, and sorted; `sessions` spans the
    /// first lesson's period numbers.
    pub fn from_lessons(lessons: &[Lesson]) -> Self {
        let Some(first) = lessons.first() else {
            return Self::unknown();
        };

        let mut weeks: Vec<u32> = lessons.iter().filter_map(|l| l.week).collect();
        weeks.sort_unstable();
        weeks.dedup();

        let start = first.sessions.iter().min().copied();
        let end = first.sessions.iter().max().copied();

        let non_empty = |s: &str, fallback: fn() -> String| {
            if s.is_empty() {
                fallback()
            } else {
                s.to_string()
            }
        };

        Self {
            term: non_empty(&first.term, unknown_str),
            weeks,
            day: first.day,
            content_type: non_empty(&first.content_type, unknown_str),
            location_type: non_empty(&first.location_type, unknown_str),
            location: non_empty(&first.location, unspecified_str),
            sessions: SessionRange {
                start: start.map_or_else(SessionBound::unknown, SessionBound::Period),
                end: end.map_or_else(SessionBound::unknown, SessionBound::Period),
            },
        }
    }
}

/// A course the user selected for grabbing: catalog summary plus resolved
/// scheduling detail, persisted flat as one JSON object.
///
/// No two entries in a selection share an `id`; position in the containing
/// sequence is the grab priority and is persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedCourse {
    #[serde(flatten)]
    pub course: CourseSummary,
    #[serde(flatten)]
    pub detail: LessonDetail,
}

impl SelectedCourse {
    pub fn id(&self) -> &str {
        &self.course.id
    }
}

/// Server-reported lifecycle state of a grab task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Idle,
    Waiting,
    Running,
}

impl TaskStatus {
    /// Decode the wire integer; anything outside 0-2 is unknown.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::Idle),
            1 => Some(TaskStatus::Waiting),
            2 => Some(TaskStatus::Running),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Idle => "idle",
            TaskStatus::Waiting => "waiting",
            TaskStatus::Running => "running",
        }
    }
}

/// A server-owned grab task.
///
/// The client never mutates one of these -- it issues start/cancel/remove
/// commands and re-fetches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: String,
    pub session_id: String,
    pub courses: Vec<CourseSummary>,
    pub start_at: Option<DateTime<Utc>>,
    pub delay: Duration,
    pub retry: bool,
}

/// Input for submitting a new grab task.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub session_id: String,
    /// Delay between enrollment attempts; floored at [`MIN_GRAB_DELAY`].
    pub delay: Duration,
    pub retry: bool,
    pub start_at: DateTime<Utc>,
    pub courses: Vec<CourseSummary>,
}

impl TaskDraft {
    pub fn new(
        session_id: impl Into<String>,
        start_at: DateTime<Utc>,
        courses: Vec<CourseSummary>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            delay: MIN_GRAB_DELAY,
            retry: true,
            start_at,
            courses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(week: Option<u32>, sessions: &[u32]) -> Lesson {
        Lesson {
            name: "Algorithms".into(),
            term: "2025-1".into(),
            week,
            day: Some(3),
            content_type: "lecture".into(),
            location_type: "classroom".into(),
            location: "B-204".into(),
            teachers: vec!["Zhang".into()],
            sessions: sessions.to_vec(),
        }
    }

    #[test]
    fn test_course_summary_accepts_numeric_id() {
        let course: CourseSummary =
            serde_json::from_value(serde_json::json!({"id": 12345, "name": "Calculus"})).unwrap();
        assert_eq!(course.id, "12345");
        assert_eq!(course.chosen, 0);
    }

    #[test]
    fn test_course_summary_rejects_missing_id() {
        let res = serde_json::from_value::<CourseSummary>(serde_json::json!({"name": "Calculus"}));
        assert!(res.is_err());
    }

    #[test]
    fn test_lenient_counts_absorb_question_marks() {
        let course: CourseSummary = serde_json::from_value(serde_json::json!({
            "id": "1", "chosen": "?", "limit": "40"
        }))
        .unwrap();
        assert_eq!(course.chosen, 0);
        assert_eq!(course.limit, 40);
    }

    #[test]
    fn test_detail_from_lessons_merges_weeks() {
        let lessons = vec![
            lesson(Some(3), &[3, 4]),
            lesson(Some(1), &[3, 4]),
            lesson(Some(3), &[3, 4]),
            lesson(None, &[]),
        ];
        let detail = LessonDetail::from_lessons(&lessons);
        assert_eq!(detail.weeks, vec![1, 3]);
        assert_eq!(detail.sessions.start, SessionBound::Period(3));
        assert_eq!(detail.sessions.end, SessionBound::Period(4));
        assert_eq!(detail.day, Some(3));
    }

    #[test]
    fn test_detail_from_empty_lessons_is_unknown_sentinel() {
        let detail = LessonDetail::from_lessons(&[]);
        assert_eq!(detail, LessonDetail::unknown());
        assert_eq!(detail.sessions.start, SessionBound::unknown());
        assert!(detail.weeks.is_empty());
    }

    #[test]
    fn test_selected_course_persists_flat() {
        let selected = SelectedCourse {
            course: CourseSummary {
                id: "101".into(),
                name: "Physics".into(),
                teacher: "Li".into(),
                category: "required".into(),
                chosen: 10,
                limit: 40,
                source: 0,
                note: String::new(),
            },
            detail: LessonDetail::unknown(),
        };
        let json = serde_json::to_value(&selected).unwrap();
        assert_eq!(json["id"], "101");
        assert_eq!(json["term"], "unknown");
        assert_eq!(json["sessions"]["start"], "?");

        let back: SelectedCourse = serde_json::from_value(json).unwrap();
        assert_eq!(back, selected);
    }

    #[test]
    fn test_task_status_codes() {
        assert_eq!(TaskStatus::from_code(0), Some(TaskStatus::Idle));
        assert_eq!(TaskStatus::from_code(1), Some(TaskStatus::Waiting));
        assert_eq!(TaskStatus::from_code(2), Some(TaskStatus::Running));
        assert_eq!(TaskStatus::from_code(3), None);
        assert_eq!(TaskStatus::from_code(-1), None);
    }

    #[test]
    fn test_draft_defaults() {
        let draft = TaskDraft::new("sid", Utc::now(), Vec::new());
        assert_eq!(draft.delay, MIN_GRAB_DELAY);
        assert!(draft.retry);
    }
}
