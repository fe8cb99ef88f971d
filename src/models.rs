use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: i64,
    pub name: String,
}

/// One persisted score. `exam_date` is the raw stored text and may be
/// missing or malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub id: String,
    pub student_id: String,
    pub course_id: i64,
    pub score: f64,
    pub exam_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewScoreEntry {
    pub student_id: String,
    pub course_id: i64,
    pub score: f64,
    pub exam_date: Option<String>,
}

/// A score with its student and course resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRow {
    #[serde(skip)]
    pub student_id: String,
    #[serde(rename = "student")]
    pub student_name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "course")]
    pub course_name: String,
    pub score: f64,
    pub exam_date: Option<String>,
}

impl JoinedRow {
    pub fn parsed_exam_date(&self) -> Option<NaiveDate> {
        parse_exam_date(self.exam_date.as_deref())
    }
}

pub const EXAM_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_exam_date(raw: Option<&str>) -> Option<NaiveDate> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, EXAM_DATE_FORMAT).ok()
}

/// Optional match constraints over the joined view. `None` and empty strings
/// both mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub class_name: Option<String>,
    pub course_name: Option<String>,
    pub student_id: Option<String>,
}

impl FilterSpec {
    pub fn label(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.class_name, &self.course_name, &self.student_id]
            .into_iter()
            .filter_map(|value| value.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub class_names: Vec<String>,
    pub course_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub course_name: String,
    pub summary: Option<ScoreSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrendSeries {
    Points {
        student_name: Option<String>,
        course_name: String,
        points: Vec<TrendPoint>,
        axis: AxisRange,
    },
    NoData {
        student_name: Option<String>,
        course_name: String,
        axis: AxisRange,
    },
}

impl TrendSeries {
    pub fn axis(&self) -> AxisRange {
        match self {
            TrendSeries::Points { axis, .. } | TrendSeries::NoData { axis, .. } => *axis,
        }
    }

    pub fn points(&self) -> &[TrendPoint] {
        match self {
            TrendSeries::Points { points, .. } => points,
            TrendSeries::NoData { .. } => &[],
        }
    }
}

/// One candidate row of a batch submission, as typed by the user. Missing
/// fields read as empty so the validator reports them per row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BatchRow {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub score: String,
    #[serde(default)]
    pub exam_date: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub fail_count: usize,
    pub failures: Vec<(usize, crate::error::EngineError)>,
}
