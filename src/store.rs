use crate::error::StoreError;
use crate::models::{Course, NewScoreEntry, ScoreEntry, Student};

/// Narrows `list_score_entries`; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreEntryQuery {
    pub student_id: Option<String>,
    pub course_id: Option<i64>,
}

impl ScoreEntryQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_pair(student_id: &str, course_id: i64) -> Self {
        Self {
            student_id: Some(student_id.to_string()),
            course_id: Some(course_id),
        }
    }
}

/// Read access to students, courses and scores, plus the score write path.
/// The store owns all persisted state; callers never cache what it returns.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn list_students(&self) -> Result<Vec<Student>, StoreError>;

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError>;

    /// Exact-name lookup.
    async fn find_course_by_name(&self, name: &str) -> Result<Option<Course>, StoreError>;

    async fn list_score_entries(
        &self,
        query: &ScoreEntryQuery,
    ) -> Result<Vec<ScoreEntry>, StoreError>;

    /// Null-safe on `exam_date`: two missing dates are equal.
    async fn score_entry_exists(
        &self,
        student_id: &str,
        course_id: i64,
        exam_date: Option<&str>,
    ) -> Result<bool, StoreError>;

    async fn create_score_entry(&self, entry: &NewScoreEntry) -> Result<(), StoreError>;
}
