use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("student id is required")]
    EmptyStudentId,
    #[error("course name is required")]
    EmptyCourseName,
    #[error("score is required")]
    EmptyScore,
    #[error("score {0:?} is not a number")]
    UnparseableScore(String),
    #[error("score {0} is outside 0-100")]
    ScoreOutOfRange(f64),
}

/// Failures reported by a record store. Passed through the engine unmodified.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("constraint violated: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("course not found: {0}")]
    CourseNotFound(String),
    #[error("student not found: {0}")]
    StudentNotFound(String),
    #[error(
        "score already recorded for student {student_id}, course {course_id}, date {}",
        .exam_date.as_deref().unwrap_or("(none)")
    )]
    DuplicateEntry {
        student_id: String,
        course_id: i64,
        exam_date: Option<String>,
    },
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;
