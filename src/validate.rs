use tracing::{info, warn};

use crate::error::{EngineError, EngineResult, ValidationError};
use crate::models::{parse_exam_date, BatchOutcome, BatchRow, Course, NewScoreEntry, EXAM_DATE_FORMAT};
use crate::stats::is_valid_score;
use crate::store::RecordStore;

/// Checks that the three required fields are present and that the score is a
/// finite number in 0-100.
pub fn check_fields(
    student_id: &str,
    course_name: &str,
    score_text: &str,
) -> Result<f64, ValidationError> {
    if student_id.trim().is_empty() {
        return Err(ValidationError::EmptyStudentId);
    }
    if course_name.trim().is_empty() {
        return Err(ValidationError::EmptyCourseName);
    }
    parse_score(score_text)
}

pub fn parse_score(score_text: &str) -> Result<f64, ValidationError> {
    let text = score_text.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyScore);
    }

    let score: f64 = text
        .parse()
        .map_err(|_| ValidationError::UnparseableScore(text.to_string()))?;
    if !score.is_finite() {
        return Err(ValidationError::UnparseableScore(text.to_string()));
    }
    if !is_valid_score(score) {
        return Err(ValidationError::ScoreOutOfRange(score));
    }

    Ok(score)
}

/// Empty text is no date; a valid date is stored canonically; anything else is
/// kept verbatim for readers to repair.
pub fn normalize_exam_date(exam_date: &str) -> Option<String> {
    let text = exam_date.trim();
    if text.is_empty() {
        return None;
    }
    match parse_exam_date(Some(text)) {
        Some(date) => Some(date.format(EXAM_DATE_FORMAT).to_string()),
        None => Some(text.to_string()),
    }
}

async fn resolve_entry<S: RecordStore>(
    store: &S,
    student_id: &str,
    course_name: &str,
    score_text: &str,
    exam_date: &str,
) -> EngineResult<NewScoreEntry> {
    let score = check_fields(student_id, course_name, score_text)?;
    let student_id = student_id.trim();
    let course_name = course_name.trim();

    let course: Course = store
        .find_course_by_name(course_name)
        .await?
        .ok_or_else(|| EngineError::CourseNotFound(course_name.to_string()))?;

    let student_known = store
        .list_students()
        .await?
        .iter()
        .any(|s| s.id == student_id);
    if !student_known {
        return Err(EngineError::StudentNotFound(student_id.to_string()));
    }

    Ok(NewScoreEntry {
        student_id: student_id.to_string(),
        course_id: course.id,
        score,
        exam_date: normalize_exam_date(exam_date),
    })
}

/// Validates and records one score. An existing score for the same student,
/// course and date is reported as `DuplicateEntry`, never replaced.
pub async fn submit_score<S: RecordStore>(
    store: &S,
    student_id: &str,
    course_name: &str,
    score_text: &str,
    exam_date: &str,
) -> EngineResult<()> {
    let entry = match resolve_entry(store, student_id, course_name, score_text, exam_date).await {
        Ok(entry) => entry,
        Err(err) => {
            warn!(student_id, course_name, error = %err, "rejected score submission");
            return Err(err);
        }
    };

    if store
        .score_entry_exists(&entry.student_id, entry.course_id, entry.exam_date.as_deref())
        .await?
    {
        warn!(
            student_id = %entry.student_id,
            course_id = entry.course_id,
            "rejected duplicate score"
        );
        return Err(EngineError::DuplicateEntry {
            student_id: entry.student_id,
            course_id: entry.course_id,
            exam_date: entry.exam_date,
        });
    }

    store.create_score_entry(&entry).await?;
    info!(
        student_id = %entry.student_id,
        course_id = entry.course_id,
        score = entry.score,
        "recorded score"
    );
    Ok(())
}

/// Validates and records each row on its own. Duplicates are left to the
/// store's uniqueness constraint. A failing row never stops the rest.
pub async fn submit_batch<S: RecordStore>(store: &S, rows: &[BatchRow]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for (index, row) in rows.iter().enumerate() {
        let result = match resolve_entry(
            store,
            &row.student_id,
            &row.course_name,
            &row.score,
            &row.exam_date,
        )
        .await
        {
            Ok(entry) => store.create_score_entry(&entry).await.map_err(EngineError::from),
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => outcome.success_count += 1,
            Err(err) => {
                warn!(row = index + 1, error = %err, "batch row rejected");
                outcome.fail_count += 1;
                outcome.failures.push((index, err));
            }
        }
    }

    info!(
        success = outcome.success_count,
        failed = outcome.fail_count,
        "batch submission finished"
    );
    outcome
}
