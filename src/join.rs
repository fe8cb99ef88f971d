use std::collections::HashMap;

use tracing::debug;

use crate::models::{Course, JoinedRow, ScoreEntry, Student};

/// Resolves each score against its student and course. Scores whose student
/// or course no longer exists are dropped without error.
pub fn build_joined_view(
    students: &[Student],
    courses: &[Course],
    entries: &[ScoreEntry],
) -> Vec<JoinedRow> {
    let students_by_id: HashMap<&str, &Student> =
        students.iter().map(|s| (s.id.as_str(), s)).collect();
    let course_names: HashMap<i64, &str> =
        courses.iter().map(|c| (c.id, c.name.as_str())).collect();

    let rows: Vec<JoinedRow> = entries
        .iter()
        .filter_map(|entry| {
            let student = students_by_id.get(entry.student_id.as_str())?;
            let course_name = course_names.get(&entry.course_id)?;
            Some(JoinedRow {
                student_id: student.id.clone(),
                student_name: student.name.clone(),
                class_name: student.class_name.clone(),
                course_name: (*course_name).to_string(),
                score: entry.score,
                exam_date: entry.exam_date.clone(),
            })
        })
        .collect();

    let orphaned = entries.len() - rows.len();
    if orphaned > 0 {
        debug!(orphaned, "dropped scores with dangling student or course");
    }

    rows
}
