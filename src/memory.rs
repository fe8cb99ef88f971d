use std::sync::Mutex;

use crate::error::StoreError;
use crate::models::{Course, NewScoreEntry, ScoreEntry, Student};
use crate::store::{RecordStore, ScoreEntryQuery};

/// In-memory record store. Like the SQLite schema it keeps scores without
/// foreign keys and rejects a second score for the same (student, course, date).
#[derive(Debug, Default)]
pub struct MemoryStore {
    students: Vec<Student>,
    courses: Vec<Course>,
    entries: Mutex<Vec<ScoreEntry>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_student(mut self, id: &str, name: &str, class_name: &str) -> Self {
        self.students.push(Student {
            id: id.to_string(),
            name: name.to_string(),
            class_name: class_name.to_string(),
        });
        self
    }

    pub fn with_course(mut self, id: i64, name: &str) -> Self {
        self.courses.push(Course {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_score(
        self,
        student_id: &str,
        course_id: i64,
        score: f64,
        exam_date: Option<&str>,
    ) -> Self {
        {
            let mut entries = self.entries.lock().unwrap();
            let id = format!("score-{}", entries.len() + 1);
            entries.push(ScoreEntry {
                id,
                student_id: student_id.to_string(),
                course_id,
                score,
                exam_date: exam_date.map(str::to_string),
            });
        }
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl RecordStore for MemoryStore {
    async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        Ok(self.students.clone())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        Ok(self.courses.clone())
    }

    async fn find_course_by_name(&self, name: &str) -> Result<Option<Course>, StoreError> {
        Ok(self.courses.iter().find(|c| c.name == name).cloned())
    }

    async fn list_score_entries(
        &self,
        query: &ScoreEntryQuery,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| {
                query.student_id.as_deref().map_or(true, |id| e.student_id == id)
                    && query.course_id.map_or(true, |id| e.course_id == id)
            })
            .cloned()
            .collect())
    }

    async fn score_entry_exists(
        &self,
        student_id: &str,
        course_id: i64,
        exam_date: Option<&str>,
    ) -> Result<bool, StoreError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().any(|e| {
            e.student_id == student_id
                && e.course_id == course_id
                && e.exam_date.as_deref() == exam_date
        }))
    }

    async fn create_score_entry(&self, entry: &NewScoreEntry) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Constraint("store is read-only".to_string()));
        }

        let mut entries = self.entries.lock().unwrap();
        // SQL UNIQUE lets NULL dates repeat; mirror that here.
        let clash = entry.exam_date.is_some()
            && entries.iter().any(|e| {
                e.student_id == entry.student_id
                    && e.course_id == entry.course_id
                    && e.exam_date == entry.exam_date
            });
        if clash {
            return Err(StoreError::Constraint(
                "UNIQUE constraint failed: scores.student_id, scores.course_id, scores.exam_date"
                    .to_string(),
            ));
        }

        let id = format!("score-{}", entries.len() + 1);
        entries.push(ScoreEntry {
            id,
            student_id: entry.student_id.clone(),
            course_id: entry.course_id,
            score: entry.score,
            exam_date: entry.exam_date.clone(),
        });
        Ok(())
    }
}
