use std::collections::BTreeSet;

use chrono::{Local, NaiveDateTime};

use crate::error::EngineResult;
use crate::filter;
use crate::join::build_joined_view;
use crate::models::{
    BatchOutcome, BatchRow, Course, FilterOptions, FilterSpec, JoinedRow, ScoreSummary, Student,
    TrendSeries,
};
use crate::store::{RecordStore, ScoreEntryQuery};
use crate::{stats, trend, validate};

/// Entry point for the score screens. Every call reads fresh from the store;
/// nothing is cached between calls.
pub struct ScoreEngine<S> {
    store: S,
    wildcard: String,
}

impl<S: RecordStore> ScoreEngine<S> {
    pub fn with_wildcard(store: S, wildcard: impl Into<String>) -> Self {
        Self {
            store,
            wildcard: wildcard.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Distinct, sorted, non-blank class and course names.
    pub async fn filter_options(&self) -> EngineResult<FilterOptions> {
        let class_names: BTreeSet<String> = self
            .store
            .list_students()
            .await?
            .into_iter()
            .map(|s| s.class_name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        let course_names: BTreeSet<String> = self
            .store
            .list_courses()
            .await?
            .into_iter()
            .map(|c| c.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        Ok(FilterOptions {
            class_names: class_names.into_iter().collect(),
            course_names: course_names.into_iter().collect(),
        })
    }

    pub async fn courses(&self) -> EngineResult<Vec<Course>> {
        Ok(self.store.list_courses().await?)
    }

    pub async fn students_in_class(&self, class_name: &str) -> EngineResult<Vec<Student>> {
        let class_name = class_name.trim();
        Ok(self
            .store
            .list_students()
            .await?
            .into_iter()
            .filter(|s| s.class_name == class_name)
            .collect())
    }

    pub async fn joined_view(&self) -> EngineResult<Vec<JoinedRow>> {
        let students = self.store.list_students().await?;
        let courses = self.store.list_courses().await?;
        let entries = self.store.list_score_entries(&ScoreEntryQuery::all()).await?;
        Ok(build_joined_view(&students, &courses, &entries))
    }

    pub async fn apply_filter(&self, spec: &FilterSpec) -> EngineResult<Vec<JoinedRow>> {
        let rows = self.joined_view().await?;
        Ok(filter::apply_filter(rows, spec, &self.wildcard))
    }

    pub fn compute_statistics(&self, rows: &[JoinedRow]) -> Option<ScoreSummary> {
        stats::compute_statistics(rows)
    }

    pub async fn build_trend_series(
        &self,
        student_id: &str,
        course_name: &str,
    ) -> EngineResult<TrendSeries> {
        self.build_trend_series_at(student_id, course_name, Local::now().naive_local())
            .await
    }

    pub async fn build_trend_series_at(
        &self,
        student_id: &str,
        course_name: &str,
        now: NaiveDateTime,
    ) -> EngineResult<TrendSeries> {
        trend::build_trend_series(&self.store, student_id.trim(), course_name.trim(), now).await
    }

    pub async fn submit_score(
        &self,
        student_id: &str,
        course_name: &str,
        score_text: &str,
        exam_date: &str,
    ) -> EngineResult<()> {
        validate::submit_score(&self.store, student_id, course_name, score_text, exam_date).await
    }

    pub async fn submit_batch(&self, rows: &[BatchRow]) -> BatchOutcome {
        validate::submit_batch(&self.store, rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, ValidationError};
    use crate::filter::DEFAULT_WILDCARD;
    use crate::memory::MemoryStore;
    use chrono::NaiveDate;

    fn engine() -> ScoreEngine<MemoryStore> {
        let store = MemoryStore::new()
            .with_student("1", "Li", "A")
            .with_student("2", "Wang", "B")
            .with_student("3", "Zhao", " ")
            .with_course(10, "Math")
            .with_course(11, "English")
            .with_score("1", 10, 92.0, Some("2024-03-01"))
            .with_score("1", 10, 88.0, Some("2024-04-01"))
            .with_score("2", 11, 70.0, Some("2024-03-02"))
            .with_score("2", 10, 80.0, Some("2024-03-02"))
            .with_score("7", 10, 15.0, Some("2024-03-02"));
        ScoreEngine::with_wildcard(store, DEFAULT_WILDCARD)
    }

    #[tokio::test]
    async fn filter_options_are_distinct_and_sorted() {
        let options = engine().filter_options().await.unwrap();
        assert_eq!(options.class_names, vec!["A", "B"]);
        assert_eq!(options.course_names, vec!["English", "Math"]);
    }

    #[tokio::test]
    async fn unconstrained_filter_is_the_joined_view() {
        let engine = engine();
        let view = engine.joined_view().await.unwrap();
        let filtered = engine.apply_filter(&FilterSpec::default()).await.unwrap();

        assert_eq!(view.len(), 4);
        assert_eq!(filtered, view);
    }

    #[tokio::test]
    async fn statistics_follow_the_filter() {
        let engine = engine();
        let rows = engine
            .apply_filter(&FilterSpec {
                course_name: Some("math".to_string()),
                ..FilterSpec::default()
            })
            .await
            .unwrap();

        let summary = engine.compute_statistics(&rows).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.max, 92.0);
        assert_eq!(summary.min, 80.0);
        assert!((summary.mean - 260.0 / 3.0).abs() < 1e-9);

        let none = engine
            .apply_filter(&FilterSpec {
                class_name: Some("Z".to_string()),
                ..FilterSpec::default()
            })
            .await
            .unwrap();
        assert!(engine.compute_statistics(&none).is_none());
    }

    #[tokio::test]
    async fn students_in_class_uses_exact_names() {
        let engine = engine();
        let class_a = engine.students_in_class("A").await.unwrap();
        assert_eq!(class_a.len(), 1);
        assert_eq!(class_a[0].id, "1");
    }

    #[tokio::test]
    async fn submissions_show_up_in_the_next_read() {
        let engine = engine();
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        engine
            .submit_score("2", "Math", "85.5", "2024-05-01")
            .await
            .unwrap();
        let err = engine
            .submit_score("2", "Math", "150", "2024-05-02")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::ScoreOutOfRange(_))
        ));

        let series = engine
            .build_trend_series_at("2", "Math", now)
            .await
            .unwrap();
        let scores: Vec<f64> = series.points().iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![80.0, 85.5]);
    }

    #[tokio::test]
    async fn batch_counts_successes_and_failures() {
        let engine = engine();
        let rows = vec![
            BatchRow {
                student_id: "1".to_string(),
                course_name: "English".to_string(),
                score: "77".to_string(),
                exam_date: "2024-05-01".to_string(),
            },
            BatchRow {
                student_id: "1".to_string(),
                course_name: "History".to_string(),
                score: "77".to_string(),
                exam_date: "2024-05-01".to_string(),
            },
        ];

        let outcome = engine.submit_batch(&rows).await;
        assert_eq!((outcome.success_count, outcome.fail_count), (1, 1));
        assert_eq!(engine.store().entry_count(), 6);
    }
}
