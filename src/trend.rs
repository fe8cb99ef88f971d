use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{parse_exam_date, AxisRange, ScoreEntry, TrendPoint, TrendSeries};
use crate::stats::is_valid_score;
use crate::store::{RecordStore, ScoreEntryQuery};

/// Days shown before the current moment when there is nothing to plot.
pub const EMPTY_AXIS_DAYS: i64 = 7;

/// Margin added before the first and after the last point.
pub const AXIS_PADDING_DAYS: i64 = 1;

/// Builds the chronological score series for one student in one course.
///
/// The course is resolved by exact name. Scores outside 0-100 are skipped, and
/// a missing or malformed exam date is replaced by the date of `now`.
pub async fn build_trend_series<S: RecordStore>(
    store: &S,
    student_id: &str,
    course_name: &str,
    now: NaiveDateTime,
) -> EngineResult<TrendSeries> {
    let course = store
        .find_course_by_name(course_name)
        .await?
        .ok_or_else(|| EngineError::CourseNotFound(course_name.to_string()))?;

    let student_name = store
        .list_students()
        .await?
        .into_iter()
        .find(|s| s.id == student_id)
        .map(|s| s.name);

    let entries = store
        .list_score_entries(&ScoreEntryQuery::for_pair(student_id, course.id))
        .await?;
    let points = trend_points(&entries, now);

    let series = if points.is_empty() {
        TrendSeries::NoData {
            student_name,
            course_name: course.name,
            axis: empty_axis(now),
        }
    } else {
        let axis = padded_axis(&points).unwrap_or_else(|| empty_axis(now));
        TrendSeries::Points {
            student_name,
            course_name: course.name,
            points,
            axis,
        }
    };

    Ok(series)
}

/// Converts entries to points at midnight of their exam date, sorted
/// ascending. Equal timestamps keep their input order.
pub fn trend_points(entries: &[ScoreEntry], now: NaiveDateTime) -> Vec<TrendPoint> {
    let today = now.date();
    let mut repaired = 0usize;

    let mut points: Vec<TrendPoint> = entries
        .iter()
        .filter(|entry| is_valid_score(entry.score))
        .map(|entry| {
            let date = parse_exam_date(entry.exam_date.as_deref()).unwrap_or_else(|| {
                repaired += 1;
                today
            });
            TrendPoint {
                timestamp: date.and_time(NaiveTime::MIN),
                score: entry.score,
            }
        })
        .collect();

    if repaired > 0 {
        debug!(repaired, %today, "substituted current date for unusable exam dates");
    }

    points.sort_by_key(|point| point.timestamp);
    points
}

pub fn padded_axis(points: &[TrendPoint]) -> Option<AxisRange> {
    let first = points.iter().map(|p| p.timestamp).min()?;
    let last = points.iter().map(|p| p.timestamp).max()?;
    Some(AxisRange {
        start: first - Duration::days(AXIS_PADDING_DAYS),
        end: last + Duration::days(AXIS_PADDING_DAYS),
    })
}

pub fn empty_axis(now: NaiveDateTime) -> AxisRange {
    AxisRange {
        start: now - Duration::days(EMPTY_AXIS_DAYS),
        end: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_student("1", "Li", "A")
            .with_course(10, "Math")
            .with_course(11, "English")
            .with_score("1", 10, 88.0, Some("2024-04-01"))
            .with_score("1", 10, 92.0, Some("2024-03-01"))
            .with_score("1", 11, 75.0, Some("2024-03-02"))
    }

    #[tokio::test]
    async fn builds_sorted_series_with_padding() {
        let series = build_trend_series(&store(), "1", "Math", now()).await.unwrap();

        let TrendSeries::Points {
            student_name,
            course_name,
            points,
            axis,
        } = series
        else {
            panic!("expected points");
        };
        assert_eq!(student_name.as_deref(), Some("Li"));
        assert_eq!(course_name, "Math");
        assert_eq!(
            points,
            vec![
                TrendPoint {
                    timestamp: at(2024, 3, 1),
                    score: 92.0
                },
                TrendPoint {
                    timestamp: at(2024, 4, 1),
                    score: 88.0
                },
            ]
        );
        assert_eq!(axis.start, at(2024, 2, 29));
        assert_eq!(axis.end, at(2024, 4, 2));
    }

    #[tokio::test]
    async fn course_lookup_is_exact() {
        let err = build_trend_series(&store(), "1", "math", now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::CourseNotFound(name) if name == "math"));
    }

    #[tokio::test]
    async fn no_rows_yields_no_data_with_default_axis() {
        let series = build_trend_series(&store(), "2", "Math", now()).await.unwrap();

        assert!(series.points().is_empty());
        let TrendSeries::NoData { student_name, axis, .. } = series else {
            panic!("expected no data");
        };
        assert_eq!(student_name, None);
        assert_eq!(axis.end, now());
        assert_eq!(axis.start, now() - Duration::days(7));
    }

    #[tokio::test]
    async fn out_of_range_scores_only_is_no_data() {
        let store = MemoryStore::new()
            .with_student("1", "Li", "A")
            .with_course(10, "Math")
            .with_score("1", 10, 120.0, Some("2024-03-01"));

        let series = build_trend_series(&store, "1", "Math", now()).await.unwrap();
        assert!(matches!(series, TrendSeries::NoData { .. }));
    }

    #[test]
    fn unusable_dates_become_today() {
        let entries = vec![
            ScoreEntry {
                id: "a".to_string(),
                student_id: "1".to_string(),
                course_id: 10,
                score: 70.0,
                exam_date: None,
            },
            ScoreEntry {
                id: "b".to_string(),
                student_id: "1".to_string(),
                course_id: 10,
                score: 80.0,
                exam_date: Some("03/01/2024".to_string()),
            },
            ScoreEntry {
                id: "c".to_string(),
                student_id: "1".to_string(),
                course_id: 10,
                score: 90.0,
                exam_date: Some("2024-01-10".to_string()),
            },
        ];

        let points = trend_points(&entries, now());
        let scores: Vec<f64> = points.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![90.0, 70.0, 80.0]);
        assert_eq!(points[1].timestamp, at(2024, 6, 15));
        assert_eq!(points[2].timestamp, at(2024, 6, 15));
    }

    #[test]
    fn padding_holds_for_any_non_empty_series() {
        let dates = [at(2023, 12, 31), at(2024, 1, 1), at(2023, 6, 5)];
        let points: Vec<TrendPoint> = dates
            .iter()
            .map(|&timestamp| TrendPoint {
                timestamp,
                score: 50.0,
            })
            .collect();

        let axis = padded_axis(&points).unwrap();
        assert_eq!(axis.start, at(2023, 6, 4));
        assert_eq!(axis.end, at(2024, 1, 2));
        assert!(padded_axis(&[]).is_none());
    }
}
