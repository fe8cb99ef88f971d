use crate::models::{JoinedRow, ScoreSummary};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

pub fn is_valid_score(score: f64) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

/// Count, mean, max and min over the rows whose score lies in 0-100.
/// Returns `None` when no row qualifies.
pub fn compute_statistics<'a, I>(rows: I) -> Option<ScoreSummary>
where
    I: IntoIterator<Item = &'a JoinedRow>,
{
    let mut count = 0usize;
    let mut total = 0.0_f64;
    let mut max = f64::MIN;
    let mut min = f64::MAX;

    for score in rows.into_iter().map(|row| row.score).filter(|s| is_valid_score(*s)) {
        count += 1;
        total += score;
        max = max.max(score);
        min = min.min(score);
    }

    if count == 0 {
        return None;
    }

    Some(ScoreSummary {
        count,
        mean: total / count as f64,
        max,
        min,
    })
}
