use tracing::debug;

use crate::models::{FilterSpec, JoinedRow};

pub const DEFAULT_WILDCARD: &str = "all";

/// Applies `spec` to `rows`, keeping the original order. Every present
/// constraint must match.
pub fn apply_filter(rows: Vec<JoinedRow>, spec: &FilterSpec, wildcard: &str) -> Vec<JoinedRow> {
    let class_needle = substring_constraint(spec.class_name.as_deref(), wildcard);
    let course_needle = substring_constraint(spec.course_name.as_deref(), wildcard);
    let student_id = spec
        .student_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let before = rows.len();
    let filtered: Vec<JoinedRow> = rows
        .into_iter()
        .filter(|row| {
            class_needle
                .as_deref()
                .map_or(true, |needle| contains_ignore_case(&row.class_name, needle))
                && course_needle
                    .as_deref()
                    .map_or(true, |needle| contains_ignore_case(&row.course_name, needle))
                && student_id.map_or(true, |id| row.student_id == id)
        })
        .collect();

    debug!(before, after = filtered.len(), "applied score filter");
    filtered
}

/// Lower-cased needle, or `None` when the value places no constraint.
fn substring_constraint(value: Option<&str>, wildcard: &str) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(wildcard.trim()) {
        return None;
    }
    Some(value.to_lowercase())
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}
