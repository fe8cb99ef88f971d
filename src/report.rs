use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{CourseSummary, JoinedRow, ScoreSummary};
use crate::stats;

pub fn summarize_by_course(rows: &[JoinedRow]) -> Vec<CourseSummary> {
    let mut grouped: BTreeMap<&str, Vec<&JoinedRow>> = BTreeMap::new();

    for row in rows {
        grouped.entry(row.course_name.as_str()).or_default().push(row);
    }

    let mut summaries: Vec<CourseSummary> = grouped
        .into_iter()
        .map(|(course_name, course_rows)| CourseSummary {
            course_name: course_name.to_string(),
            summary: stats::compute_statistics(course_rows),
        })
        .collect();

    summaries.sort_by(|a, b| {
        let count = |s: &CourseSummary| s.summary.as_ref().map_or(0, |v| v.count);
        count(b).cmp(&count(a))
    });
    summaries
}

/// Renders the summary the way the statistics screen shows it, with `--` for
/// every figure when nothing valid was found.
pub fn format_summary(summary: Option<&ScoreSummary>) -> String {
    match summary {
        Some(s) => format!(
            "count {} | mean {:.1} | max {} | min {}",
            s.count, s.mean, s.max, s.min
        ),
        None => "count -- | mean -- | max -- | min --".to_string(),
    }
}

pub fn build_report(filter_label: Option<&str>, rows: &[JoinedRow]) -> String {
    let overall = stats::compute_statistics(rows);
    let courses = summarize_by_course(rows);

    let mut output = String::new();
    let label = filter_label.unwrap_or("all classes and courses");

    let _ = writeln!(output, "# Exam Score Report");
    let _ = writeln!(output, "Generated for {} ({} scores)", label, rows.len());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "{}", format_summary(overall.as_ref()));

    let _ = writeln!(output);
    let _ = writeln!(output, "## By Course");

    if courses.is_empty() {
        let _ = writeln!(output, "No scores recorded for this selection.");
    } else {
        for course in courses.iter() {
            let _ = writeln!(
                output,
                "- {}: {}",
                course.course_name,
                format_summary(course.summary.as_ref())
            );
        }
    }

    let mut recent = rows.to_vec();
    recent.sort_by(|a, b| b.parsed_exam_date().cmp(&a.parsed_exam_date()));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Exams");

    if recent.is_empty() {
        let _ = writeln!(output, "No scores recorded for this selection.");
    } else {
        for row in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}) {} on {}: {}",
                row.student_name,
                row.class_name,
                row.course_name,
                row.exam_date.as_deref().unwrap_or("unknown date"),
                row.score
            );
        }
    }

    output
}
