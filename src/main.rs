use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod csv_io;
mod db;
mod engine;
mod error;
mod filter;
mod join;
#[cfg(test)]
mod memory;
mod models;
mod report;
mod stats;
mod store;
mod trend;
mod validate;

use config::AppConfig;
use db::SqliteStore;
use engine::ScoreEngine;
use models::{FilterSpec, TrendSeries};

#[derive(Parser)]
#[command(name = "exam-score-insights")]
#[command(about = "Exam score entry, filtered statistics and trend series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Class name substring (case-insensitive; the wildcard label means any)
    #[arg(long)]
    class: Option<String>,
    /// Course name substring (case-insensitive; the wildcard label means any)
    #[arg(long)]
    course: Option<String>,
    /// Exact student id
    #[arg(long)]
    student: Option<String>,
}

impl From<FilterArgs> for FilterSpec {
    fn from(args: FilterArgs) -> Self {
        FilterSpec {
            class_name: args.class,
            course_name: args.course,
            student_id: args.student,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// List the class and course names available for filtering
    Options,
    /// List courses with their ids
    Courses,
    /// List the students of one class
    Students {
        #[arg(long)]
        class: String,
    },
    /// Show filtered scores with count, mean, max and min
    Scores {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show one student's scores in one course in date order
    Trend {
        #[arg(long)]
        student: String,
        #[arg(long)]
        course: String,
        /// Print the series as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a single score
    Submit {
        #[arg(long)]
        student: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        score: String,
        /// Exam date as YYYY-MM-DD
        #[arg(long, default_value = "")]
        date: String,
    },
    /// Record scores from a CSV file (student_id,course_name,score,exam_date)
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Write filtered scores to a CSV file
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "scores.csv")]
        out: PathBuf,
    },
    /// Generate a markdown report for filtered scores
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;

    let engine = ScoreEngine::with_wildcard(SqliteStore::new(pool), config.wildcard_label);

    match cli.command {
        Commands::InitDb => {
            db::init_db(engine.store().pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(engine.store().pool()).await?;
            println!("Seed data inserted.");
        }
        Commands::Options => {
            let options = engine.filter_options().await?;
            if options.class_names.is_empty() {
                println!("No classes recorded yet.");
            } else {
                println!("Classes: {}", options.class_names.join(", "));
            }
            if options.course_names.is_empty() {
                println!("No courses recorded yet.");
            } else {
                println!("Courses: {}", options.course_names.join(", "));
            }
        }
        Commands::Courses => {
            let courses = engine.courses().await?;
            if courses.is_empty() {
                println!("No courses recorded yet.");
            }
            for course in courses {
                println!("- {} - {}", course.id, course.name);
            }
        }
        Commands::Students { class } => {
            let students = engine.students_in_class(&class).await?;
            if students.is_empty() {
                println!("No students in {class}.");
            }
            for student in students {
                println!("- {} {}", student.id, student.name);
            }
        }
        Commands::Scores { filter, limit } => {
            let spec: FilterSpec = filter.into();
            let rows = engine.apply_filter(&spec).await?;
            if rows.is_empty() {
                println!("No scores match this filter.");
            }
            for row in rows.iter().take(limit) {
                println!(
                    "- {} ({}) {}: {} on {}",
                    row.student_name,
                    row.class_name,
                    row.course_name,
                    row.score,
                    row.exam_date.as_deref().unwrap_or("unknown date")
                );
            }
            let summary = engine.compute_statistics(&rows);
            println!("{}", report::format_summary(summary.as_ref()));
        }
        Commands::Trend {
            student,
            course,
            json,
        } => {
            let series = engine.build_trend_series(&student, &course).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
                return Ok(());
            }

            let axis = series.axis();
            match &series {
                TrendSeries::Points {
                    student_name,
                    course_name,
                    ..
                } => println!(
                    "{} trend for {}:",
                    course_name,
                    student_name.as_deref().unwrap_or(&student)
                ),
                TrendSeries::NoData { course_name, .. } => {
                    println!("{course_name} trend: no valid scores recorded.")
                }
            }
            for point in series.points() {
                println!("- {}: {}", point.timestamp.date(), point.score);
            }
            println!("Axis: {} to {}", axis.start, axis.end);
        }
        Commands::Submit {
            student,
            course,
            score,
            date,
        } => {
            engine.submit_score(&student, &course, &score, &date).await?;
            println!("Score recorded.");
        }
        Commands::Import { csv } => {
            let rows = csv_io::read_batch_file(&csv)?;
            let outcome = engine.submit_batch(&rows).await;
            for (index, err) in &outcome.failures {
                println!("- row {}: {}", index + 1, err);
            }
            println!(
                "Imported {} scores from {} ({} failed).",
                outcome.success_count,
                csv.display(),
                outcome.fail_count
            );
        }
        Commands::Export { filter, out } => {
            let spec: FilterSpec = filter.into();
            let rows = engine.apply_filter(&spec).await?;
            csv_io::write_rows_file(&out, &rows)?;
            println!("Exported {} scores to {}.", rows.len(), out.display());
        }
        Commands::Report { filter, out } => {
            let spec: FilterSpec = filter.into();
            let rows = engine.apply_filter(&spec).await?;
            let label = spec.label();
            let report = report::build_report(label.as_deref(), &rows);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
