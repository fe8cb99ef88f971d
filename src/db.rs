use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Course, NewScoreEntry, ScoreEntry, Student};
use crate::store::{RecordStore, ScoreEntryQuery};

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &SqlitePool) -> Result<(), StoreError> {
    let students = vec![
        ("2024001", "Li Wei", "Class A"),
        ("2024002", "Zhang Min", "Class A"),
        ("2024003", "Wang Fang", "Class B"),
        ("2024004", "Chen Jie", "Class B"),
    ];

    for (id, name, class_name) in students {
        sqlx::query(
            r#"
            INSERT INTO students (student_id, student_name, class_name)
            VALUES (?, ?, ?)
            ON CONFLICT (student_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(class_name)
        .execute(pool)
        .await?;
    }

    let courses = vec![(1_i64, "Math"), (2, "English"), (3, "Physics")];

    for (id, name) in courses {
        sqlx::query(
            r#"
            INSERT INTO courses (course_id, course_name)
            VALUES (?, ?)
            ON CONFLICT (course_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let scores = vec![
        ("2024001", 1_i64, 92.0_f64, "2024-03-01"),
        ("2024001", 1, 88.0, "2024-04-01"),
        ("2024001", 2, 79.5, "2024-03-05"),
        ("2024002", 1, 67.0, "2024-03-01"),
        ("2024002", 3, 74.0, "2024-03-12"),
        ("2024003", 1, 85.5, "2024-03-01"),
        ("2024003", 2, 91.0, "2024-03-05"),
        ("2024004", 3, 58.0, "2024-03-12"),
        ("2024004", 3, 66.0, "2024-04-12"),
    ];

    for (student_id, course_id, score, exam_date) in scores {
        sqlx::query(
            r#"
            INSERT INTO scores (score_id, student_id, course_id, score, exam_date)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (student_id, course_id, exam_date) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(student_id)
        .bind(course_id)
        .bind(score)
        .bind(exam_date)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// SQLite-backed record store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn student_from_row(row: &SqliteRow) -> Student {
    Student {
        id: row.get("student_id"),
        name: row.get("student_name"),
        class_name: row
            .get::<Option<String>, _>("class_name")
            .unwrap_or_default(),
    }
}

fn course_from_row(row: &SqliteRow) -> Course {
    Course {
        id: row.get("course_id"),
        name: row.get("course_name"),
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Constraint(db_err.message().to_string())
        }
        other => StoreError::Database(other),
    }
}

impl RecordStore for SqliteStore {
    async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        let rows = sqlx::query(
            "SELECT student_id, student_name, class_name FROM students ORDER BY student_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(student_from_row).collect())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        let rows = sqlx::query("SELECT course_id, course_name FROM courses ORDER BY course_id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(course_from_row).collect())
    }

    async fn find_course_by_name(&self, name: &str) -> Result<Option<Course>, StoreError> {
        let row = sqlx::query("SELECT course_id, course_name FROM courses WHERE course_name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(course_from_row))
    }

    async fn list_score_entries(
        &self,
        query: &ScoreEntryQuery,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let mut sql = String::from(
            "SELECT score_id, student_id, course_id, score, exam_date FROM scores WHERE 1 = 1",
        );

        if query.student_id.is_some() {
            sql.push_str(" AND student_id = ?");
        }
        if query.course_id.is_some() {
            sql.push_str(" AND course_id = ?");
        }
        sql.push_str(" ORDER BY rowid");

        let mut rows = sqlx::query(&sql);
        if let Some(value) = query.student_id.as_deref() {
            rows = rows.bind(value);
        }
        if let Some(value) = query.course_id {
            rows = rows.bind(value);
        }

        let records = rows.fetch_all(&self.pool).await?;
        let mut entries = Vec::with_capacity(records.len());
        let mut unreadable = 0usize;

        for row in records {
            // Externally written rows may hold text where a number or date belongs.
            let score = match row.try_get::<f64, _>("score") {
                Ok(value) => value,
                Err(sqlx::Error::ColumnDecode { .. }) => {
                    unreadable += 1;
                    f64::NAN
                }
                Err(err) => return Err(err.into()),
            };
            let exam_date = match row.try_get::<Option<String>, _>("exam_date") {
                Ok(value) => value,
                Err(sqlx::Error::ColumnDecode { .. }) => None,
                Err(err) => return Err(err.into()),
            };

            entries.push(ScoreEntry {
                id: row.try_get("score_id")?,
                student_id: row.try_get("student_id")?,
                course_id: row.try_get("course_id")?,
                score,
                exam_date,
            });
        }

        if unreadable > 0 {
            warn!(unreadable, "score rows with non-numeric values");
        }

        Ok(entries)
    }

    async fn score_entry_exists(
        &self,
        student_id: &str,
        course_id: i64,
        exam_date: Option<&str>,
    ) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query(
            "SELECT COUNT(*) AS n FROM scores \
             WHERE student_id = ? AND course_id = ? AND exam_date IS ?",
        )
        .bind(student_id)
        .bind(course_id)
        .bind(exam_date)
        .fetch_one(&self.pool)
        .await?
        .get("n");

        Ok(count > 0)
    }

    async fn create_score_entry(&self, entry: &NewScoreEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO scores (score_id, student_id, course_id, score, exam_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&entry.student_id)
        .bind(entry.course_id)
        .bind(entry.score)
        .bind(entry.exam_date.as_deref())
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }
}
