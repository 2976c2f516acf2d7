use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime,
};
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

use crate::error::{AppError, Result};
use crate::models::question::{Choice, Question};
use crate::models::response::{ResponseFilter, ResponseRecord};
use crate::store::ResponseStore;

/// Creates a new database connection pool.
///
/// # Arguments
///
/// * `database_url` - The URL of the PostgreSQL database.
///
/// # Returns
///
/// A `Result` containing the `Pool`.
pub fn create_pool(database_url: &str) -> Result<Pool> {
    let mut cfg = Config::new();
    let pg_config: tokio_postgres::Config = database_url.parse()?;

    if let Some(tokio_postgres::config::Host::Tcp(hostname)) = pg_config.get_hosts().first() {
        cfg.host = Some(hostname.to_string());
    }
    if let Some(port) = pg_config.get_ports().first() {
        cfg.port = Some(*port);
    }

    if let Some(dbname) = pg_config.get_dbname() {
        cfg.dbname = Some(dbname.to_string());
    }

    if let Some(user) = pg_config.get_user() {
        cfg.user = Some(user.to_string());
    }

    if let Some(password) = pg_config.get_password() {
        cfg.password = Some(String::from_utf8_lossy(password).to_string());
    }

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.pool = Some(PoolConfig {
        max_size: 50,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(2)),
            recycle: Some(Duration::from_secs(1)),
        },
        ..PoolConfig::default()
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(AppError::from)
}

/// Postgres-backed response store.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

/// A helper to read one column, mapping failures to a named error.
fn col<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name)
        .map_err(|_| AppError::Internal(format!("missing or invalid column '{name}'")))
}

fn row_to_record(row: &Row) -> Result<ResponseRecord> {
    let answer: String = col(row, "answer")?;
    let answer = Choice::parse(&answer)
        .ok_or_else(|| AppError::Internal(format!("corrupt answer column '{answer}'")))?;
    Ok(ResponseRecord {
        set_id: col(row, "set_id")?,
        question_id: col(row, "question_id")?,
        student: col(row, "student")?,
        answer,
        is_correct: col(row, "is_correct")?,
        timestamp: col(row, "timestamp")?,
    })
}

fn row_to_question(row: &Row) -> Result<Question> {
    let correct: String = col(row, "correct")?;
    Ok(Question {
        id: col(row, "id")?,
        text: col(row, "question")?,
        options: [
            col(row, "option_a")?,
            col(row, "option_b")?,
            col(row, "option_c")?,
            col(row, "option_d")?,
        ],
        // An unparsable correct column defaults to A, like the stored form.
        correct: Choice::parse(&correct).unwrap_or(Choice::A),
    })
}

#[async_trait]
impl ResponseStore for PgStore {
    async fn append_response(&self, record: &ResponseRecord) -> Result<()> {
        let client = self.pool.get().await?;
        let answer = record.answer.as_str();
        client
            .execute(
                r#"
                INSERT INTO responses (set_id, question_id, student, answer, is_correct, timestamp)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
                &[
                    &record.set_id,
                    &record.question_id,
                    &record.student,
                    &answer,
                    &record.is_correct,
                    &record.timestamp,
                ],
            )
            .await?;
        Ok(())
    }

    async fn scan_responses(&self, filter: &ResponseFilter) -> Result<Vec<ResponseRecord>> {
        let client = self.pool.get().await?;

        let mut sql = String::from(
            "SELECT set_id, question_id, student, answer, is_correct, timestamp FROM responses",
        );
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let mut clauses: Vec<String> = Vec::new();

        if let Some(ref set_id) = filter.set_id {
            params.push(set_id);
            clauses.push(format!("set_id = ${}", params.len()));
        }
        if let Some(ref question_id) = filter.question_id {
            params.push(question_id);
            clauses.push(format!("question_id = ${}", params.len()));
        }
        if let Some(ref student) = filter.student {
            params.push(student);
            clauses.push(format!("student = ${}", params.len()));
        }
        if let Some(ref is_correct) = filter.is_correct {
            params.push(is_correct);
            clauses.push(format!("is_correct = ${}", params.len()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY timestamp");

        let rows = client.query(sql.as_str(), &params).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn get_question_set(&self, set_id: &str) -> Result<Option<Vec<Question>>> {
        let client = self.pool.get().await?;

        let exists = client
            .query_opt(
                r#"
                SELECT id
                FROM question_sets
                WHERE id = $1
                "#,
                &[&set_id],
            )
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let rows = client
            .query(
                r#"
                SELECT id, question, option_a, option_b, option_c, option_d, correct
                FROM questions
                WHERE set_id = $1
                ORDER BY idx
                "#,
                &[&set_id],
            )
            .await?;
        let questions = rows
            .iter()
            .map(row_to_question)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(questions))
    }
}
