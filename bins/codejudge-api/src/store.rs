//! Problem and test case storage (PostgreSQL)
//!
//! Read-only from the judge's point of view. Test cases always come back in
//! ascending id order so "Case 1" names the same row on every run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use codejudge_common::types::{Difficulty, Example, Problem, ProblemSummary, TestCase};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use serde_json::Value;
use thiserror::Error;
use tokio_postgres::{NoTls, Row};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("query failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("invalid row: {0}")]
    Row(String),
}

#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn list_problems(&self) -> Result<Vec<ProblemSummary>, StoreError>;

    async fn get_problem(&self, id: i64) -> Result<Option<Problem>, StoreError>;

    /// Test cases of a problem by ascending id. Hidden cases are dropped
    /// unless `include_hidden` is set. An unknown problem yields an empty list.
    async fn list_test_cases(
        &self,
        problem_id: i64,
        include_hidden: bool,
    ) -> Result<Vec<TestCase>, StoreError>;

    /// Round-trip to the database, returning its clock
    async fn ping(&self) -> Result<DateTime<Utc>, StoreError>;
}

pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Build the connection pool. Connections are opened lazily.
    pub fn connect(database_url: &str, max_size: usize) -> anyhow::Result<Self> {
        let pg_config: tokio_postgres::Config = database_url.parse()?;
        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager).max_size(max_size).build()?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ProblemStore for PgStore {
    async fn list_problems(&self) -> Result<Vec<ProblemSummary>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id::BIGINT, title, difficulty::TEXT
                 FROM problems
                 ORDER BY id ASC",
                &[],
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<ProblemSummary, StoreError> {
                Ok(ProblemSummary {
                    id: row.try_get(0)?,
                    title: row.try_get(1)?,
                    difficulty: parse_difficulty(&row.try_get::<_, String>(2)?)?,
                })
            })
            .collect()
    }

    async fn get_problem(&self, id: i64) -> Result<Option<Problem>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id::BIGINT, title, description, constraints, difficulty::TEXT, examples
                 FROM problems
                 WHERE id = $1::BIGINT",
                &[&id],
            )
            .await?;

        row.map(|row| problem_from_row(&row)).transpose()
    }

    async fn list_test_cases(
        &self,
        problem_id: i64,
        include_hidden: bool,
    ) -> Result<Vec<TestCase>, StoreError> {
        let client = self.pool.get().await?;
        // to_jsonb keeps JSONB inputs as-is and turns TEXT inputs into strings
        let rows = client
            .query(
                "SELECT id::BIGINT, problem_id::BIGINT, to_jsonb(input),
                        expected_output::TEXT, COALESCE(is_hidden, FALSE)
                 FROM test_cases
                 WHERE problem_id = $1::BIGINT
                   AND ($2::BOOLEAN OR NOT COALESCE(is_hidden, FALSE))
                 ORDER BY id ASC",
                &[&problem_id, &include_hidden],
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<TestCase, StoreError> {
                Ok(TestCase {
                    id: row.try_get(0)?,
                    problem_id: row.try_get(1)?,
                    input: row.try_get::<_, Option<Value>>(2)?.unwrap_or(Value::Null),
                    expected_output: row.try_get::<_, Option<String>>(3)?.unwrap_or_default(),
                    is_hidden: row.try_get(4)?,
                })
            })
            .collect()
    }

    async fn ping(&self) -> Result<DateTime<Utc>, StoreError> {
        let client = self.pool.get().await?;
        let row = client.query_one("SELECT NOW()", &[]).await?;
        Ok(row.try_get(0)?)
    }
}

fn problem_from_row(row: &Row) -> Result<Problem, StoreError> {
    Ok(Problem {
        id: row.try_get(0)?,
        title: row.try_get(1)?,
        description: row.try_get::<_, Option<String>>(2)?.unwrap_or_default(),
        constraints: row.try_get::<_, Option<String>>(3)?.unwrap_or_default(),
        difficulty: parse_difficulty(&row.try_get::<_, String>(4)?)?,
        examples: parse_examples(row.try_get::<_, Option<Value>>(5)?)?,
    })
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, StoreError> {
    Difficulty::parse(raw).ok_or_else(|| StoreError::Row(format!("unknown difficulty {:?}", raw)))
}

fn parse_examples(raw: Option<Value>) -> Result<Vec<Example>, StoreError> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| StoreError::Row(format!("invalid examples: {}", e))),
    }
}
