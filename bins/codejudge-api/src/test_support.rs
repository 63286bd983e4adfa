//! In-memory doubles for the store and the execution oracle

use crate::engine::{ExecutionOracle, ExecutionRequest, OracleError};
use crate::store::{ProblemStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use codejudge_common::types::{
    Difficulty, OracleResult, Problem, ProblemSummary, TestCase,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    pub problems: Vec<Problem>,
    pub test_cases: Vec<TestCase>,
    pub fail: bool,
}

impl MemoryStore {
    pub fn with_cases(test_cases: Vec<TestCase>) -> Self {
        Self {
            problems: vec![sample_problem(1)],
            test_cases,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            Err(StoreError::Row("database unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProblemStore for MemoryStore {
    async fn list_problems(&self) -> Result<Vec<ProblemSummary>, StoreError> {
        self.check()?;
        Ok(self
            .problems
            .iter()
            .map(|p| ProblemSummary {
                id: p.id,
                title: p.title.clone(),
                difficulty: p.difficulty,
            })
            .collect())
    }

    async fn get_problem(&self, id: i64) -> Result<Option<Problem>, StoreError> {
        self.check()?;
        Ok(self.problems.iter().find(|p| p.id == id).cloned())
    }

    async fn list_test_cases(
        &self,
        problem_id: i64,
        include_hidden: bool,
    ) -> Result<Vec<TestCase>, StoreError> {
        self.check()?;
        let mut cases: Vec<TestCase> = self
            .test_cases
            .iter()
            .filter(|c| c.problem_id == problem_id && (include_hidden || !c.is_hidden))
            .cloned()
            .collect();
        cases.sort_by_key(|c| c.id);
        Ok(cases)
    }

    async fn ping(&self) -> Result<DateTime<Utc>, StoreError> {
        self.check()?;
        Ok(Utc::now())
    }
}

/// Oracle that replays scripted results in call order and records every
/// request it receives
#[derive(Default)]
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<Result<OracleResult, OracleError>>>,
    pub stdins: Mutex<Vec<String>>,
    pub language_ids: Mutex<Vec<u32>>,
}

impl ScriptedOracle {
    pub fn new(responses: Vec<Result<OracleResult, OracleError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    /// Every call prints `stdout`, in order
    pub fn printing(outputs: &[&str]) -> Self {
        Self::new(outputs.iter().map(|o| Ok(stdout(o))).collect())
    }

    pub fn calls(&self) -> usize {
        self.stdins.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutionOracle for ScriptedOracle {
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<OracleResult, OracleError> {
        self.stdins.lock().unwrap().push(request.stdin.to_string());
        self.language_ids
            .lock()
            .unwrap()
            .push(request.language.oracle_id());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Network("no scripted response left".to_string())))
    }
}

pub fn stdout(text: &str) -> OracleResult {
    OracleResult {
        stdout: text.to_string(),
        time: Some("0.005".to_string()),
        ..Default::default()
    }
}

pub fn case(id: i64, input: Value, expected: &str, is_hidden: bool) -> TestCase {
    TestCase {
        id,
        problem_id: 1,
        input,
        expected_output: expected.to_string(),
        is_hidden,
    }
}

pub fn sample_problem(id: i64) -> Problem {
    Problem {
        id,
        title: "Two Sum".to_string(),
        description: "Return indices of the two numbers that add up to target.".to_string(),
        constraints: "2 <= nums.length <= 10^4".to_string(),
        difficulty: Difficulty::Easy,
        examples: Vec::new(),
    }
}
