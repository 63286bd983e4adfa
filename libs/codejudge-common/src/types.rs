use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Languages accepted by the judge.
///
/// The numeric ids are the execution oracle's language ids and never change
/// at runtime; there is no per-deployment language registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Java,
    Python,
    Javascript,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Cpp,
        Language::Java,
        Language::Python,
        Language::Javascript,
    ];

    /// Resolve a wire name ("cpp", "java", "python", "javascript").
    /// Matching is exact: "Python" or "py" are rejected.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "cpp" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            "python" => Some(Language::Python),
            "javascript" => Some(Language::Javascript),
            _ => None,
        }
    }

    /// Language id understood by the execution oracle
    pub fn oracle_id(&self) -> u32 {
        match self {
            Language::Cpp => 54,
            Language::Java => 62,
            Language::Python => 71,
            Language::Javascript => 63,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Cpp => write!(f, "cpp"),
            Language::Java => write!(f, "java"),
            Language::Python => write!(f, "python"),
            Language::Javascript => write!(f, "javascript"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Parse the textual column value stored for a problem
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Illustrative example shown on a problem page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSummary {
    pub id: i64,
    pub title: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub constraints: String,
    pub difficulty: Difficulty,
    pub examples: Vec<Example>,
}

/// A stored test case. `input` keeps the problem-specific shape as JSON and
/// is rendered to stdin only when the case is executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    pub problem_id: i64,
    pub input: Value,
    pub expected_output: String,
    pub is_hidden: bool,
}

/// Judging policy for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeMode {
    /// Visible cases only, every case evaluated
    Run,
    /// All cases, evaluation stops at the first failure
    Submit,
}

impl JudgeMode {
    pub fn include_hidden(&self) -> bool {
        matches!(self, JudgeMode::Submit)
    }

    pub fn fail_fast(&self) -> bool {
        matches!(self, JudgeMode::Submit)
    }
}

impl fmt::Display for JudgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeMode::Run => write!(f, "run"),
            JudgeMode::Submit => write!(f, "submit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JudgeStatus {
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Compile Error")]
    CompileError,
    #[serde(rename = "Runtime Error")]
    RuntimeError,
}

impl fmt::Display for JudgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeStatus::Accepted => write!(f, "Accepted"),
            JudgeStatus::WrongAnswer => write!(f, "Wrong Answer"),
            JudgeStatus::CompileError => write!(f, "Compile Error"),
            JudgeStatus::RuntimeError => write!(f, "Runtime Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub input: Value,
    pub expected: String,
    pub output: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: JudgeStatus,
    pub runtime: String,
    pub cases: Vec<CaseResult>,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        self.status == JudgeStatus::Accepted
    }
}

/// Body of `POST /api/judge/run` and `POST /api/judge/submit`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeRequest {
    pub problem_id: i64,
    pub code: String,
    pub language: Language,
}

/// Body of `POST /api/run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub code: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleStatus {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

/// Raw result of one oracle execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleResult {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub stdout: String,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    /// CPU time in seconds, as reported by the oracle
    #[serde(default)]
    pub time: Option<String>,
    /// Peak memory in kilobytes
    #[serde(default)]
    pub memory: Option<u64>,
    #[serde(default)]
    pub status: Option<OracleStatus>,
}

impl OracleResult {
    /// Compiler diagnostics, if compilation failed
    pub fn compile_error(&self) -> Option<&str> {
        non_blank(self.compile_output.as_deref())
    }

    /// Runtime diagnostics, if the program failed while running.
    ///
    /// Non-blank stderr wins; otherwise an oracle status reporting a time
    /// limit, a signal or a non-zero exit counts, described by the status.
    pub fn runtime_error(&self) -> Option<&str> {
        if let Some(stderr) = non_blank(self.stderr.as_deref()) {
            return Some(stderr);
        }
        match &self.status {
            Some(status) if status.id == 5 || (7..=12).contains(&status.id) => {
                if status.description.is_empty() {
                    Some("Runtime Error")
                } else {
                    Some(status.description.as_str())
                }
            }
            _ => None,
        }
    }

    pub fn time_seconds(&self) -> Option<f64> {
        self.time.as_deref().and_then(|t| t.trim().parse::<f64>().ok())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn empty_if_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
