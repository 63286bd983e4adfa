//! Test Evaluator - Output Normalization and Case Classification
//!
//! **Core Responsibility:**
//! Turn one raw oracle result into a judged case and fold judged cases into
//! a verdict.
//!
//! **Critical Properties:**
//! - Knows nothing about HTTP
//! - Knows nothing about the database
//! - Pure functions: (oracle result, test case) → case result
//!
//! **Normalization Rules:**
//! - Surrounding whitespace is ignored
//! - One or more whitespace-separated non-negative integers are read as an
//!   integer list, so `0 1`, `[0, 1]` and `[0,1]` are the same answer
//! - Anything else that parses as JSON compares by its compact JSON form
//! - Everything else compares as a JSON string literal
//! - Negative numbers and floats never take the integer-list path
use codejudge_common::types::{CaseResult, JudgeStatus, OracleResult, TestCase, Verdict};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref INT_SEQUENCE: Regex = Regex::new(r"^\d+(\s+\d+)*$").expect("valid regex");
}

/// Comparable form of a program output or expected output
#[derive(Debug, Clone)]
pub enum Comparable {
    IntSequence(Vec<u64>),
    Structured(Value),
    Scalar(String),
}

impl Comparable {
    /// Canonical text used for equality
    pub fn canonical(&self) -> String {
        match self {
            Comparable::IntSequence(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!("[{}]", items.join(","))
            }
            Comparable::Structured(value) => value.to_string(),
            Comparable::Scalar(text) => Value::String(text.clone()).to_string(),
        }
    }
}

impl PartialEq for Comparable {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

pub fn normalize(raw: &str) -> Comparable {
    let trimmed = raw.trim();

    if INT_SEQUENCE.is_match(trimmed) {
        let parsed: Result<Vec<u64>, _> =
            trimmed.split_whitespace().map(str::parse::<u64>).collect();
        // Values past u64 fall through to the JSON path
        if let Ok(values) = parsed {
            return Comparable::IntSequence(values);
        }
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Comparable::Structured(value),
        Err(_) => Comparable::Scalar(trimmed.to_string()),
    }
}

pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize(actual) == normalize(expected)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    Passed,
    Failed,
    CompileError,
    RuntimeError,
}

impl CaseStatus {
    /// Compile and runtime errors end evaluation under every policy
    pub fn is_error(&self) -> bool {
        matches!(self, CaseStatus::CompileError | CaseStatus::RuntimeError)
    }
}

#[derive(Debug, Clone)]
pub struct EvaluatedCase {
    pub status: CaseStatus,
    pub result: CaseResult,
    pub time_seconds: Option<f64>,
}

/// Judge one case. Priority: compile error, then runtime error, then
/// normalized output comparison.
pub fn evaluate_case(test_case: &TestCase, output: &OracleResult) -> EvaluatedCase {
    let (status, error) = if let Some(diagnostics) = output.compile_error() {
        (CaseStatus::CompileError, Some(diagnostics.to_string()))
    } else if let Some(diagnostics) = output.runtime_error() {
        (CaseStatus::RuntimeError, Some(diagnostics.to_string()))
    } else if outputs_match(&output.stdout, &test_case.expected_output) {
        (CaseStatus::Passed, None)
    } else {
        (CaseStatus::Failed, None)
    };

    EvaluatedCase {
        status,
        result: CaseResult {
            input: test_case.input.clone(),
            expected: test_case.expected_output.clone(),
            output: output.stdout.trim_end().to_string(),
            passed: status == CaseStatus::Passed,
            error,
        },
        time_seconds: output.time_seconds(),
    }
}

/// Fold evaluated cases into the final verdict.
///
/// An error case decides the status outright; otherwise the verdict is
/// Accepted only when every evaluated case passed.
pub fn aggregate(cases: Vec<EvaluatedCase>) -> Verdict {
    let status = if cases.iter().any(|c| c.status == CaseStatus::CompileError) {
        JudgeStatus::CompileError
    } else if cases.iter().any(|c| c.status == CaseStatus::RuntimeError) {
        JudgeStatus::RuntimeError
    } else if !cases.is_empty() && cases.iter().all(|c| c.status == CaseStatus::Passed) {
        JudgeStatus::Accepted
    } else {
        JudgeStatus::WrongAnswer
    };

    let times: Vec<f64> = cases.iter().filter_map(|c| c.time_seconds).collect();
    let runtime = if times.is_empty() {
        "N/A".to_string()
    } else {
        format!("{:.3} s", times.iter().sum::<f64>())
    };

    Verdict {
        status,
        runtime,
        cases: cases.into_iter().map(|c| c.result).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_case(expected: &str) -> TestCase {
        TestCase {
            id: 1,
            problem_id: 1,
            input: json!("2 7 11 15\n9"),
            expected_output: expected.to_string(),
            is_hidden: false,
        }
    }

    fn make_output(stdout: &str) -> OracleResult {
        OracleResult {
            stdout: stdout.to_string(),
            time: Some("0.010".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_space_separated_matches_list() {
        assert!(outputs_match("0 1", "[0,1]"));
        assert!(outputs_match("0 1\n", "[0, 1]"));
        assert!(outputs_match("  0   1 ", "0 1"));
        assert!(outputs_match("0\n1", "[0,1]"));
        assert_eq!(normalize("0 1").canonical(), "[0,1]");
    }

    #[test]
    fn test_order_matters() {
        assert!(!outputs_match("1 0", "0 1"));
        assert!(!outputs_match("1 0", "[0,1]"));
    }

    #[test]
    fn test_single_integer_is_a_sequence() {
        assert_eq!(normalize("42").canonical(), "[42]");
        assert!(outputs_match("42\n", "42"));
    }

    #[test]
    fn test_negative_numbers_skip_integer_path() {
        assert!(matches!(normalize("-1 2"), Comparable::Scalar(_)));
        assert!(matches!(normalize("-1"), Comparable::Structured(_)));
        assert!(!outputs_match("-1 2", "[-1,2]"));
        assert!(outputs_match("[-1, 2]", "[-1,2]"));
    }

    #[test]
    fn test_floats_compare_structurally() {
        assert!(matches!(normalize("1.5"), Comparable::Structured(_)));
        assert!(outputs_match(" 1.5 ", "1.5"));
    }

    #[test]
    fn test_json_values_compare_structurally() {
        assert!(outputs_match("[[1, 2], [3]]", "[[1,2],[3]]"));
        assert!(outputs_match("true", " true\n"));
        assert!(outputs_match("{\"a\": 1}", "{\"a\":1}"));
    }

    #[test]
    fn test_plain_text_falls_back_to_string() {
        let normalized = normalize("  hello world \n");
        assert!(matches!(normalized, Comparable::Scalar(_)));
        assert_eq!(normalized.canonical(), "\"hello world\"");
        assert!(outputs_match("hello world", "hello world\n"));
        assert!(!outputs_match("Hello", "hello"));
    }

    #[test]
    fn test_quoted_string_equals_bare_string() {
        assert!(outputs_match("\"abc\"", "abc"));
    }

    #[test]
    fn test_huge_integers_fall_through() {
        let normalized = normalize("184467440737095516160");
        assert!(matches!(normalized, Comparable::Structured(_)));
    }

    #[test]
    fn test_empty_output() {
        assert!(outputs_match("", "   \n"));
        assert!(!outputs_match("", "0"));
    }

    #[test]
    fn test_evaluate_case_pass() {
        let case = make_case("0 1");
        let evaluated = evaluate_case(&case, &make_output("[0, 1]\n"));
        assert_eq!(evaluated.status, CaseStatus::Passed);
        assert!(evaluated.result.passed);
        assert_eq!(evaluated.result.output, "[0, 1]");
        assert_eq!(evaluated.result.error, None);
    }

    #[test]
    fn test_evaluate_case_mismatch() {
        let case = make_case("0 1");
        let evaluated = evaluate_case(&case, &make_output("1 0"));
        assert_eq!(evaluated.status, CaseStatus::Failed);
        assert!(!evaluated.result.passed);
    }

    #[test]
    fn test_compile_error_beats_everything() {
        let case = make_case("0 1");
        let output = OracleResult {
            stdout: "0 1".to_string(),
            stderr: Some("warning".to_string()),
            compile_output: Some("main.cpp:1: error: expected ';'".to_string()),
            ..Default::default()
        };
        let evaluated = evaluate_case(&case, &output);
        assert_eq!(evaluated.status, CaseStatus::CompileError);
        assert_eq!(
            evaluated.result.error.as_deref(),
            Some("main.cpp:1: error: expected ';'")
        );
        assert!(!evaluated.result.passed);
    }

    #[test]
    fn test_stderr_is_runtime_error() {
        let case = make_case("0 1");
        let output = OracleResult {
            stdout: "0 1".to_string(),
            stderr: Some("Traceback: ZeroDivisionError".to_string()),
            ..Default::default()
        };
        let evaluated = evaluate_case(&case, &output);
        assert_eq!(evaluated.status, CaseStatus::RuntimeError);
        assert!(!evaluated.result.passed);
    }

    #[test]
    fn test_aggregate_all_passed() {
        let case = make_case("1");
        let verdict = aggregate(vec![
            evaluate_case(&case, &make_output("1")),
            evaluate_case(&case, &make_output("1")),
        ]);
        assert_eq!(verdict.status, JudgeStatus::Accepted);
        assert_eq!(verdict.cases.len(), 2);
        assert_eq!(verdict.runtime, "0.020 s");
    }

    #[test]
    fn test_aggregate_any_failure_is_wrong_answer() {
        let case = make_case("1");
        let verdict = aggregate(vec![
            evaluate_case(&case, &make_output("1")),
            evaluate_case(&case, &make_output("2")),
            evaluate_case(&case, &make_output("1")),
        ]);
        assert_eq!(verdict.status, JudgeStatus::WrongAnswer);
        assert_eq!(verdict.cases.len(), 3);
    }

    #[test]
    fn test_aggregate_error_status_wins() {
        let case = make_case("1");
        let crashed = OracleResult {
            stderr: Some("segfault".to_string()),
            ..Default::default()
        };
        let verdict = aggregate(vec![
            evaluate_case(&case, &make_output("2")),
            evaluate_case(&case, &crashed),
        ]);
        assert_eq!(verdict.status, JudgeStatus::RuntimeError);
    }

    #[test]
    fn test_aggregate_empty_is_never_accepted() {
        let verdict = aggregate(Vec::new());
        assert_ne!(verdict.status, JudgeStatus::Accepted);
        assert_eq!(verdict.runtime, "N/A");
    }

    #[test]
    fn test_runtime_not_reported() {
        let case = make_case("1");
        let output = OracleResult {
            stdout: "1".to_string(),
            ..Default::default()
        };
        let verdict = aggregate(vec![evaluate_case(&case, &output)]);
        assert_eq!(verdict.runtime, "N/A");
    }
}
