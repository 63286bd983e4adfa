//! CLI commands talking to the judge API
use anyhow::{bail, Context, Result};
use codejudge_common::types::{
    JudgeMode, JudgeRequest, Language, OracleResult, ProblemSummary, RunRequest, Verdict,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Judging is synchronous on the server, so allow for many oracle round-trips
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(server: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: server.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base_url))?;
        decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base_url))?;
        decode(response).await
    }
}

/// Decode a success body, or turn the server's `{"error": ...}` body into an error
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .context("Failed to parse server response");
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(text);
    bail!("{} ({})", message, status)
}

fn read_source(path: &Path) -> Result<String> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if source.trim().is_empty() {
        bail!("{} is empty", path.display());
    }
    Ok(source)
}

/// List all problems
pub async fn list_problems(client: &ApiClient) -> Result<()> {
    let problems: Vec<ProblemSummary> = client.get("/problems").await?;
    print!("{}", format_problems(&problems));
    Ok(())
}

/// Judge a source file. Returns whether the verdict was Accepted.
pub async fn judge(
    client: &ApiClient,
    mode: JudgeMode,
    problem_id: i64,
    language: Language,
    file: &Path,
) -> Result<bool> {
    let request = JudgeRequest {
        problem_id,
        code: read_source(file)?,
        language,
    };

    println!("🚀 {} problem {} ({})...", mode_title(mode), problem_id, language);

    let path = match mode {
        JudgeMode::Run => "/judge/run",
        JudgeMode::Submit => "/judge/submit",
    };
    let verdict: Verdict = client.post(path, &request).await?;

    print!("{}", format_verdict(&verdict));
    Ok(verdict.is_accepted())
}

/// Run a source file once with custom stdin. Returns whether the program ran cleanly.
pub async fn exec(
    client: &ApiClient,
    language: Language,
    file: &Path,
    input: Option<&Path>,
) -> Result<bool> {
    let input = match input {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let request = RunRequest {
        code: read_source(file)?,
        language,
        input,
    };
    let result: OracleResult = client.post("/run", &request).await?;

    print!("{}", format_execution(&result));
    Ok(result.compile_error().is_none() && result.runtime_error().is_none())
}

fn mode_title(mode: JudgeMode) -> &'static str {
    match mode {
        JudgeMode::Run => "Running",
        JudgeMode::Submit => "Submitting",
    }
}

fn format_problems(problems: &[ProblemSummary]) -> String {
    if problems.is_empty() {
        return "No problems available.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{:<6} {:<10} {}\n", "Id", "Difficulty", "Title"));
    out.push_str(&format!("{}\n", "─".repeat(60)));
    for problem in problems {
        out.push_str(&format!(
            "{:<6} {:<10} {}\n",
            problem.id,
            format!("{:?}", problem.difficulty),
            problem.title
        ));
    }
    out.push_str(&format!("\n✅ Total: {} problem(s)\n", problems.len()));
    out
}

fn format_verdict(verdict: &Verdict) -> String {
    let mut out = String::new();
    let icon = if verdict.is_accepted() { "✅" } else { "❌" };
    out.push_str(&format!("{} {}  (runtime: {})\n\n", icon, verdict.status, verdict.runtime));

    for (idx, case) in verdict.cases.iter().enumerate() {
        let mark = if case.passed { "✓" } else { "✗" };
        out.push_str(&format!("  Case {} {}\n", idx + 1, mark));
        out.push_str(&format!("    Input:    {}\n", render_input(&case.input)));
        out.push_str(&format!("    Expected: {}\n", case.expected));
        out.push_str(&format!("    Output:   {}\n", case.output));
        if let Some(error) = &case.error {
            out.push_str(&format!("    Error:    {}\n", error.trim_end()));
        }
    }
    out
}

fn format_execution(result: &OracleResult) -> String {
    let mut out = String::new();
    if let Some(diagnostics) = result.compile_error() {
        out.push_str(&format!("❌ Compile Error\n{}\n", diagnostics.trim_end()));
        return out;
    }

    out.push_str(&result.stdout);
    if !result.stdout.is_empty() && !result.stdout.ends_with('\n') {
        out.push('\n');
    }
    if let Some(diagnostics) = result.runtime_error() {
        out.push_str(&format!("❌ Runtime Error\n{}\n", diagnostics.trim_end()));
    }
    if let Some(time) = &result.time {
        out.push_str(&format!("⏱  {} s", time));
        if let Some(memory) = result.memory {
            out.push_str(&format!(", {} KB", memory));
        }
        out.push('\n');
    }
    out
}

/// Show string inputs on one line, escaping newlines
fn render_input(input: &serde_json::Value) -> String {
    match input {
        serde_json::Value::String(text) => text.replace('\n', "\\n"),
        other => other.to_string(),
    }
}
