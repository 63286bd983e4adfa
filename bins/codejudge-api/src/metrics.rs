//! Prometheus metrics for the judge service

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref JUDGE_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("codejudge_judge_requests_total", "Judge requests by mode"),
        &["mode"]
    )
    .expect("metric can be created");

    pub static ref VERDICTS: IntCounterVec = IntCounterVec::new(
        Opts::new("codejudge_verdicts_total", "Verdicts by mode and status"),
        &["mode", "status"]
    )
    .expect("metric can be created");

    pub static ref ORACLE_CALLS: IntCounterVec = IntCounterVec::new(
        Opts::new("codejudge_oracle_calls_total", "Execution oracle calls by outcome"),
        &["outcome"]
    )
    .expect("metric can be created");

    pub static ref ORACLE_CALL_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("codejudge_oracle_call_seconds", "Execution oracle round-trip time")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0])
    )
    .expect("metric can be created");
}

/// Register all collectors. Called once at startup.
pub fn register() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(JUDGE_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(VERDICTS.clone()))?;
    REGISTRY.register(Box::new(ORACLE_CALLS.clone()))?;
    REGISTRY.register(Box::new(ORACLE_CALL_SECONDS.clone()))?;
    Ok(())
}

/// Render the registry in the Prometheus text format
pub fn render() -> prometheus::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
