mod engine;
mod error;
mod evaluator;
mod executor;
mod handlers;
mod metrics;
mod routes;
mod store;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use codejudge_common::config::{Config, LogFormat};
use engine::{ExecutionOracle, Judge0Engine};
use executor::Judge;
use std::sync::Arc;
use store::{PgStore, ProblemStore};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

pub struct AppState {
    pub judge: Judge,
    pub store: Arc<dyn ProblemStore>,
    pub oracle: Arc<dyn ExecutionOracle>,
}

impl AppState {
    /// Store and oracle are shared by the judge and the handlers that
    /// reach them directly.
    pub fn new(store: Arc<dyn ProblemStore>, oracle: Arc<dyn ExecutionOracle>) -> Self {
        Self {
            judge: Judge::new(store.clone(), oracle.clone()),
            store,
            oracle,
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);

    info!("Codejudge API booting...");

    metrics::register().context("Failed to register metrics")?;

    let store = PgStore::connect(&config.database_url, config.db_pool_size)
        .context("Failed to create database pool")?;
    match store.ping().await {
        Ok(now) => info!(database_time = %now, "Connected to PostgreSQL"),
        Err(e) => warn!(error = %e, "PostgreSQL not reachable yet; requests will retry"),
    }

    let oracle = Judge0Engine::new(
        &config.oracle_url,
        config.oracle_timeout,
        config.oracle_auth_token.clone(),
    )
    .context("Failed to build execution oracle client")?;
    info!(
        oracle_url = %config.oracle_url,
        timeout_secs = config.oracle_timeout.as_secs(),
        "Execution oracle configured"
    );

    let state = Arc::new(AppState::new(Arc::new(store), Arc::new(oracle)));
    let app = routes::app(state);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Codejudge API shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Received shutdown signal, finishing in-flight requests...");
}
