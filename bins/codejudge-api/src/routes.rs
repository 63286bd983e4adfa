//! Route table for the judge API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    let api = Router::new()
        .route("/judge/run", post(handlers::judge_run))
        .route("/judge/submit", post(handlers::judge_submit))
        .route("/run", post(handlers::run_code))
        .route("/problems", get(handlers::list_problems))
        .route("/problems/:id", get(handlers::get_problem))
        .route("/problems/:id/testcases", get(handlers::list_visible_test_cases))
        .route("/health", get(handlers::health_check));

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(handlers::metrics_handler))
}

/// Full application: routes, state, CORS for the browser UI and request spans
pub fn app(state: Arc<AppState>) -> Router {
    routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
