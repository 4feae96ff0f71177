//! Health check endpoint.

use axum::extract::State;
use axum::response::Json;
use axum::{Router, routing::get};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
}

/// Report process and database health.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = db::check_health(state.db()).await;

    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}
