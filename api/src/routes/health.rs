use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Backing store reachable
    pub db: bool,
    /// Plan assistant enabled (provider credentials present)
    pub assistant: bool,
}

/// Only the store gates the overall status: a missing provider key is a
/// configuration state the assistant endpoint already reports as 501, not
/// an outage.
fn overall_status(db_ok: bool) -> (StatusCode, &'static str) {
    if db_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degradado")
    }
}

/// Liveness check: pings the store and reports whether the plan assistant
/// is configured.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Backing store unreachable", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    let (http_status, status) = overall_status(db_ok);
    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            db: db_ok,
            assistant: state.assistant.is_some(),
        }),
    )
}
