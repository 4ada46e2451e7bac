use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use plato_core::error::ApiError;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::OkResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/telemetry/event", post(record_event))
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRequest {
    /// Free-form event name, e.g. "checkin.completed"
    pub event_name: Option<String>,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

/// Store one engagement event tagged with the caller's role.
#[utoipa::path(
    post,
    path = "/v1/telemetry/event",
    request_body = TelemetryRequest,
    responses(
        (status = 200, description = "Event recorded", body = OkResponse),
        (status = 400, description = "Missing event name", body = ApiError),
        (status = 401, description = "No authenticated session", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "telemetry"
)]
pub async fn record_event(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(body): AppJson<TelemetryRequest>,
) -> Result<Json<OkResponse>, AppError> {
    let event_name = body
        .event_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::Validation {
            message: "eventName requerido".to_string(),
            field: Some("eventName".to_string()),
        })?;

    sqlx::query(
        "INSERT INTO engagement_events (user_id, role, event_name, context) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(auth.user_id)
    .bind(auth.profile.role)
    .bind(event_name)
    .bind(body.context.unwrap_or_else(|| serde_json::json!({})))
    .execute(&state.db)
    .await?;

    Ok(Json(OkResponse { ok: true }))
}
