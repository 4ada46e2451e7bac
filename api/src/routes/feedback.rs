use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use plato_core::error::ApiError;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/feedback/nps", post(submit_nps))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct NpsRequest {
    /// 0..=10
    pub score: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NpsResponse {
    pub ok: bool,
    pub id: Uuid,
}

/// Record an NPS response. Aggregation lives in the `submit_nps_response`
/// SQL function; this handler only validates and forwards.
#[utoipa::path(
    post,
    path = "/v1/feedback/nps",
    request_body = NpsRequest,
    responses(
        (status = 200, description = "Response recorded", body = NpsResponse),
        (status = 400, description = "Score out of range", body = ApiError),
        (status = 401, description = "No authenticated session", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "feedback"
)]
pub async fn submit_nps(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(body): AppJson<NpsRequest>,
) -> Result<Json<NpsResponse>, AppError> {
    let score = body
        .score
        .filter(|score| (0..=10).contains(score))
        .ok_or_else(|| AppError::Validation {
            message: "score invalido".to_string(),
            field: Some("score".to_string()),
        })?;

    let id: Uuid = sqlx::query_scalar("SELECT submit_nps_response($1, $2, $3, $4)")
        .bind(auth.user_id)
        .bind(score)
        .bind(body.comment.unwrap_or_default())
        .bind(body.context.unwrap_or_else(|| serde_json::json!({})))
        .fetch_one(&state.db)
        .await?;

    Ok(Json(NpsResponse { ok: true, id }))
}
