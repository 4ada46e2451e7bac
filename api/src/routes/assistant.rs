use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use plato_core::error::ApiError;

use crate::assistant::provider::CompletionProvider;
use crate::assistant::store::{AssistantStore, PgAssistantStore};
use crate::assistant::{self, AssistantRequest, Outcome, PipelineError, prompts, week};
use crate::auth::{AuthenticatedUser, require_patient};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/assistant/plan", post(plan_assistant))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AssistantRequestBody {
    /// Raw user message; trimmed server-side, must be non-empty
    pub message: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AssistantAnswer {
    /// Model answer or canned moderation refusal — same shape either way
    pub answer: String,
}

/// Moderated plan-assistant endpoint.
///
/// Guard refusals come back as plain 200 answers; the chat UI renders them
/// like any other reply.
#[utoipa::path(
    post,
    path = "/v1/assistant/plan",
    request_body = AssistantRequestBody,
    responses(
        (status = 200, description = "Answer or moderation refusal", body = AssistantAnswer),
        (status = 400, description = "Empty message", body = ApiError),
        (status = 401, description = "No authenticated session", body = ApiError),
        (status = 403, description = "Caller is not a patient", body = ApiError),
        (status = 429, description = "Daily assistant quota exhausted", body = ApiError),
        (status = 500, description = "Store or provider failure", body = ApiError),
        (status = 501, description = "Assistant provider not configured", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "assistant"
)]
pub async fn plan_assistant(
    State(state): State<AppState>,
    auth: Option<AuthenticatedUser>,
    body: Result<AppJson<AssistantRequestBody>, AppError>,
) -> Result<Json<AssistantAnswer>, AppError> {
    let store = PgAssistantStore::new(state.db.clone());
    let answer = handle(
        state.assistant.as_deref(),
        &store,
        state.clinic_tz,
        auth,
        body.map(|AppJson(body)| body),
    )
    .await?;
    Ok(Json(answer))
}

/// Failure order is fixed: unconfigured (501), bad or empty payload (400),
/// no session (401), non-patient (403), then the pipeline (429 on quota,
/// 500 on dependency failure). The body arrives as a `Result` so an
/// unconfigured deployment answers 501 even to a malformed payload, and the
/// role gate sits before the pipeline so non-patients never touch the quota
/// counter.
async fn handle<S, P>(
    provider: Option<&P>,
    store: &S,
    clinic_tz: chrono_tz::Tz,
    auth: Option<AuthenticatedUser>,
    body: Result<AssistantRequestBody, AppError>,
) -> Result<AssistantAnswer, AppError>
where
    S: AssistantStore,
    P: CompletionProvider,
{
    let Some(provider) = provider else {
        return Err(AppError::NotConfigured {
            message: prompts::MSG_NOT_CONFIGURED.to_string(),
        });
    };

    let body = body?;
    let message = body
        .message
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .ok_or_else(|| AppError::Validation {
            message: prompts::MSG_EMPTY_MESSAGE.to_string(),
            field: Some("message".to_string()),
        })?;

    let auth = auth.ok_or_else(|| AppError::Unauthorized {
        message: prompts::MSG_NOT_AUTHENTICATED.to_string(),
    })?;
    require_patient(&auth)?;

    let request = AssistantRequest {
        user_id: auth.user_id,
        locale: auth.profile.locale,
        week_start: week::current_week_start(Utc::now(), clinic_tz),
        message: message.to_string(),
    };

    match assistant::run(store, provider, &request).await {
        Ok(Outcome::Answer(answer)) => Ok(AssistantAnswer { answer }),
        Ok(Outcome::Refused(purpose)) => Ok(AssistantAnswer {
            answer: purpose.refusal().to_string(),
        }),
        Err(PipelineError::QuotaExceeded) => Err(AppError::QuotaExceeded {
            message: prompts::MSG_QUOTA_EXHAUSTED.to_string(),
        }),
        Err(PipelineError::QuotaStore(err)) => Err(AppError::Database(err)),
        Err(PipelineError::Guard(err)) | Err(PipelineError::Completion(err)) => {
            Err(AppError::Provider(err.to_string()))
        }
    }
}
