use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use plato_core::error::ApiError;
use plato_core::profile::Locale;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::OkResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/locale", post(set_locale))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LocaleRequest {
    /// "es" or "eu"; anything else coerces to "es"
    pub locale: Option<String>,
}

/// Persist the user's interface language on their profile.
#[utoipa::path(
    post,
    path = "/v1/locale",
    request_body = LocaleRequest,
    responses(
        (status = 200, description = "Locale updated", body = OkResponse),
        (status = 401, description = "No authenticated session", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "profile"
)]
pub async fn set_locale(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(body): AppJson<LocaleRequest>,
) -> Result<Json<OkResponse>, AppError> {
    let locale = Locale::coerce(body.locale.as_deref().unwrap_or_default());

    sqlx::query("UPDATE profiles SET locale = $1 WHERE id = $2")
        .bind(locale)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    Ok(Json(OkResponse { ok: true }))
}
