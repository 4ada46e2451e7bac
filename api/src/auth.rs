use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use uuid::Uuid;

use plato_core::auth::hash_token;
use plato_core::profile::{Profile, Role};

use crate::assistant::prompts;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user resolved from `Authorization: Bearer plato_st_...`.
/// The session lookup also loads the profile, so handlers get role and
/// locale without a second query.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub profile: Profile,
}

fn unauthenticated() -> AppError {
    AppError::Unauthorized {
        message: prompts::MSG_NOT_AUTHENTICATED.to_string(),
    }
}

/// Patient-only surfaces call this before doing anything with side effects;
/// a nutritionist session must stop here, before the quota counter moves.
pub fn require_patient(auth: &AuthenticatedUser) -> Result<(), AppError> {
    if auth.profile.role == Role::Patient {
        return Ok(());
    }
    tracing::info!(
        user_id = %auth.user_id,
        role = ?auth.profile.role,
        decision = "deny",
        "role authorization decision"
    );
    Err(AppError::Forbidden {
        message: prompts::MSG_PATIENTS_ONLY.to_string(),
    })
}

pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn authenticate_session(
    token: &str,
    pool: &sqlx::PgPool,
) -> Result<AuthenticatedUser, AppError> {
    let token_hash = hash_token(token);

    let profile = sqlx::query_as::<_, Profile>(
        "SELECT p.id, p.email, p.role, p.locale, p.full_name \
         FROM sessions s \
         JOIN profiles p ON p.id = s.user_id \
         WHERE s.token_hash = $1 \
           AND s.revoked = FALSE \
           AND s.expires_at > NOW()",
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(unauthenticated)?;

    Ok(AuthenticatedUser {
        user_id: profile.id,
        profile,
    })
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(unauthenticated)?;
        authenticate_session(token, &state.db).await
    }
}

/// `Option<AuthenticatedUser>` for handlers that sequence their own failure
/// order (the assistant validates the payload before reporting 401).
/// Database errors still abort; only auth failures become `None`.
impl OptionalFromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <Self as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Database(err)) => Err(AppError::Database(err)),
            Err(_) => Ok(None),
        }
    }
}
