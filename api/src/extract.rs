//! Custom extractors that convert axum rejections to structured AppError
//! responses. Use `AppJson<T>` instead of `axum::Json<T>` in handlers so a
//! malformed body produces the same JSON error envelope as everything else.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

/// Convert a `JsonRejection` to `AppError::Validation`, pulling a field name
/// out of serde's message when one is present.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field_hint = extract_field_from_serde_message(&body_text);

    AppError::Validation {
        message: format!("Cuerpo de la petición inválido: {body_text}"),
        field: Some(field_hint.unwrap_or_else(|| "body".to_string())),
    }
}

/// Serde errors name the offending field in backticks:
/// "missing field `score`" / "unknown field `foo`".
fn extract_field_from_serde_message(msg: &str) -> Option<String> {
    for pattern in ["missing field `", "unknown field `"] {
        if let Some(start) = msg.find(pattern) {
            let after = &msg[start + pattern.len()..];
            if let Some(end) = after.find('`') {
                return Some(after[..end].to_string());
            }
        }
    }
    None
}
