//! Per-IP request throttles. Process-local and best-effort only: they do
//! not survive restarts and do not coordinate across instances. The
//! assistant's daily quota is enforced separately by an atomic counter in
//! the database; these layers just blunt bursts.

use axum::http::Response;
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
};

type RateLimitLayer =
    GovernorLayer<SmartIpKeyExtractor, governor::middleware::NoOpMiddleware, axum::body::Body>;

/// POST /v1/assistant/plan: 10 requests per minute per IP.
pub fn assistant_layer() -> RateLimitLayer {
    GovernorLayer::new(
        GovernorConfigBuilder::default()
            .per_second(6)
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("invalid governor config for assistant"),
    )
    .error_handler(json_error_handler)
}

/// POST /v1/telemetry/event: 120 requests per minute per IP.
pub fn telemetry_layer() -> RateLimitLayer {
    GovernorLayer::new(
        GovernorConfigBuilder::default()
            .per_millisecond(500)
            .burst_size(30)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("invalid governor config for telemetry"),
    )
    .error_handler(json_error_handler)
}

/// POST /v1/feedback/nps and /v1/locale: 10 requests per minute per IP.
pub fn forms_layer() -> RateLimitLayer {
    GovernorLayer::new(
        GovernorConfigBuilder::default()
            .per_second(6)
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("invalid governor config for forms"),
    )
    .error_handler(json_error_handler)
}

/// Custom error handler that returns JSON in ApiError format with a
/// Retry-After header.
fn json_error_handler(err: GovernorError) -> Response<axum::body::Body> {
    let (status, retry_after, message) = match err {
        GovernorError::TooManyRequests { wait_time, .. } => (
            axum::http::StatusCode::TOO_MANY_REQUESTS,
            wait_time.to_string(),
            format!("Demasiadas peticiones. Reintenta en {wait_time} segundos."),
        ),
        GovernorError::UnableToExtractKey => (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            String::new(),
            "No se pudo identificar el cliente para limitar peticiones.".to_string(),
        ),
        GovernorError::Other { code, msg, .. } => {
            (code, String::new(), msg.unwrap_or_default().to_string())
        }
    };

    let request_id = uuid::Uuid::now_v7().to_string();
    let body = serde_json::json!({
        "error": message,
        "code": plato_core::error::codes::RATE_LIMITED,
        "request_id": request_id,
    });

    let mut response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    if !retry_after.is_empty() {
        response
            .headers_mut()
            .insert("retry-after", retry_after.parse().unwrap());
    }

    response
}
