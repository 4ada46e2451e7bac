use serde::Serialize;
use utoipa::ToSchema;

/// Structured error response. The `error` field carries the user-facing
/// message (the chat UI renders it verbatim); `code` is the machine-readable
/// classification for clients that branch on error kind.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Human-readable description of what went wrong
    pub error: String,
    /// Machine-readable error code (e.g. "validation_failed", "quota_exceeded")
    pub code: String,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const QUOTA_EXCEEDED: &str = "quota_exceeded";
    pub const NOT_CONFIGURED: &str = "not_configured";
    pub const PROVIDER_ERROR: &str = "provider_error";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const INTERNAL_ERROR: &str = "internal_error";
}
