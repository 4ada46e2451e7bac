use std::sync::Arc;

use sqlx::PgPool;

use crate::assistant::provider::GroqClient;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// `None` when GROQ_API_KEY is absent; the assistant endpoint answers
    /// 501 in that case and every other route keeps working.
    pub assistant: Option<Arc<GroqClient>>,
    pub clinic_tz: chrono_tz::Tz,
}
