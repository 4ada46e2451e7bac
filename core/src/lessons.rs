use serde::Serialize;
use utoipa::ToSchema;

use crate::profile::Locale;

/// Published educational content snippet, bilingual by column. Only the
/// fields matching the active locale reach the assistant context.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Lesson {
    pub title_es: String,
    pub body_es: String,
    pub title_eu: String,
    pub body_eu: String,
    pub tags: Vec<String>,
}

impl Lesson {
    /// Title/body pair for the given locale. No cross-locale fallback: an
    /// untranslated field renders empty rather than silently switching
    /// language mid-context.
    pub fn localized(&self, locale: Locale) -> (&str, &str) {
        match locale {
            Locale::Es => (&self.title_es, &self.body_es),
            Locale::Eu => (&self.title_eu, &self.body_eu),
        }
    }
}
