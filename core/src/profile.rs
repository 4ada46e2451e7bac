use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Interface language for a user. The platform ships Spanish and Basque;
/// adding a locale means adding a variant here plus its prompt/copy entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "locale_code", rename_all = "lowercase")]
pub enum Locale {
    Es,
    Eu,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::Eu => "eu",
        }
    }

    /// Lenient parse used by the locale endpoint: anything that is not
    /// exactly `"eu"` coerces to Spanish.
    pub fn coerce(raw: &str) -> Self {
        if raw == "eu" { Locale::Eu } else { Locale::Es }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::Es
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Patient,
    Nutri,
}

/// Profile row as read by the auth extractor. One per user, created at
/// signup by the onboarding flow.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub locale: Locale,
    pub full_name: Option<String>,
}
