use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "plan_status", rename_all = "lowercase")]
pub enum PlanStatus {
    Draft,
    Published,
}

/// Read-only projection of a patient's weekly plan as the assistant sees it.
/// `plan_data` is an opaque blob owned by the plan editor; it is passed
/// through to the model verbatim, never interpreted here.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct PlanRecord {
    pub plan_data: serde_json::Value,
    pub schema_version: i32,
    pub status: PlanStatus,
    pub published_at: Option<DateTime<Utc>>,
}

impl Default for PlanRecord {
    /// Substitute used when no plan exists for the week. New patients hit
    /// this path on every message until their first plan lands.
    fn default() -> Self {
        PlanRecord {
            plan_data: serde_json::Value::Object(serde_json::Map::new()),
            schema_version: 1,
            status: PlanStatus::Draft,
            published_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_is_an_empty_draft() {
        let plan = PlanRecord::default();
        assert_eq!(plan.plan_data, serde_json::json!({}));
        assert_eq!(plan.schema_version, 1);
        assert_eq!(plan.status, PlanStatus::Draft);
        assert!(plan.published_at.is_none());
    }
}
