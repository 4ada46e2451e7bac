use std::future::Future;

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use plato_core::lessons::Lesson;
use plato_core::plan::PlanRecord;

/// Result of the atomic check-and-increment on the daily usage counter.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct QuotaVerdict {
    pub allowed: bool,
    pub new_count: i32,
}

/// Read/write boundary between the pipeline and the backing store. The
/// pipeline is generic over this so tests can count calls and inject
/// failures without a database.
pub trait AssistantStore: Send + Sync {
    /// Increment today's counter for `user_id` and report whether the new
    /// count is still within `max_per_day`. Must be a single indivisible
    /// operation: concurrent requests from one user must not lose updates.
    fn check_and_increment_quota(
        &self,
        user_id: Uuid,
        max_per_day: i32,
    ) -> impl Future<Output = Result<QuotaVerdict, sqlx::Error>> + Send;

    /// Latest plan row for the patient's current week, if any.
    fn plan_for_week(
        &self,
        patient_id: Uuid,
        week_start: NaiveDate,
    ) -> impl Future<Output = Result<Option<PlanRecord>, sqlx::Error>> + Send;

    /// Most recently created published lessons, newest first.
    fn recent_published_lessons(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Lesson>, sqlx::Error>> + Send;
}

#[derive(Clone)]
pub struct PgAssistantStore {
    pool: PgPool,
}

impl PgAssistantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AssistantStore for PgAssistantStore {
    async fn check_and_increment_quota(
        &self,
        user_id: Uuid,
        max_per_day: i32,
    ) -> Result<QuotaVerdict, sqlx::Error> {
        // The SQL function owns atomicity (single upsert statement) and the
        // day-window definition (clinic timezone). See migrations.
        sqlx::query_as::<_, QuotaVerdict>(
            "SELECT allowed, new_count FROM assistant_check_and_increment($1, $2)",
        )
        .bind(user_id)
        .bind(max_per_day)
        .fetch_one(&self.pool)
        .await
    }

    async fn plan_for_week(
        &self,
        patient_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Option<PlanRecord>, sqlx::Error> {
        sqlx::query_as::<_, PlanRecord>(
            "SELECT plan_data, schema_version, status, published_at \
             FROM plans \
             WHERE patient_id = $1 AND week_start = $2 \
             ORDER BY updated_at DESC \
             LIMIT 1",
        )
        .bind(patient_id)
        .bind(week_start)
        .fetch_optional(&self.pool)
        .await
    }

    async fn recent_published_lessons(&self, limit: i64) -> Result<Vec<Lesson>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            "SELECT title_es, body_es, title_eu, body_eu, tags \
             FROM content_lessons \
             WHERE published = TRUE \
             ORDER BY created_at DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
