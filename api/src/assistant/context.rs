use chrono::NaiveDate;
use uuid::Uuid;

use plato_core::lessons::Lesson;
use plato_core::plan::PlanRecord;
use plato_core::profile::Locale;

use crate::assistant::store::AssistantStore;

/// At most this many lesson snippets reach the model context.
pub const LESSON_LIMIT: i64 = 5;

/// Everything the completion call knows about the patient's situation.
#[derive(Debug, Clone)]
pub struct AssistantContext {
    pub plan: PlanRecord,
    pub lessons: Vec<Lesson>,
}

/// Fetch plan and lessons, degrading to defaults on any read failure.
/// An absent plan is the normal state for new patients; the assistant must
/// answer (within an empty context) rather than fail the whole request.
pub async fn assemble<S: AssistantStore>(
    store: &S,
    patient_id: Uuid,
    week_start: NaiveDate,
) -> AssistantContext {
    let plan = match store.plan_for_week(patient_id, week_start).await {
        Ok(found) => found.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(patient_id = %patient_id, error = ?err, "plan read failed, using empty plan");
            PlanRecord::default()
        }
    };

    let lessons = match store.recent_published_lessons(LESSON_LIMIT).await {
        Ok(lessons) => lessons,
        Err(err) => {
            tracing::warn!(error = ?err, "lesson read failed, continuing without lessons");
            Vec::new()
        }
    };

    AssistantContext { plan, lessons }
}

/// Render the constrained context block handed to the model as the second
/// system message. Pure function of its inputs; calling it twice with
/// unchanged data yields byte-identical text.
pub fn render(context: &AssistantContext, locale: Locale, week_start: NaiveDate) -> String {
    let lessons_text = if context.lessons.is_empty() {
        "(none)".to_string()
    } else {
        context
            .lessons
            .iter()
            .map(|lesson| {
                let (title, body) = lesson.localized(locale);
                format!("- {title}: {body}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let plan_meta = serde_json::json!({
        "schema_version": context.plan.schema_version,
        "status": context.plan.status,
        "published_at": context.plan.published_at,
    })
    .to_string();

    format!(
        "LOCALE={}\nWEEK_START={}\nPLAN_META={}\nPLAN_JSON={}\nLESSONS:\n{}",
        locale.as_str(),
        week_start,
        plan_meta,
        context.plan.plan_data,
        lessons_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use plato_core::plan::PlanStatus;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    fn lesson(title_es: &str, body_es: &str, title_eu: &str, body_eu: &str) -> Lesson {
        Lesson {
            title_es: title_es.to_string(),
            body_es: body_es.to_string(),
            title_eu: title_eu.to_string(),
            body_eu: body_eu.to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn empty_context_renders_defaults() {
        let context = AssistantContext {
            plan: PlanRecord::default(),
            lessons: Vec::new(),
        };
        let text = render(&context, Locale::Es, monday());

        assert!(text.contains("LOCALE=es"));
        assert!(text.contains("WEEK_START=2024-09-02"));
        assert!(text.contains("PLAN_JSON={}"));
        assert!(text.contains("\"schema_version\":1"));
        assert!(text.contains("\"status\":\"draft\""));
        assert!(text.contains("\"published_at\":null"));
        assert!(text.ends_with("LESSONS:\n(none)"));
    }

    #[test]
    fn lessons_render_as_dashed_lines_in_the_active_locale() {
        let context = AssistantContext {
            plan: PlanRecord::default(),
            lessons: vec![
                lesson("Fibra", "Añade verdura.", "Zuntza", "Barazkiak gehitu."),
                lesson("Agua", "Bebe más.", "Ura", "Edan gehiago."),
            ],
        };

        let es = render(&context, Locale::Es, monday());
        assert!(es.contains("LESSONS:\n- Fibra: Añade verdura.\n- Agua: Bebe más."));

        let eu = render(&context, Locale::Eu, monday());
        assert!(eu.contains("- Zuntza: Barazkiak gehitu."));
        assert!(!eu.contains("Fibra"));
    }

    #[test]
    fn missing_locale_field_renders_empty_without_fallback() {
        let context = AssistantContext {
            plan: PlanRecord::default(),
            lessons: vec![lesson("Fibra", "Añade verdura.", "", "")],
        };
        let eu = render(&context, Locale::Eu, monday());
        assert!(eu.contains("LESSONS:\n- : "));
        assert!(!eu.contains("Fibra"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let context = AssistantContext {
            plan: PlanRecord {
                plan_data: serde_json::json!({"meals": ["desayuno", "comida"]}),
                schema_version: 2,
                status: PlanStatus::Published,
                published_at: chrono::DateTime::parse_from_rfc3339("2024-09-01T10:00:00Z")
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .ok(),
            },
            lessons: vec![lesson("Fibra", "Añade verdura.", "Zuntza", "Barazkiak gehitu.")],
        };

        let first = render(&context, Locale::Es, monday());
        let second = render(&context, Locale::Es, monday());
        assert_eq!(first, second);
    }
}
