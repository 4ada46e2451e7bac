use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// The product serves a single clinic; "today" and the quota day window are
/// anchored to its timezone, not the server's.
pub const DEFAULT_CLINIC_TZ: Tz = chrono_tz::Europe::Madrid;

/// Clinic timezone from `PLATO_CLINIC_TZ`, falling back to Madrid on a
/// missing or unparseable value.
pub fn clinic_tz_from_env() -> Tz {
    match std::env::var("PLATO_CLINIC_TZ") {
        Ok(name) => name.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value = %name, "PLATO_CLINIC_TZ is not a valid timezone, using default");
            DEFAULT_CLINIC_TZ
        }),
        Err(_) => DEFAULT_CLINIC_TZ,
    }
}

/// Monday of the week containing `date`.
pub fn week_start_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday of the current week, as seen from the clinic's wall clock.
pub fn current_week_start(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    week_start_monday(now.with_timezone(&tz).date_naive())
}
