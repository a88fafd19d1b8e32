//! Response normalizers: provider payload in, stable record out.
//!
//! All functions here are pure. "Now"-relative fields take the evaluation
//! instant as an argument, so the same payload at the same instant always
//! yields the same record. A record that cannot be normalized is reported as
//! `ServiceError::NormalizationSkipped` and dropped by the batch callers.

pub mod calendar;
pub mod mail;
pub mod radio;
pub mod weather;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ServiceError;

pub(crate) fn skipped(id: &str, reason: impl Into<String>) -> ServiceError {
    ServiceError::NormalizationSkipped {
        id: if id.is_empty() {
            "<unknown>".to_string()
        } else {
            id.to_string()
        },
        reason: reason.into(),
    }
}

/// Midnight at the start of `date` in `tz`, as UTC.
///
/// Where a DST transition skips midnight, the first valid instant after it is
/// used.
pub fn local_midnight(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    let mut candidate = naive;
    for _ in 0..4 {
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return dt.with_timezone(&Utc);
        }
        candidate += Duration::minutes(30);
    }
    Utc.from_utc_datetime(&naive)
}

/// Local calendar date of `instant` in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Format a UTC datetime as "9:00 AM" in the given zone.
pub fn format_time_display(dt: DateTime<Utc>, tz: &Tz) -> String {
    dt.with_timezone(tz).format("%-I:%M %p").to_string()
}
