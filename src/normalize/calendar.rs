//! Google Calendar event → `CalendarEvent`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use super::{format_time_display, local_date, local_midnight, skipped};
use crate::api::calendar::{RawAttendee, RawEvent, RawEventTime};
use crate::error::ServiceError;
use crate::types::{Attendee, CalendarEvent, EventStatus};

/// Google Calendar event palette, keyed by `colorId`.
const EVENT_COLORS: &[(&str, &str)] = &[
    ("1", "#7986cb"),  // Lavender
    ("2", "#33b679"),  // Sage
    ("3", "#8e24aa"),  // Grape
    ("4", "#e67c73"),  // Flamingo
    ("5", "#f6bf26"),  // Banana
    ("6", "#f4511e"),  // Tangerine
    ("7", "#039be5"),  // Peacock
    ("8", "#616161"),  // Graphite
    ("9", "#3f51b5"),  // Blueberry
    ("10", "#0b8043"), // Basil
    ("11", "#d50000"), // Tomato
];
pub const DEFAULT_EVENT_COLOR: &str = "#039be5";

pub fn event_color(color_id: Option<&str>) -> String {
    color_id
        .and_then(|id| EVENT_COLORS.iter().find(|(key, _)| *key == id))
        .map(|(_, hex)| hex.to_string())
        .unwrap_or_else(|| DEFAULT_EVENT_COLOR.to_string())
}

pub fn event_status(status: Option<&str>) -> EventStatus {
    match status {
        Some("confirmed") => EventStatus::Confirmed,
        Some("tentative") => EventStatus::Tentative,
        Some("cancelled") => EventStatus::Cancelled,
        _ => EventStatus::Unknown,
    }
}

/// Parse a start/end value. Returns the instant and whether it was date-only.
fn parse_event_time(value: &RawEventTime, tz: &Tz) -> Option<(DateTime<Utc>, bool)> {
    if let Some(dt) = value.date_time.as_deref().filter(|s| !s.is_empty()) {
        return DateTime::parse_from_rfc3339(dt)
            .ok()
            .map(|dt| (dt.with_timezone(&Utc), false));
    }
    let date = value.date.as_deref().filter(|s| !s.is_empty())?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| (local_midnight(d, tz), true))
}

fn normalize_attendee(raw: &RawAttendee) -> Attendee {
    let name = raw
        .display_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| crate::util::name_from_email(&raw.email));
    Attendee {
        email: raw.email.clone(),
        name,
        response_status: raw
            .response_status
            .clone()
            .unwrap_or_else(|| "needsAction".to_string()),
        is_organizer: raw.organizer.unwrap_or(false),
        is_self: raw.is_self.unwrap_or(false),
    }
}

/// True when the user has declined this event.
pub fn is_declined_by_self(raw: &RawEvent) -> bool {
    raw.attendees
        .iter()
        .any(|a| a.is_self == Some(true) && a.response_status.as_deref() == Some("declined"))
}

/// Normalize one event at the instant `now`.
///
/// All-day events are anchored to local midnight in `tz`; without an explicit
/// end they last until the next local midnight. A timed event without an end
/// is treated as instantaneous.
pub fn normalize_event(
    raw: &RawEvent,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<CalendarEvent, ServiceError> {
    if raw.id.is_empty() {
        return Err(skipped(&raw.id, "missing id"));
    }

    let (start, is_all_day) = raw
        .start
        .as_ref()
        .and_then(|s| parse_event_time(s, tz))
        .ok_or_else(|| skipped(&raw.id, "missing or unparseable start"))?;

    let end = match raw.end.as_ref().and_then(|e| parse_event_time(e, tz)) {
        Some((end, _)) => end,
        None if is_all_day => {
            let next_day = local_date(start, tz) + Duration::days(1);
            local_midnight(next_day, tz)
        }
        None => start,
    };

    if end < start {
        return Err(skipped(&raw.id, "end precedes start"));
    }

    let today = local_date(now, tz);
    let start_day = local_date(start, tz);

    let attendees: Vec<Attendee> = raw
        .attendees
        .iter()
        .filter(|a| a.resource != Some(true) && !a.email.is_empty())
        .map(normalize_attendee)
        .collect();

    let organizer = raw
        .organizer
        .as_ref()
        .map(|o| o.email.clone())
        .unwrap_or_default();

    let title = raw
        .summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("(No title)")
        .to_string();

    let time_label = if is_all_day {
        "All day".to_string()
    } else {
        format!(
            "{} - {}",
            format_time_display(start, tz),
            format_time_display(end, tz)
        )
    };

    Ok(CalendarEvent {
        id: raw.id.clone(),
        title,
        description: raw.description.clone().unwrap_or_default(),
        location: raw.location.clone().unwrap_or_default(),
        start,
        end,
        is_all_day,
        is_today: start_day == today,
        is_tomorrow: Some(start_day) == today.succ_opt(),
        is_past: end <= now,
        is_future: start > now,
        is_ongoing: start <= now && now < end,
        color: event_color(raw.color_id.as_deref()),
        attendees,
        organizer,
        status: event_status(raw.status.as_deref()),
        time_label,
        duration_minutes: (end - start).num_minutes(),
        meeting_link: raw.hangout_link.clone().filter(|l| !l.is_empty()),
    })
}

/// Normalize a batch, dropping cancelled and declined events and skipping
/// malformed ones. Output is ordered by start, then id.
pub fn normalize_events(raw: &[RawEvent], now: DateTime<Utc>, tz: &Tz) -> Vec<CalendarEvent> {
    let mut events: Vec<CalendarEvent> = raw
        .iter()
        .filter(|e| event_status(e.status.as_deref()) != EventStatus::Cancelled)
        .filter(|e| !is_declined_by_self(e))
        .filter_map(|e| match normalize_event(e, now, tz) {
            Ok(event) => Some(event),
            Err(err) => {
                log::debug!("{}", err);
                None
            }
        })
        .collect();
    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    events
}
