//! Pure rollups used by the summary builders: trends, previews, grouping.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::normalize::local_date;
use crate::types::{CalendarEvent, DayGroup, MailMessage, Preview, SenderCount, Trend};

/// Compare two counts.
pub fn trend(current: usize, previous: usize) -> Trend {
    match current.cmp(&previous) {
        std::cmp::Ordering::Greater => Trend::Up,
        std::cmp::Ordering::Less => Trend::Down,
        std::cmp::Ordering::Equal => Trend::Stable,
    }
}

/// Compare two measurements; differences within `tolerance` are stable.
pub fn trend_f64(current: f64, previous: f64, tolerance: f64) -> Trend {
    let delta = current - previous;
    if delta > tolerance {
        Trend::Up
    } else if delta < -tolerance {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// The first `limit` items plus the full count.
pub fn preview<T: Clone>(items: &[T], limit: usize) -> Preview<T> {
    preview_of(items, items.len(), limit)
}

/// Like `preview`, for a window the provider reports as larger than the
/// fetched `items`.
pub fn preview_of<T: Clone>(items: &[T], total: usize, limit: usize) -> Preview<T> {
    let total = total.max(items.len());
    Preview {
        items: items.iter().take(limit).cloned().collect(),
        total,
        has_more: total > limit,
    }
}

/// Events in progress at `now`.
pub fn ongoing(events: &[CalendarEvent], now: DateTime<Utc>) -> Vec<CalendarEvent> {
    events
        .iter()
        .filter(|e| e.start <= now && now < e.end)
        .cloned()
        .collect()
}

/// Earliest event that has not started yet.
pub fn next_upcoming(events: &[CalendarEvent], now: DateTime<Utc>) -> Option<CalendarEvent> {
    events
        .iter()
        .filter(|e| e.start > now)
        .min_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)))
        .cloned()
}

/// Bucket events by the local date of their start, days ascending and
/// events by start then id within each day.
pub fn group_by_day(events: &[CalendarEvent], tz: &Tz) -> Vec<DayGroup<CalendarEvent>> {
    let mut days: BTreeMap<chrono::NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    for event in events {
        days.entry(local_date(event.start, tz))
            .or_default()
            .push(event.clone());
    }
    days.into_iter()
        .map(|(date, mut items)| {
            items.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
            DayGroup { date, items }
        })
        .collect()
}

/// Keep the first event for each id.
pub fn dedup_by_id(events: impl IntoIterator<Item = CalendarEvent>) -> Vec<CalendarEvent> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect()
}

/// Most frequent senders, ties broken by name.
pub fn top_senders(messages: &[MailMessage], n: usize) -> Vec<SenderCount> {
    let mut counts: HashMap<String, SenderCount> = HashMap::new();
    for msg in messages {
        let key = msg.from.email.to_lowercase();
        counts
            .entry(key)
            .or_insert_with(|| SenderCount {
                name: msg.from.name.clone(),
                email: msg.from.email.clone(),
                count: 0,
            })
            .count += 1;
    }
    let mut ranked: Vec<SenderCount> = counts.into_values().collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.email.cmp(&b.email))
    });
    ranked.truncate(n);
    ranked
}
