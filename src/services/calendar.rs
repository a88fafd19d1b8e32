// Calendar service
// Windowed event queries, the week grouped by day, and the calendar widget
// summary.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use super::{cached, degrade};
use crate::api::calendar::{CalendarSource, EventQuery, RawEvent};
use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::normalize::calendar::normalize_events;
use crate::normalize::{local_date, local_midnight};
use crate::rollup;
use crate::types::{CalendarEvent, CalendarSummary, Credentials, DayGroup};

const DAY_MAX_RESULTS: u32 = 50;
const WEEK_MAX_RESULTS: u32 = 250;
const WEEK_DAYS: i64 = 7;

/// Which slice of the calendar to list. Day boundaries are local midnights in
/// the configured zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Today,
    Tomorrow,
    /// Today plus the following six days
    Week,
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl TimeWindow {
    pub fn query(&self, now: DateTime<Utc>, tz: &Tz) -> EventQuery {
        let today = local_date(now, tz);
        let day = |offset: i64| local_midnight(today + Duration::days(offset), tz);
        let (time_min, time_max, max_results) = match *self {
            TimeWindow::Today => (day(0), day(1), DAY_MAX_RESULTS),
            TimeWindow::Tomorrow => (day(1), day(2), DAY_MAX_RESULTS),
            TimeWindow::Week => (day(0), day(WEEK_DAYS), WEEK_MAX_RESULTS),
            TimeWindow::Range { start, end } => (start, end, WEEK_MAX_RESULTS),
        };
        EventQuery {
            time_min,
            time_max,
            max_results,
        }
    }
}

pub struct CalendarService {
    source: Arc<dyn CalendarSource>,
    /// Raw listings; flags are derived at read time so they follow the clock
    cache: TtlCache<Vec<RawEvent>>,
    clock: Arc<dyn Clock>,
    tz: Tz,
    preview_limit: usize,
}

impl CalendarService {
    pub fn new(
        source: Arc<dyn CalendarSource>,
        clock: Arc<dyn Clock>,
        tz: Tz,
        ttl_secs: u64,
        preview_limit: usize,
    ) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl_secs, clock.clone()),
            clock,
            tz,
            preview_limit,
        }
    }

    /// Normalized events in `window`, ordered by start.
    pub async fn get_events(
        &self,
        credentials: &Credentials,
        window: TimeWindow,
    ) -> Result<Vec<CalendarEvent>, ServiceError> {
        self.events_at(credentials, window, self.clock.now()).await
    }

    async fn events_at(
        &self,
        credentials: &Credentials,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, ServiceError> {
        let query = window.query(now, &self.tz);
        if query.time_max <= query.time_min {
            return Ok(Vec::new());
        }
        let token = credentials.access_token.as_str();
        let raw = cached(&self.cache, query.cache_key(token), || {
            self.source.list_events(token, &query)
        })
        .await?;
        Ok(normalize_events(&raw, now, &self.tz))
    }

    /// The week's events bucketed by local day.
    pub async fn get_events_by_day(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<DayGroup<CalendarEvent>>, ServiceError> {
        let events = self.get_events(credentials, TimeWindow::Week).await?;
        Ok(rollup::group_by_day(&events, &self.tz))
    }

    /// Calendar widget summary. Never fails; see `CalendarSummary::degraded`.
    pub async fn get_summary(&self, credentials: &Credentials) -> CalendarSummary {
        let now = self.clock.now();
        match self.build_summary(credentials, now).await {
            Ok(summary) => summary,
            Err(err) => CalendarSummary::empty(now, Some(degrade("calendar", &err, now))),
        }
    }

    async fn build_summary(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<CalendarSummary, ServiceError> {
        let (today, tomorrow, week) = tokio::try_join!(
            self.events_at(credentials, TimeWindow::Today, now),
            self.events_at(credentials, TimeWindow::Tomorrow, now),
            self.events_at(credentials, TimeWindow::Week, now),
        )?;

        let upcoming = rollup::dedup_by_id(today.iter().chain(week.iter()).cloned());

        Ok(CalendarSummary {
            total_today: today.len(),
            total_tomorrow: tomorrow.len(),
            total_week: week.len(),
            ongoing: rollup::ongoing(&today, now),
            next_event: rollup::next_upcoming(&upcoming, now),
            today: rollup::preview(&today, self.preview_limit),
            tomorrow: rollup::preview(&tomorrow, self.preview_limit),
            week: rollup::preview(&week, self.preview_limit),
            generated_at: now,
            degraded: None,
        })
    }

    pub async fn validate_token(&self, credentials: &Credentials) -> bool {
        match self.source.validate_token(&credentials.access_token).await {
            Ok(()) => true,
            Err(err) => {
                log::info!("calendar token rejected: {}", err);
                false
            }
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
