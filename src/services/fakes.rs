// In-memory provider sources for service tests.
//
// The fakes apply the same window and query semantics as the real providers,
// closely enough for the summary builders to be exercised end to end.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::api::calendar::{CalendarSource, EventQuery, RawEvent, RawEventTime};
use crate::api::geolocation::{GeolocationSource, IpLocation};
use crate::api::gmail::{
    MailSource, MessageList, MessageQuery, MessageRef, RawHeader, RawMessage, RawPayload,
};
use crate::api::open_meteo::{ForecastResponse, WeatherSource};
use crate::api::radio_browser::{RawStation, StationQuery, StationSource};
use crate::error::ServiceError;
use crate::types::Coordinates;

pub const GOOD_TOKEN: &str = "good-token";

fn check_token(token: &str) -> Result<(), ServiceError> {
    if token == GOOD_TOKEN {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

fn failure(status: u16) -> ServiceError {
    ServiceError::from_status(status, "fake failure".to_string())
}

// ============================================================================
// Calendar
// ============================================================================

pub fn timed_event(id: &str, start: &str, end: &str) -> RawEvent {
    RawEvent {
        id: id.to_string(),
        summary: Some(format!("Event {}", id)),
        start: Some(RawEventTime {
            date_time: Some(start.to_string()),
            date: None,
        }),
        end: Some(RawEventTime {
            date_time: Some(end.to_string()),
            date: None,
        }),
        status: Some("confirmed".to_string()),
        ..Default::default()
    }
}

fn event_bound(time: &Option<RawEventTime>) -> Option<DateTime<Utc>> {
    let value = time.as_ref()?.date_time.as_deref()?;
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Default)]
pub struct FakeCalendar {
    pub events: Vec<RawEvent>,
    pub fail_status: Option<u16>,
    pub calls: AtomicUsize,
}

impl FakeCalendar {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarSource for FakeCalendar {
    async fn list_events(
        &self,
        access_token: &str,
        query: &EventQuery,
    ) -> Result<Vec<RawEvent>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_status {
            return Err(failure(status));
        }
        check_token(access_token)?;
        Ok(self
            .events
            .iter()
            .filter(|e| match (event_bound(&e.start), event_bound(&e.end)) {
                (Some(start), Some(end)) => start < query.time_max && end > query.time_min,
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn validate_token(&self, access_token: &str) -> Result<(), ServiceError> {
        check_token(access_token)
    }
}

// ============================================================================
// Mail
// ============================================================================

pub fn mail(id: &str, from: &str, at: DateTime<Utc>, labels: &[&str]) -> RawMessage {
    RawMessage {
        id: id.to_string(),
        thread_id: id.to_string(),
        label_ids: labels.iter().map(|l| l.to_string()).collect(),
        snippet: Some(format!("snippet {}", id)),
        internal_date: Some(at.timestamp_millis().to_string()),
        size_estimate: Some(1024),
        payload: Some(RawPayload {
            headers: vec![
                RawHeader {
                    name: "From".to_string(),
                    value: from.to_string(),
                },
                RawHeader {
                    name: "Subject".to_string(),
                    value: format!("Subject {}", id),
                },
            ],
            parts: Vec::new(),
        }),
    }
}

fn internal_millis(msg: &RawMessage) -> i64 {
    msg.internal_date
        .as_deref()
        .and_then(|d| d.parse().ok())
        .unwrap_or(0)
}

/// Understands the handful of search operators the mail service issues:
/// `is:unread`, `is:important`, `after:<epoch>`, `before:<epoch>`.
fn matches_query(msg: &RawMessage, q: &str) -> bool {
    let millis = internal_millis(msg);
    let has = |label: &str| msg.label_ids.iter().any(|l| l == label);
    q.split_whitespace().all(|term| match term.split_once(':') {
        Some(("is", "unread")) => has("UNREAD"),
        Some(("is", "important")) => has("IMPORTANT"),
        Some(("after", secs)) => secs.parse::<i64>().map_or(false, |s| millis / 1000 > s),
        Some(("before", secs)) => secs.parse::<i64>().map_or(false, |s| millis / 1000 < s),
        _ => true,
    })
}

#[derive(Default)]
pub struct FakeMail {
    pub messages: Vec<RawMessage>,
    pub list_status: Option<u16>,
    pub detail_status: Option<u16>,
    /// Ids whose detail request fails with a 500
    pub broken: HashSet<String>,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl FakeMail {
    pub fn new(messages: Vec<RawMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailSource for FakeMail {
    async fn list_messages(
        &self,
        access_token: &str,
        query: &MessageQuery,
    ) -> Result<MessageList, ServiceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.list_status {
            return Err(failure(status));
        }
        check_token(access_token)?;
        // Gmail lists newest first
        let mut matching: Vec<&RawMessage> = self
            .messages
            .iter()
            .filter(|m| matches_query(m, &query.q))
            .collect();
        matching.sort_by_key(|m| std::cmp::Reverse(internal_millis(m)));
        Ok(MessageList {
            total: matching.len(),
            refs: matching
                .iter()
                .take(query.max_results as usize)
                .map(|m| MessageRef {
                    id: m.id.clone(),
                    thread_id: m.thread_id.clone(),
                })
                .collect(),
        })
    }

    async fn get_message(
        &self,
        access_token: &str,
        message_id: &str,
    ) -> Result<RawMessage, ServiceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.detail_status {
            return Err(failure(status));
        }
        check_token(access_token)?;
        if self.broken.contains(message_id) {
            return Err(failure(500));
        }
        self.messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| failure(404))
    }

    async fn validate_token(&self, access_token: &str) -> Result<(), ServiceError> {
        check_token(access_token)
    }
}

// ============================================================================
// Weather
// ============================================================================

#[derive(Default)]
pub struct FakeWeather {
    /// `None` simulates a transport failure
    pub response: Option<ForecastResponse>,
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<Coordinates>>,
}

impl FakeWeather {
    pub fn new(response: ForecastResponse) -> Self {
        Self {
            response: Some(response),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn fetch_forecast(&self, at: Coordinates) -> Result<ForecastResponse, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().push(at);
        self.response
            .clone()
            .ok_or_else(|| ServiceError::Transport("connection refused".to_string()))
    }
}

#[derive(Default)]
pub struct FakeGeolocation {
    /// `None` simulates a rate-limited lookup
    pub location: Option<IpLocation>,
    pub calls: AtomicUsize,
}

impl FakeGeolocation {
    pub fn at(city: &str, country: &str, lat: f64, lon: f64) -> Self {
        Self {
            location: Some(IpLocation {
                city: Some(city.to_string()),
                country_name: Some(country.to_string()),
                latitude: Some(lat),
                longitude: Some(lon),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeolocationSource for FakeGeolocation {
    async fn locate(&self) -> Result<IpLocation, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.location.clone().ok_or_else(|| ServiceError::RequestFailed {
            status: 200,
            body: "RateLimited".to_string(),
        })
    }
}

// ============================================================================
// Radio
// ============================================================================

pub fn station(id: &str, country_code: &str, votes: u64) -> RawStation {
    RawStation {
        stationuuid: id.to_string(),
        name: format!("Station {}", id),
        url_resolved: Some(format!("https://stream.example/{}", id)),
        countrycode: Some(country_code.to_string()),
        codec: Some("mp3".to_string()),
        bitrate: Some(128),
        votes: Some(votes),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct FakeStations {
    pub stations: Vec<RawStation>,
    pub fail_status: Option<u16>,
    pub calls: AtomicUsize,
}

impl FakeStations {
    pub fn new(stations: Vec<RawStation>) -> Self {
        Self {
            stations,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StationSource for FakeStations {
    async fn list_stations(&self, query: &StationQuery) -> Result<Vec<RawStation>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_status {
            return Err(failure(status));
        }
        let (country, limit) = match query {
            StationQuery::ByCountry {
                country_code,
                limit,
            } => (Some(country_code.as_str()), *limit),
            StationQuery::Top { limit } => (None, *limit),
        };
        Ok(self
            .stations
            .iter()
            .filter(|s| match country {
                Some(cc) => s
                    .countrycode
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(cc)),
                None => true,
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
