//! Normalized records and widget summaries.
//!
//! Everything here is produced fresh by a normalizer or an aggregator and is
//! never mutated afterwards.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorPayload;

/// Access credential supplied by the caller for each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

// =============================================================================
// Calendar
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    pub name: String,
    /// accepted / tentative / declined / needsAction
    pub response_status: String,
    pub is_organizer: bool,
    pub is_self: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub is_today: bool,
    pub is_tomorrow: bool,
    pub is_past: bool,
    pub is_future: bool,
    pub is_ongoing: bool,
    /// Hex color, e.g. "#039be5"
    pub color: String,
    pub attendees: Vec<Attendee>,
    pub organizer: String,
    pub status: EventStatus,
    /// "All day" or "9:00 AM - 9:30 AM" in the configured zone
    pub time_label: String,
    pub duration_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
}

// =============================================================================
// Mail
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    pub initials: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub name: String,
    pub email: String,
    pub avatar: Avatar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailCategory {
    Primary,
    Social,
    Promotions,
    Updates,
    Forums,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: Sender,
    pub to: String,
    pub date: DateTime<Utc>,
    pub time_label: String,
    pub snippet: String,
    pub is_unread: bool,
    pub is_important: bool,
    pub is_starred: bool,
    pub labels: Vec<String>,
    pub category: MailCategory,
    pub size_estimate: u64,
    pub has_attachments: bool,
}

// =============================================================================
// Weather
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherLocation {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions. Times are local to the forecast location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub observed_at: Option<NaiveDateTime>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub wind_compass: String,
    pub weather_code: i32,
    pub description: String,
    pub icon: String,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub weather_code: i32,
    pub description: String,
    pub icon: String,
    pub temp_max: f64,
    pub temp_min: f64,
    pub precipitation_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub location: WeatherLocation,
    pub current: CurrentConditions,
    /// The current local day, kept apart from `forecast`
    pub today: Option<DailyForecast>,
    /// Following days, ascending, at most six
    pub forecast: Vec<DailyForecast>,
    pub hourly: Vec<HourlyPoint>,
    pub fetched_at: DateTime<Utc>,
}

// =============================================================================
// Radio
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioStation {
    pub id: String,
    pub name: String,
    pub stream_url: String,
    pub homepage: String,
    pub favicon: String,
    pub tags: Vec<String>,
    pub country: String,
    pub country_code: String,
    pub codec: String,
    pub bitrate: u32,
    pub votes: u64,
}

// =============================================================================
// Summaries
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// First few items of a window plus its full size.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_more: bool,
}

impl<T> Preview<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
        }
    }
}

/// Events of one calendar day, sorted by start.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGroup<T> {
    pub date: NaiveDate,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSummary {
    pub today: Preview<CalendarEvent>,
    pub tomorrow: Preview<CalendarEvent>,
    pub week: Preview<CalendarEvent>,
    pub total_today: usize,
    pub total_tomorrow: usize,
    pub total_week: usize,
    pub ongoing: Vec<CalendarEvent>,
    pub next_event: Option<CalendarEvent>,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<ErrorPayload>,
}

impl CalendarSummary {
    pub fn empty(now: DateTime<Utc>, degraded: Option<ErrorPayload>) -> Self {
        Self {
            today: Preview::empty(),
            tomorrow: Preview::empty(),
            week: Preview::empty(),
            total_today: 0,
            total_tomorrow: 0,
            total_week: 0,
            ongoing: Vec::new(),
            next_event: None,
            generated_at: now,
            degraded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderCount {
    pub name: String,
    pub email: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailSummary {
    pub unread: Preview<MailMessage>,
    pub today: Preview<MailMessage>,
    pub important: Preview<MailMessage>,
    pub total_unread: usize,
    pub total_today: usize,
    pub total_important: usize,
    pub yesterday_count: usize,
    /// Today's volume against all of yesterday
    pub trend: Trend,
    pub top_senders: Vec<SenderCount>,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<ErrorPayload>,
}

impl MailSummary {
    pub fn empty(now: DateTime<Utc>, degraded: Option<ErrorPayload>) -> Self {
        Self {
            unread: Preview::empty(),
            today: Preview::empty(),
            important: Preview::empty(),
            total_unread: 0,
            total_today: 0,
            total_important: 0,
            yesterday_count: 0,
            trend: Trend::Stable,
            top_senders: Vec::new(),
            generated_at: now,
            degraded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    pub snapshot: Option<WeatherSnapshot>,
    pub today_high: Option<f64>,
    pub today_low: Option<f64>,
    /// Tomorrow's high against today's
    pub trend: Trend,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<ErrorPayload>,
}

impl WeatherSummary {
    pub fn empty(now: DateTime<Utc>, degraded: Option<ErrorPayload>) -> Self {
        Self {
            snapshot: None,
            today_high: None,
            today_low: None,
            trend: Trend::Stable,
            generated_at: now,
            degraded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioSummary {
    pub local: Vec<RadioStation>,
    pub top: Vec<RadioStation>,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<ErrorPayload>,
}

impl RadioSummary {
    pub fn empty(now: DateTime<Utc>, degraded: Option<ErrorPayload>) -> Self {
        Self {
            local: Vec::new(),
            top: Vec::new(),
            generated_at: now,
            degraded,
        }
    }
}
