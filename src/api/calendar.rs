//! Google Calendar API v3: time-windowed event listing.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use super::{build_http_client, check_status, endpoint};
use crate::cache::{cache_key, token_fingerprint};
use crate::error::ServiceError;

/// Upper bound on followed `nextPageToken`s for one window.
const MAX_PAGES: usize = 20;

// ============================================================================
// API response types (deserialized from Google Calendar JSON)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<RawEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<RawEventTime>,
    #[serde(default)]
    pub end: Option<RawEventTime>,
    #[serde(default)]
    pub attendees: Vec<RawAttendee>,
    #[serde(default)]
    pub organizer: Option<RawOrganizer>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub hangout_link: Option<String>,
}

/// Either `date` (all-day) or `dateTime` (timed) is set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventTime {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttendee {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub response_status: Option<String>,
    #[serde(default)]
    pub organizer: Option<bool>,
    #[serde(default)]
    pub resource: Option<bool>,
    #[serde(rename = "self", default)]
    pub is_self: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrganizer {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

// ============================================================================
// Query + source trait
// ============================================================================

/// One time-windowed listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    pub max_results: u32,
}

impl EventQuery {
    pub fn time_min_param(&self) -> String {
        self.time_min.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn time_max_param(&self) -> String {
        self.time_max.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn cache_key(&self, token: &str) -> String {
        let fingerprint = token_fingerprint(token);
        let time_min = self.time_min_param();
        let time_max = self.time_max_param();
        let max_results = self.max_results.to_string();
        cache_key(&[
            ("token", fingerprint.as_str()),
            ("timeMin", time_min.as_str()),
            ("timeMax", time_max.as_str()),
            ("maxResults", max_results.as_str()),
        ])
    }
}

#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// List single (expanded) events in the window, ordered by start time.
    /// `max_results` is the page size; every page is followed.
    async fn list_events(
        &self,
        access_token: &str,
        query: &EventQuery,
    ) -> Result<Vec<RawEvent>, ServiceError>;

    /// Cheapest authenticated call; `Ok(())` means the token is usable.
    async fn validate_token(&self, access_token: &str) -> Result<(), ServiceError>;
}

// ============================================================================
// Calendar API
// ============================================================================

#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    async fn list_events(
        &self,
        access_token: &str,
        query: &EventQuery,
    ) -> Result<Vec<RawEvent>, ServiceError> {
        let url = endpoint(&self.base_url, "calendars/primary/events");
        let time_min = query.time_min_param();
        let time_max = query.time_max_param();
        let max_results = query.max_results.to_string();

        log::debug!(
            "calendar list_events timeMin={} timeMax={} maxResults={}",
            time_min,
            time_max,
            max_results
        );

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 1..=MAX_PAGES {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(access_token)
                .query(&[
                    ("timeMin", time_min.as_str()),
                    ("timeMax", time_max.as_str()),
                    ("maxResults", max_results.as_str()),
                    ("singleEvents", "true"),
                    ("orderBy", "startTime"),
                ]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let body: EventListResponse = check_status(request.send().await?).await?.json().await?;
            events.extend(body.items);

            page_token = body.next_page_token;
            if page_token.is_none() {
                return Ok(events);
            }
            log::debug!("calendar list_events following page {}", page + 1);
        }

        log::warn!(
            "calendar list_events stopped after {} pages, {} events",
            MAX_PAGES,
            events.len()
        );
        Ok(events)
    }

    async fn validate_token(&self, access_token: &str) -> Result<(), ServiceError> {
        let url = endpoint(&self.base_url, "users/me/calendarList");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("maxResults", "1")])
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}
