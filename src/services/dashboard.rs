// Dashboard service
// Owns one instance of each widget service and assembles the full dashboard
// snapshot in a single concurrent pass.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::calendar::CalendarService;
use super::mail::MailService;
use super::radio::RadioService;
use super::weather::WeatherService;
use crate::api::calendar::GoogleCalendarClient;
use crate::api::geolocation::IpApiClient;
use crate::api::gmail::GmailClient;
use crate::api::open_meteo::OpenMeteoClient;
use crate::api::radio_browser::RadioBrowserClient;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::ServiceError;
use crate::types::{
    CalendarSummary, Coordinates, Credentials, MailSummary, RadioSummary, WeatherSummary,
};

/// Every widget summary at one instant.
///
/// Calendar and mail are absent when no credential was supplied; each present
/// summary reports its own failure through `degraded`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailSummary>,
    pub weather: WeatherSummary,
    pub radio: RadioSummary,
    pub generated_at: DateTime<Utc>,
}

pub struct Dashboard {
    calendar: CalendarService,
    mail: MailService,
    weather: WeatherService,
    radio: RadioService,
    clock: Arc<dyn Clock>,
}

impl Dashboard {
    pub fn new(
        calendar: CalendarService,
        mail: MailService,
        weather: WeatherService,
        radio: RadioService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            calendar,
            mail,
            weather,
            radio,
            clock,
        }
    }

    /// Wire every service to its real provider client.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, ServiceError> {
        let tz = config.tz();
        log::info!("Dashboard using timezone {}", tz);

        let calendar = CalendarService::new(
            Arc::new(GoogleCalendarClient::new(&config.calendar.base_url)?),
            clock.clone(),
            tz,
            config.calendar.ttl_secs,
            config.preview_limit,
        );
        let mail = MailService::new(
            Arc::new(GmailClient::new(&config.mail.base_url)?),
            clock.clone(),
            tz,
            config.mail.ttl_secs,
            config.preview_limit,
            config.mail.max_results,
        );
        let weather = WeatherService::new(
            Arc::new(OpenMeteoClient::new(&config.weather.base_url)?),
            Arc::new(IpApiClient::new(&config.weather.geolocation_url)?),
            clock.clone(),
            config.weather.ttl_secs,
            config.weather.default_location.clone(),
        );
        let radio = RadioService::new(
            Arc::new(RadioBrowserClient::new(&config.radio.base_url)?),
            clock.clone(),
            config.radio.ttl_secs,
            config.radio.country_code.clone(),
            config.radio.limit,
        );

        Ok(Self::new(calendar, mail, weather, radio, clock))
    }

    pub fn calendar(&self) -> &CalendarService {
        &self.calendar
    }

    pub fn mail(&self) -> &MailService {
        &self.mail
    }

    pub fn weather(&self) -> &WeatherService {
        &self.weather
    }

    pub fn radio(&self) -> &RadioService {
        &self.radio
    }

    /// All widget summaries, fetched concurrently.
    pub async fn snapshot(
        &self,
        credentials: Option<&Credentials>,
        location: Option<Coordinates>,
    ) -> DashboardSnapshot {
        let generated_at = self.clock.now();

        let calendar = async {
            match credentials {
                Some(c) => Some(self.calendar.get_summary(c).await),
                None => None,
            }
        };
        let mail = async {
            match credentials {
                Some(c) => Some(self.mail.get_summary(c).await),
                None => None,
            }
        };

        let (calendar, mail, weather, radio) = tokio::join!(
            calendar,
            mail,
            self.weather.get_summary(location),
            self.radio.get_summary(),
        );

        DashboardSnapshot {
            calendar,
            mail,
            weather,
            radio,
            generated_at,
        }
    }

    /// Drop every cached response so the next snapshot refetches.
    pub fn refresh(&self) {
        log::info!("Clearing all widget caches");
        self.calendar.clear_cache();
        self.mail.clear_cache();
        self.weather.clear_cache();
        self.radio.clear_cache();
    }
}
