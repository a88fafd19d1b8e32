//! Dashboard configuration, read from `~/.dayboard/config.json`.
//!
//! Every field has a default so a partial (or missing) file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::cache::{
    CALENDAR_TTL_SECS, MAIL_TTL_SECS, MAX_TTL_SECS, RADIO_TTL_SECS, WEATHER_TTL_SECS,
};
use crate::error::ConfigError;
use crate::types::Coordinates;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// IANA zone used for day boundaries and display times
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Items shown per window before `hasMore` kicks in
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub radio: RadioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConfig {
    #[serde(default = "default_calendar_url")]
    pub base_url: String,
    #[serde(default = "default_calendar_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailConfig {
    #[serde(default = "default_gmail_url")]
    pub base_url: String,
    #[serde(default = "default_mail_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_mail_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,
    #[serde(default = "default_weather_ttl")]
    pub ttl_secs: u64,
    #[serde(default)]
    pub default_location: DefaultLocation,
}

/// Used when neither explicit coordinates nor IP geolocation are available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultLocation {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioConfig {
    #[serde(default = "default_radio_url")]
    pub base_url: String,
    #[serde(default = "default_radio_ttl")]
    pub ttl_secs: u64,
    /// ISO 3166-1 alpha-2 code for the local station list
    #[serde(default = "default_country_code")]
    pub country_code: String,
    #[serde(default = "default_radio_limit")]
    pub limit: u32,
}

fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_preview_limit() -> usize {
    3
}
fn default_calendar_url() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}
fn default_calendar_ttl() -> u64 {
    CALENDAR_TTL_SECS
}
fn default_gmail_url() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}
fn default_mail_ttl() -> u64 {
    MAIL_TTL_SECS
}
fn default_mail_max_results() -> u32 {
    25
}
fn default_weather_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}
fn default_geolocation_url() -> String {
    "https://ipapi.co".to_string()
}
fn default_weather_ttl() -> u64 {
    WEATHER_TTL_SECS
}
fn default_radio_url() -> String {
    "https://de1.api.radio-browser.info".to_string()
}
fn default_radio_ttl() -> u64 {
    RADIO_TTL_SECS
}
fn default_country_code() -> String {
    "RO".to_string()
}
fn default_radio_limit() -> u32 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            preview_limit: default_preview_limit(),
            calendar: CalendarConfig::default(),
            mail: MailConfig::default(),
            weather: WeatherConfig::default(),
            radio: RadioConfig::default(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: default_calendar_url(),
            ttl_secs: default_calendar_ttl(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            base_url: default_gmail_url(),
            ttl_secs: default_mail_ttl(),
            max_results: default_mail_max_results(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
            geolocation_url: default_geolocation_url(),
            ttl_secs: default_weather_ttl(),
            default_location: DefaultLocation::default(),
        }
    }
}

impl Default for DefaultLocation {
    fn default() -> Self {
        Self {
            name: "Bucharest".to_string(),
            country: "Romania".to_string(),
            lat: 44.4268,
            lon: 26.1025,
        }
    }
}

impl DefaultLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            base_url: default_radio_url(),
            ttl_secs: default_radio_ttl(),
            country_code: default_country_code(),
            limit: default_radio_limit(),
        }
    }
}

impl Config {
    /// Resolve the configured zone, falling back to UTC.
    pub fn tz(&self) -> Tz {
        match self.timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!("Unknown timezone '{}', using UTC", self.timezone);
                Tz::UTC
            }
        }
    }

    /// Reject values the services cannot honor.
    fn validate(&self) -> Result<(), String> {
        let ttls = [
            ("calendar", self.calendar.ttl_secs),
            ("mail", self.mail.ttl_secs),
            ("weather", self.weather.ttl_secs),
            ("radio", self.radio.ttl_secs),
        ];
        for (section, ttl_secs) in ttls {
            if ttl_secs > MAX_TTL_SECS {
                return Err(format!(
                    "{}.ttlSecs is {}, the maximum is {}",
                    section, ttl_secs, MAX_TTL_SECS
                ));
            }
        }
        Ok(())
    }
}

/// Default config location.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".dayboard").join("config.json"))
}

/// Load config from the default location.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path()?)
}

/// Load config from `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config.validate().map_err(|reason| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(config)
}
