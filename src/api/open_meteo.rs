//! Open-Meteo forecast API (no key required).
//!
//! Requests current conditions plus hourly and daily arrays in the location's
//! own time zone (`timezone=auto`), so every timestamp in the payload is a
//! local wall-clock time without an offset.

use async_trait::async_trait;
use serde::Deserialize;

use super::{build_http_client, check_status, endpoint};
use crate::error::ServiceError;
use crate::types::Coordinates;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
pressure_msl,wind_speed_10m,wind_direction_10m,weather_code";
const HOURLY_FIELDS: &str = "temperature_2m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
sunrise,sunset,precipitation_probability_max";
/// Today plus the six days shown in the forecast strip.
const FORECAST_DAYS: u32 = 7;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub utc_offset_seconds: i32,
    #[serde(default)]
    pub current: Option<RawCurrent>,
    #[serde(default)]
    pub hourly: Option<RawHourly>,
    #[serde(default)]
    pub daily: Option<RawDaily>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurrent {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    #[serde(default)]
    pub apparent_temperature: Option<f64>,
    #[serde(default)]
    pub pressure_msl: Option<f64>,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
    #[serde(default)]
    pub wind_direction_10m: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
}

/// Parallel arrays indexed by day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDaily {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub sunrise: Vec<Option<String>>,
    #[serde(default)]
    pub sunset: Vec<Option<String>>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<f64>>,
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_forecast(&self, at: Coordinates) -> Result<ForecastResponse, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch_forecast(&self, at: Coordinates) -> Result<ForecastResponse, ServiceError> {
        let url = endpoint(&self.base_url, "forecast");
        log::debug!("open-meteo forecast lat={} lon={}", at.lat, at.lon);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("latitude", at.lat.to_string()),
                ("longitude", at.lon.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", FORECAST_DAYS.to_string()),
            ])
            .send()
            .await?;

        Ok(check_status(resp).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::serve_canned;

    #[test]
    fn test_forecast_deserialization_tolerates_nulls() {
        let json = r#"{
            "latitude": 44.43,
            "longitude": 26.1,
            "timezone": "Europe/Bucharest",
            "utc_offset_seconds": 7200,
            "current": {"time": "2026-02-08T14:15", "temperature_2m": 6.3, "weather_code": 3},
            "daily": {
                "time": ["2026-02-08", "2026-02-09"],
                "weather_code": [3, null],
                "temperature_2m_max": [8.1, 9.4],
                "temperature_2m_min": [1.2, null]
            }
        }"#;

        let parsed: ForecastResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.utc_offset_seconds, 7200);
        let daily = parsed.daily.unwrap();
        assert_eq!(daily.time.len(), 2);
        assert_eq!(daily.weather_code[1], None);
        assert!(daily.sunrise.is_empty());
        assert!(parsed.hourly.is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_classified() {
        let (base, _) = serve_canned("400 Bad Request", r#"{"error":true,"reason":"Latitude out of range"}"#).await;
        let client = OpenMeteoClient::new(base).unwrap();
        let err = client
            .fetch_forecast(Coordinates { lat: 144.0, lon: 0.0 })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RequestFailed { status: 400, .. }));
    }
}
