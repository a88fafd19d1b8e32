// Weather service
// Location resolution, cached forecasts and the weather widget summary.
// Open-Meteo needs no credential, so there is no token validation here.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::{cached, degrade};
use crate::api::geolocation::GeolocationSource;
use crate::api::open_meteo::WeatherSource;
use crate::cache::{cache_key, TtlCache};
use crate::clock::Clock;
use crate::config::DefaultLocation;
use crate::error::ServiceError;
use crate::normalize::weather::normalize_forecast;
use crate::rollup;
use crate::types::{Coordinates, Trend, WeatherLocation, WeatherSnapshot, WeatherSummary};

/// Tomorrow within this many degrees of today counts as stable.
const TREND_TOLERANCE: f64 = 1.0;
/// Coordinates this close to the default location reuse its name.
const SAME_PLACE_EPSILON: f64 = 1e-4;
const CURRENT_LOCATION: &str = "Current location";

pub struct WeatherService {
    forecasts: Arc<dyn WeatherSource>,
    geolocation: Arc<dyn GeolocationSource>,
    cache: TtlCache<WeatherSnapshot>,
    /// The IP lookup result, so every forecast refresh does not re-locate
    located: TtlCache<WeatherLocation>,
    clock: Arc<dyn Clock>,
    default_location: DefaultLocation,
}

impl WeatherService {
    pub fn new(
        forecasts: Arc<dyn WeatherSource>,
        geolocation: Arc<dyn GeolocationSource>,
        clock: Arc<dyn Clock>,
        ttl_secs: u64,
        default_location: DefaultLocation,
    ) -> Self {
        Self {
            forecasts,
            geolocation,
            cache: TtlCache::new(ttl_secs, clock.clone()),
            located: TtlCache::new(ttl_secs, clock.clone()),
            clock,
            default_location,
        }
    }

    fn default_weather_location(&self) -> WeatherLocation {
        WeatherLocation {
            name: self.default_location.name.clone(),
            country: self.default_location.country.clone(),
            lat: self.default_location.lat,
            lon: self.default_location.lon,
        }
    }

    /// Explicit coordinates, else IP geolocation, else the configured default.
    pub async fn resolve_location(&self, explicit: Option<Coordinates>) -> WeatherLocation {
        if let Some(at) = explicit {
            let default = self.default_location.coordinates();
            if (at.lat - default.lat).abs() < SAME_PLACE_EPSILON
                && (at.lon - default.lon).abs() < SAME_PLACE_EPSILON
            {
                return self.default_weather_location();
            }
            return WeatherLocation {
                name: CURRENT_LOCATION.to_string(),
                country: String::new(),
                lat: at.lat,
                lon: at.lon,
            };
        }

        let lookup = cached(&self.located, "ip".to_string(), || async {
            let found = self.geolocation.locate().await?;
            match (found.latitude, found.longitude) {
                (Some(lat), Some(lon)) => Ok(WeatherLocation {
                    name: found
                        .city
                        .filter(|c| !c.trim().is_empty())
                        .unwrap_or_else(|| CURRENT_LOCATION.to_string()),
                    country: found.country_name.unwrap_or_default(),
                    lat,
                    lon,
                }),
                _ => Err(ServiceError::Decode(
                    "geolocation response has no coordinates".to_string(),
                )),
            }
        })
        .await;

        match lookup {
            Ok(location) => location,
            Err(err) => {
                log::warn!(
                    "IP geolocation failed ({}), using {}",
                    err,
                    self.default_location.name
                );
                self.default_weather_location()
            }
        }
    }

    pub async fn get_weather(
        &self,
        location: Option<Coordinates>,
    ) -> Result<WeatherSnapshot, ServiceError> {
        let resolved = self.resolve_location(location).await;
        let lat = format!("{:.4}", resolved.lat);
        let lon = format!("{:.4}", resolved.lon);
        let key = cache_key(&[("lat", lat.as_str()), ("lon", lon.as_str())]);
        let at = Coordinates {
            lat: resolved.lat,
            lon: resolved.lon,
        };

        // Cached per point; the name is resolved per call and stamped on read
        let mut snapshot = cached(&self.cache, key, || async {
            let raw = self.forecasts.fetch_forecast(at).await?;
            normalize_forecast(&raw, resolved.clone(), self.clock.now())
        })
        .await?;
        snapshot.location = resolved;
        Ok(snapshot)
    }

    /// Weather widget summary. Never fails; see `WeatherSummary::degraded`.
    pub async fn get_summary(&self, location: Option<Coordinates>) -> WeatherSummary {
        let now = self.clock.now();
        match self.get_weather(location).await {
            Ok(snapshot) => summarize(snapshot, now),
            Err(err) => WeatherSummary::empty(now, Some(degrade("weather", &err, now))),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        self.located.clear();
    }
}

fn summarize(snapshot: WeatherSnapshot, now: DateTime<Utc>) -> WeatherSummary {
    let today = snapshot.today.clone();
    let tomorrow = today.as_ref().and_then(|t| {
        snapshot
            .forecast
            .iter()
            .find(|d| d.date == t.date + Duration::days(1))
    });
    let trend = match (&today, tomorrow) {
        (Some(t), Some(next)) => rollup::trend_f64(next.temp_max, t.temp_max, TREND_TOLERANCE),
        _ => Trend::Stable,
    };

    WeatherSummary {
        today_high: today.as_ref().map(|t| t.temp_max),
        today_low: today.as_ref().map(|t| t.temp_min),
        trend,
        snapshot: Some(snapshot),
        generated_at: now,
        degraded: None,
    }
}
