//! Open-Meteo forecast → `WeatherSnapshot`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::api::open_meteo::{ForecastResponse, RawDaily};
use crate::error::ServiceError;
use crate::types::{
    CurrentConditions, DailyForecast, HourlyPoint, WeatherLocation, WeatherSnapshot,
};

/// Days shown after today.
pub const FORECAST_LEN: usize = 6;
/// Hourly points shown from the current hour.
pub const HOURLY_LEN: usize = 12;

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// WMO weather interpretation code → (description, icon key).
pub fn describe_weather_code(code: i32) -> (&'static str, &'static str) {
    match code {
        0 => ("Clear sky", "clear"),
        1 => ("Mainly clear", "mostly-clear"),
        2 => ("Partly cloudy", "partly-cloudy"),
        3 => ("Overcast", "cloudy"),
        45 | 48 => ("Fog", "fog"),
        51 | 53 | 55 => ("Drizzle", "drizzle"),
        56 | 57 => ("Freezing drizzle", "sleet"),
        61 => ("Light rain", "rain"),
        63 => ("Rain", "rain"),
        65 => ("Heavy rain", "rain"),
        66 | 67 => ("Freezing rain", "sleet"),
        71 => ("Light snow", "snow"),
        73 => ("Snow", "snow"),
        75 => ("Heavy snow", "snow"),
        77 => ("Snow grains", "snow"),
        80..=82 => ("Rain showers", "showers"),
        85 | 86 => ("Snow showers", "snow"),
        95 => ("Thunderstorm", "thunderstorm"),
        96 | 99 => ("Thunderstorm with hail", "thunderstorm"),
        _ => ("Unknown", "unknown"),
    }
}

/// 16-point compass direction for a bearing in degrees.
pub fn wind_compass(degrees: f64) -> &'static str {
    let normalized = degrees.rem_euclid(360.0);
    let index = ((normalized / 22.5) + 0.5).floor() as usize % COMPASS.len();
    COMPASS[index]
}

/// Open-Meteo local times come as `2026-02-08T14:15` (no seconds, no offset).
fn parse_local_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

fn daily_entries(daily: &RawDaily) -> Vec<(DailyForecast, usize)> {
    daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, day)| {
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
            let code = at(&daily.weather_code, i).unwrap_or(-1);
            let (description, icon) = describe_weather_code(code);
            Some((
                DailyForecast {
                    date,
                    weather_code: code,
                    description: description.to_string(),
                    icon: icon.to_string(),
                    temp_max: at(&daily.temperature_2m_max, i).unwrap_or(0.0),
                    temp_min: at(&daily.temperature_2m_min, i).unwrap_or(0.0),
                    precipitation_probability: at(&daily.precipitation_probability_max, i)
                        .unwrap_or(0.0),
                },
                i,
            ))
        })
        .collect()
}

/// Normalize a forecast response for `location`.
///
/// "Today" is the location's own calendar day, taken from the current
/// observation time (or `now` shifted by the reported UTC offset). The
/// forecast strip holds only the days after it, ascending, capped at six.
pub fn normalize_forecast(
    raw: &ForecastResponse,
    location: WeatherLocation,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot, ServiceError> {
    let current = raw
        .current
        .as_ref()
        .ok_or_else(|| ServiceError::Decode("forecast response has no current block".into()))?;

    let observed_at = current.time.as_deref().and_then(parse_local_time);
    let local_now = observed_at.unwrap_or_else(|| {
        (now + Duration::seconds(raw.utc_offset_seconds as i64)).naive_utc()
    });
    let today = local_now.date();

    let mut entries = raw.daily.as_ref().map(daily_entries).unwrap_or_default();
    entries.sort_by_key(|(day, _)| day.date);
    entries.dedup_by_key(|(day, _)| day.date);

    let today_entry = entries.iter().find(|(day, _)| day.date == today);
    let (sunrise, sunset) = match (today_entry, raw.daily.as_ref()) {
        (Some((_, i)), Some(daily)) => (
            daily
                .sunrise
                .get(*i)
                .and_then(|s| s.as_deref())
                .and_then(parse_local_time),
            daily
                .sunset
                .get(*i)
                .and_then(|s| s.as_deref())
                .and_then(parse_local_time),
        ),
        _ => (None, None),
    };
    let today_forecast = today_entry.map(|(day, _)| day.clone());

    let forecast: Vec<DailyForecast> = entries
        .into_iter()
        .map(|(day, _)| day)
        .filter(|day| day.date > today)
        .take(FORECAST_LEN)
        .collect();

    let hour_start = local_now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(local_now);
    let hourly: Vec<HourlyPoint> = raw
        .hourly
        .as_ref()
        .map(|h| {
            h.time
                .iter()
                .enumerate()
                .filter_map(|(i, t)| {
                    let time = parse_local_time(t)?;
                    let temperature = at(&h.temperature_2m, i)?;
                    Some(HourlyPoint { time, temperature })
                })
                .filter(|p| p.time >= hour_start)
                .take(HOURLY_LEN)
                .collect()
        })
        .unwrap_or_default();

    let code = current.weather_code.unwrap_or(-1);
    let (description, icon) = describe_weather_code(code);
    let wind_direction = current.wind_direction_10m.unwrap_or(0.0);
    let temperature = current.temperature_2m.unwrap_or(0.0);

    Ok(WeatherSnapshot {
        location,
        current: CurrentConditions {
            observed_at,
            temperature,
            feels_like: current.apparent_temperature.unwrap_or(temperature),
            humidity: current.relative_humidity_2m.unwrap_or(0.0),
            pressure: current.pressure_msl.unwrap_or(0.0),
            wind_speed: current.wind_speed_10m.unwrap_or(0.0),
            wind_direction,
            wind_compass: wind_compass(wind_direction).to_string(),
            weather_code: code,
            description: description.to_string(),
            icon: icon.to_string(),
            sunrise,
            sunset,
        },
        today: today_forecast,
        forecast,
        hourly,
        fetched_at: now,
    })
}
