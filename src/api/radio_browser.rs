//! radio-browser.info station directory.

use async_trait::async_trait;
use serde::Deserialize;

use super::{build_http_client, check_status, endpoint, path_segment};
use crate::error::ServiceError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStation {
    #[serde(default)]
    pub stationuuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_resolved: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    /// Comma separated
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub countrycode: Option<String>,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub votes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationQuery {
    /// Most clicked stations for one country
    ByCountry { country_code: String, limit: u32 },
    /// Most clicked stations worldwide
    Top { limit: u32 },
}

impl StationQuery {
    pub fn cache_key(&self) -> String {
        match self {
            StationQuery::ByCountry {
                country_code,
                limit,
            } => crate::cache::cache_key(&[
                ("country", country_code.to_uppercase().as_str()),
                ("limit", limit.to_string().as_str()),
            ]),
            StationQuery::Top { limit } => {
                crate::cache::cache_key(&[("top", "clicks"), ("limit", limit.to_string().as_str())])
            }
        }
    }
}

#[async_trait]
pub trait StationSource: Send + Sync {
    async fn list_stations(&self, query: &StationQuery) -> Result<Vec<RawStation>, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct RadioBrowserClient {
    client: reqwest::Client,
    base_url: String,
}

impl RadioBrowserClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl StationSource for RadioBrowserClient {
    async fn list_stations(&self, query: &StationQuery) -> Result<Vec<RawStation>, ServiceError> {
        let request = match query {
            StationQuery::ByCountry {
                country_code,
                limit,
            } => self
                .client
                .get(endpoint(
                    &self.base_url,
                    &format!(
                        "json/stations/bycountrycodeexact/{}",
                        path_segment(&country_code.to_uppercase())
                    ),
                ))
                .query(&[
                    ("order", "clickcount".to_string()),
                    ("reverse", "true".to_string()),
                    ("hidebroken", "true".to_string()),
                    ("limit", limit.to_string()),
                ]),
            StationQuery::Top { limit } => self
                .client
                .get(endpoint(
                    &self.base_url,
                    &format!("json/stations/topclick/{}", limit),
                ))
                .query(&[("hidebroken", "true")]),
        };

        let resp = request.send().await?;
        Ok(check_status(resp).await?.json().await?)
    }
}
