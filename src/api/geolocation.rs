//! IP geolocation lookup (ipapi.co), used when no coordinates are supplied.

use async_trait::async_trait;
use serde::Deserialize;

use super::{build_http_client, check_status, endpoint};
use crate::error::ServiceError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// ipapi reports rate limiting as a 200 with `error: true`
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[async_trait]
pub trait GeolocationSource: Send + Sync {
    async fn locate(&self) -> Result<IpLocation, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct IpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl IpApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl GeolocationSource for IpApiClient {
    async fn locate(&self) -> Result<IpLocation, ServiceError> {
        let resp = self
            .client
            .get(endpoint(&self.base_url, "json/"))
            .send()
            .await?;
        let location: IpLocation = check_status(resp).await?.json().await?;
        if location.error {
            return Err(ServiceError::RequestFailed {
                status: 200,
                body: location.reason.unwrap_or_default(),
            });
        }
        Ok(location)
    }
}
