// Radio service
// Local and worldwide station listings for the radio widget.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{cached, degrade};
use crate::api::radio_browser::{RawStation, StationQuery, StationSource};
use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::normalize::radio::normalize_stations;
use crate::types::{RadioStation, RadioSummary};

pub struct RadioService {
    source: Arc<dyn StationSource>,
    cache: TtlCache<Vec<RawStation>>,
    clock: Arc<dyn Clock>,
    country_code: String,
    limit: u32,
}

impl RadioService {
    pub fn new(
        source: Arc<dyn StationSource>,
        clock: Arc<dyn Clock>,
        ttl_secs: u64,
        country_code: impl Into<String>,
        limit: u32,
    ) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl_secs, clock.clone()),
            clock,
            country_code: country_code.into(),
            limit,
        }
    }

    pub async fn get_stations(&self, query: &StationQuery) -> Result<Vec<RadioStation>, ServiceError> {
        let raw = cached(&self.cache, query.cache_key(), || {
            self.source.list_stations(query)
        })
        .await?;
        Ok(normalize_stations(&raw))
    }

    /// Radio widget summary. Never fails; see `RadioSummary::degraded`.
    pub async fn get_summary(&self) -> RadioSummary {
        let now = self.clock.now();
        match self.build_summary(now).await {
            Ok(summary) => summary,
            Err(err) => RadioSummary::empty(now, Some(degrade("radio", &err, now))),
        }
    }

    async fn build_summary(&self, now: DateTime<Utc>) -> Result<RadioSummary, ServiceError> {
        let local_query = StationQuery::ByCountry {
            country_code: self.country_code.clone(),
            limit: self.limit,
        };
        let top_query = StationQuery::Top { limit: self.limit };
        let (local, top) = tokio::try_join!(
            self.get_stations(&local_query),
            self.get_stations(&top_query)
        )?;
        Ok(RadioSummary {
            local,
            top,
            generated_at: now,
            degraded: None,
        })
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
