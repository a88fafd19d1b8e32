// Widget services: cached, normalized queries plus summary builders.
//
// Each service owns its provider source and its own TTL cache. Summary
// builders never fail: any sub-query error produces an empty summary that
// carries the cause in `degraded`.

pub mod calendar;
pub mod dashboard;
pub mod mail;
pub mod radio;
pub mod weather;

#[cfg(test)]
pub(crate) mod fakes;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::cache::TtlCache;
use crate::error::{ErrorPayload, ServiceError};

/// Serve `key` from `cache`, or run `fetch` and store its result.
///
/// Failures are never cached.
pub(crate) async fn cached<V, F, Fut>(
    cache: &TtlCache<V>,
    key: String,
    fetch: F,
) -> Result<V, ServiceError>
where
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, ServiceError>>,
{
    if let Some(hit) = cache.get(&key) {
        log::debug!("cache hit {}", key);
        return Ok(hit);
    }
    log::debug!("cache miss {}", key);
    let value = fetch().await?;
    cache.set(key, value.clone());
    Ok(value)
}

/// Log a summary failure and build the payload carried by the empty fallback.
pub(crate) fn degrade(widget: &str, err: &ServiceError, now: DateTime<Utc>) -> ErrorPayload {
    log::warn!("{} summary unavailable at {}: {}", widget, now, err);
    ErrorPayload::from(err)
}
