//! Per-service in-memory TTL cache.
//!
//! Each service owns one `TtlCache`; nothing is shared between services.
//! Entries are only ever touched inside a short lock that never spans an
//! `.await`, so concurrent fan-out queries cannot observe a torn entry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::clock::Clock;

/// Default freshness windows per service.
pub const MAIL_TTL_SECS: u64 = 120;
pub const CALENDAR_TTL_SECS: u64 = 300;
pub const WEATHER_TTL_SECS: u64 = 600;
pub const RADIO_TTL_SECS: u64 = 1_800;

/// Longest accepted freshness window (one week).
pub const MAX_TTL_SECS: u64 = 7 * 24 * 3_600;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub payload: V,
    pub stored_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.stored_at < ttl
    }
}

pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// `ttl_secs` is clamped to `MAX_TTL_SECS`.
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        if ttl_secs > MAX_TTL_SECS {
            log::warn!("Cache TTL {}s exceeds {}s, clamping", ttl_secs, MAX_TTL_SECS);
        }
        Self {
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Returns the cached payload while it is still fresh. A stale entry is
    /// dropped on read.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl) => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, payload: V) {
        let entry = CacheEntry {
            payload,
            stored_at: self.clock.now(),
        };
        self.entries.lock().insert(key.into(), entry);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Build a cache key from every request parameter.
///
/// Parameters are joined as `name=value` pairs in the given order; values are
/// escaped so a `|` or `=` inside a query string cannot merge two keys.
pub fn cache_key(parts: &[(&str, &str)]) -> String {
    parts
        .iter()
        .map(|(name, value)| format!("{}={}", name, escape_key_value(value)))
        .collect::<Vec<_>>()
        .join("|")
}

fn escape_key_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('=', "\\=")
}

/// Stable identity for a credential that does not keep the secret in memory
/// as a map key.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..8])
}
