//! Remote API clients.
//!
//! One client per provider. Each performs a single request per logical query,
//! attaches the caller's credential (never stored), and classifies the
//! response. There is no retry here: a failure goes straight back to the
//! caller, which decides whether to re-authenticate or offer a retry.
//!
//! Modules:
//! - calendar: Google Calendar API v3 event listing
//! - gmail: Gmail API v1 message search + metadata
//! - open_meteo: forecast by coordinates (no key)
//! - geolocation: best-effort IP location lookup
//! - radio_browser: station directory

pub mod calendar;
pub mod geolocation;
pub mod gmail;
pub mod open_meteo;
pub mod radio_browser;

use crate::error::ServiceError;

const USER_AGENT: &str = concat!("dayboard/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client settings for every provider.
pub fn build_http_client() -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(4)
        .build()
        .map_err(|e| ServiceError::Transport(format!("failed to build HTTP client: {}", e)))
}

/// Pass a successful response through; turn anything else into a typed failure.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ServiceError::from_status(status.as_u16(), truncate_body(body)))
}

/// Keep diagnostics bounded; provider error pages can be large.
fn truncate_body(mut body: String) -> String {
    const MAX_BODY: usize = 500;
    if body.len() > MAX_BODY {
        let mut cut = MAX_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

/// Join a configured base URL and a path without doubling slashes.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Percent-encode a caller-supplied value used as one path segment.
pub(crate) fn path_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
