//! Widget data layer for a personal dashboard.
//!
//! Provider clients (`api`) fetch raw payloads, `normalize` turns them into
//! stable records, and the per-widget `services` cache, aggregate and
//! summarize them. `services::dashboard` ties the widgets together.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod normalize;
pub mod rollup;
pub mod services;
pub mod types;
pub mod util;
