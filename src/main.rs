//! Dayboard CLI: print one dashboard snapshot as JSON.
//!
//! Usage: `DAYBOARD_ACCESS_TOKEN=... dayboard`
//!
//! Without a token only the weather and radio widgets are filled in.
//! `DAYBOARD_LAT` / `DAYBOARD_LON` pin the weather location; otherwise it is
//! resolved from the public IP.

use std::process::ExitCode;
use std::sync::Arc;

use dayboard_lib::clock::SystemClock;
use dayboard_lib::config::load_config;
use dayboard_lib::services::dashboard::Dashboard;
use dayboard_lib::types::{Coordinates, Credentials};

fn env_coordinates() -> Option<Coordinates> {
    let lat = std::env::var("DAYBOARD_LAT").ok()?.trim().parse().ok()?;
    let lon = std::env::var("DAYBOARD_LON").ok()?.trim().parse().ok()?;
    Some(Coordinates { lat, lon })
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let dashboard = match Dashboard::from_config(&config, Arc::new(SystemClock)) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            log::error!("Failed to set up provider clients: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let credentials = std::env::var("DAYBOARD_ACCESS_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .map(|t| Credentials::new(t.trim()));
    if credentials.is_none() {
        log::info!("DAYBOARD_ACCESS_TOKEN not set, skipping calendar and mail");
    }

    let snapshot = dashboard
        .snapshot(credentials.as_ref(), env_coordinates())
        .await;

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to serialize snapshot: {}", e);
            ExitCode::FAILURE
        }
    }
}
