//! ==============================================================================
//! main.rs - pressure hub entry point
//! ==============================================================================
//!
//! purpose:
//!     composition root. the sensor device posts raw pressure values here and
//!     the dashboard polls for the latest one.
//!
//! responsibilities:
//!     - load hub.toml (or defaults)
//!     - initialize logging
//!     - construct the one reading store for the process
//!     - serve the http api
//!
//! architecture:
//!
//!     ┌──────────────┐   POST /sensor-data   ┌──────────────────────────┐
//!     │ sensor device│ ────────────────────> │        web server        │
//!     └──────────────┘                       │       (server.rs)        │
//!     ┌──────────────┐   GET /api/sensor-*   │                          │
//!     │  dashboard   │ <───────────────────> │                          │
//!     └──────────────┘                       └────────────┬─────────────┘
//!                                                         │
//!                                            ┌────────────┴─────────────┐
//!                                            │      reading store       │
//!                                            │  arc<rwlock<option<..>>> │
//!                                            └──────────────────────────┘
//!
//! ==============================================================================

use anyhow::Result;
use pressure_hub::config::HubConfig;
use pressure_hub::server::{self, AppState};
use pressure_hub::store::ReadingStore;

#[tokio::main]
async fn main() -> Result<()> {
    // step 1: load configuration
    let (config, source) = HubConfig::load_or_default()?;

    // step 2: logging (RUST_LOG wins over the config file)
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("===========================================================");
    log::info!("  Pressure Hub v{}", env!("CARGO_PKG_VERSION"));
    log::info!("===========================================================");
    match &source {
        Some(path) => log::info!("[CONFIG] Loaded from {}", path.display()),
        None => log::warn!("[CONFIG] No config file found - using defaults"),
    }
    config.log_summary();

    // step 3: the store lives as long as the process
    let store = ReadingStore::with_system_clock();
    let state = AppState::new(store, config.logging.show_sensor_data);

    // step 4: serve
    if let Err(e) = server::run_server(&config, state).await {
        log::error!("[ERROR] Web server error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
