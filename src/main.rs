//! Adaptive price ticker
//!
//! # Architecture
//! - **core**: Symbol, easing curves, price points
//! - **hot_path**: Per-tick interpolation engine
//! - **monitor**: Frame sampling, probes and adaptive settings
//! - **feed**: Authoritative price polling
//! - **engine**: Adaptive update loop tying the above together
//! - **infrastructure**: Cold path (logging, metrics, config, api)

use anyhow::Context;
use price_ticker::core::Symbol;
use price_ticker::feed::HttpPriceFeed;
use price_ticker::hot_path::InterpolationEngine;
use price_ticker::infrastructure::logging::init_logging;
use price_ticker::infrastructure::{start_server, AppState};
use price_ticker::monitor::{PerformanceMonitor, SysfsBatteryProbe, SysinfoMemoryProbe};
use price_ticker::{AdaptiveUpdateLoop, Config};
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    // Guards flush file appenders on drop
    let _log_guards = init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::info!("Starting price ticker...");

    // 1. Initialize Core Components
    let monitor = Arc::new(PerformanceMonitor::with_probes(
        config.thresholds.clone(),
        Box::new(SysinfoMemoryProbe::new()),
        Box::new(SysfsBatteryProbe::new()),
    ));
    let engine = InterpolationEngine::new(config.interpolation.clone());
    let feed = Arc::new(HttpPriceFeed::new(&config.feed).context("Failed to build price feed")?);
    tracing::info!("Polling authoritative prices from {}", feed.url());

    let mut update_loop = AdaptiveUpdateLoop::new(
        engine,
        monitor.clone(),
        feed,
        &config.update_loop,
        config.feed.timeout(),
    );

    for entry in &config.symbols {
        let symbol = Symbol::new(&entry.symbol);
        if !symbol.is_valid() {
            tracing::warn!("Skipping configured symbol with empty name");
            continue;
        }
        update_loop.track_symbol(symbol, entry.initial_price);
    }

    // 2. Start API Server (Cold Path)
    if config.api.enabled {
        let state = AppState {
            snapshot: update_loop.snapshot_handle(),
            monitor: monitor.clone(),
            metrics: update_loop.metrics(),
        };
        let port = config.api.port;
        tokio::spawn(async move {
            if let Err(e) = start_server(state, port).await {
                tracing::error!("API Server failed: {}", e);
            }
        });
    }

    // 3. Graceful shutdown on Ctrl+C
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
        }
        let _ = shutdown_tx.send(true);
    });

    // 4. Run the update loop (this blocks the task)
    update_loop.run(shutdown_rx).await;

    tracing::info!("Price ticker stopped");
    Ok(())
}
