//! API Server (Cold Path)
//!
//! Read-only REST API over the ticker snapshot, performance metrics and
//! loop counters. Handlers only read shared state published by the loop.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::core::Symbol;
use crate::engine::{SharedSnapshot, SymbolView};
use crate::infrastructure::metrics::{LoopMetrics, LoopMetricsSnapshot};
use crate::monitor::{AdaptiveSettings, PerformanceMetrics, PerformanceMonitor};
use crate::TickerError;

/// Feed connectivity and loop counters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub is_connected: bool,
    pub active_symbols: usize,
    pub update_loop: LoopMetricsSnapshot,
}

/// Monitor output with the settings derived from it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceDto {
    pub metrics: PerformanceMetrics,
    pub performance_level: f64,
    pub is_acceptable: bool,
    pub adaptive_settings: AdaptiveSettings,
    /// Settings the loop is currently running with
    pub active_settings: AdaptiveSettings,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub snapshot: SharedSnapshot,
    pub monitor: Arc<PerformanceMonitor>,
    pub metrics: Arc<LoopMetrics>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/prices", get(get_prices))
        .route("/api/prices/:symbol", get(get_price))
        .route("/api/metrics", get(get_performance))
        .route("/api/status", get(get_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
pub async fn start_server(state: AppState, port: u16) -> Result<(), TickerError> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("API Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| TickerError::Api(e.to_string()))?;

    Ok(())
}

/// Handler for /api/prices
async fn get_prices(State(state): State<AppState>) -> Json<Vec<SymbolView>> {
    Json(state.snapshot.read().symbols.clone())
}

/// Handler for /api/prices/:symbol
async fn get_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<SymbolView>, StatusCode> {
    let symbol = Symbol::new(&symbol);
    let snapshot = state.snapshot.read();
    snapshot
        .symbols
        .iter()
        .find(|view| view.symbol == symbol)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Handler for /api/metrics
async fn get_performance(State(state): State<AppState>) -> Json<PerformanceDto> {
    let thresholds = state.monitor.thresholds();
    let metrics = state.monitor.metrics();
    let active_settings = state.snapshot.read().settings;

    Json(PerformanceDto {
        metrics,
        performance_level: metrics.performance_level(thresholds),
        is_acceptable: metrics.is_acceptable(thresholds),
        adaptive_settings: AdaptiveSettings::from_metrics(&metrics, thresholds),
        active_settings,
    })
}

/// Handler for /api/status
async fn get_status(State(state): State<AppState>) -> Json<StatusDto> {
    let (is_connected, active_symbols) = {
        let snapshot = state.snapshot.read();
        (snapshot.connected, snapshot.symbols.len())
    };

    Json(StatusDto {
        is_connected,
        active_symbols,
        update_loop: state.metrics.snapshot(),
    })
}
