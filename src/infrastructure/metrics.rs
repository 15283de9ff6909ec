//! Update loop counters
//!
//! Lock-free counters using atomic operations.
//! Written by the update loop, exported via the snapshot API.

use crate::core::price::now_millis;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

/// Counters for local ticks, feed syncs and retunes
pub struct LoopMetrics {
    local_ticks: AtomicU64,
    sync_successes: AtomicU64,
    sync_failures: AtomicU64,
    retunes: AtomicU64,
    /// Feed connectivity as last observed by the loop
    connected: AtomicBool,
    /// Last successful sync (Unix millis, 0 = never)
    last_sync_time: AtomicU64,
    /// Current local-update interval in milliseconds
    update_interval_ms: AtomicU64,
    start_time: Instant,
}

/// Metrics snapshot for API export
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopMetricsSnapshot {
    pub local_ticks: u64,
    pub sync_successes: u64,
    pub sync_failures: u64,
    pub retunes: u64,
    pub connected: bool,
    pub update_interval_ms: u64,
    pub ms_since_last_sync: Option<u64>,
    pub tick_rate: f64, // ticks per second
    pub uptime_seconds: u64,
}

impl LoopMetrics {
    pub fn new() -> Self {
        Self {
            local_ticks: AtomicU64::new(0),
            sync_successes: AtomicU64::new(0),
            sync_failures: AtomicU64::new(0),
            retunes: AtomicU64::new(0),
            connected: AtomicBool::new(false),
            last_sync_time: AtomicU64::new(0),
            update_interval_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn record_local_tick(&self) {
        self.local_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sync_success(&self) {
        self.sync_successes.fetch_add(1, Ordering::Relaxed);
        self.last_sync_time.store(now_millis(), Ordering::Relaxed);
        self.connected.store(true, Ordering::Relaxed);
    }

    pub fn record_sync_failure(&self) {
        self.sync_failures.fetch_add(1, Ordering::Relaxed);
        self.connected.store(false, Ordering::Relaxed);
    }

    pub fn record_retune(&self, update_interval_ms: u64) {
        self.retunes.fetch_add(1, Ordering::Relaxed);
        self.update_interval_ms.store(update_interval_ms, Ordering::Relaxed);
    }

    pub fn set_update_interval(&self, update_interval_ms: u64) {
        self.update_interval_ms.store(update_interval_ms, Ordering::Relaxed);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        let ticks = self.local_ticks.load(Ordering::Relaxed);
        let uptime = self.start_time.elapsed().as_secs();
        let rate = if uptime > 0 {
            ticks as f64 / uptime as f64
        } else {
            0.0
        };

        let last_sync = self.last_sync_time.load(Ordering::Relaxed);
        let since_sync = (last_sync != 0).then(|| now_millis().saturating_sub(last_sync));

        LoopMetricsSnapshot {
            local_ticks: ticks,
            sync_successes: self.sync_successes.load(Ordering::Relaxed),
            sync_failures: self.sync_failures.load(Ordering::Relaxed),
            retunes: self.retunes.load(Ordering::Relaxed),
            connected: self.is_connected(),
            update_interval_ms: self.update_interval_ms.load(Ordering::Relaxed),
            ms_since_last_sync: since_sync,
            tick_rate: rate,
            uptime_seconds: uptime,
        }
    }
}

impl Default for LoopMetrics {
    fn default() -> Self {
        Self::new()
    }
}
