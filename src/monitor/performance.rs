//! Performance Monitor
//!
//! Samples frame timing from a background task, keeps two capped ring
//! buffers (frame times and update times) and derives `PerformanceMetrics`.
//!
//! Frame time here is the measured gap between consecutive sampler ticks
//! scheduled at the target frame budget, so runtime contention shows up as
//! late or jittery frames. The CPU figure is derived from that jitter and is
//! a heuristic, not a CPU measurement.
//!
//! Public methods never panic and never return errors: missing capabilities
//! leave the affected fields at their last known values.

use crate::infrastructure::RingBuffer;
use crate::log_perf;
use crate::monitor::adaptive::{AdaptiveSettings, PerformanceMetrics, PerformanceThresholds};
use crate::monitor::probes::{BatteryProbe, MemoryProbe, Reading, Unsupported};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Level;

/// Samples kept per history
pub const HISTORY_LEN: usize = 30;

struct MonitorState {
    frame_times: RingBuffer<f64, HISTORY_LEN>,
    update_times: RingBuffer<f64, HISTORY_LEN>,
    last_frame: Option<Instant>,
    metrics: PerformanceMetrics,
}

pub struct PerformanceMonitor {
    thresholds: PerformanceThresholds,
    state: Mutex<MonitorState>,
    sampler: Mutex<Option<JoinHandle<()>>>,
    memory_probe: Box<dyn MemoryProbe>,
    battery_probe: Box<dyn BatteryProbe>,
}

impl PerformanceMonitor {
    /// Monitor without memory or battery introspection
    pub fn new(thresholds: PerformanceThresholds) -> Self {
        Self::with_probes(thresholds, Box::new(Unsupported), Box::new(Unsupported))
    }

    pub fn with_probes(
        thresholds: PerformanceThresholds,
        memory_probe: Box<dyn MemoryProbe>,
        battery_probe: Box<dyn BatteryProbe>,
    ) -> Self {
        let metrics = PerformanceMetrics::initial(&thresholds);
        Self {
            thresholds,
            state: Mutex::new(MonitorState {
                frame_times: RingBuffer::new(),
                update_times: RingBuffer::new(),
                last_frame: None,
                metrics,
            }),
            sampler: Mutex::new(None),
            memory_probe,
            battery_probe,
        }
    }

    pub fn thresholds(&self) -> &PerformanceThresholds {
        &self.thresholds
    }

    /// Frame budget the sampler aims for
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.thresholds.target_frame_rate.max(1.0))
    }

    /// Start the frame sampler. No-op when already running or outside a tokio runtime.
    pub fn start_monitoring(self: &Arc<Self>) {
        let mut sampler = self.sampler.lock();
        if sampler.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log_perf!(Level::WARN, "No async runtime, frame sampling disabled");
            return;
        };

        self.state.lock().last_frame = None;

        let monitor = Arc::downgrade(self);
        let budget = self.frame_budget();
        *sampler = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(budget);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(monitor) = monitor.upgrade() else {
                    break;
                };
                monitor.record_frame_at(tokio::time::Instant::now().into_std());
            }
        }));

        log_perf!(Level::INFO, "Frame sampling started ({:?} budget)", budget);
    }

    /// Stop the frame sampler, cancelling the pending tick
    pub fn stop_monitoring(&self) {
        if let Some(handle) = self.sampler.lock().take() {
            handle.abort();
            log_perf!(Level::INFO, "Frame sampling stopped");
        }
        self.state.lock().last_frame = None;
    }

    pub fn is_monitoring(&self) -> bool {
        self.sampler
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Per-frame callback: records the gap since the previous frame
    pub fn record_frame_at(&self, now: Instant) {
        let mut state = self.state.lock();
        if let Some(previous) = state.last_frame {
            state.frame_times.push(as_millis_f64(now.saturating_duration_since(previous)));
            if let Some(mean) = state.frame_times.mean() {
                if mean > 0.0 {
                    state.metrics.frame_time_ms = mean;
                    state.metrics.frame_rate = 1000.0 / mean;
                }
            }
        }
        state.last_frame = Some(now);
    }

    /// Record how long an update took, measured from `start` to now
    pub fn record_update_time(&self, start: Instant) {
        self.record_update_duration(start.elapsed());
    }

    pub fn record_update_duration(&self, elapsed: Duration) {
        let mut state = self.state.lock();
        state.update_times.push(as_millis_f64(elapsed));
        if let Some(mean) = state.update_times.mean() {
            state.metrics.update_latency_ms = mean;
        }
    }

    /// Number of update samples currently held
    pub fn update_history_len(&self) -> usize {
        self.state.lock().update_times.count()
    }

    pub fn frame_history_len(&self) -> usize {
        self.state.lock().frame_times.count()
    }

    /// Refresh memory, CPU estimate and power state, then return a copy
    pub fn metrics(&self) -> PerformanceMetrics {
        let memory = self.memory_probe.read();
        let battery = self.battery_probe.read();

        let mut state = self.state.lock();

        state.metrics.memory_supported = memory.is_supported();
        if let Some(sample) = memory.available() {
            state.metrics.memory_usage_mb = sample.used_mb;
            state.metrics.memory_usage_percent = sample.usage_percent();
        }

        if let (Some(mean), Some(std_dev)) = (state.frame_times.mean(), state.frame_times.std_dev()) {
            if mean > 0.0 && state.frame_times.count() > 1 {
                state.metrics.cpu_load_estimate = (std_dev / mean * 200.0).min(100.0);
            }
        }

        state.metrics.battery_supported = battery.is_supported();
        state.metrics.low_power_mode = match battery {
            Reading::Available(sample) => {
                sample.level < self.thresholds.low_battery_level && !sample.charging
            }
            Reading::Unsupported => {
                state.frame_times.is_full()
                    && state.metrics.frame_rate < self.thresholds.low_power_frame_rate
            }
        };

        state.metrics
    }

    pub fn is_performance_acceptable(&self) -> bool {
        self.metrics().is_acceptable(&self.thresholds)
    }

    /// Overall health in [0, 100]
    pub fn performance_level(&self) -> f64 {
        self.metrics().performance_level(&self.thresholds)
    }

    pub fn adaptive_settings(&self) -> AdaptiveSettings {
        AdaptiveSettings::from_metrics(&self.metrics(), &self.thresholds)
    }
}

#[inline]
fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.sampler.get_mut().take() {
            handle.abort();
        }
    }
}
