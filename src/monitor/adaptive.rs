//! Adaptive settings derived from performance metrics
//!
//! Rules run in a fixed order: frame rate, memory, CPU, low power, then the
//! headroom upgrade. Every rule except the last only tightens constraints.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed thresholds the monitor measures against
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PerformanceThresholds {
    pub target_frame_rate: f64,
    pub min_frame_rate: f64,
    /// Percent of the memory limit
    pub max_memory_usage: f64,
    /// Percent, compared against the jitter-based CPU estimate
    pub max_cpu_usage: f64,
    pub max_update_latency_ms: f64,
    /// Sustained frame rate under which low-power mode is assumed without a battery
    pub low_power_frame_rate: f64,
    /// Battery level (0..1) under which a discharging battery means low power
    pub low_battery_level: f64,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            target_frame_rate: 60.0,
            min_frame_rate: 30.0,
            max_memory_usage: 80.0,
            max_cpu_usage: 70.0,
            max_update_latency_ms: 100.0,
            low_power_frame_rate: 15.0,
            low_battery_level: 0.2,
        }
    }
}

/// Snapshot of the monitor's rolling measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub frame_time_ms: f64,
    pub frame_rate: f64,
    pub memory_usage_percent: f64,
    pub memory_usage_mb: f64,
    /// Frame-time jitter as a contention proxy, not a measured CPU load
    pub cpu_load_estimate: f64,
    pub update_latency_ms: f64,
    pub low_power_mode: bool,
    pub memory_supported: bool,
    pub battery_supported: bool,
}

impl PerformanceMetrics {
    /// Metrics before any sample arrived: a healthy frame at the target rate
    pub fn initial(thresholds: &PerformanceThresholds) -> Self {
        Self {
            frame_time_ms: 1000.0 / thresholds.target_frame_rate.max(1.0),
            frame_rate: thresholds.target_frame_rate,
            memory_usage_percent: 0.0,
            memory_usage_mb: 0.0,
            cpu_load_estimate: 0.0,
            update_latency_ms: 0.0,
            low_power_mode: false,
            memory_supported: false,
            battery_supported: false,
        }
    }

    pub fn is_acceptable(&self, thresholds: &PerformanceThresholds) -> bool {
        self.frame_rate >= thresholds.min_frame_rate
            && self.memory_usage_percent <= thresholds.max_memory_usage
            && self.cpu_load_estimate <= thresholds.max_cpu_usage
            && self.update_latency_ms <= thresholds.max_update_latency_ms
    }

    /// Unweighted average of four 0..100 sub-scores
    pub fn performance_level(&self, thresholds: &PerformanceThresholds) -> f64 {
        let frame_score = if thresholds.target_frame_rate > 0.0 {
            self.frame_rate / thresholds.target_frame_rate * 100.0
        } else {
            100.0
        };
        let memory_score = 100.0 - self.memory_usage_percent;
        let cpu_score = 100.0 - self.cpu_load_estimate;
        let latency_score = if thresholds.max_update_latency_ms > 0.0 {
            100.0 - self.update_latency_ms / thresholds.max_update_latency_ms * 100.0
        } else {
            100.0
        };

        [frame_score, memory_score, cpu_score, latency_score]
            .iter()
            .map(|score| score.clamp(0.0, 100.0))
            .sum::<f64>()
            / 4.0
    }
}

/// Recommended update cadence and visual quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveSettings {
    pub update_interval_ms: u64,
    pub interpolation_steps: u32,
    pub micro_fluctuation_enabled: bool,
    pub enable_smoothing: bool,
    pub chart_animation_duration_ms: u64,
    pub enable_advanced_animations: bool,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self::BASELINE
    }
}

impl AdaptiveSettings {
    pub const BASELINE: Self = Self {
        update_interval_ms: 375,
        interpolation_steps: 8,
        micro_fluctuation_enabled: true,
        enable_smoothing: true,
        chart_animation_duration_ms: 200,
        enable_advanced_animations: true,
    };

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn from_metrics(metrics: &PerformanceMetrics, thresholds: &PerformanceThresholds) -> Self {
        let mut settings = Self::BASELINE;

        if metrics.frame_rate < thresholds.min_frame_rate {
            settings.update_interval_ms = 750;
            settings.interpolation_steps = 4;
            settings.micro_fluctuation_enabled = false;
            settings.chart_animation_duration_ms = 100;
            settings.enable_advanced_animations = false;
        } else if metrics.frame_rate < thresholds.target_frame_rate * 0.8 {
            settings.update_interval_ms = 500;
            settings.interpolation_steps = 6;
            settings.chart_animation_duration_ms = 150;
            settings.enable_advanced_animations = false;
        }

        if metrics.memory_usage_percent > thresholds.max_memory_usage {
            settings.update_interval_ms = settings.update_interval_ms.max(600);
            settings.interpolation_steps = settings.interpolation_steps.min(4);
            settings.micro_fluctuation_enabled = false;
            settings.enable_advanced_animations = false;
        }

        if metrics.cpu_load_estimate > thresholds.max_cpu_usage {
            settings.update_interval_ms = settings.update_interval_ms.max(800);
            settings.interpolation_steps = settings.interpolation_steps.min(3);
            settings.enable_smoothing = false;
            settings.chart_animation_duration_ms = settings.chart_animation_duration_ms.min(100);
        }

        if metrics.low_power_mode {
            settings = Self {
                update_interval_ms: 1000,
                interpolation_steps: 2,
                micro_fluctuation_enabled: false,
                enable_smoothing: false,
                chart_animation_duration_ms: 0,
                enable_advanced_animations: false,
            };
        } else if metrics.frame_rate >= thresholds.target_frame_rate
            && metrics.memory_usage_percent < 50.0
            && metrics.cpu_load_estimate < 40.0
        {
            settings.update_interval_ms = 250;
            settings.interpolation_steps = 12;
            settings.chart_animation_duration_ms = 300;
        }

        settings
    }
}
