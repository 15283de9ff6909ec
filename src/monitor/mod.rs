//! Performance monitoring and adaptive tuning
//!
//! - probes: optional memory/battery introspection
//! - performance: frame sampler and rolling metrics
//! - adaptive: thresholds, metrics snapshot, settings derivation

pub mod adaptive;
pub mod performance;
pub mod probes;

pub use adaptive::{AdaptiveSettings, PerformanceMetrics, PerformanceThresholds};
pub use performance::{PerformanceMonitor, HISTORY_LEN};
pub use probes::{
    BatteryProbe, BatterySample, MemoryProbe, MemorySample, Reading, SysfsBatteryProbe,
    SysinfoMemoryProbe, Unsupported,
};
