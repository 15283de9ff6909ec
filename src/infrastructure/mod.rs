//! Infrastructure - cold path only
//!
//! This module contains non-latency-critical code:
//! - Logging and loop counters
//! - Configuration management
//! - Snapshot API

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod ring_buffer;

pub use api::{start_server, AppState};
pub use metrics::{LoopMetrics, LoopMetricsSnapshot};
pub use ring_buffer::RingBuffer;
