//! Adaptive price ticker
//!
//! Turns sparse authoritative quotes into a smooth per-tick price stream and
//! tunes its own cadence from observed runtime performance.

pub mod core;
pub mod engine;
pub mod feed;
pub mod hot_path;
pub mod infrastructure;
pub mod monitor;

// Re-export commonly used types
pub use engine::{AdaptiveUpdateLoop, TickerSnapshot};
pub use infrastructure::config::Config;

use thiserror::Error;

/// Main error type for the ticker
#[derive(Error, Debug)]
pub enum TickerError {
    #[error("Feed error: {0}")]
    Feed(#[from] feed::FeedError),

    #[error("Configuration error: {0}")]
    Config(#[from] infrastructure::config::ConfigError),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TickerError>;
