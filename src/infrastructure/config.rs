//! Configuration management for the ticker
//!
//! Loads configuration from config.toml at startup.
//! All values are configurable to avoid hardcoded constants.

use crate::core::PriceBounds;
use crate::hot_path::InterpolationConfig;
use crate::monitor::PerformanceThresholds;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Ticker Configuration
///
/// Loaded from config.toml at startup. Every section falls back to defaults
/// so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub interpolation: InterpolationConfig,

    #[serde(default)]
    pub thresholds: PerformanceThresholds,

    /// Timer cadences and price clamp
    #[serde(default)]
    pub update_loop: LoopConfig,

    /// Authoritative price feed
    #[serde(default)]
    pub feed: FeedConfig,

    /// Snapshot API server settings
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Symbols tracked from startup, even before the feed answers
    #[serde(default)]
    pub symbols: Vec<SymbolConfig>,
}

/// Adaptive update loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoopConfig {
    /// Use interpolation toward feed prices while connected
    #[serde(default = "default_true")]
    pub interpolation_enabled: bool,

    /// Local-update interval before the first retune
    #[serde(default = "default_update_interval_ms")]
    pub initial_update_interval_ms: u64,

    /// Remote-sync poll interval
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,

    /// How often adaptive settings are pulled from the monitor
    #[serde(default = "default_retune_interval_ms")]
    pub retune_interval_ms: u64,

    #[serde(default = "default_min_price")]
    pub min_price: f64,

    #[serde(default = "default_max_price")]
    pub max_price: f64,
}

/// Price feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bounded wait per poll; past it the sync counts as failed
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub bearer_token: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write rolling log files in addition to the console
    #[serde(default = "default_true")]
    pub file_output: bool,

    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

/// Statically configured symbol
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SymbolConfig {
    pub symbol: String,
    pub initial_price: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interpolation_enabled: true,
            initial_update_interval_ms: default_update_interval_ms(),
            sync_interval_ms: default_sync_interval_ms(),
            retune_interval_ms: default_retune_interval_ms(),
            min_price: default_min_price(),
            max_price: default_max_price(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
            bearer_token: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_api_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: true,
            directory: default_log_directory(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_update_interval_ms() -> u64 {
    375
}

fn default_sync_interval_ms() -> u64 {
    3000
}

fn default_retune_interval_ms() -> u64 {
    2000
}

fn default_min_price() -> f64 {
    0.01
}

fn default_max_price() -> f64 {
    1_000_000.0
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_endpoint() -> String {
    "/api/stocks".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_user_agent() -> String {
    "price-ticker/0.1".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

impl LoopConfig {
    pub fn initial_update_interval(&self) -> Duration {
        Duration::from_millis(self.initial_update_interval_ms)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub fn retune_interval(&self) -> Duration {
        Duration::from_millis(self.retune_interval_ms)
    }

    pub fn price_bounds(&self) -> PriceBounds {
        PriceBounds::new(self.min_price, self.max_price)
    }
}

impl FeedConfig {
    /// Absolute URL of the stock endpoint
    pub fn endpoint_url(&self) -> Result<Url, url::ParseError> {
        let base = Url::parse(&self.base_url)?;
        base.join(&self.endpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from config.toml file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// `PRICE_FEED_URL` and `PRICE_FEED_TOKEN` override the feed section.
    /// # Errors
    /// Returns error if file exists but cannot be parsed or fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File not found - use defaults
                Config::default()
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if let Ok(url) = std::env::var("PRICE_FEED_URL") {
            config.feed.base_url = url;
        }
        if let Ok(token) = std::env::var("PRICE_FEED_TOKEN") {
            config.feed.bearer_token = Some(token);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reject values the engine and loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interpolation.steps == 0 {
            return Err(ConfigError::Invalid("interpolation.steps must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.interpolation.smoothing_factor) {
            return Err(ConfigError::Invalid(
                "interpolation.smoothing_factor must be within [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.interpolation.micro_fluctuation_frequency) {
            return Err(ConfigError::Invalid(
                "interpolation.micro_fluctuation_frequency must be within [0, 1]".into(),
            ));
        }
        let lp = &self.update_loop;
        if lp.initial_update_interval_ms == 0 || lp.sync_interval_ms == 0 || lp.retune_interval_ms == 0 {
            return Err(ConfigError::Invalid("update_loop intervals must be non-zero".into()));
        }
        if !(lp.min_price > 0.0 && lp.min_price < lp.max_price) {
            return Err(ConfigError::Invalid(
                "update_loop.min_price must be positive and below max_price".into(),
            ));
        }
        if self.feed.timeout_ms == 0 {
            return Err(ConfigError::Invalid("feed.timeout_ms must be non-zero".into()));
        }
        self.feed
            .endpoint_url()
            .map_err(|e| ConfigError::Invalid(format!("feed URL: {}", e)))?;
        if self.thresholds.target_frame_rate <= 0.0 {
            return Err(ConfigError::Invalid("thresholds.target_frame_rate must be positive".into()));
        }
        for symbol in &self.symbols {
            if symbol.symbol.trim().is_empty() || !(symbol.initial_price > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "symbol entry {:?} needs a name and a positive initial_price",
                    symbol.symbol
                )));
            }
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
