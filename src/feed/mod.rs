//! Authoritative price feed (Cold Path)
//!
//! The update loop only needs "give me prices or tell me you failed".
//! Any transport, status or parse problem collapses into a `FeedError`.

pub mod client;

pub use client::HttpPriceFeed;

use crate::core::Symbol;
use crate::log_feed;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::Level;

/// One authoritative quote
#[derive(Debug, Clone, PartialEq)]
pub struct StockQuote {
    pub symbol: Symbol,
    pub price: f64,
    pub currency: Option<String>,
    /// Simulation paused from a control panel
    pub paused: bool,
}

/// Successful feed poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub quotes: Vec<StockQuote>,
}

/// Source of authoritative prices
///
/// The returned future must be `Send` so a poll can run on its own task
/// while the update loop keeps ticking.
pub trait PriceFeed: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<FeedSnapshot, FeedError>> + Send;
}

/// Feed errors
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Feed rejected request: {0}")]
    Rejected(String),

    #[error("Feed timed out after {0:?}")]
    Timeout(Duration),
}

// === API Response Types ===

/// `{ success, stocks: [{ symbol, currentPrice, ... }] }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub success: bool,
    #[serde(default)]
    pub stocks: Vec<FeedStock>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStock {
    pub symbol: String,
    pub current_price: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub is_paused: bool,
}

impl FeedResponse {
    /// Validate the envelope and keep usable quotes
    pub fn into_snapshot(self) -> Result<FeedSnapshot, FeedError> {
        if !self.success {
            return Err(FeedError::Rejected(
                self.error.unwrap_or_else(|| "success=false".to_string()),
            ));
        }

        let quotes = self
            .stocks
            .into_iter()
            .filter_map(|stock| {
                let symbol = Symbol::new(&stock.symbol);
                if !symbol.is_valid() {
                    log_feed!(Level::WARN, "Dropping quote with empty symbol");
                    return None;
                }
                if !stock.current_price.is_finite() || stock.current_price <= 0.0 {
                    log_feed!(
                        Level::WARN,
                        "Dropping {} quote with unusable price {}",
                        symbol,
                        stock.current_price
                    );
                    return None;
                }
                Some(StockQuote {
                    symbol,
                    price: stock.current_price,
                    currency: stock.currency,
                    paused: stock.is_paused,
                })
            })
            .collect();

        Ok(FeedSnapshot { quotes })
    }
}

/// Parse a raw response body
pub fn parse_feed_body(body: &str) -> Result<FeedSnapshot, FeedError> {
    let response: FeedResponse =
        serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;
    response.into_snapshot()
}
