//! HTTP price feed client
//!
//! Polls the dashboard backend's stock endpoint.
//! API: GET {base_url}{endpoint} -> `{ success, stocks: [...] }`

use crate::feed::{parse_feed_body, FeedError, FeedSnapshot, PriceFeed};
use crate::infrastructure::config::FeedConfig;
use crate::log_feed;
use std::time::Duration;
use tracing::Level;
use url::Url;

pub struct HttpPriceFeed {
    client: reqwest::Client,
    url: Url,
    bearer_token: Option<String>,
}

impl HttpPriceFeed {
    /// Build a client for the configured endpoint
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let url = config
            .endpoint_url()
            .map_err(|e| FeedError::Network(format!("Invalid feed URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url,
            bearer_token: config.bearer_token.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl PriceFeed for HttpPriceFeed {
    async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        log_feed!(Level::DEBUG, "Polling {}", self.url);

        let mut request = self.client.get(self.url.clone());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Http(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let snapshot = parse_feed_body(&body)?;
        log_feed!(Level::DEBUG, "Received {} quotes", snapshot.quotes.len());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    /// Serve `app` on an ephemeral loopback port and return a feed pointed at it
    async fn serve(app: Router) -> HttpPriceFeed {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let config = FeedConfig {
            base_url: format!("http://{}", addr),
            endpoint: "/api/stocks".to_string(),
            timeout_ms: 2000,
            ..FeedConfig::default()
        };
        HttpPriceFeed::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let app = Router::new().route(
            "/api/stocks",
            get(|| async {
                r#"{"success":true,"stocks":[{"symbol":"bnox","currentPrice":101.0,"currency":"USD"}]}"#
            }),
        );
        let snapshot = serve(app).await.fetch().await.unwrap();
        assert_eq!(snapshot.quotes.len(), 1);
        assert_eq!(snapshot.quotes[0].symbol.as_str(), "BNOX");
        assert_eq!(snapshot.quotes[0].price, 101.0);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let app = Router::new().route(
            "/api/stocks",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance") }),
        );
        let result = serve(app).await.fetch().await;
        assert!(matches!(result, Err(FeedError::Http(503))));
    }

    #[tokio::test]
    async fn test_fetch_html_body_is_parse_error() {
        let app = Router::new().route(
            "/api/stocks",
            get(|| async { "<html><body>Bad Gateway</body></html>" }),
        );
        let result = serve(app).await.fetch().await;
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejected_envelope() {
        let app = Router::new().route(
            "/api/stocks",
            get(|| async { r#"{"success":false,"error":"simulation stopped"}"# }),
        );
        let result = serve(app).await.fetch().await;
        assert!(matches!(result, Err(FeedError::Rejected(ref msg)) if msg == "simulation stopped"));
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        use axum::http::HeaderMap;

        let app = Router::new().route(
            "/api/stocks",
            get(|headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer secret");
                if authorized {
                    (StatusCode::OK, r#"{"success":true,"stocks":[]}"#)
                } else {
                    (StatusCode::UNAUTHORIZED, "")
                }
            }),
        );
        let mut feed = serve(app).await;
        assert!(matches!(feed.fetch().await, Err(FeedError::Http(401))));

        feed.bearer_token = Some("secret".to_string());
        assert!(feed.fetch().await.unwrap().quotes.is_empty());
    }

    #[test]
    fn test_client_creation() {
        let config = FeedConfig {
            base_url: "http://127.0.0.1:3000/".to_string(),
            endpoint: "/api/stocks".to_string(),
            ..FeedConfig::default()
        };
        let feed = HttpPriceFeed::new(&config).unwrap();
        assert_eq!(feed.url().as_str(), "http://127.0.0.1:3000/api/stocks");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = FeedConfig {
            base_url: "not a url".to_string(),
            ..FeedConfig::default()
        };
        assert!(matches!(HttpPriceFeed::new(&config), Err(FeedError::Network(_))));
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_network_error() {
        let config = FeedConfig {
            // port 9 (discard) on loopback is not expected to serve HTTP
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 500,
            ..FeedConfig::default()
        };
        let feed = HttpPriceFeed::new(&config).unwrap();
        assert!(matches!(feed.fetch().await, Err(FeedError::Network(_))));
    }
}
