//! Adaptive Update Loop
//!
//! Orchestrates the local-update timer, the remote-sync timer and the
//! retune timer. All engine mutation happens on the task running `run`:
//! feed polls execute on their own task and hand results back through an
//! MPSC channel, so a local tick always sees the latest committed target.

use crate::core::{InterpolatedPricePoint, PriceBounds, Symbol};
use crate::feed::{FeedError, FeedSnapshot, PriceFeed};
use crate::hot_path::{InterpolationConfigPatch, InterpolationEngine, InterpolationStatus};
use crate::infrastructure::config::LoopConfig;
use crate::infrastructure::metrics::LoopMetrics;
use crate::monitor::{AdaptiveSettings, PerformanceMonitor};
use crate::{log_feed, log_main, log_perf};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Interval, MissedTickBehavior};
use tracing::Level;

/// Loop-side view of a symbol
#[derive(Debug, Clone)]
struct TrackedSymbol {
    /// Last price emitted (after clamping)
    price: f64,
    paused: bool,
    currency: Option<String>,
    /// Configured at startup, never pruned when missing from the feed
    pinned: bool,
    last_point: Option<InterpolatedPricePoint>,
}

impl TrackedSymbol {
    fn new(price: f64, pinned: bool) -> Self {
        Self {
            price,
            paused: false,
            currency: None,
            pinned,
            last_point: None,
        }
    }
}

/// Per-symbol entry published for presentation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolView {
    pub symbol: Symbol,
    pub price: f64,
    pub point: Option<InterpolatedPricePoint>,
    pub paused: bool,
    pub currency: Option<String>,
    pub status: InterpolationStatus,
}

/// Everything presentation code needs after a tick
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSnapshot {
    pub symbols: Vec<SymbolView>,
    pub connected: bool,
    pub settings: AdaptiveSettings,
}

pub type SharedSnapshot = Arc<RwLock<TickerSnapshot>>;

type SyncResult = Result<FeedSnapshot, FeedError>;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Timer-driven coordinator between feed, engine and monitor
pub struct AdaptiveUpdateLoop<F: PriceFeed> {
    engine: InterpolationEngine,
    monitor: Arc<PerformanceMonitor>,
    feed: Arc<F>,
    metrics: Arc<LoopMetrics>,
    snapshot: SharedSnapshot,
    tracked: BTreeMap<Symbol, TrackedSymbol>,
    connected: bool,
    interpolation_enabled: bool,
    /// Fluctuation/smoothing as configured; retuning can only switch them off
    allow_fluctuation: bool,
    allow_smoothing: bool,
    bounds: PriceBounds,
    update_interval: Duration,
    sync_interval: Duration,
    retune_interval: Duration,
    fetch_timeout: Duration,
    settings: AdaptiveSettings,
}

impl<F: PriceFeed> AdaptiveUpdateLoop<F> {
    /// Zero intervals in `config` are raised to 1ms
    pub fn new(
        engine: InterpolationEngine,
        monitor: Arc<PerformanceMonitor>,
        feed: Arc<F>,
        config: &LoopConfig,
        fetch_timeout: Duration,
    ) -> Self {
        let allow_fluctuation = engine.config().micro_fluctuation_enabled;
        let allow_smoothing = engine.config().noise_reduction;
        Self {
            engine,
            monitor,
            feed,
            metrics: Arc::new(LoopMetrics::new()),
            snapshot: Arc::new(RwLock::new(TickerSnapshot::default())),
            tracked: BTreeMap::new(),
            connected: false,
            interpolation_enabled: config.interpolation_enabled,
            allow_fluctuation,
            allow_smoothing,
            bounds: config.price_bounds(),
            update_interval: non_zero(config.initial_update_interval()),
            sync_interval: non_zero(config.sync_interval()),
            retune_interval: non_zero(config.retune_interval()),
            fetch_timeout,
            settings: AdaptiveSettings::BASELINE,
        }
    }

    /// Track a symbol from startup with a seed price
    pub fn track_symbol(&mut self, symbol: Symbol, initial_price: f64) {
        let price = self.bounds.clamp(initial_price);
        self.tracked.insert(symbol, TrackedSymbol::new(price, true));
    }

    /// Stop tracking a symbol and drop its interpolation state
    pub fn remove_symbol(&mut self, symbol: &Symbol) {
        if self.tracked.remove(symbol).is_some() {
            self.engine.reset_interpolation(symbol);
            log_main!(Level::INFO, "Stopped tracking {}", symbol);
        }
    }

    pub fn engine(&self) -> &InterpolationEngine {
        &self.engine
    }

    pub fn metrics(&self) -> Arc<LoopMetrics> {
        self.metrics.clone()
    }

    pub fn snapshot_handle(&self) -> SharedSnapshot {
        self.snapshot.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn price(&self, symbol: &Symbol) -> Option<f64> {
        self.tracked.get(symbol).map(|t| t.price)
    }

    pub fn last_point(&self, symbol: &Symbol) -> Option<InterpolatedPricePoint> {
        self.tracked.get(symbol).and_then(|t| t.last_point)
    }

    pub fn tracked_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.tracked.keys()
    }

    /// Run until `shutdown` flips to true or its sender is dropped
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let (fetch_tx, mut fetch_rx) = mpsc::channel::<SyncResult>(4);
        let mut in_flight: Option<JoinHandle<()>> = None;

        let mut local_timer = periodic(self.update_interval);
        let mut retune_timer = periodic(self.retune_interval);
        // First poll fires immediately
        let mut sync_timer = interval(self.sync_interval);
        sync_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.monitor.start_monitoring();
        self.metrics
            .set_update_interval(self.update_interval.as_millis() as u64);

        log_main!(
            Level::INFO,
            "Update loop started: {} symbols, local {:?}, sync {:?}, retune {:?}",
            self.tracked.len(),
            self.update_interval,
            self.sync_interval,
            self.retune_interval
        );

        loop {
            tokio::select! {
                _ = local_timer.tick() => self.local_tick(),
                _ = sync_timer.tick() => {
                    if in_flight.as_ref().map_or(true, |handle| handle.is_finished()) {
                        in_flight = Some(self.spawn_fetch(fetch_tx.clone()));
                    } else {
                        log_feed!(Level::DEBUG, "Previous poll still running, skipping sync tick");
                    }
                }
                Some(result) = fetch_rx.recv() => self.apply_sync(result),
                _ = retune_timer.tick() => {
                    if let Some(new_interval) = self.retune() {
                        // Assigning drops the previous timer before the next select
                        local_timer = periodic(new_interval);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if let Some(handle) = in_flight.take() {
            handle.abort();
        }
        self.monitor.stop_monitoring();
        log_main!(Level::INFO, "Update loop stopped");
    }

    /// One local-update tick across every tracked symbol
    pub fn local_tick(&mut self) {
        let started = Instant::now();

        for (symbol, tracked) in self.tracked.iter_mut() {
            if tracked.paused {
                continue;
            }

            let status = self.engine.interpolation_status(symbol);
            let follow_feed = (self.connected && self.interpolation_enabled && status.has_target)
                || status.is_interpolating;

            let point = if follow_feed {
                self.engine.next_price(symbol)
            } else {
                self.engine.generate_local_price(symbol, tracked.price)
            };

            let point = point.clamped(self.bounds);
            tracked.price = point.price;
            tracked.last_point = Some(point);
        }

        self.monitor.record_update_time(started);
        self.metrics.record_local_tick();
        self.publish();
    }

    /// Apply the outcome of a feed poll
    pub fn apply_sync(&mut self, result: SyncResult) {
        match result {
            Ok(snapshot) => {
                let mut seen = HashSet::with_capacity(snapshot.quotes.len());

                for quote in snapshot.quotes {
                    let bounds = self.bounds;
                    let tracked = self.tracked.entry(quote.symbol.clone()).or_insert_with(|| {
                        log_feed!(Level::INFO, "Tracking new symbol {} from feed", quote.symbol);
                        TrackedSymbol::new(bounds.clamp(quote.price), false)
                    });

                    if tracked.paused != quote.paused {
                        log_feed!(
                            Level::INFO,
                            "{} {}",
                            quote.symbol,
                            if quote.paused { "paused" } else { "resumed" }
                        );
                    }
                    tracked.paused = quote.paused;
                    tracked.currency = quote.currency;

                    if self.interpolation_enabled {
                        self.engine.set_target(&quote.symbol, quote.price);
                    } else {
                        tracked.price = bounds.clamp(quote.price);
                    }
                    seen.insert(quote.symbol);
                }

                let stale: Vec<Symbol> = self
                    .tracked
                    .iter()
                    .filter(|(symbol, tracked)| !tracked.pinned && !seen.contains(*symbol))
                    .map(|(symbol, _)| symbol.clone())
                    .collect();
                for symbol in stale {
                    self.remove_symbol(&symbol);
                }

                if !self.connected {
                    log_feed!(Level::INFO, "Price feed connected");
                }
                self.connected = true;
                self.metrics.record_sync_success();
            }
            Err(e) => {
                if self.connected {
                    log_feed!(Level::WARN, "Price feed lost, generating locally: {}", e);
                } else {
                    log_feed!(Level::DEBUG, "Price feed still unavailable: {}", e);
                }
                self.connected = false;
                self.metrics.record_sync_failure();
            }
        }

        self.publish();
    }

    /// Pull adaptive settings and push them into the engine.
    /// Returns the new local-update interval when it changed.
    pub fn retune(&mut self) -> Option<Duration> {
        let settings = self.monitor.adaptive_settings();

        self.engine.update_config(InterpolationConfigPatch {
            steps: Some(settings.interpolation_steps),
            micro_fluctuation_enabled: Some(self.allow_fluctuation && settings.micro_fluctuation_enabled),
            noise_reduction: Some(self.allow_smoothing && settings.enable_smoothing),
            ..Default::default()
        });
        self.metrics.record_retune(settings.update_interval_ms);

        if settings != self.settings {
            log_perf!(
                Level::INFO,
                "Adaptive settings changed: interval {}ms, steps {}, fluctuation {}, smoothing {}",
                settings.update_interval_ms,
                settings.interpolation_steps,
                settings.micro_fluctuation_enabled,
                settings.enable_smoothing
            );
        }
        self.settings = settings;

        let new_interval = settings.update_interval();
        if new_interval == self.update_interval || new_interval.is_zero() {
            return None;
        }
        self.update_interval = new_interval;
        Some(new_interval)
    }

    fn spawn_fetch(&self, tx: mpsc::Sender<SyncResult>) -> JoinHandle<()> {
        let feed = Arc::clone(&self.feed);
        let timeout = self.fetch_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, feed.fetch()).await {
                Ok(result) => result,
                Err(_) => Err(FeedError::Timeout(timeout)),
            };
            // Receiver gone means the loop stopped
            let _ = tx.send(result).await;
        })
    }

    fn publish(&self) {
        let symbols = self
            .tracked
            .iter()
            .map(|(symbol, tracked)| SymbolView {
                symbol: symbol.clone(),
                price: tracked.price,
                point: tracked.last_point,
                paused: tracked.paused,
                currency: tracked.currency.clone(),
                status: self.engine.interpolation_status(symbol),
            })
            .collect();

        *self.snapshot.write() = TickerSnapshot {
            symbols,
            connected: self.connected,
            settings: self.settings,
        };
    }
}

/// tokio intervals panic on a zero period
fn non_zero(period: Duration) -> Duration {
    period.max(MIN_INTERVAL)
}

/// Interval whose first tick is one period away
fn periodic(period: Duration) -> Interval {
    let mut timer = interval_at(tokio::time::Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Easing;
    use crate::feed::StockQuote;
    use crate::hot_path::InterpolationConfig;
    use crate::monitor::PerformanceThresholds;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Feed returning queued responses, then failing
    #[derive(Default)]
    struct ScriptedFeed {
        responses: Mutex<VecDeque<SyncResult>>,
        calls: AtomicUsize,
    }

    impl ScriptedFeed {
        fn with(responses: Vec<SyncResult>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PriceFeed for ScriptedFeed {
        async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let next = self.responses.lock().pop_front();
            next.unwrap_or_else(|| Err(FeedError::Network("offline".to_string())))
        }
    }

    fn quotes(pairs: &[(&str, f64)]) -> SyncResult {
        Ok(FeedSnapshot {
            quotes: pairs
                .iter()
                .map(|(symbol, price)| StockQuote {
                    symbol: Symbol::new(symbol),
                    price: *price,
                    currency: Some("USD".to_string()),
                    paused: false,
                })
                .collect(),
        })
    }

    fn offline() -> SyncResult {
        Err(FeedError::Network("connection refused".to_string()))
    }

    fn plain_engine(steps: u32) -> InterpolationEngine {
        InterpolationEngine::with_seed(
            InterpolationConfig {
                steps,
                easing: Easing::EaseInOut,
                micro_fluctuation_enabled: false,
                noise_reduction: false,
                ..InterpolationConfig::default()
            },
            17,
        )
    }

    fn make_loop(engine: InterpolationEngine, config: LoopConfig) -> AdaptiveUpdateLoop<ScriptedFeed> {
        AdaptiveUpdateLoop::new(
            engine,
            Arc::new(PerformanceMonitor::new(PerformanceThresholds::default())),
            Arc::new(ScriptedFeed::default()),
            &config,
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_failed_sync_keeps_arc_interpolating() {
        let mut lp = make_loop(plain_engine(4), LoopConfig::default());
        let bnox = Symbol::new("BNOX");

        lp.apply_sync(quotes(&[("BNOX", 100.0)]));
        lp.apply_sync(quotes(&[("BNOX", 110.0)]));
        assert!(lp.is_connected());

        lp.local_tick();
        assert_eq!(lp.price(&bnox), Some(101.25));

        lp.apply_sync(offline());
        assert!(!lp.is_connected());
        assert!(lp.engine().interpolation_status(&bnox).is_interpolating);

        lp.local_tick();
        let point = lp.last_point(&bnox).unwrap();
        assert!(point.is_interpolated);
        assert_eq!(point.price, 105.0);
        assert_eq!(point.step, Some(1));
    }

    #[test]
    fn test_disconnected_after_settle_generates_locally() {
        let mut lp = make_loop(plain_engine(2), LoopConfig::default());
        let bnox = Symbol::new("BNOX");

        lp.apply_sync(quotes(&[("BNOX", 100.0)]));
        lp.apply_sync(quotes(&[("BNOX", 110.0)]));
        lp.local_tick();
        lp.local_tick();
        assert_eq!(lp.price(&bnox), Some(110.0));

        lp.apply_sync(offline());
        lp.local_tick();
        let point = lp.last_point(&bnox).unwrap();
        assert!(!point.is_interpolated);
        // bounded walk around the settled price
        assert!((point.price - 110.0).abs() <= 110.0 * 0.003);
    }

    #[test]
    fn test_connected_settled_holds_target() {
        let mut lp = make_loop(plain_engine(2), LoopConfig::default());
        let bnox = Symbol::new("BNOX");

        lp.apply_sync(quotes(&[("BNOX", 100.0)]));
        for _ in 0..5 {
            lp.local_tick();
            let point = lp.last_point(&bnox).unwrap();
            assert!(point.is_interpolated);
            assert_eq!(point.price, 100.0);
        }
    }

    #[test]
    fn test_pinned_symbols_generate_before_feed() {
        let mut lp = make_loop(plain_engine(4), LoopConfig::default());
        let acme = Symbol::new("ACME");
        lp.track_symbol(acme.clone(), 50.0);

        lp.apply_sync(offline());
        for _ in 0..20 {
            lp.local_tick();
        }
        let point = lp.last_point(&acme).unwrap();
        assert!(!point.is_interpolated);
        assert!(point.price > 40.0 && point.price < 60.0);
    }

    #[test]
    fn test_feed_symbols_tracked_and_pruned() {
        let mut lp = make_loop(plain_engine(4), LoopConfig::default());
        let pinned = Symbol::new("PIN");
        lp.track_symbol(pinned.clone(), 10.0);

        lp.apply_sync(quotes(&[("AAA", 1.0), ("BBB", 2.0)]));
        assert_eq!(lp.tracked_symbols().count(), 3);

        lp.apply_sync(quotes(&[("AAA", 1.5)]));
        let names: Vec<&str> = lp.tracked_symbols().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["AAA", "PIN"]);
        assert!(lp.engine().state(&Symbol::new("BBB")).is_none());

        // failures never prune
        lp.apply_sync(offline());
        assert_eq!(lp.tracked_symbols().count(), 2);
    }

    #[test]
    fn test_paused_symbol_holds_price() {
        let mut lp = make_loop(plain_engine(4), LoopConfig::default());
        let halt = Symbol::new("HALT");

        lp.apply_sync(quotes(&[("HALT", 20.0)]));
        lp.local_tick();

        lp.apply_sync(Ok(FeedSnapshot {
            quotes: vec![StockQuote {
                symbol: halt.clone(),
                price: 40.0,
                currency: None,
                paused: true,
            }],
        }));
        for _ in 0..4 {
            lp.local_tick();
        }
        assert_eq!(lp.price(&halt), Some(20.0));
    }

    #[test]
    fn test_prices_clamped_to_bounds() {
        let config = LoopConfig {
            max_price: 105.0,
            ..LoopConfig::default()
        };
        let mut lp = make_loop(plain_engine(2), config);
        let bnox = Symbol::new("BNOX");

        lp.apply_sync(quotes(&[("BNOX", 100.0)]));
        lp.apply_sync(quotes(&[("BNOX", 200.0)]));
        lp.local_tick();
        lp.local_tick();
        assert_eq!(lp.price(&bnox), Some(105.0));
    }

    #[test]
    fn test_interpolation_disabled_snaps_to_feed() {
        let config = LoopConfig {
            interpolation_enabled: false,
            ..LoopConfig::default()
        };
        let mut lp = make_loop(plain_engine(4), config);
        let snap = Symbol::new("SNAP");

        lp.apply_sync(quotes(&[("SNAP", 100.0)]));
        lp.apply_sync(quotes(&[("SNAP", 200.0)]));
        lp.local_tick();
        let point = lp.last_point(&snap).unwrap();
        assert!(!point.is_interpolated);
        assert!((point.price - 200.0).abs() <= 200.0 * 0.003);
    }

    #[test]
    fn test_retune_pushes_settings() {
        let monitor = Arc::new(PerformanceMonitor::new(PerformanceThresholds::default()));
        let mut now = Instant::now();
        monitor.record_frame_at(now);
        for _ in 0..10 {
            now += Duration::from_millis(10);
            monitor.record_frame_at(now);
        }

        let mut lp = AdaptiveUpdateLoop::new(
            InterpolationEngine::with_seed(InterpolationConfig::default(), 1),
            monitor,
            Arc::new(ScriptedFeed::default()),
            &LoopConfig::default(),
            Duration::from_secs(1),
        );

        assert_eq!(lp.retune(), Some(Duration::from_millis(250)));
        assert_eq!(lp.engine().config().steps, 12);
        assert_eq!(lp.update_interval(), Duration::from_millis(250));
        // unchanged settings keep the timer
        assert_eq!(lp.retune(), None);
        assert_eq!(lp.metrics().snapshot().retunes, 2);
    }

    #[test]
    fn test_retune_respects_disabled_fluctuation() {
        let engine = InterpolationEngine::with_seed(
            InterpolationConfig {
                micro_fluctuation_enabled: false,
                ..InterpolationConfig::default()
            },
            1,
        );
        let mut lp = make_loop(engine, LoopConfig::default());
        lp.retune();
        assert!(!lp.engine().config().micro_fluctuation_enabled);
        assert!(lp.engine().config().noise_reduction);
    }

    #[test]
    fn test_snapshot_published() {
        let mut lp = make_loop(plain_engine(4), LoopConfig::default());
        let handle = lp.snapshot_handle();

        lp.apply_sync(quotes(&[("BNOX", 100.0), ("ACME", 5.0)]));
        lp.local_tick();

        let snapshot = handle.read().clone();
        assert!(snapshot.connected);
        assert_eq!(snapshot.symbols.len(), 2);
        assert_eq!(snapshot.symbols[0].symbol.as_str(), "ACME");
        assert_eq!(snapshot.symbols[0].currency.as_deref(), Some("USD"));
        assert!(snapshot.symbols[1].point.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_ticks_and_stops() {
        let feed = Arc::new(ScriptedFeed::with(vec![
            quotes(&[("BNOX", 100.0)]),
            quotes(&[("BNOX", 120.0)]),
        ]));
        let monitor = Arc::new(PerformanceMonitor::new(PerformanceThresholds::default()));
        let mut lp = AdaptiveUpdateLoop::new(
            plain_engine(4),
            monitor.clone(),
            feed.clone(),
            &LoopConfig::default(),
            Duration::from_secs(1),
        );

        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            let _ = tx.send(true);
        });

        tokio::time::timeout(Duration::from_secs(60), lp.run(rx))
            .await
            .expect("loop should stop on shutdown");

        let metrics = lp.metrics().snapshot();
        assert!(metrics.local_ticks > 0);
        assert_eq!(metrics.sync_successes, 2);
        assert!(metrics.sync_failures >= 1);
        assert!(feed.calls.load(Ordering::Relaxed) >= 3);
        assert!(!lp.is_connected());
        assert!(!monitor.is_monitoring());

        let price = lp.price(&Symbol::new("BNOX")).unwrap();
        assert!(price > 100.0 && price < 125.0, "price {}", price);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_intervals_are_raised() {
        let config = LoopConfig {
            initial_update_interval_ms: 0,
            sync_interval_ms: 0,
            retune_interval_ms: 0,
            ..LoopConfig::default()
        };
        let mut lp = make_loop(plain_engine(4), config);
        assert_eq!(lp.update_interval(), Duration::from_millis(1));

        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = tx.send(true);
        });
        lp.run(rx).await;

        let metrics = lp.metrics().snapshot();
        assert!(metrics.local_ticks > 0);
        assert!(metrics.sync_failures > 0);
        assert!(metrics.retunes > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_feed_times_out() {
        struct StalledFeed;

        impl PriceFeed for StalledFeed {
            async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(FeedSnapshot::default())
            }
        }

        let mut lp = AdaptiveUpdateLoop::new(
            plain_engine(4),
            Arc::new(PerformanceMonitor::new(PerformanceThresholds::default())),
            Arc::new(StalledFeed),
            &LoopConfig::default(),
            Duration::from_millis(500),
        );

        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            let _ = tx.send(true);
        });
        lp.run(rx).await;

        assert!(!lp.is_connected());
        assert_eq!(lp.metrics().snapshot().sync_failures, 1);
    }
}
