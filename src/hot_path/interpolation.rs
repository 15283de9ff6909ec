//! Price Interpolation Engine (Hot Path)
//!
//! Blends the last known authoritative price toward a newly received target
//! over a fixed number of ticks, optionally adding bounded micro-fluctuation
//! and exponential smoothing. Falls back to a bounded local random walk when
//! no authoritative target is available.
//!
//! All per-symbol fields live in one `SymbolState` record so they are
//! created and cleared together.

use crate::core::{Easing, InterpolatedPricePoint, Symbol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Price returned when a symbol has never been observed
pub const FALLBACK_PRICE: f64 = 0.0;

/// Interpolation tuning
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Ticks needed to travel from last price to target
    pub steps: u32,
    pub easing: Easing,
    pub micro_fluctuation_enabled: bool,
    /// Fluctuation amplitude in percent of the current value
    pub micro_fluctuation_range: f64,
    /// Probability (0..1) that a tick receives a fluctuation
    pub micro_fluctuation_frequency: f64,
    /// EMA weight kept from the previous smoothed value (0 = no smoothing)
    pub smoothing_factor: f64,
    pub noise_reduction: bool,
    /// Bound of the local random walk in percent of the current value
    pub trend_strength: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            steps: 8,
            easing: Easing::EaseInOut,
            micro_fluctuation_enabled: true,
            micro_fluctuation_range: 0.05,
            micro_fluctuation_frequency: 0.3,
            smoothing_factor: 0.3,
            noise_reduction: true,
            trend_strength: 0.2,
        }
    }
}

/// Partial update merged into the live config by `update_config`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InterpolationConfigPatch {
    pub steps: Option<u32>,
    pub easing: Option<Easing>,
    pub micro_fluctuation_enabled: Option<bool>,
    pub micro_fluctuation_range: Option<f64>,
    pub micro_fluctuation_frequency: Option<f64>,
    pub smoothing_factor: Option<f64>,
    pub noise_reduction: Option<bool>,
    pub trend_strength: Option<f64>,
}

impl InterpolationConfig {
    fn merge(&mut self, patch: InterpolationConfigPatch) {
        if let Some(steps) = patch.steps {
            self.steps = steps.max(1);
        }
        if let Some(easing) = patch.easing {
            self.easing = easing;
        }
        if let Some(enabled) = patch.micro_fluctuation_enabled {
            self.micro_fluctuation_enabled = enabled;
        }
        if let Some(range) = patch.micro_fluctuation_range {
            self.micro_fluctuation_range = range;
        }
        if let Some(frequency) = patch.micro_fluctuation_frequency {
            self.micro_fluctuation_frequency = frequency;
        }
        if let Some(factor) = patch.smoothing_factor {
            self.smoothing_factor = factor;
        }
        if let Some(enabled) = patch.noise_reduction {
            self.noise_reduction = enabled;
        }
        if let Some(trend) = patch.trend_strength {
            self.trend_strength = trend;
        }
    }

    #[inline(always)]
    fn total_steps(&self) -> u32 {
        self.steps.max(1)
    }
}

/// Where a symbol is in its interpolation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Locally generated prices only, no pending target
    Tracking,
    /// Travelling from `last` toward `target`
    Interpolating,
    /// Arc complete, `last == target`
    Settled,
}

/// Per-symbol interpolation state
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolState {
    pub last: Option<f64>,
    pub target: Option<f64>,
    pub step: u32,
    pub smoothed: Option<f64>,
    pub phase: Phase,
}

impl SymbolState {
    fn tracking() -> Self {
        Self {
            last: None,
            target: None,
            step: 0,
            smoothed: None,
            phase: Phase::Tracking,
        }
    }
}

/// Observational view of a symbol's arc
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationStatus {
    pub has_target: bool,
    pub is_interpolating: bool,
    pub progress: f64,
    pub current_step: u32,
    pub total_steps: u32,
}

/// Interpolation engine holding state for every tracked symbol
pub struct InterpolationEngine {
    config: InterpolationConfig,
    states: HashMap<Symbol, SymbolState>,
    rng: StdRng,
}

impl InterpolationEngine {
    /// Create engine seeded from OS entropy
    pub fn new(config: InterpolationConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create engine with a deterministic random source
    pub fn with_seed(config: InterpolationConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut config: InterpolationConfig, rng: StdRng) -> Self {
        config.steps = config.total_steps();
        Self {
            config,
            states: HashMap::new(),
            rng,
        }
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Merge a partial config; effective from the next tick
    pub fn update_config(&mut self, patch: InterpolationConfigPatch) {
        self.config.merge(patch);
    }

    /// Record a new authoritative price and start a fresh arc
    pub fn set_target(&mut self, symbol: &Symbol, price: f64) {
        let state = self
            .states
            .entry(symbol.clone())
            .or_insert_with(SymbolState::tracking);

        if state.last.is_none() {
            // First observation: no visual transition
            state.last = Some(price);
        }
        state.target = Some(price);
        state.step = 0;
        state.phase = Phase::Interpolating;
    }

    /// Advance the arc for `symbol` by one tick
    pub fn next_price(&mut self, symbol: &Symbol) -> InterpolatedPricePoint {
        let Some(state) = self.states.get_mut(symbol) else {
            return InterpolatedPricePoint::local(FALLBACK_PRICE);
        };

        let (last, target) = match (state.last, state.target) {
            (Some(last), Some(target)) => (last, target),
            (last, target) => {
                return InterpolatedPricePoint::local(target.or(last).unwrap_or(FALLBACK_PRICE));
            }
        };

        let total = self.config.total_steps();

        if state.phase == Phase::Settled {
            let price = finish(&self.config, &mut self.rng, state, target);
            return InterpolatedPricePoint::interpolated(price, target, 0);
        }

        let step_index = state.step;
        let step = step_index + 1;
        let progress = (step as f64 / total as f64).min(1.0);
        let eased = self.config.easing.apply(progress);

        let base = if eased >= 1.0 {
            target
        } else {
            last + (target - last) * eased
        };

        let price = finish(&self.config, &mut self.rng, state, base);

        if step >= total {
            state.last = Some(target);
            state.step = 0;
            state.phase = Phase::Settled;
        } else {
            state.step = step;
        }

        InterpolatedPricePoint::interpolated(price, target, step_index)
    }

    /// Produce a locally generated price when no authoritative feed is driving `symbol`
    pub fn generate_local_price(&mut self, symbol: &Symbol, current_price: f64) -> InterpolatedPricePoint {
        let state = self
            .states
            .entry(symbol.clone())
            .or_insert_with(SymbolState::tracking);

        let trend = self.rng.gen_range(-1.0..=1.0) * self.config.trend_strength / 100.0;
        let walked = current_price + current_price * trend;
        let price = finish(&self.config, &mut self.rng, state, walked);

        state.last = Some(price);
        if state.phase == Phase::Settled {
            state.target = None;
            state.step = 0;
            state.phase = Phase::Tracking;
        }

        InterpolatedPricePoint::local(price)
    }

    pub fn interpolation_status(&self, symbol: &Symbol) -> InterpolationStatus {
        let total = self.config.total_steps();
        match self.states.get(symbol) {
            Some(state) => {
                let is_interpolating = state.phase == Phase::Interpolating
                    && state.target.is_some()
                    && state.step < total;
                InterpolationStatus {
                    has_target: state.target.is_some(),
                    is_interpolating,
                    progress: if is_interpolating {
                        state.step as f64 / total as f64
                    } else {
                        0.0
                    },
                    current_step: state.step,
                    total_steps: total,
                }
            }
            None => InterpolationStatus {
                has_target: false,
                is_interpolating: false,
                progress: 0.0,
                current_step: 0,
                total_steps: total,
            },
        }
    }

    /// Drop every field held for `symbol`
    pub fn reset_interpolation(&mut self, symbol: &Symbol) {
        self.states.remove(symbol);
    }

    pub fn state(&self, symbol: &Symbol) -> Option<&SymbolState> {
        self.states.get(symbol)
    }

    pub fn tracked_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.states.keys()
    }
}

/// Apply micro-fluctuation and noise reduction to `base`
#[inline]
fn finish(config: &InterpolationConfig, rng: &mut StdRng, state: &mut SymbolState, base: f64) -> f64 {
    let mut candidate = base;

    if config.micro_fluctuation_enabled && rng.gen::<f64>() < config.micro_fluctuation_frequency {
        let amplitude = base * config.micro_fluctuation_range / 100.0;
        candidate += rng.gen_range(-1.0..=1.0) * amplitude;
    }

    if config.noise_reduction {
        let previous = state.smoothed.unwrap_or(candidate);
        let smoothed = previous + (candidate - previous) * (1.0 - config.smoothing_factor);
        state.smoothed = Some(smoothed);
        smoothed
    } else {
        candidate
    }
}
