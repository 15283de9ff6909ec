//! Hot path operations - run on every local-update tick
//!
//! This module contains the per-tick price computation:
//! - Easing toward authoritative targets
//! - Micro-fluctuation and noise reduction
//! - Local random walk fallback

pub mod interpolation;

pub use interpolation::{
    InterpolationConfig, InterpolationConfigPatch, InterpolationEngine, InterpolationStatus, Phase,
    SymbolState,
};
