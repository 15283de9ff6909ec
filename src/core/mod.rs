//! Core types shared by the engine, monitor and update loop
//!
//! - Symbol: opaque ticker key
//! - Easing: interpolation curves
//! - InterpolatedPricePoint: one emitted price per tick
//! - PriceBounds: absolute price sanity clamp

pub mod easing;
pub mod price;
pub mod symbol;

pub use easing::Easing;
pub use price::{InterpolatedPricePoint, PriceBounds};
pub use symbol::Symbol;
