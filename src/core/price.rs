//! Price point types
//!
//! InterpolatedPricePoint is produced once per tick and never mutated.

use serde::Serialize;
use std::time::SystemTime;

/// A single price emitted by the engine for one symbol and one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatedPricePoint {
    /// Unix timestamp in milliseconds
    pub timestamp: u64,
    pub price: f64,
    /// True when blended toward an authoritative target, false for local generation
    pub is_interpolated: bool,
    /// Authoritative price the arc is heading to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_price: Option<f64>,
    /// Step index inside the current arc (pre-increment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
}

impl InterpolatedPricePoint {
    pub fn interpolated(price: f64, source_price: f64, step: u32) -> Self {
        Self {
            timestamp: now_millis(),
            price,
            is_interpolated: true,
            source_price: Some(source_price),
            step: Some(step),
        }
    }

    pub fn local(price: f64) -> Self {
        Self {
            timestamp: now_millis(),
            price,
            is_interpolated: false,
            source_price: None,
            step: None,
        }
    }

    /// Copy of this point with the price clamped into `bounds`
    pub fn clamped(&self, bounds: PriceBounds) -> Self {
        Self {
            price: bounds.clamp(self.price),
            ..*self
        }
    }
}

/// Absolute sanity floor/ceiling applied by the update loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

impl PriceBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp into [min, max]. NaN collapses to the floor.
    #[inline]
    pub fn clamp(&self, price: f64) -> f64 {
        if price.is_nan() {
            return self.min;
        }
        price.max(self.min).min(self.max)
    }
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self::new(0.01, 1_000_000.0)
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds() {
        let bounds = PriceBounds::new(1.0, 500.0);
        assert_eq!(bounds.clamp(0.2), 1.0);
        assert_eq!(bounds.clamp(750.0), 500.0);
        assert_eq!(bounds.clamp(42.5), 42.5);
        assert_eq!(bounds.clamp(f64::NAN), 1.0);
        assert_eq!(bounds.clamp(f64::INFINITY), 500.0);
    }

    #[test]
    fn test_clamped_point_keeps_metadata() {
        let point = InterpolatedPricePoint::interpolated(900.0, 950.0, 3);
        let clamped = point.clamped(PriceBounds::new(0.01, 800.0));
        assert_eq!(clamped.price, 800.0);
        assert!(clamped.is_interpolated);
        assert_eq!(clamped.source_price, Some(950.0));
        assert_eq!(clamped.step, Some(3));
        assert_eq!(clamped.timestamp, point.timestamp);
        // original untouched
        assert_eq!(point.price, 900.0);
    }

    #[test]
    fn test_local_point_serialization() {
        let point = InterpolatedPricePoint::local(12.5);
        let json = serde_json::to_value(point).unwrap();
        assert_eq!(json["isInterpolated"], false);
        assert!(json.get("sourcePrice").is_none());
        assert!(json["timestamp"].as_u64().unwrap() > 0);
    }
}
