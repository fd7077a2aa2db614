//! Feature Scaling
//!
//! Sensor features live on known physical ranges (hours of the day,
//! temperature spans, unit activity levels), so scaling divides each
//! feature by a fixed full-scale value instead of fitting statistics to
//! the data. The same scaler serves training and inference.

use ndarray::{arr1, Array1};
use serde::{Deserialize, Serialize};

use super::record::{SlotReading, NUM_FEATURES};

/// Per-feature full-scale divisors applied before the network sees a reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    scales: [f64; NUM_FEATURES],
}

impl Default for FeatureScaler {
    /// Scales for the standard feature layout: hour (24 h), outdoor
    /// temperature (10 degrees), lights and motion (already 0-1), power
    /// draw (10 kW), energy price (already unit scale), indoor temperature
    /// (30 degrees).
    fn default() -> Self {
        Self {
            scales: [24.0, 10.0, 1.0, 1.0, 10.0, 1.0, 30.0],
        }
    }
}

impl FeatureScaler {
    /// Scaler with custom full-scale values; every scale must be a positive
    /// finite number.
    pub fn new(scales: [f64; NUM_FEATURES]) -> Option<Self> {
        if scales.iter().all(|&s| s > 0.0 && s.is_finite()) {
            Some(Self { scales })
        } else {
            None
        }
    }

    /// Scale a raw reading into the network's input vector.
    pub fn scale(&self, reading: &SlotReading) -> Array1<f64> {
        let raw = reading.raw_features();
        let mut scaled = arr1(&raw);
        scaled
            .iter_mut()
            .zip(self.scales.iter())
            .for_each(|(v, &s)| *v /= s);
        scaled
    }
}
