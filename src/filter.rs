//! Noise gating for raw accelerometer samples
//!
//! Each active axis keeps its magnitude only when it is strictly above the
//! configured threshold. Everything else, including non-finite readings,
//! contributes zero.

use crate::config::ShakeConfig;
use crate::types::{FilteredSample, Sample};

/// Stateless per-sample noise gate
pub struct SampleFilter;

impl SampleFilter {
    /// Gate a sample against the configured threshold and axis set
    pub fn filter(sample: &Sample, config: &ShakeConfig) -> FilteredSample {
        let mut filtered = FilteredSample {
            timestamp_ms: sample.timestamp_ms,
            ..FilteredSample::default()
        };

        for &axis in config.axes.axes() {
            filtered.set(axis, gate(sample.component(axis), config.threshold));
        }

        filtered
    }
}

/// Magnitude if strictly above threshold, otherwise zero
fn gate(value: f64, threshold: f64) -> f64 {
    let magnitude = value.abs();
    if magnitude.is_finite() && magnitude > threshold {
        magnitude
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AxisSet;

    #[test]
    fn test_below_threshold_is_silent() {
        let config = ShakeConfig::default();
        for value in [0.0, 0.5, 1.0, 1.74, 1.75] {
            let filtered = SampleFilter::filter(&Sample::spatial(value, value, value, 0), &config);
            assert!(filtered.is_silent(), "{} should be filtered", value);
        }
    }

    #[test]
    fn test_threshold_boundary_is_strict() {
        let config = ShakeConfig::default();

        let at = SampleFilter::filter(&Sample::spatial(1.75, 0.0, 0.0, 0), &config);
        assert_eq!(at.x, 0.0);

        let above = SampleFilter::filter(&Sample::spatial(1.7500001, 0.0, 0.0, 0), &config);
        assert_eq!(above.x, 1.7500001);
    }

    #[test]
    fn test_negative_readings_use_magnitude() {
        let config = ShakeConfig::default();
        let filtered = SampleFilter::filter(&Sample::spatial(-2.5, 0.3, -1.0, 0), &config);
        assert_eq!(filtered.x, 2.5);
        assert_eq!(filtered.y, 0.0);
        assert_eq!(filtered.z, 0.0);
    }

    #[test]
    fn test_non_finite_contributes_zero() {
        let config = ShakeConfig::default();
        let filtered = SampleFilter::filter(
            &Sample::spatial(f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0),
            &config,
        );
        assert!(filtered.is_silent());
    }

    #[test]
    fn test_planar_mode_ignores_z() {
        let config = ShakeConfig {
            axes: AxisSet::Planar,
            ..ShakeConfig::default()
        };
        let filtered = SampleFilter::filter(&Sample::spatial(0.0, 2.0, 9.0, 40), &config);
        assert_eq!(filtered.y, 2.0);
        assert_eq!(filtered.z, 0.0);
        assert_eq!(filtered.timestamp_ms, 40);

        let planar = SampleFilter::filter(&Sample::planar(-3.0, 1.0, 60), &config);
        assert_eq!(planar.x, 3.0);
        assert_eq!(planar.y, 0.0);
    }

    #[test]
    fn test_custom_threshold() {
        let config = ShakeConfig::new(3, 0.5).unwrap();
        let filtered = SampleFilter::filter(&Sample::spatial(0.6, 0.5, 0.4, 0), &config);
        assert_eq!(filtered.x, 0.6);
        assert_eq!(filtered.y, 0.0);
        assert_eq!(filtered.z, 0.0);
    }
}
