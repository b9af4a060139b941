//! Detector configuration
//!
//! Configuration is fixed at construction. Invalid values fail fast with
//! `ShakeError::InvalidConfiguration` instead of being clamped.

use serde::{Deserialize, Serialize};

use crate::error::ShakeError;
use crate::types::AxisSet;

/// Default per-axis noise floor in sensor units (g)
pub const DEFAULT_THRESHOLD: f64 = 1.75;

/// Default accelerometer update rate
pub const DEFAULT_SAMPLE_INTERVAL_HZ: f64 = 50.0;

/// Shake detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShakeConfig {
    /// Active axes, serialized as the axis count (2 or 3)
    pub axes: AxisSet,
    /// Values strictly above this pass the filter
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Nominal sensor update rate
    #[serde(default = "default_sample_interval_hz")]
    pub sample_interval_hz: f64,
    /// Auto-cancel an episode that stays open longer than this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_timeout_ms: Option<u64>,
    /// Drop accumulated energy older than this before adding a new sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_after_ms: Option<u64>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_sample_interval_hz() -> f64 {
    DEFAULT_SAMPLE_INTERVAL_HZ
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            axes: AxisSet::Spatial,
            threshold: DEFAULT_THRESHOLD,
            sample_interval_hz: DEFAULT_SAMPLE_INTERVAL_HZ,
            episode_timeout_ms: None,
            stale_after_ms: None,
        }
    }
}

impl ShakeConfig {
    /// Build a validated configuration from an axis count and threshold
    pub fn new(axis_count: u8, threshold: f64) -> Result<Self, ShakeError> {
        let config = Self {
            axes: AxisSet::try_from(axis_count)?,
            threshold,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Two-axis configuration with default threshold
    pub fn planar() -> Self {
        Self {
            axes: AxisSet::Planar,
            ..Self::default()
        }
    }

    pub fn with_sample_interval_hz(mut self, hz: f64) -> Self {
        self.sample_interval_hz = hz;
        self
    }

    pub fn with_episode_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.episode_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_stale_after_ms(mut self, stale_after_ms: u64) -> Self {
        self.stale_after_ms = Some(stale_after_ms);
        self
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<(), ShakeError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ShakeError::InvalidConfiguration(format!(
                "threshold must be a positive finite number, got {}",
                self.threshold
            )));
        }

        if !self.sample_interval_hz.is_finite() || self.sample_interval_hz <= 0.0 {
            return Err(ShakeError::InvalidConfiguration(format!(
                "sample_interval_hz must be a positive finite number, got {}",
                self.sample_interval_hz
            )));
        }

        if self.episode_timeout_ms == Some(0) {
            return Err(ShakeError::InvalidConfiguration(
                "episode_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.stale_after_ms == Some(0) {
            return Err(ShakeError::InvalidConfiguration(
                "stale_after_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Expected spacing between samples
    pub fn sample_period_ms(&self) -> f64 {
        1000.0 / self.sample_interval_hz
    }

    /// Load and validate configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ShakeError> {
        let config: ShakeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ShakeError> {
        serde_json::to_string_pretty(self).map_err(|e| ShakeError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = ShakeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold, 1.75);
        assert_eq!(config.sample_interval_hz, 50.0);
        assert_eq!(config.sample_period_ms(), 20.0);
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        assert!(matches!(
            ShakeConfig::new(3, 0.0),
            Err(ShakeError::InvalidConfiguration(_))
        ));
        assert!(ShakeConfig::new(3, -1.0).is_err());
        assert!(ShakeConfig::new(3, f64::NAN).is_err());
        assert!(ShakeConfig::new(3, f64::INFINITY).is_err());
    }

    #[test]
    fn test_rejects_unsupported_axis_count() {
        assert!(matches!(
            ShakeConfig::new(1, 1.75),
            Err(ShakeError::InvalidConfiguration(_))
        ));
        assert!(ShakeConfig::new(4, 1.75).is_err());
    }

    #[test]
    fn test_rejects_bad_sample_rate_and_zero_bounds() {
        assert!(ShakeConfig::default()
            .with_sample_interval_hz(0.0)
            .validate()
            .is_err());
        assert!(ShakeConfig::default()
            .with_episode_timeout_ms(0)
            .validate()
            .is_err());
        assert!(ShakeConfig::default()
            .with_stale_after_ms(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = ShakeConfig::planar()
            .with_episode_timeout_ms(1500)
            .with_stale_after_ms(400);
        let json = config.to_json().unwrap();
        let restored = ShakeConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = ShakeConfig::from_json(r#"{"axes": 2}"#).unwrap();
        assert_eq!(config.axes, AxisSet::Planar);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.episode_timeout_ms, None);
    }

    #[test]
    fn test_from_json_validates() {
        assert!(ShakeConfig::from_json(r#"{"axes": 3, "threshold": -2.0}"#).is_err());
        assert!(ShakeConfig::from_json(r#"{"axes": 7}"#).is_err());
    }
}
