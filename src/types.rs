//! Core data types
//!
//! This module defines the values that flow through the shake detector:
//! raw samples, filtered samples, per-axis totals and the resolution record
//! emitted when an episode completes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ShakeError;

/// Spatial direction of detected motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    /// Stable numeric code used across the C ABI
    pub fn code(&self) -> i32 {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Set of axes the detector listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AxisSet {
    /// X and Y only
    Planar,
    /// X, Y and Z
    Spatial,
}

impl AxisSet {
    /// Active axes in tie-break priority order
    pub fn axes(&self) -> &'static [Axis] {
        match self {
            AxisSet::Planar => &[Axis::X, Axis::Y],
            AxisSet::Spatial => &[Axis::X, Axis::Y, Axis::Z],
        }
    }

    pub fn contains(&self, axis: Axis) -> bool {
        self.axes().contains(&axis)
    }

    pub fn count(&self) -> u8 {
        self.axes().len() as u8
    }
}

impl TryFrom<u8> for AxisSet {
    type Error = ShakeError;

    fn try_from(count: u8) -> Result<Self, Self::Error> {
        match count {
            2 => Ok(AxisSet::Planar),
            3 => Ok(AxisSet::Spatial),
            other => Err(ShakeError::InvalidConfiguration(format!(
                "unsupported axis count {} (expected 2 or 3)",
                other
            ))),
        }
    }
}

impl From<AxisSet> for u8 {
    fn from(set: AxisSet) -> Self {
        set.count()
    }
}

/// One accelerometer reading
///
/// Components may be signed; the filter works on magnitudes. `z` is ignored
/// when the detector runs in planar mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Sensor clock in milliseconds
    pub timestamp_ms: u64,
}

impl Sample {
    /// Two-component reading
    pub fn planar(x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            timestamp_ms,
        }
    }

    /// Three-component reading
    pub fn spatial(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    pub fn component(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

/// Per-axis contribution after noise gating
///
/// Every component is either the unfiltered magnitude or zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp_ms: u64,
}

impl FilteredSample {
    pub fn component(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub(crate) fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    /// True when no axis passed the threshold
    pub fn is_silent(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// Accumulated energy per axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisTotals {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AxisTotals {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub(crate) fn add(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x += value,
            Axis::Y => self.y += value,
            Axis::Z => self.z += value,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// External gesture signal delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureSignal {
    Begin,
    End,
    Cancel,
}

/// Outcome of a completed (non-cancelled) episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShakeResolution {
    /// Unique identifier for this episode
    pub episode_id: Uuid,
    /// Dominant axis of motion
    pub axis: Axis,
    /// Totals at the moment the episode ended
    pub totals: AxisTotals,
    /// Samples that contributed non-zero energy, warm-up included
    pub samples_accumulated: u32,
    pub began_at_ms: u64,
    pub ended_at_ms: u64,
}

impl ShakeResolution {
    pub fn duration_ms(&self) -> u64 {
        self.ended_at_ms.saturating_sub(self.began_at_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_set_from_count() {
        assert_eq!(AxisSet::try_from(2).unwrap(), AxisSet::Planar);
        assert_eq!(AxisSet::try_from(3).unwrap(), AxisSet::Spatial);
        assert!(AxisSet::try_from(1).is_err());
        assert!(AxisSet::try_from(4).is_err());
    }

    #[test]
    fn test_axis_set_priority_order() {
        assert_eq!(AxisSet::Planar.axes(), &[Axis::X, Axis::Y]);
        assert_eq!(AxisSet::Spatial.axes(), &[Axis::X, Axis::Y, Axis::Z]);
        assert!(!AxisSet::Planar.contains(Axis::Z));
    }

    #[test]
    fn test_axis_set_serializes_as_count() {
        let json = serde_json::to_string(&AxisSet::Spatial).unwrap();
        assert_eq!(json, "3");

        let parsed: AxisSet = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, AxisSet::Planar);

        assert!(serde_json::from_str::<AxisSet>("5").is_err());
    }

    #[test]
    fn test_axis_serialization() {
        assert_eq!(serde_json::to_string(&Axis::Y).unwrap(), "\"y\"");
        assert_eq!(Axis::Z.code(), 2);
    }

    #[test]
    fn test_resolution_duration() {
        let resolution = ShakeResolution {
            episode_id: Uuid::new_v4(),
            axis: Axis::X,
            totals: AxisTotals::default(),
            samples_accumulated: 0,
            began_at_ms: 1_000,
            ended_at_ms: 1_640,
        };
        assert_eq!(resolution.duration_ms(), 640);
    }
}
