//! Resolution report encoding
//!
//! Wraps a `ShakeResolution` with producer metadata so downstream consumers
//! can tell which build of the detector produced it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ShakeError;
use crate::types::ShakeResolution;
use crate::{PRODUCER_NAME, SHAKEIT_VERSION};

/// Current resolution report schema version
pub const REPORT_VERSION: &str = "shakeit.resolution.v1";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Serialized form of a completed episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub schema_version: String,
    pub producer: ReportProducer,
    #[serde(flatten)]
    pub resolution: ShakeResolution,
}

/// Encoder for resolution reports
pub struct ResolutionEncoder {
    instance_id: String,
}

impl Default for ResolutionEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(&self, resolution: &ShakeResolution) -> ResolutionReport {
        ResolutionReport {
            schema_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: SHAKEIT_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            resolution: resolution.clone(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, resolution: &ShakeResolution) -> Result<String, ShakeError> {
        let report = self.encode(resolution);
        serde_json::to_string(&report).map_err(|e| ShakeError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Axis, AxisTotals};

    fn resolution() -> ShakeResolution {
        ShakeResolution {
            episode_id: Uuid::new_v4(),
            axis: Axis::Z,
            totals: AxisTotals::new(0.0, 2.0, 6.5),
            samples_accumulated: 4,
            began_at_ms: 100,
            ended_at_ms: 180,
        }
    }

    #[test]
    fn test_encode_to_json_fields() {
        let encoder = ResolutionEncoder::with_instance_id("test-instance".to_string());
        let json = encoder.encode_to_json(&resolution()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["schema_version"], "shakeit.resolution.v1");
        assert_eq!(value["producer"]["name"], "shakeit-core");
        assert_eq!(value["producer"]["instance_id"], "test-instance");
        assert_eq!(value["axis"], "z");
        assert_eq!(value["totals"]["z"], 6.5);
        assert_eq!(value["samples_accumulated"], 4);
    }

    #[test]
    fn test_report_parses_back() {
        let encoder = ResolutionEncoder::new();
        let original = resolution();
        let json = encoder.encode_to_json(&original).unwrap();
        let report: ResolutionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.resolution, original);
    }
}
