//! shakeit.sensor_event.v1 schema definition
//!
//! A line-oriented record format for captured sensor sessions. Each record is
//! either an accelerometer sample, a gesture signal from the platform, or a
//! one-off notice that the accelerometer is unavailable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GestureSignal, Sample};

/// Current schema version
pub const SCHEMA_VERSION: &str = "shakeit.sensor_event.v1";

/// What a record carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordPayload {
    /// Accelerometer reading in g
    Sample {
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z: Option<f64>,
        /// Error reported by the sensor alongside this reading
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Begin,
    End,
    Cancel,
    SensorUnavailable,
}

/// One captured record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Schema version (must be "shakeit.sensor_event.v1")
    pub schema_version: String,
    /// When the record was captured
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: RecordPayload,
}

impl SensorRecord {
    /// Create a sample record
    pub fn sample(timestamp: DateTime<Utc>, x: f64, y: f64, z: Option<f64>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp,
            payload: RecordPayload::Sample {
                x,
                y,
                z,
                error: None,
            },
        }
    }

    /// Create a gesture signal record
    pub fn signal(timestamp: DateTime<Utc>, signal: GestureSignal) -> Self {
        let payload = match signal {
            GestureSignal::Begin => RecordPayload::Begin,
            GestureSignal::End => RecordPayload::End,
            GestureSignal::Cancel => RecordPayload::Cancel,
        };
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp,
            payload,
        }
    }

    /// Create a sensor-unavailable record
    pub fn sensor_unavailable(timestamp: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp,
            payload: RecordPayload::SensorUnavailable,
        }
    }

    /// Timestamp as milliseconds since the Unix epoch, clamped at zero
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp.timestamp_millis().max(0) as u64
    }

    /// Sample view of this record, if it is a sample
    pub fn as_sample(&self) -> Option<Sample> {
        match &self.payload {
            RecordPayload::Sample { x, y, z, .. } => Some(Sample::spatial(
                *x,
                *y,
                z.unwrap_or(0.0),
                self.timestamp_ms(),
            )),
            _ => None,
        }
    }

    /// Gesture signal carried by this record, if any
    pub fn as_signal(&self) -> Option<GestureSignal> {
        match self.payload {
            RecordPayload::Begin => Some(GestureSignal::Begin),
            RecordPayload::End => Some(GestureSignal::End),
            RecordPayload::Cancel => Some(GestureSignal::Cancel),
            _ => None,
        }
    }

    /// Validate the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        Ok(())
    }

    pub fn kind_name(&self) -> &'static str {
        match self.payload {
            RecordPayload::Sample { .. } => "sample",
            RecordPayload::Begin => "begin",
            RecordPayload::End => "end",
            RecordPayload::Cancel => "cancel",
            RecordPayload::SensorUnavailable => "sensor_unavailable",
        }
    }
}

/// Validation errors for sensor records
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Record {index} at {timestamp} is earlier than the record before it")]
    TimestampOutOfOrder { index: usize, timestamp: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_serialize_sample_record() {
        let record = SensorRecord::sample(at(1_700_000_000_000), 2.0, -0.5, Some(0.1));
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("\"kind\":\"sample\""));
        assert!(json.contains("shakeit.sensor_event.v1"));
        assert!(!json.contains("error"));

        let parsed: SensorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_deserialize_signal_records() {
        let json = r#"{
            "schema_version": "shakeit.sensor_event.v1",
            "timestamp": "2024-03-01T12:00:00.250Z",
            "kind": "begin"
        }"#;
        let record: SensorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.as_signal(), Some(GestureSignal::Begin));
        assert!(record.as_sample().is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_planar_sample_defaults_z() {
        let json = r#"{
            "schema_version": "shakeit.sensor_event.v1",
            "timestamp": "2024-03-01T12:00:00Z",
            "kind": "sample",
            "x": 1.2,
            "y": -2.4
        }"#;
        let record: SensorRecord = serde_json::from_str(json).unwrap();
        let sample = record.as_sample().unwrap();
        assert_eq!(sample.y, -2.4);
        assert_eq!(sample.z, 0.0);
        assert_eq!(sample.timestamp_ms, record.timestamp_ms());
    }

    #[test]
    fn test_sample_with_error() {
        let json = r#"{
            "schema_version": "shakeit.sensor_event.v1",
            "timestamp": "2024-03-01T12:00:00Z",
            "kind": "sample",
            "x": 0.0,
            "y": 0.0,
            "error": "device busy"
        }"#;
        let record: SensorRecord = serde_json::from_str(json).unwrap();
        match record.payload {
            RecordPayload::Sample { error, .. } => assert_eq!(error.as_deref(), Some("device busy")),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_wrong_version() {
        let mut record = SensorRecord::signal(at(0), GestureSignal::End);
        record.schema_version = "shakeit.sensor_event.v0".to_string();
        assert!(matches!(
            record.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(SensorRecord::sensor_unavailable(at(0)).kind_name(), "sensor_unavailable");
        assert_eq!(SensorRecord::signal(at(0), GestureSignal::Cancel).kind_name(), "cancel");
    }
}
