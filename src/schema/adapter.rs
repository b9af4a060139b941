//! Parsing and validation of captured sensor sessions

use crate::error::ShakeError;
use crate::schema::sensor_event::{SensorRecord, ValidationError};

/// Reader for shakeit.sensor_event.v1 streams
pub struct SensorEventAdapter;

impl SensorEventAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<SensorRecord>, ShakeError> {
        let records: Vec<SensorRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<SensorRecord>, ShakeError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<SensorRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(ShakeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse either format, sniffing a leading `[` as a JSON array
    pub fn parse_auto(input: &str) -> Result<Vec<SensorRecord>, ShakeError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Validate every record and check timestamps never go backwards
    pub fn validate_stream(records: &[SensorRecord]) -> Result<(), ValidationError> {
        let mut previous = None;
        for (index, record) in records.iter().enumerate() {
            record.validate()?;
            if let Some(prev) = previous {
                if record.timestamp < prev {
                    return Err(ValidationError::TimestampOutOfOrder {
                        index,
                        timestamp: record.timestamp.to_rfc3339(),
                    });
                }
            }
            previous = Some(record.timestamp);
        }
        Ok(())
    }

    /// Validate each record independently, collecting every failure
    pub fn collect_errors(records: &[SensorRecord]) -> Vec<(usize, ValidationError)> {
        let mut errors = Vec::new();
        let mut previous = None;
        for (index, record) in records.iter().enumerate() {
            if let Err(e) = record.validate() {
                errors.push((index, e));
            }
            if let Some(prev) = previous {
                if record.timestamp < prev {
                    errors.push((
                        index,
                        ValidationError::TimestampOutOfOrder {
                            index,
                            timestamp: record.timestamp.to_rfc3339(),
                        },
                    ));
                }
            }
            previous = Some(record.timestamp);
        }
        errors
    }
}
