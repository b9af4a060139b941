//! Replay pipeline
//!
//! Drives captured sensor sessions through the episode controller and encodes
//! every completed episode as a resolution report.

use tracing::{debug, warn};

use crate::config::ShakeConfig;
use crate::encoder::ResolutionEncoder;
use crate::episode::GestureEpisodeController;
use crate::error::ShakeError;
use crate::schema::{RecordPayload, SensorEventAdapter, SensorRecord};
use crate::types::{AxisTotals, ShakeResolution};

/// Replay a captured session and return one JSON report per resolved episode.
///
/// # Arguments
/// * `input` - shakeit.sensor_event.v1 records, as NDJSON or a JSON array
/// * `config` - Detector configuration
///
/// # Example
/// ```ignore
/// let reports = replay_session(ndjson, &ShakeConfig::default())?;
/// ```
pub fn replay_session(input: String, config: &ShakeConfig) -> Result<Vec<String>, ShakeError> {
    let records = SensorEventAdapter::parse_auto(&input)?;
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut processor = ShakeProcessor::new(config.clone())?;
    processor.process_to_json(&records)
}

/// Stateful processor that keeps episode state across calls.
///
/// Use this when a session arrives in chunks.
pub struct ShakeProcessor {
    controller: GestureEpisodeController,
    encoder: ResolutionEncoder,
    sensor_unavailable: bool,
    records_processed: usize,
}

impl ShakeProcessor {
    /// Create a processor, validating the configuration
    pub fn new(config: ShakeConfig) -> Result<Self, ShakeError> {
        config.validate()?;
        Ok(Self {
            controller: GestureEpisodeController::new(config),
            encoder: ResolutionEncoder::new(),
            sensor_unavailable: false,
            records_processed: 0,
        })
    }

    /// Apply one record. Returns the resolution if the record closed an episode.
    pub fn process_record(
        &mut self,
        record: &SensorRecord,
    ) -> Result<Option<ShakeResolution>, ShakeError> {
        record.validate()?;
        self.records_processed += 1;
        let now_ms = record.timestamp_ms();

        match &record.payload {
            RecordPayload::Sample { .. } if self.sensor_unavailable => {
                Err(ShakeError::SensorUnavailable)
            }
            RecordPayload::Sample { error: Some(message), .. } => {
                warn!(at_ms = now_ms, error = %message, "sensor reported an error, sample dropped");
                Ok(None)
            }
            RecordPayload::Sample { .. } => {
                if let Some(sample) = record.as_sample() {
                    self.controller.on_sample(&sample);
                }
                Ok(None)
            }
            RecordPayload::SensorUnavailable => {
                if !self.sensor_unavailable {
                    warn!(at_ms = now_ms, "accelerometer unavailable");
                    self.sensor_unavailable = true;
                    self.controller.reset();
                }
                Ok(None)
            }
            RecordPayload::Begin | RecordPayload::End | RecordPayload::Cancel => {
                match record.as_signal() {
                    Some(signal) => Ok(self.controller.handle(signal, now_ms)),
                    None => Ok(None),
                }
            }
        }
    }

    /// Apply an ordered batch of records
    pub fn process_records(
        &mut self,
        records: &[SensorRecord],
    ) -> Result<Vec<ShakeResolution>, ShakeError> {
        SensorEventAdapter::validate_stream(records)?;

        let mut resolutions = Vec::new();
        for record in records {
            if let Some(resolution) = self.process_record(record)? {
                resolutions.push(resolution);
            }
        }

        debug!(
            records = records.len(),
            resolved = resolutions.len(),
            "batch processed"
        );
        Ok(resolutions)
    }

    /// Apply a batch and encode each resolution as a JSON report
    pub fn process_to_json(&mut self, records: &[SensorRecord]) -> Result<Vec<String>, ShakeError> {
        self.process_records(records)?
            .iter()
            .map(|resolution| self.encoder.encode_to_json(resolution))
            .collect()
    }

    /// Parse NDJSON and process it
    pub fn process_ndjson(&mut self, ndjson: &str) -> Result<Vec<String>, ShakeError> {
        let records = SensorEventAdapter::parse_ndjson(ndjson)?;
        self.process_to_json(&records)
    }

    /// Totals accumulated so far, including warm-up
    pub fn totals(&self) -> AxisTotals {
        self.controller.snapshot()
    }

    pub fn is_sensor_unavailable(&self) -> bool {
        self.sensor_unavailable
    }

    pub fn records_processed(&self) -> usize {
        self.records_processed
    }

    pub fn config(&self) -> &ShakeConfig {
        self.controller.config()
    }
}
