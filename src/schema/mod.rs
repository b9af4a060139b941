//! Captured sensor session schema
//!
//! Defines shakeit.sensor_event.v1, the record format used to replay recorded
//! accelerometer and gesture streams through the detector.

pub mod adapter;
pub mod sensor_event;

pub use adapter::SensorEventAdapter;
pub use sensor_event::{RecordPayload, SensorRecord, ValidationError, SCHEMA_VERSION};
