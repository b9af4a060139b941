//! ShakeIt Core - Directional shake detection from accelerometer streams
//!
//! ShakeIt turns a stream of accelerometer samples into one "axis resolved"
//! outcome per shake gesture through a small deterministic pipeline:
//! noise gate → per-axis energy accumulation → dominant-axis classification,
//! framed by the Begin/End/Cancel signals of the platform's gesture recognizer.
//!
//! ## Modules
//!
//! - **Live detection**: [`ShakeDetector`] serializes sensor and gesture threads
//!   and notifies a [`ShakeObserver`]
//! - **Replay**: [`replay_session`] and [`ShakeProcessor`] run captured
//!   `shakeit.sensor_event.v1` sessions and emit JSON resolution reports

pub mod accumulator;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod encoder;
pub mod episode;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod schema;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::ShakeConfig;
pub use detector::{SampleSink, ShakeDetector, ShakeObserver};
pub use episode::{EpisodeState, GestureEpisodeController};
pub use error::ShakeError;
pub use pipeline::{replay_session, ShakeProcessor};
pub use types::{Axis, AxisSet, AxisTotals, GestureSignal, Sample, ShakeResolution};

// Schema exports
pub use schema::{SensorEventAdapter, SensorRecord, SCHEMA_VERSION};

/// Version embedded in all resolution reports
pub const SHAKEIT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for resolution reports
pub const PRODUCER_NAME: &str = "shakeit-core";
