//! Thread-safe detector front door
//!
//! Samples arrive from the sensor delivery thread while Begin/End/Cancel arrive
//! from the UI thread. Both go through one mutex around the episode controller,
//! so `add`, `snapshot` and `reset` never interleave. Observer callbacks run
//! after the lock is released and may call back into the detector.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::config::ShakeConfig;
use crate::episode::{EpisodeState, GestureEpisodeController};
use crate::error::ShakeError;
use crate::types::{AxisTotals, GestureSignal, Sample, ShakeResolution};

/// Receiver of detector outcomes, typically the view layer
pub trait ShakeObserver: Send + Sync {
    /// Called exactly once per completed, non-cancelled episode
    fn axis_resolved(&self, resolution: &ShakeResolution);

    /// Called once when the accelerometer is reported unavailable
    fn sensor_unavailable(&self) {}
}

#[derive(Debug)]
struct DetectorState {
    controller: GestureEpisodeController,
    sensor_unavailable: bool,
    stopped: bool,
}

impl DetectorState {
    fn accept(&mut self, sample: &Sample, error: Option<&str>) -> Result<(), ShakeError> {
        if self.sensor_unavailable {
            return Err(ShakeError::SensorUnavailable);
        }
        if self.stopped {
            debug!(at_ms = sample.timestamp_ms, "sample after stop discarded");
            return Ok(());
        }
        if let Some(message) = error {
            warn!(at_ms = sample.timestamp_ms, error = message, "sensor reported an error, sample dropped");
            return Ok(());
        }

        self.controller.on_sample(sample);
        Ok(())
    }
}

fn lock(state: &Mutex<DetectorState>) -> MutexGuard<'_, DetectorState> {
    // A panicking observer never holds this lock, so a poisoned guard still
    // carries consistent totals.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared shake detector handle
///
/// Cloning is cheap; every clone drives the same detector.
#[derive(Clone)]
pub struct ShakeDetector {
    state: Arc<Mutex<DetectorState>>,
    observer: Arc<dyn ShakeObserver>,
}

impl ShakeDetector {
    /// Create a detector, failing fast on an invalid configuration
    pub fn new(config: ShakeConfig, observer: Arc<dyn ShakeObserver>) -> Result<Self, ShakeError> {
        config.validate()?;
        info!(
            axes = config.axes.count(),
            threshold = config.threshold,
            sample_interval_hz = config.sample_interval_hz,
            "shake detector created"
        );

        Ok(Self {
            state: Arc::new(Mutex::new(DetectorState {
                controller: GestureEpisodeController::new(config),
                sensor_unavailable: false,
                stopped: false,
            })),
            observer,
        })
    }

    /// Handle for the sensor delivery thread
    pub fn sample_sink(&self) -> SampleSink {
        SampleSink {
            state: Arc::clone(&self.state),
        }
    }

    /// Feed one accelerometer sample
    pub fn push_sample(&self, sample: &Sample) -> Result<(), ShakeError> {
        lock(&self.state).accept(sample, None)
    }

    /// Feed one sensor callback, dropping it when the sensor flagged an error
    pub fn push_reading(&self, sample: &Sample, error: Option<&str>) -> Result<(), ShakeError> {
        lock(&self.state).accept(sample, error)
    }

    /// Open an episode at `now_ms`.
    ///
    /// `now_ms` must be on the sensor clock used for `Sample::timestamp_ms`,
    /// otherwise `episode_timeout_ms` measures across two clocks.
    pub fn begin(&self, now_ms: u64) -> bool {
        let mut state = lock(&self.state);
        if state.stopped {
            return false;
        }
        state.controller.begin(now_ms)
    }

    /// Close the open episode and notify the observer
    pub fn end(&self, now_ms: u64) -> Option<ShakeResolution> {
        let resolution = {
            let mut state = lock(&self.state);
            if state.stopped {
                return None;
            }
            state.controller.end(now_ms)
        };

        if let Some(resolution) = &resolution {
            self.observer.axis_resolved(resolution);
        }
        resolution
    }

    pub fn cancel(&self, now_ms: u64) -> bool {
        let mut state = lock(&self.state);
        if state.stopped {
            return false;
        }
        state.controller.cancel(now_ms)
    }

    /// Dispatch a gesture signal from the platform
    pub fn handle(&self, signal: GestureSignal, now_ms: u64) -> Option<ShakeResolution> {
        match signal {
            GestureSignal::Begin => {
                self.begin(now_ms);
                None
            }
            GestureSignal::End => self.end(now_ms),
            GestureSignal::Cancel => {
                self.cancel(now_ms);
                None
            }
        }
    }

    /// Mark the accelerometer as unavailable for the rest of the session.
    ///
    /// The observer hears about it once; later samples are rejected.
    pub fn report_sensor_unavailable(&self) {
        {
            let mut state = lock(&self.state);
            if state.sensor_unavailable {
                return;
            }
            state.sensor_unavailable = true;
            state.controller.reset();
        }

        warn!("accelerometer unavailable, no samples will be processed");
        self.observer.sensor_unavailable();
    }

    /// Stop processing. Safe to call repeatedly and with no episode open.
    pub fn stop(&self) {
        let mut state = lock(&self.state);
        if state.stopped {
            return;
        }
        state.stopped = true;
        state.controller.reset();
        info!("shake detector stopped");
    }

    pub fn is_stopped(&self) -> bool {
        lock(&self.state).stopped
    }

    pub fn is_sensor_unavailable(&self) -> bool {
        lock(&self.state).sensor_unavailable
    }

    pub fn snapshot(&self) -> AxisTotals {
        lock(&self.state).controller.snapshot()
    }

    pub fn episode_state(&self) -> EpisodeState {
        lock(&self.state).controller.state()
    }

    pub fn config(&self) -> ShakeConfig {
        lock(&self.state).controller.config().clone()
    }
}

/// Sample-only handle given to the sensor delivery thread
#[derive(Clone)]
pub struct SampleSink {
    state: Arc<Mutex<DetectorState>>,
}

impl SampleSink {
    pub fn push_sample(&self, sample: &Sample) -> Result<(), ShakeError> {
        lock(&self.state).accept(sample, None)
    }

    pub fn push_reading(&self, sample: &Sample, error: Option<&str>) -> Result<(), ShakeError> {
        lock(&self.state).accept(sample, error)
    }
}
