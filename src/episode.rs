//! Gesture episode state machine
//!
//! Ties the filter, accumulator and classifier to the Begin/End/Cancel signals
//! delivered by the platform's gesture recognizer.
//!
//! Samples are accumulated in every state. Energy gathered while Idle is the
//! warm-up that the platform consumes before it reports Begin, so Begin does
//! not clear it. The flip side is that an episode whose End never arrives
//! leaves its energy behind for the next one. Two opt-in bounds exist for
//! that: `episode_timeout_ms` closes an overdue episode without resolving it,
//! and `stale_after_ms` drops Idle energy that has not been topped up recently.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::accumulator::EnergyAccumulator;
use crate::classifier::AxisClassifier;
use crate::config::ShakeConfig;
use crate::filter::SampleFilter;
use crate::types::{AxisTotals, GestureSignal, Sample, ShakeResolution};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    Idle,
    Accumulating,
}

/// Drives one detector through successive episodes
#[derive(Debug, Clone)]
pub struct GestureEpisodeController {
    config: ShakeConfig,
    accumulator: EnergyAccumulator,
    state: EpisodeState,
    began_at_ms: u64,
}

impl GestureEpisodeController {
    /// Create a controller from a validated configuration
    pub fn new(config: ShakeConfig) -> Self {
        Self {
            accumulator: EnergyAccumulator::new(config.axes),
            config,
            state: EpisodeState::Idle,
            began_at_ms: 0,
        }
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn config(&self) -> &ShakeConfig {
        &self.config
    }

    /// Current totals, warm-up included
    pub fn snapshot(&self) -> AxisTotals {
        self.accumulator.snapshot()
    }

    /// Filter a sample and fold it into the totals
    pub fn on_sample(&mut self, sample: &Sample) {
        self.expire_if_overdue(sample.timestamp_ms);

        if self.state == EpisodeState::Idle {
            self.drop_stale_energy(sample.timestamp_ms);
        }

        let filtered = SampleFilter::filter(sample, &self.config);
        self.accumulator.add(&filtered);
    }

    /// Open an episode. Returns false if one is already open.
    pub fn begin(&mut self, now_ms: u64) -> bool {
        self.expire_if_overdue(now_ms);

        if self.state == EpisodeState::Accumulating {
            debug!(began_at_ms = self.began_at_ms, "begin ignored, episode already open");
            return false;
        }

        self.state = EpisodeState::Accumulating;
        self.began_at_ms = now_ms;
        debug!(
            at_ms = now_ms,
            warm_up_samples = self.accumulator.contributing_samples(),
            "episode began"
        );
        true
    }

    /// Close the open episode and resolve its dominant axis.
    ///
    /// Returns `None` when no episode is open; totals are left untouched in
    /// that case.
    pub fn end(&mut self, now_ms: u64) -> Option<ShakeResolution> {
        self.expire_if_overdue(now_ms);

        if self.state == EpisodeState::Idle {
            debug!(at_ms = now_ms, "end ignored, no open episode");
            return None;
        }

        let totals = self.accumulator.snapshot();
        let axis = AxisClassifier::classify(&totals, self.config.axes);
        let resolution = ShakeResolution {
            episode_id: Uuid::new_v4(),
            axis,
            totals,
            samples_accumulated: self.accumulator.contributing_samples(),
            began_at_ms: self.began_at_ms,
            ended_at_ms: now_ms,
        };

        self.accumulator.reset();
        self.state = EpisodeState::Idle;
        debug!(
            axis = axis.as_str(),
            x = totals.x,
            y = totals.y,
            z = totals.z,
            "episode resolved"
        );
        Some(resolution)
    }

    /// Abandon the open episode without resolving it.
    ///
    /// Returns false when no episode is open.
    pub fn cancel(&mut self, now_ms: u64) -> bool {
        self.expire_if_overdue(now_ms);

        if self.state == EpisodeState::Idle {
            debug!(at_ms = now_ms, "cancel ignored, no open episode");
            return false;
        }

        self.accumulator.reset();
        self.state = EpisodeState::Idle;
        debug!(at_ms = now_ms, "episode cancelled");
        true
    }

    /// Dispatch an external gesture signal
    pub fn handle(&mut self, signal: GestureSignal, now_ms: u64) -> Option<ShakeResolution> {
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

    /// Clear all energy and return to Idle
    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.state = EpisodeState::Idle;
    }

    fn expire_if_overdue(&mut self, now_ms: u64) {
        let Some(timeout_ms) = self.config.episode_timeout_ms else {
            return;
        };
        if self.state != EpisodeState::Accumulating {
            return;
        }

        let open_for = now_ms.saturating_sub(self.began_at_ms);
        if open_for > timeout_ms {
            warn!(
                open_for_ms = open_for,
                timeout_ms, "episode timed out without end, discarding energy"
            );
            self.accumulator.reset();
            self.state = EpisodeState::Idle;
        }
    }

    fn drop_stale_energy(&mut self, now_ms: u64) {
        let (Some(stale_after_ms), Some(last_ms)) = (
            self.config.stale_after_ms,
            self.accumulator.last_contribution_ms(),
        ) else {
            return;
        };

        let age = now_ms.saturating_sub(last_ms);
        if age > stale_after_ms {
            debug!(age_ms = age, "dropping stale idle energy");
            self.accumulator.reset();
        }
    }
}
