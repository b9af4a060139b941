//! Per-axis energy accumulation across an episode

use crate::types::{AxisSet, AxisTotals, FilteredSample};

/// Running per-axis totals
///
/// Totals only grow between resets. Filtered samples are non-negative, so
/// every total stays at or above zero.
#[derive(Debug, Clone)]
pub struct EnergyAccumulator {
    axes: AxisSet,
    totals: AxisTotals,
    /// Samples with at least one non-zero component since the last reset
    contributing_samples: u32,
    /// Timestamp of the most recent non-zero contribution
    last_contribution_ms: Option<u64>,
}

impl EnergyAccumulator {
    pub fn new(axes: AxisSet) -> Self {
        Self {
            axes,
            totals: AxisTotals::default(),
            contributing_samples: 0,
            last_contribution_ms: None,
        }
    }

    /// Add one filtered sample to the running totals
    pub fn add(&mut self, filtered: &FilteredSample) {
        for &axis in self.axes.axes() {
            self.totals.add(axis, filtered.component(axis));
        }

        if !filtered.is_silent() {
            self.contributing_samples = self.contributing_samples.saturating_add(1);
            self.last_contribution_ms = Some(filtered.timestamp_ms);
        }
    }

    /// Clear all accumulated energy
    pub fn reset(&mut self) {
        self.totals = AxisTotals::default();
        self.contributing_samples = 0;
        self.last_contribution_ms = None;
    }

    /// Copy of the current totals
    pub fn snapshot(&self) -> AxisTotals {
        self.totals
    }

    pub fn contributing_samples(&self) -> u32 {
        self.contributing_samples
    }

    pub fn last_contribution_ms(&self) -> Option<u64> {
        self.last_contribution_ms
    }

    pub fn axes(&self) -> AxisSet {
        self.axes
    }
}
