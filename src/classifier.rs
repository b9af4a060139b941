//! Dominant-axis classification

use crate::types::{Axis, AxisSet, AxisTotals};

/// Picks the axis with the most accumulated energy
pub struct AxisClassifier;

impl AxisClassifier {
    /// Resolve the dominant axis among the active set.
    ///
    /// Ties go to the earlier axis in X, Y, Z order, so all-zero totals
    /// resolve to X. Only a strictly larger total displaces the current
    /// leader.
    pub fn classify(totals: &AxisTotals, axes: AxisSet) -> Axis {
        let mut winner = Axis::X;
        let mut best = totals.get(Axis::X);

        for &axis in &axes.axes()[1..] {
            let value = totals.get(axis);
            if value > best {
                winner = axis;
                best = value;
            }
        }

        winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_prefers_x() {
        let totals = AxisTotals::new(5.0, 5.0, 0.0);
        assert_eq!(AxisClassifier::classify(&totals, AxisSet::Spatial), Axis::X);
        assert_eq!(AxisClassifier::classify(&totals, AxisSet::Planar), Axis::X);
    }

    #[test]
    fn test_tie_between_y_and_z_prefers_y() {
        let totals = AxisTotals::new(0.0, 3.0, 3.0);
        assert_eq!(AxisClassifier::classify(&totals, AxisSet::Spatial), Axis::Y);
    }

    #[test]
    fn test_all_zero_defaults_to_x() {
        let totals = AxisTotals::default();
        assert_eq!(AxisClassifier::classify(&totals, AxisSet::Spatial), Axis::X);
        assert_eq!(AxisClassifier::classify(&totals, AxisSet::Planar), Axis::X);
    }

    #[test]
    fn test_strict_maximum_wins() {
        assert_eq!(
            AxisClassifier::classify(&AxisTotals::new(1.0, 4.0, 2.0), AxisSet::Spatial),
            Axis::Y
        );
        assert_eq!(
            AxisClassifier::classify(&AxisTotals::new(1.0, 4.0, 6.0), AxisSet::Spatial),
            Axis::Z
        );
    }

    #[test]
    fn test_planar_never_returns_z() {
        let totals = AxisTotals::new(1.0, 2.0, 100.0);
        assert_eq!(AxisClassifier::classify(&totals, AxisSet::Planar), Axis::Y);
    }
}
