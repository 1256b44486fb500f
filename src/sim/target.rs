//! Moving target
//!
//! The target bobs vertically between -60 and +60 forever, independent of
//! any shot. Its offset is a pure function of time since the motion origin,
//! so any number of queries at arbitrary instants describe one continuous
//! motion.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::Segment;
use crate::consts::*;

/// Vertical yoyo oscillation of the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetMotion {
    /// Time the motion started (ms, scheduler clock)
    pub origin_ms: f64,
    /// Peak displacement from rest
    pub amplitude: f64,
    /// Time to travel from one extreme to the other
    pub half_period_ms: f64,
}

impl TargetMotion {
    pub fn new(origin_ms: f64, half_period_ms: f64) -> Self {
        Self {
            origin_ms,
            amplitude: TARGET_AMPLITUDE,
            half_period_ms,
        }
    }

    /// A target pinned at its rest position
    pub fn stationary() -> Self {
        Self {
            origin_ms: 0.0,
            amplitude: 0.0,
            half_period_ms: DEFAULT_TARGET_HALF_PERIOD_MS,
        }
    }

    /// Vertical offset at `now_ms`
    ///
    /// Starts at 0 and sweeps through ±amplitude with an eased turnaround
    /// at each extreme.
    pub fn offset_at(&self, now_ms: f64) -> f64 {
        if self.amplitude == 0.0 || self.half_period_ms <= 0.0 {
            return 0.0;
        }
        let phase = (now_ms - self.origin_ms) / self.half_period_ms * std::f64::consts::PI;
        self.amplitude * phase.sin()
    }

    /// Upper bound on how fast the offset can change (units per ms)
    pub fn max_speed(&self) -> f64 {
        if self.half_period_ms <= 0.0 {
            return 0.0;
        }
        self.amplitude.abs() * std::f64::consts::PI / self.half_period_ms
    }
}

impl Default for TargetMotion {
    fn default() -> Self {
        Self::new(0.0, DEFAULT_TARGET_HALF_PERIOD_MS)
    }
}

/// Target hit segment and center at a given vertical offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetGeometry {
    pub hit_segment: Segment,
    pub center: DVec2,
}

impl TargetGeometry {
    pub fn at_offset(offset: f64) -> Self {
        let shift = DVec2::new(0.0, offset);
        Self {
            hit_segment: Segment::new(TARGET_HIT_START, TARGET_HIT_END).translated(shift),
            center: TARGET_CENTER + shift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_at_rest_and_reaches_extremes() {
        let motion = TargetMotion::new(1000.0, 2000.0);
        assert_eq!(motion.offset_at(1000.0), 0.0);
        assert!((motion.offset_at(2000.0) - 60.0).abs() < 1e-9);
        assert!((motion.offset_at(4000.0) + 60.0).abs() < 1e-9);
        assert!(motion.offset_at(3000.0).abs() < 1e-9);
    }

    #[test]
    fn test_repeats_every_full_period() {
        let motion = TargetMotion::new(0.0, 1500.0);
        for t in [0.0, 123.0, 987.5, 2222.0] {
            assert!((motion.offset_at(t) - motion.offset_at(t + 3000.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stationary() {
        let motion = TargetMotion::stationary();
        assert_eq!(motion.offset_at(0.0), 0.0);
        assert_eq!(motion.offset_at(12345.0), 0.0);
        assert_eq!(motion.max_speed(), 0.0);
    }

    #[test]
    fn test_geometry_follows_offset() {
        let rest = TargetGeometry::at_offset(0.0);
        assert_eq!(rest.center, TARGET_CENTER);
        // At rest the center sits on the middle of the hit segment
        assert!((rest.hit_segment.midpoint() - rest.center).length() < 1e-12);

        let raised = TargetGeometry::at_offset(-40.0);
        assert_eq!(raised.center, TARGET_CENTER - DVec2::new(0.0, 40.0));
        assert_eq!(raised.hit_segment.start, TARGET_HIT_START - DVec2::new(0.0, 40.0));
    }

    proptest! {
        #[test]
        fn offset_is_bounded_and_continuous(
            t in 0.0f64..100_000.0,
            dt in 0.0f64..50.0,
            half_period in 200.0f64..5000.0,
        ) {
            let motion = TargetMotion::new(0.0, half_period);
            let a = motion.offset_at(t);
            let b = motion.offset_at(t + dt);
            prop_assert!(a.abs() <= TARGET_AMPLITUDE + 1e-9);
            prop_assert!(b.abs() <= TARGET_AMPLITUDE + 1e-9);
            prop_assert!((b - a).abs() <= motion.max_speed() * dt + 1e-9);
        }
    }
}
