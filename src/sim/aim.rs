//! Aim model: pointer position → draw vector → trajectory curve
//!
//! The player pulls the string down and away from the bow hand. The pull
//! direction (plus a per-shot jitter) sets the launch angle, the pull length
//! sets the power, and both shape the cubic flight path.

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::curve::TrajectoryCurve;
use crate::consts::*;
use crate::{heading, polar_to_cartesian};

/// Current pull of the bowstring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawVector {
    /// Direction from pivot to draw point, jitter included (radians)
    pub angle: f64,
    /// Pull length, clamped to [0, MAX_DRAW_DISTANCE]
    pub power: f64,
}

impl DrawVector {
    /// Rotation of the bow (it points away from the pull)
    #[inline]
    pub fn bow_angle(&self) -> f64 {
        self.angle - std::f64::consts::PI
    }

    /// How far the string visibly moves back from rest
    ///
    /// The bow stretches up to 2x as power grows, so the string travels
    /// less than the raw pull.
    pub fn string_pull(&self) -> f64 {
        let stretch = (self.power / 30.0).clamp(1.0, 2.0);
        self.power / stretch
    }

    /// Power as a fraction of the maximum draw
    #[inline]
    pub fn charge(&self) -> f64 {
        self.power / MAX_DRAW_DISTANCE
    }

    pub fn trajectory(&self) -> TrajectoryCurve {
        derive_trajectory(self)
    }
}

/// Keep the draw point behind and below the pivot
#[inline]
pub fn clamp_draw_point(pointer: DVec2, pivot: DVec2) -> DVec2 {
    DVec2::new(
        pointer.x.min(pivot.x - DRAW_CLAMP_MARGIN),
        pointer.y.max(pivot.y + DRAW_CLAMP_MARGIN),
    )
}

/// Convert a pointer position into a draw vector
///
/// `jitter` is fixed for the whole draw gesture, so the preview and the
/// released shot use the same angle.
pub fn compute_aim(pointer: DVec2, pivot: DVec2, jitter: f64) -> DrawVector {
    let delta = clamp_draw_point(pointer, pivot) - pivot;
    DrawVector {
        angle: heading(delta) + jitter,
        power: delta.length().min(MAX_DRAW_DISTANCE),
    }
}

/// Build the flight path for a draw vector
///
/// Control points relative to the launch point:
/// - p1 = offset (radius = power × 7.5 along the bow angle)
/// - p2 = (arc_width − offset.x, offset.y + baseline drop)
/// - p3 = (arc_width, baseline drop), arc_width = 2.8 × offset.x
pub fn derive_trajectory(draw: &DrawVector) -> TrajectoryCurve {
    let radius = draw.power * CONTROL_RADIUS_PER_POWER;
    let offset = polar_to_cartesian(radius, draw.bow_angle());
    let arc_width = offset.x * ARC_WIDTH_FACTOR;

    TrajectoryCurve::new(
        LAUNCH_POINT,
        LAUNCH_POINT + offset,
        LAUNCH_POINT + DVec2::new(arc_width - offset.x, offset.y + ARC_BASELINE_DROP),
        LAUNCH_POINT + DVec2::new(arc_width, ARC_BASELINE_DROP),
    )
}

/// Draw a hand-unsteadiness angle in [-half_range, half_range]
pub fn sample_jitter<R: Rng>(rng: &mut R, half_range: f64) -> f64 {
    if half_range <= 0.0 {
        return 0.0;
    }
    rng.random_range(-half_range..=half_range)
}

/// Whether a pointer-down lands close enough to the bowstring to grab it
#[inline]
pub fn within_capture_radius(pointer: DVec2) -> bool {
    pointer.distance(BOWSTRING_REST) <= CAPTURE_RADIUS
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::f64::consts::PI;

    #[test]
    fn test_power_is_clamped() {
        let far = PIVOT + DVec2::new(-300.0, 300.0);
        let draw = compute_aim(far, PIVOT, 0.0);
        assert_eq!(draw.power, MAX_DRAW_DISTANCE);
        assert!((draw.charge() - 1.0).abs() < 1e-12);

        let near = PIVOT + DVec2::new(-20.0, 15.0);
        let draw = compute_aim(near, PIVOT, 0.0);
        assert!((draw.power - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_draw_point_stays_down_and_away() {
        // Pointer up and in front of the pivot gets pulled to the corner
        let clamped = clamp_draw_point(PIVOT + DVec2::new(40.0, -40.0), PIVOT);
        assert_eq!(clamped, PIVOT + DVec2::new(-DRAW_CLAMP_MARGIN, DRAW_CLAMP_MARGIN));

        let draw = compute_aim(PIVOT + DVec2::new(40.0, -40.0), PIVOT, 0.0);
        assert!((draw.angle - 3.0 * PI / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_jitter_is_added_to_angle() {
        let pointer = PIVOT + DVec2::new(-30.0, 30.0);
        let base = compute_aim(pointer, PIVOT, 0.0);
        let shaken = compute_aim(pointer, PIVOT, 0.02);
        assert!((shaken.angle - base.angle - 0.02).abs() < 1e-12);
        assert_eq!(shaken.power, base.power);
    }

    #[test]
    fn test_trajectory_control_points() {
        let draw = DrawVector {
            angle: 5.0 * PI / 6.0,
            power: 40.0,
        };
        let curve = derive_trajectory(&draw);
        let radius = 40.0 * 7.5;
        let bow = draw.bow_angle();

        assert_eq!(curve.start(), LAUNCH_POINT);
        let end_offset = curve.end() - LAUNCH_POINT;
        assert!((end_offset.x - 2.8 * radius * bow.cos()).abs() < 1e-9);
        assert!((end_offset.y - ARC_BASELINE_DROP).abs() < 1e-12);

        // The arc bows upward (negative y) before coming down to the baseline
        assert!(curve.points[1].y < LAUNCH_POINT.y);
    }

    #[test]
    fn test_more_power_reaches_further() {
        let angle = 5.0 * PI / 6.0;
        let weak = derive_trajectory(&DrawVector { angle, power: 20.0 });
        let strong = derive_trajectory(&DrawVector { angle, power: 45.0 });
        assert!(strong.end().x > weak.end().x);
        assert!(strong.total_length() > weak.total_length());
    }

    #[test]
    fn test_string_pull() {
        let soft = DrawVector { angle: PI, power: 15.0 };
        assert!((soft.string_pull() - 15.0).abs() < 1e-12);
        let full = DrawVector { angle: PI, power: 50.0 };
        assert!((full.string_pull() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_jitter_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let j = sample_jitter(&mut rng, DEFAULT_AIM_JITTER);
            assert!(j.abs() <= DEFAULT_AIM_JITTER);
        }
        assert_eq!(sample_jitter(&mut rng, 0.0), 0.0);
    }

    #[test]
    fn test_capture_radius() {
        assert!(within_capture_radius(BOWSTRING_REST));
        assert!(within_capture_radius(BOWSTRING_REST + DVec2::new(-30.0, 40.0)));
        assert!(!within_capture_radius(TARGET_CENTER));
    }
}
