//! Cubic Bézier trajectory with arclength parameterization
//!
//! A trajectory is defined by four control points:
//! - p0: launch point
//! - p1, p2: shape the arc (derived from the draw vector)
//! - p3: landing point on the forward baseline
//!
//! Arrows travel at constant speed along the path, so positions are looked
//! up by distance travelled rather than by the raw curve parameter. The
//! cumulative length table is built once per curve from fixed-step samples.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::CURVE_SAMPLES;
use crate::heading;

/// A cubic Bézier curve with a precomputed arclength table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryCurve {
    /// Control points p0..p3
    pub points: [DVec2; 4],
    /// Cumulative chord length at t = i / CURVE_SAMPLES
    lengths: Vec<f64>,
}

impl TrajectoryCurve {
    pub fn new(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2) -> Self {
        let points = [p0, p1, p2, p3];
        let mut lengths = Vec::with_capacity(CURVE_SAMPLES + 1);
        lengths.push(0.0);

        let mut prev = bezier_point(&points, 0.0);
        let mut total = 0.0;
        for i in 1..=CURVE_SAMPLES {
            let p = bezier_point(&points, i as f64 / CURVE_SAMPLES as f64);
            total += (p - prev).length();
            lengths.push(total);
            prev = p;
        }

        Self { points, lengths }
    }

    #[inline]
    pub fn start(&self) -> DVec2 {
        self.points[0]
    }

    #[inline]
    pub fn end(&self) -> DVec2 {
        self.points[3]
    }

    /// Total path length
    #[inline]
    pub fn total_length(&self) -> f64 {
        self.lengths[CURVE_SAMPLES]
    }

    /// Point at curve parameter t in [0, 1]
    #[inline]
    pub fn point_at(&self, t: f64) -> DVec2 {
        bezier_point(&self.points, t.clamp(0.0, 1.0))
    }

    /// Map a distance along the path to the curve parameter
    pub fn param_at_length(&self, distance: f64) -> f64 {
        let s = distance.clamp(0.0, self.total_length());
        let i = self
            .lengths
            .partition_point(|&l| l <= s)
            .clamp(1, CURVE_SAMPLES)
            - 1;

        let span = self.lengths[i + 1] - self.lengths[i];
        let frac = if span > 0.0 {
            (s - self.lengths[i]) / span
        } else {
            0.0
        };
        (i as f64 + frac) / CURVE_SAMPLES as f64
    }

    /// Point reached after travelling `distance` along the path
    #[inline]
    pub fn point_at_length(&self, distance: f64) -> DVec2 {
        self.point_at(self.param_at_length(distance))
    }

    /// Position and heading at `distance` along the path
    ///
    /// The heading comes from a second sample one unit further along. At the
    /// end of the path the second sample is taken one unit back instead.
    pub fn pose_at_length(&self, distance: f64) -> (DVec2, f64) {
        let total = self.total_length();
        let s = distance.clamp(0.0, total);
        let here = self.point_at_length(s);
        let angle = if s + 1.0 <= total {
            heading(self.point_at_length(s + 1.0) - here)
        } else {
            heading(here - self.point_at_length(s - 1.0))
        };
        (here, angle)
    }

    /// Evenly spaced points along the path (for rendering the aim preview)
    pub fn sample(&self, num_points: usize) -> Vec<DVec2> {
        let total = self.total_length();
        (0..num_points)
            .map(|i| {
                let f = i as f64 / (num_points - 1).max(1) as f64;
                self.point_at_length(f * total)
            })
            .collect()
    }
}

/// Evaluate a cubic Bézier at parameter t
#[inline]
fn bezier_point(p: &[DVec2; 4], t: f64) -> DVec2 {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    p[0] * a + p[1] * b + p[2] * c + p[3] * d
}
