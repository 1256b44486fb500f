//! Segment geometry for hit detection
//!
//! Both the aim preview and the flight check reduce to one question: where do
//! two line segments cross? The test is exact: parallel lines are detected by
//! a determinant of exactly zero, with no tolerance band.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::polar_to_cartesian;

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: DVec2,
    pub end: DVec2,
}

impl Segment {
    pub const fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }

    /// Segment of `length` leaving `origin` in direction `angle`
    pub fn from_angle(origin: DVec2, angle: f64, length: f64) -> Self {
        Self {
            start: origin,
            end: origin + polar_to_cartesian(length, angle),
        }
    }

    /// Same segment shifted by `offset`
    #[inline]
    pub fn translated(&self, offset: DVec2) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    #[inline]
    pub fn delta(&self) -> DVec2 {
        self.end - self.start
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.delta().length()
    }

    #[inline]
    pub fn midpoint(&self) -> DVec2 {
        (self.start + self.end) * 0.5
    }
}

/// Crossing point of the infinite lines through two segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub point: DVec2,
    /// Crossing lies within the first segment's extent
    pub on_a: bool,
    /// Crossing lies within the second segment's extent
    pub on_b: bool,
}

impl Intersection {
    /// True only when the crossing lies on both segments
    #[inline]
    pub fn is_contact(&self) -> bool {
        self.on_a && self.on_b
    }
}

/// Intersect the lines through `a` and `b`
///
/// Returns `None` when the lines are parallel (determinant exactly zero).
/// A crossing outside either segment is still returned, flagged by `on_a` /
/// `on_b`; callers must check [`Intersection::is_contact`] before treating it
/// as a collision.
pub fn intersect(a: &Segment, b: &Segment) -> Option<Intersection> {
    let da = a.delta();
    let db = b.delta();
    let c = a.start - b.start;

    let denominator = db.y * da.x - db.x * da.y;
    if denominator == 0.0 {
        return None;
    }

    let ua = (db.x * c.y - db.y * c.x) / denominator;
    let ub = (da.x * c.y - da.y * c.x) / denominator;

    Some(Intersection {
        point: a.start + da * ua,
        on_a: (0.0..=1.0).contains(&ua),
        on_b: (0.0..=1.0).contains(&ub),
    })
}

/// Check whether two segments physically touch
#[inline]
pub fn segments_touch(a: &Segment, b: &Segment) -> Option<DVec2> {
    intersect(a, b)
        .filter(Intersection::is_contact)
        .map(|hit| hit.point)
}
