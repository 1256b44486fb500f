//! Arrow flight and hit resolution
//!
//! A released arrow follows its frozen trajectory at constant speed for a
//! fixed duration. Every frame it projects a short probe along its heading
//! and tests it against the target's hit segment *at the target's current
//! offset*. The first contact resolves the shot; reaching the end of the
//! path without contact is a miss. Each projectile resolves exactly once.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::curve::TrajectoryCurve;
use super::geometry::{Segment, segments_touch};
use super::target::{TargetGeometry, TargetMotion};
use crate::consts::*;
use crate::platform::{CancelHandle, Scheduler};

/// How a shot ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotKind {
    Bullseye,
    Hit,
    Miss,
}

impl ShotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotKind::Bullseye => "bullseye",
            ShotKind::Hit => "hit",
            ShotKind::Miss => "miss",
        }
    }
}

/// Result of one resolved arrow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotOutcome {
    pub kind: ShotKind,
    pub score: u32,
    /// Distance from the target center (hits only)
    pub distance: Option<f64>,
    /// Where the arrow struck (hits only)
    pub impact: Option<DVec2>,
}

impl ShotOutcome {
    pub fn miss() -> Self {
        Self {
            kind: ShotKind::Miss,
            score: 0,
            distance: None,
            impact: None,
        }
    }

    /// Classify a hit by its distance from the target center
    pub fn hit_at(impact: DVec2, center: DVec2) -> Self {
        let distance = impact.distance(center);
        let kind = if distance < BULLSEYE_RADIUS {
            ShotKind::Bullseye
        } else {
            ShotKind::Hit
        };
        Self {
            kind,
            score: score_for_distance(distance),
            distance: Some(distance),
            impact: Some(impact),
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.kind != ShotKind::Miss
    }
}

/// Linear falloff from MAX_SCORE at the center, floored at MIN_SCORE
pub fn score_for_distance(distance: f64) -> u32 {
    let raw = (MAX_SCORE as f64 - distance * SCORE_FALLOFF).round();
    raw.max(MIN_SCORE as f64) as u32
}

/// Arrow position for rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowPose {
    pub position: DVec2,
    /// Heading along the path (radians)
    pub rotation: f64,
    /// Fraction of the flight completed
    pub progress: f64,
}

/// Result of advancing a projectile by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightStep {
    /// Still travelling
    Flying(ArrowPose),
    /// Resolved on this frame (reported once)
    Resolved(ShotOutcome),
    /// Already resolved earlier; nothing changed
    Settled,
}

/// One released arrow
#[derive(Debug, Clone)]
pub struct Projectile {
    trajectory: TrajectoryCurve,
    start_ms: f64,
    duration_ms: f64,
    pose: ArrowPose,
    outcome: Option<ShotOutcome>,
}

impl Projectile {
    /// Freeze `trajectory` and start the flight clock at `start_ms`
    pub fn new(trajectory: TrajectoryCurve, start_ms: f64) -> Self {
        let (position, rotation) = trajectory.pose_at_length(0.0);
        Self {
            trajectory,
            start_ms,
            duration_ms: FLIGHT_DURATION_MS,
            pose: ArrowPose {
                position,
                rotation,
                progress: 0.0,
            },
            outcome: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[inline]
    pub fn trajectory(&self) -> &TrajectoryCurve {
        &self.trajectory
    }

    #[inline]
    pub fn pose(&self) -> ArrowPose {
        self.pose
    }

    #[inline]
    pub fn outcome(&self) -> Option<ShotOutcome> {
        self.outcome
    }

    #[inline]
    pub fn has_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    /// Move the arrow to its position at `now_ms` and test for a hit
    ///
    /// `target_offset` must be the target's offset at `now_ms`, not at
    /// release time.
    pub fn advance(&mut self, now_ms: f64, target_offset: f64) -> FlightStep {
        if self.outcome.is_some() {
            return FlightStep::Settled;
        }

        let progress = if self.duration_ms > 0.0 {
            ((now_ms - self.start_ms).max(0.0) / self.duration_ms).min(1.0)
        } else {
            1.0
        };
        let distance = progress * self.trajectory.total_length();
        let (position, rotation) = self.trajectory.pose_at_length(distance);
        self.pose = ArrowPose {
            position,
            rotation,
            progress,
        };

        let target = TargetGeometry::at_offset(target_offset);
        let probe = Segment::from_angle(position, rotation, ARROW_PROBE_LENGTH);
        if let Some(impact) = segments_touch(&probe, &target.hit_segment) {
            return self.resolve(ShotOutcome::hit_at(impact, target.center));
        }

        if progress >= 1.0 {
            return self.resolve(ShotOutcome::miss());
        }

        FlightStep::Flying(self.pose)
    }

    fn resolve(&mut self, outcome: ShotOutcome) -> FlightStep {
        log::trace!(
            "Arrow resolved: {} ({}) at progress {:.3}",
            outcome.kind.as_str(),
            outcome.score,
            self.pose.progress
        );
        self.outcome = Some(outcome);
        FlightStep::Resolved(outcome)
    }
}

type ResolvedCallback = Box<dyn FnOnce(ShotOutcome)>;

struct FlightLoop {
    projectile: Projectile,
    target: TargetMotion,
    frame: Option<CancelHandle>,
    on_resolved: Option<ResolvedCallback>,
}

/// Keeps a released arrow's frame loop alive
///
/// Dropping the handle stops the flight; `on_resolved` is then never called.
pub struct FlightHandle {
    flight: Rc<RefCell<FlightLoop>>,
}

impl FlightHandle {
    pub fn pose(&self) -> ArrowPose {
        self.flight.borrow().projectile.pose()
    }

    pub fn outcome(&self) -> Option<ShotOutcome> {
        self.flight.borrow().projectile.outcome()
    }

    pub fn has_resolved(&self) -> bool {
        self.flight.borrow().projectile.has_resolved()
    }

    /// Stop requesting frames
    pub fn cancel(&self) {
        let mut flight = self.flight.borrow_mut();
        flight.frame = None;
        flight.on_resolved = None;
    }
}

/// Launch an arrow along `trajectory`
///
/// Each frame samples the target offset at the frame's timestamp. The arrow
/// resolves at most once; `on_resolved` receives the outcome and the frame
/// loop stops.
pub fn release(
    scheduler: &Rc<dyn Scheduler>,
    trajectory: TrajectoryCurve,
    target: TargetMotion,
    on_resolved: impl FnOnce(ShotOutcome) + 'static,
) -> FlightHandle {
    let flight = Rc::new(RefCell::new(FlightLoop {
        projectile: Projectile::new(trajectory, scheduler.now()),
        target,
        frame: None,
        on_resolved: Some(Box::new(on_resolved)),
    }));
    request_frame(Rc::downgrade(scheduler), &flight);
    FlightHandle { flight }
}

fn request_frame(scheduler: Weak<dyn Scheduler>, flight: &Rc<RefCell<FlightLoop>>) {
    let Some(strong) = scheduler.upgrade() else {
        return;
    };
    let weak_flight = Rc::downgrade(flight);
    let handle = strong.request_tick(Box::new(move |now| {
        let Some(flight) = weak_flight.upgrade() else {
            return;
        };
        let step = {
            let mut f = flight.borrow_mut();
            let offset = f.target.offset_at(now);
            f.projectile.advance(now, offset)
        };
        match step {
            FlightStep::Flying(_) => request_frame(scheduler, &flight),
            FlightStep::Resolved(outcome) => {
                let callback = {
                    let mut f = flight.borrow_mut();
                    f.frame = None;
                    f.on_resolved.take()
                };
                if let Some(callback) = callback {
                    callback(outcome);
                }
            }
            FlightStep::Settled => {}
        }
    }));
    flight.borrow_mut().frame = Some(handle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::VirtualScheduler;
    use proptest::prelude::*;
    use std::cell::Cell;

    /// Level shot along y = `height`, evenly parameterized
    fn level_shot(height: f64) -> TrajectoryCurve {
        TrajectoryCurve::new(
            DVec2::new(100.0, height),
            DVec2::new(400.0, height),
            DVec2::new(700.0, height),
            DVec2::new(1000.0, height),
        )
    }

    /// Step a projectile at 60 Hz until it resolves
    fn fly(projectile: &mut Projectile, offset_at: impl Fn(f64) -> f64) -> ShotOutcome {
        for k in 1..=60 {
            let now = k as f64 * DEFAULT_FRAME_MS;
            if let FlightStep::Resolved(outcome) = projectile.advance(now, offset_at(now)) {
                return outcome;
            }
        }
        panic!("projectile never resolved");
    }

    #[test]
    fn test_score_mapping() {
        assert_eq!(score_for_distance(0.0), 100);
        assert_eq!(score_for_distance(1.5), 97);
        assert_eq!(score_for_distance(19.0), 62);
        assert_eq!(score_for_distance(1000.0), MIN_SCORE);
    }

    #[test]
    fn test_bullseye_boundary() {
        let center = TARGET_CENTER;
        let edge = ShotOutcome::hit_at(center + DVec2::new(0.0, BULLSEYE_RADIUS), center);
        assert_eq!(edge.kind, ShotKind::Hit);

        let inside = ShotOutcome::hit_at(center + DVec2::new(0.0, BULLSEYE_RADIUS - 1e-9), center);
        assert_eq!(inside.kind, ShotKind::Bullseye);
    }

    #[test]
    fn test_level_shot_hits_center() {
        let mut projectile = Projectile::new(level_shot(TARGET_CENTER.y), 0.0);
        let outcome = fly(&mut projectile, |_| 0.0);

        assert_eq!(outcome.kind, ShotKind::Bullseye);
        assert_eq!(outcome.score, MAX_SCORE);
        assert!(outcome.distance.is_some_and(|d| d < 1e-6));
    }

    #[test]
    fn test_level_shot_below_target_misses() {
        let mut projectile = Projectile::new(level_shot(400.0), 0.0);
        let outcome = fly(&mut projectile, |_| 0.0);

        assert_eq!(outcome, ShotOutcome::miss());
        assert_eq!(projectile.pose().progress, 1.0);
    }

    #[test]
    fn test_resolves_at_most_once() {
        let mut projectile = Projectile::new(level_shot(TARGET_CENTER.y), 0.0);
        let outcome = fly(&mut projectile, |_| 0.0);

        for k in 0..50 {
            // Even a target moved away cannot change the recorded outcome
            let step = projectile.advance(1000.0 + k as f64, 200.0);
            assert_eq!(step, FlightStep::Settled);
        }
        assert_eq!(projectile.outcome(), Some(outcome));
    }

    #[test]
    fn test_target_offset_read_at_check_time() {
        // Target shifted down by 20 while the arrow is in flight: the arrow
        // strikes the segment off-center
        let mut projectile = Projectile::new(level_shot(TARGET_CENTER.y), 0.0);
        let outcome = fly(&mut projectile, |now| if now < 100.0 { 0.0 } else { 20.0 });

        assert_eq!(outcome.kind, ShotKind::Hit);
        assert_eq!(outcome.score, 48);

        // Moved clear of the flight line entirely: miss
        let mut projectile = Projectile::new(level_shot(TARGET_CENTER.y), 0.0);
        let outcome = fly(&mut projectile, |now| if now < 100.0 { 0.0 } else { 100.0 });
        assert_eq!(outcome.kind, ShotKind::Miss);
    }

    #[test]
    fn test_release_reports_once() {
        let clock = Rc::new(VirtualScheduler::new());
        let scheduler: Rc<dyn Scheduler> = clock.clone();
        let calls = Rc::new(Cell::new(0));
        let score = Rc::new(Cell::new(0));

        let (c, s) = (Rc::clone(&calls), Rc::clone(&score));
        let handle = release(
            &scheduler,
            level_shot(TARGET_CENTER.y),
            TargetMotion::stationary(),
            move |outcome| {
                c.set(c.get() + 1);
                s.set(outcome.score);
            },
        );

        clock.advance(2000.0);
        assert_eq!(calls.get(), 1);
        assert_eq!(score.get(), MAX_SCORE);
        assert!(handle.has_resolved());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_dropped_flight_never_reports() {
        let clock = Rc::new(VirtualScheduler::new());
        let scheduler: Rc<dyn Scheduler> = clock.clone();
        let calls = Rc::new(Cell::new(0));

        let c = Rc::clone(&calls);
        let handle = release(
            &scheduler,
            level_shot(TARGET_CENTER.y),
            TargetMotion::stationary(),
            move |_| c.set(c.get() + 1),
        );

        clock.advance_frames(3);
        assert!(handle.pose().progress > 0.0);
        drop(handle);

        clock.advance(2000.0);
        assert_eq!(calls.get(), 0);
        assert_eq!(clock.pending(), 0);
    }

    proptest! {
        #[test]
        fn score_is_monotonic(d1 in 0.0f64..60.0, d2 in 0.0f64..60.0) {
            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            prop_assert!(score_for_distance(near) >= score_for_distance(far));
            prop_assert!(score_for_distance(far) >= MIN_SCORE);
            prop_assert!(score_for_distance(near) <= MAX_SCORE);
        }
    }
}
