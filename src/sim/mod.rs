//! Simulation module
//!
//! All gameplay logic lives here. Everything below `game` is pure and
//! deterministic:
//! - Time comes in as an argument, never read from a clock
//! - Seeded RNG only
//! - No rendering or platform dependencies
//!
//! `game` binds these pieces to a [`Scheduler`](crate::platform::Scheduler).

pub mod aim;
pub mod curve;
pub mod flight;
pub mod game;
pub mod geometry;
pub mod session;
pub mod target;

pub use aim::{DrawVector, clamp_draw_point, compute_aim, derive_trajectory, sample_jitter};
pub use curve::TrajectoryCurve;
pub use flight::{ArrowPose, FlightHandle, FlightStep, Projectile, ShotKind, ShotOutcome, release};
pub use game::{
    ArcheryGame, GameEvent, GameEventLog, GameListener, GameSnapshot, IgnoreReason, InputOutcome,
};
pub use geometry::{Intersection, Segment, intersect, segments_touch};
pub use session::{EndReason, SessionPhase, SessionState, ShotRecord};
pub use target::{TargetGeometry, TargetMotion};
