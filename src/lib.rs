//! Archery Range - aiming, flight and scoring engine for an archery mini-game
//!
//! Core modules:
//! - `sim`: Simulation (geometry, aim, flight, target motion, session rules)
//! - `platform`: Scheduler abstraction (frame callbacks, timers, virtual clock)
//! - `settings`: Session options and difficulty presets

pub mod platform;
pub mod settings;
pub mod sim;

pub use platform::{CancelHandle, Scheduler, VirtualScheduler};
pub use settings::{Difficulty, SessionOptions};

use glam::DVec2;

/// Game configuration constants
///
/// Local coordinates follow screen conventions: x grows right, y grows down.
pub mod consts {
    use glam::DVec2;

    /// Bow hand; draw vectors are measured from here
    pub const PIVOT: DVec2 = DVec2::new(100.0, 250.0);
    /// Where every trajectory curve starts
    pub const LAUNCH_POINT: DVec2 = DVec2::new(100.0, 250.0);
    /// Neutral bowstring position (draws must start near it)
    pub const BOWSTRING_REST: DVec2 = DVec2::new(88.0, 250.0);
    pub const CAPTURE_RADIUS: f64 = 60.0;

    /// Draw point must stay this far behind and below the pivot
    pub const DRAW_CLAMP_MARGIN: f64 = 7.0;
    pub const MAX_DRAW_DISTANCE: f64 = 50.0;
    /// Aim jitter half-range (radians), drawn once per shot
    pub const DEFAULT_AIM_JITTER: f64 = std::f64::consts::PI * 0.015;

    /// Trajectory shape
    pub const CONTROL_RADIUS_PER_POWER: f64 = 7.5;
    pub const ARC_WIDTH_FACTOR: f64 = 2.8;
    /// Forward baseline sits this far below the launch point
    pub const ARC_BASELINE_DROP: f64 = 50.0;
    /// Arclength table resolution
    pub const CURVE_SAMPLES: usize = 100;

    /// Target layout at rest (offset 0)
    pub const TARGET_CENTER: DVec2 = DVec2::new(750.0, 250.0);
    pub const TARGET_HIT_START: DVec2 = DVec2::new(725.0, 280.0);
    pub const TARGET_HIT_END: DVec2 = DVec2::new(775.0, 220.0);
    pub const TARGET_AMPLITUDE: f64 = 60.0;
    pub const DEFAULT_TARGET_HALF_PERIOD_MS: f64 = 2000.0;

    /// Arrow flight
    pub const FLIGHT_DURATION_MS: f64 = 500.0;
    /// Length of the forward probe used for hit detection
    pub const ARROW_PROBE_LENGTH: f64 = 60.0;

    /// Scoring
    pub const BULLSEYE_RADIUS: f64 = 7.0;
    pub const MAX_SCORE: u32 = 100;
    pub const MIN_SCORE: u32 = 10;
    pub const SCORE_FALLOFF: f64 = 2.0;

    /// Session defaults
    pub const DEFAULT_MAX_ARROWS: u32 = 10;
    pub const DEFAULT_SESSION_SECONDS: u32 = 60;
    /// Session clock cadence
    pub const CLOCK_TICK_MS: f64 = 1000.0;
    /// Wait between the end condition and the Ended transition
    pub const END_GRACE_DELAY_MS: f64 = 1500.0;

    /// Virtual scheduler frame interval (60 Hz)
    pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> DVec2 {
    DVec2::new(r * theta.cos(), r * theta.sin())
}

/// Direction angle of a vector (radians, screen coordinates)
#[inline]
pub fn heading(v: DVec2) -> f64 {
    v.y.atan2(v.x)
}
