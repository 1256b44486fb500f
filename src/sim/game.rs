//! Session runtime
//!
//! Wires pointer input, aiming, arrow flights, the session clock and the
//! end-of-session grace delay onto a host [`Scheduler`]. All mutable state
//! lives in one [`SessionRuntimeState`]; scheduled callbacks reach it through
//! weak references, and every callback handle is owned by that state, so
//! dropping the game cancels everything it scheduled.
//!
//! Calls that arrive at the wrong time (drawing before start, releasing with
//! no draw, input after the end) are ignored and reported as
//! [`InputOutcome::Ignored`]; nothing here panics or errors on bad timing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::aim::{DrawVector, compute_aim, derive_trajectory, sample_jitter, within_capture_radius};
use super::curve::TrajectoryCurve;
use super::flight::{self, ArrowPose, FlightHandle, ShotKind, ShotOutcome};
use super::session::{EndReason, SessionPhase, SessionState, ShotRecord};
use super::target::TargetMotion;
use crate::consts::*;
use crate::platform::{CancelHandle, Scheduler};
use crate::settings::SessionOptions;

/// Receives the session's output
pub trait GameListener {
    /// Called once per resolved arrow
    fn on_score(&mut self, score: u32, kind: ShotKind);
    /// Called exactly once, when the session ends
    fn on_game_end(&mut self, final_score: u32);
}

/// Output of a session as data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Score { score: u32, kind: ShotKind },
    GameEnd { final_score: u32 },
}

/// Listener that records every event; clones share one log
#[derive(Debug, Clone, Default)]
pub struct GameEventLog {
    events: Rc<RefCell<Vec<GameEvent>>>,
}

impl GameEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    /// Scores of resolved arrows, in order
    pub fn scores(&self) -> Vec<u32> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                GameEvent::Score { score, .. } => Some(*score),
                GameEvent::GameEnd { .. } => None,
            })
            .collect()
    }

    pub fn final_score(&self) -> Option<u32> {
        self.events.borrow().iter().find_map(|e| match e {
            GameEvent::GameEnd { final_score } => Some(*final_score),
            GameEvent::Score { .. } => None,
        })
    }
}

impl GameListener for GameEventLog {
    fn on_score(&mut self, score: u32, kind: ShotKind) {
        self.events.borrow_mut().push(GameEvent::Score { score, kind });
    }

    fn on_game_end(&mut self, final_score: u32) {
        self.events.borrow_mut().push(GameEvent::GameEnd { final_score });
    }
}

/// Result of an input call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Accepted,
    Ignored(IgnoreReason),
}

/// Why an input call was a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotStarted,
    AlreadyStarted,
    SessionOver,
    NoArrowsLeft,
    OutsideCaptureRadius,
    AlreadyDrawing,
    NotDrawing,
}

/// The draw gesture in progress
#[derive(Debug, Clone)]
struct DrawState {
    /// Fixed for the whole gesture
    jitter: f64,
    aim: DrawVector,
    trajectory: TrajectoryCurve,
}

struct InFlight {
    id: u32,
    handle: FlightHandle,
}

/// All mutable state of one session
pub struct SessionRuntimeState {
    session: SessionState,
    target: TargetMotion,
    draw: Option<DrawState>,
    flights: Vec<InFlight>,
    ticker: Option<CancelHandle>,
    end_timer: Option<CancelHandle>,
    rng: Pcg32,
    aim_jitter: f64,
    next_arrow_id: u32,
}

impl SessionRuntimeState {
    fn new(options: &SessionOptions, target: TargetMotion) -> Self {
        Self {
            session: SessionState::new(options.max_arrows, options.session_duration_seconds),
            target,
            draw: None,
            flights: Vec::new(),
            ticker: None,
            end_timer: None,
            rng: Pcg32::seed_from_u64(options.seed),
            aim_jitter: options.aim_jitter,
            next_arrow_id: 1,
        }
    }

    fn can_draw(&self) -> Result<(), IgnoreReason> {
        match self.session.phase() {
            SessionPhase::NotStarted => return Err(IgnoreReason::NotStarted),
            SessionPhase::Ending | SessionPhase::Ended => return Err(IgnoreReason::SessionOver),
            SessionPhase::InProgress => {}
        }
        if self.session.arrows_remaining() as usize <= self.flights.len() {
            return Err(IgnoreReason::NoArrowsLeft);
        }
        Ok(())
    }

    /// Drop every scheduled callback
    fn cancel_all(&mut self) {
        self.ticker = None;
        self.end_timer = None;
        self.flights.clear();
        self.draw = None;
    }
}

/// Weak links handed to scheduled callbacks
#[derive(Clone)]
struct Links {
    state: Weak<RefCell<SessionRuntimeState>>,
    listener: Weak<RefCell<dyn GameListener>>,
    scheduler: Weak<dyn Scheduler>,
}

impl Links {
    fn on_clock_tick(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let ending = state.borrow_mut().session.tick();
        if let Some(reason) = ending {
            self.schedule_end(&state, reason);
        }
    }

    fn on_arrow_resolved(&self, id: u32, outcome: ShotOutcome) {
        let Some(state) = self.state.upgrade() else {
            return;
        };

        let record = {
            let mut s = state.borrow_mut();
            s.flights.retain(|f| f.id != id);
            let record = s.session.record_shot(&outcome);
            if record != ShotRecord::Ignored {
                log::info!(
                    "Arrow {}: {} for {} (total {}, {}/{} shots)",
                    id,
                    outcome.kind.as_str(),
                    outcome.score,
                    s.session.total_score(),
                    s.session.shots_fired(),
                    s.session.max_arrows()
                );
            }
            record
        };

        match record {
            ShotRecord::Ignored => return,
            ShotRecord::Counted => {}
            ShotRecord::EndScheduled(reason) => self.schedule_end(&state, reason),
        }
        self.dispatch(GameEvent::Score {
            score: outcome.score,
            kind: outcome.kind,
        });
    }

    /// Stop the clock and finalize after the grace delay
    fn schedule_end(&self, state: &Rc<RefCell<SessionRuntimeState>>, reason: EndReason) {
        let Some(scheduler) = self.scheduler.upgrade() else {
            return;
        };
        log::info!(
            "Session ending ({:?}), finalizing in {} ms",
            reason,
            END_GRACE_DELAY_MS
        );

        let links = self.clone();
        let timer = scheduler.request_timeout(
            END_GRACE_DELAY_MS,
            Box::new(move |_| links.on_grace_elapsed()),
        );

        let mut s = state.borrow_mut();
        s.ticker = None;
        s.draw = None;
        s.end_timer = Some(timer);
    }

    fn on_grace_elapsed(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let final_score = {
            let mut s = state.borrow_mut();
            let final_score = s.session.finalize();
            s.cancel_all();
            final_score
        };
        if let Some(final_score) = final_score {
            log::info!("Session ended with {} points", final_score);
            self.dispatch(GameEvent::GameEnd { final_score });
        }
    }

    fn dispatch(&self, event: GameEvent) {
        let Some(listener) = self.listener.upgrade() else {
            return;
        };
        let mut listener = listener.borrow_mut();
        match event {
            GameEvent::Score { score, kind } => listener.on_score(score, kind),
            GameEvent::GameEnd { final_score } => listener.on_game_end(final_score),
        }
    }
}

/// Renderer-facing view of the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub phase: SessionPhase,
    pub shots_fired: u32,
    pub total_score: u32,
    pub arrows_remaining: u32,
    pub seconds_remaining: u32,
    pub target_offset: f64,
    /// Current draw, if the string is being held
    pub aim: Option<DrawVector>,
    /// Preview of the path the arrow would take if released now
    pub aim_path: Vec<DVec2>,
    pub arrows: Vec<ArrowPose>,
}

/// Points in the aim preview path
const AIM_PREVIEW_POINTS: usize = 24;

/// One archery mini-game session bound to a scheduler
pub struct ArcheryGame {
    state: Rc<RefCell<SessionRuntimeState>>,
    listener: Rc<RefCell<dyn GameListener>>,
    scheduler: Rc<dyn Scheduler>,
}

impl ArcheryGame {
    /// Create a session; the target starts moving immediately
    pub fn new(
        options: SessionOptions,
        scheduler: Rc<dyn Scheduler>,
        listener: impl GameListener + 'static,
    ) -> Self {
        let options = options.validated();
        let target = if options.stationary_target {
            TargetMotion::stationary()
        } else {
            TargetMotion::new(scheduler.now(), options.target_half_period_ms)
        };
        let listener: Rc<RefCell<dyn GameListener>> = Rc::new(RefCell::new(listener));

        Self {
            state: Rc::new(RefCell::new(SessionRuntimeState::new(&options, target))),
            listener,
            scheduler,
        }
    }

    fn links(&self) -> Links {
        Links {
            state: Rc::downgrade(&self.state),
            listener: Rc::downgrade(&self.listener),
            scheduler: Rc::downgrade(&self.scheduler),
        }
    }

    /// Start the session clock
    pub fn start(&self) -> InputOutcome {
        let mut state = self.state.borrow_mut();
        if !state.session.start() {
            return InputOutcome::Ignored(IgnoreReason::AlreadyStarted);
        }

        let links = self.links();
        state.ticker = Some(
            self.scheduler
                .request_interval(CLOCK_TICK_MS, Box::new(move |_| links.on_clock_tick())),
        );
        log::info!(
            "Session started: {} arrows, {} s",
            state.session.max_arrows(),
            state.session.seconds_remaining()
        );
        InputOutcome::Accepted
    }

    /// Grab the bowstring
    pub fn pointer_down(&self, pointer: DVec2) -> InputOutcome {
        let mut state = self.state.borrow_mut();
        if state.draw.is_some() {
            return InputOutcome::Ignored(IgnoreReason::AlreadyDrawing);
        }
        if let Err(reason) = state.can_draw() {
            return InputOutcome::Ignored(reason);
        }
        if !within_capture_radius(pointer) {
            return InputOutcome::Ignored(IgnoreReason::OutsideCaptureRadius);
        }

        let half_range = state.aim_jitter;
        let jitter = sample_jitter(&mut state.rng, half_range);
        let aim = compute_aim(pointer, PIVOT, jitter);
        log::debug!("Draw started (jitter {:.4} rad)", jitter);
        state.draw = Some(DrawState {
            jitter,
            trajectory: derive_trajectory(&aim),
            aim,
        });
        InputOutcome::Accepted
    }

    /// Update the aim while the string is held
    pub fn pointer_move(&self, pointer: DVec2) -> InputOutcome {
        let mut state = self.state.borrow_mut();
        let Some(draw) = state.draw.as_mut() else {
            return InputOutcome::Ignored(IgnoreReason::NotDrawing);
        };

        draw.aim = compute_aim(pointer, PIVOT, draw.jitter);
        draw.trajectory = derive_trajectory(&draw.aim);
        InputOutcome::Accepted
    }

    /// Let go of the string and launch an arrow along the current aim
    pub fn pointer_up(&self) -> InputOutcome {
        let mut state = self.state.borrow_mut();
        let Some(draw) = state.draw.take() else {
            return InputOutcome::Ignored(IgnoreReason::NotDrawing);
        };
        if let Err(reason) = state.can_draw() {
            return InputOutcome::Ignored(reason);
        }

        let id = state.next_arrow_id;
        state.next_arrow_id += 1;
        log::debug!(
            "Arrow {} released: angle {:.3} rad, power {:.1}",
            id,
            draw.aim.angle,
            draw.aim.power
        );

        let links = self.links();
        let handle = flight::release(&self.scheduler, draw.trajectory, state.target, move |outcome| {
            links.on_arrow_resolved(id, outcome)
        });
        state.flights.push(InFlight { id, handle });
        InputOutcome::Accepted
    }

    /// Cancel the ticker, grace timer and every arrow in flight
    pub fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        state.cancel_all();
        log::debug!("Session torn down");
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().session.phase()
    }

    pub fn shots_fired(&self) -> u32 {
        self.state.borrow().session.shots_fired()
    }

    pub fn total_score(&self) -> u32 {
        self.state.borrow().session.total_score()
    }

    pub fn arrows_in_flight(&self) -> usize {
        self.state.borrow().flights.len()
    }

    pub fn current_aim(&self) -> Option<DrawVector> {
        self.state.borrow().draw.as_ref().map(|d| d.aim)
    }

    pub fn target_offset(&self) -> f64 {
        self.state.borrow().target.offset_at(self.scheduler.now())
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let state = self.state.borrow();
        let session = &state.session;
        GameSnapshot {
            phase: session.phase(),
            shots_fired: session.shots_fired(),
            total_score: session.total_score(),
            arrows_remaining: session.arrows_remaining(),
            seconds_remaining: session.seconds_remaining(),
            target_offset: state.target.offset_at(self.scheduler.now()),
            aim: state.draw.as_ref().map(|d| d.aim),
            aim_path: state
                .draw
                .as_ref()
                .map(|d| d.trajectory.sample(AIM_PREVIEW_POINTS))
                .unwrap_or_default(),
            arrows: state.flights.iter().map(|f| f.handle.pose()).collect(),
        }
    }
}

impl Drop for ArcheryGame {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.cancel_all();
        }
    }
}
