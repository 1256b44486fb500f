//! Session rules: shot limit, clock, score
//!
//! A session ends on whichever comes first: the last arrow resolving or the
//! clock running out. Either path moves the session into a short `Ending`
//! window (so the last arrow can be seen landing) and only `finalize` ends
//! it, reporting the final score exactly once.

use serde::{Deserialize, Serialize};

use super::flight::ShotOutcome;

/// Lifecycle of one play-through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting for the start action
    NotStarted,
    /// Accepting draws, clock running
    InProgress,
    /// End condition met, waiting out the grace delay
    Ending,
    /// Final score reported; terminal
    Ended,
}

/// Why the session is ending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    ShotLimit,
    TimeLimit,
}

/// Effect of recording a shot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotRecord {
    /// Session no longer accepts shots
    Ignored,
    /// Score and shot count updated
    Counted,
    /// Counted, and this was the last arrow
    EndScheduled(EndReason),
}

/// Score and clock state for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    phase: SessionPhase,
    shots_fired: u32,
    total_score: u32,
    max_arrows: u32,
    duration_seconds: u32,
    seconds_remaining: u32,
    end_reason: Option<EndReason>,
    /// Set once the final score has been handed out
    finalized: bool,
}

impl SessionState {
    pub fn new(max_arrows: u32, duration_seconds: u32) -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            shots_fired: 0,
            total_score: 0,
            max_arrows,
            duration_seconds,
            seconds_remaining: duration_seconds,
            end_reason: None,
            finalized: false,
        }
    }

    /// NotStarted → InProgress. Returns false if already started.
    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::NotStarted {
            return false;
        }
        self.phase = SessionPhase::InProgress;
        true
    }

    /// Fold a resolved arrow into the score
    ///
    /// Arrows landing during the grace window still count.
    pub fn record_shot(&mut self, outcome: &ShotOutcome) -> ShotRecord {
        if !matches!(self.phase, SessionPhase::InProgress | SessionPhase::Ending) {
            return ShotRecord::Ignored;
        }

        self.shots_fired += 1;
        self.total_score += outcome.score;

        if self.shots_fired >= self.max_arrows && self.begin_ending(EndReason::ShotLimit) {
            return ShotRecord::EndScheduled(EndReason::ShotLimit);
        }
        ShotRecord::Counted
    }

    /// Advance the session clock by one second
    ///
    /// Returns the end reason the first time the clock runs out.
    pub fn tick(&mut self) -> Option<EndReason> {
        if self.phase != SessionPhase::InProgress {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 && self.begin_ending(EndReason::TimeLimit) {
            return Some(EndReason::TimeLimit);
        }
        None
    }

    /// Ending → Ended, handing out the final score once
    pub fn finalize(&mut self) -> Option<u32> {
        if self.phase != SessionPhase::Ending || self.finalized {
            return None;
        }
        self.finalized = true;
        self.phase = SessionPhase::Ended;
        Some(self.total_score)
    }

    fn begin_ending(&mut self, reason: EndReason) -> bool {
        if self.phase != SessionPhase::InProgress {
            return false;
        }
        self.phase = SessionPhase::Ending;
        self.end_reason = Some(reason);
        true
    }

    /// Whether a new draw may begin (ignoring arrows still in flight)
    #[inline]
    pub fn accepts_draw(&self) -> bool {
        self.phase == SessionPhase::InProgress && self.shots_fired < self.max_arrows
    }

    #[inline]
    pub fn arrows_remaining(&self) -> u32 {
        self.max_arrows.saturating_sub(self.shots_fired)
    }

    #[inline]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[inline]
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    #[inline]
    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    #[inline]
    pub fn max_arrows(&self) -> u32 {
        self.max_arrows
    }

    #[inline]
    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    #[inline]
    pub fn elapsed_seconds(&self) -> u32 {
        self.duration_seconds - self.seconds_remaining
    }

    #[inline]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        matches!(self.phase, SessionPhase::Ending | SessionPhase::Ended)
    }
}
