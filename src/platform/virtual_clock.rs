//! Deterministic scheduler driven by virtual time
//!
//! Frames fire at exact multiples of the frame interval. Timers due at the
//! same instant as a frame run first, in registration order. The queue is
//! never borrowed while a callback runs, so callbacks may freely schedule
//! or cancel other work.

use std::cell::RefCell;

use super::scheduler::{CancelHandle, CancelToken, FrameCallback, Scheduler, TimerCallback};
use crate::consts::DEFAULT_FRAME_MS;

struct PendingFrame {
    token: CancelToken,
    callback: FrameCallback,
}

struct PendingTimer {
    due: f64,
    seq: u64,
    /// `Some` for repeating timers
    period: Option<f64>,
    token: CancelToken,
    callback: TimerCallback,
}

struct Queue {
    now: f64,
    frame_ms: f64,
    frame_index: u64,
    frames: Vec<PendingFrame>,
    timers: Vec<PendingTimer>,
    next_seq: u64,
}

impl Queue {
    fn next_frame_time(&self) -> f64 {
        (self.frame_index + 1) as f64 * self.frame_ms
    }

    fn prune(&mut self) {
        self.frames.retain(|f| !f.token.is_cancelled());
        self.timers.retain(|t| !t.token.is_cancelled());
    }

    /// Index of the earliest timer (ties broken by registration order)
    fn earliest_timer(&self) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)
    }

    fn push_timer(&mut self, due: f64, period: Option<f64>, token: CancelToken, callback: TimerCallback) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(PendingTimer {
            due,
            seq,
            period,
            token,
            callback,
        });
    }
}

enum Due {
    Timer(usize),
    Frame,
}

/// Scheduler over virtual time, advanced explicitly by the caller
pub struct VirtualScheduler {
    queue: RefCell<Queue>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_MS)
    }

    pub fn with_frame_interval(frame_ms: f64) -> Self {
        Self {
            queue: RefCell::new(Queue {
                now: 0.0,
                frame_ms,
                frame_index: 0,
                frames: Vec::new(),
                timers: Vec::new(),
                next_seq: 0,
            }),
        }
    }

    pub fn frame_interval(&self) -> f64 {
        self.queue.borrow().frame_ms
    }

    /// Number of live (uncancelled) callbacks
    pub fn pending(&self) -> usize {
        let mut queue = self.queue.borrow_mut();
        queue.prune();
        queue.frames.len() + queue.timers.len()
    }

    /// Advance virtual time by `ms`, firing everything that comes due
    pub fn advance(&self, ms: f64) {
        let target = self.queue.borrow().now + ms;
        self.advance_to(target);
    }

    /// Advance through the next `count` frame boundaries
    pub fn advance_frames(&self, count: u64) {
        let target = {
            let queue = self.queue.borrow();
            (queue.frame_index + count) as f64 * queue.frame_ms
        };
        self.advance_to(target);
    }

    /// Advance virtual time to `target` ms
    pub fn advance_to(&self, target: f64) {
        loop {
            let due = {
                let mut queue = self.queue.borrow_mut();
                queue.prune();
                let next_frame = queue.next_frame_time();
                let timer = queue.earliest_timer().filter(|&i| queue.timers[i].due <= target);

                match timer {
                    Some(i) if queue.timers[i].due <= next_frame => Due::Timer(i),
                    _ if next_frame <= target => Due::Frame,
                    Some(i) => Due::Timer(i),
                    None => {
                        queue.now = queue.now.max(target);
                        return;
                    }
                }
            };

            match due {
                Due::Timer(i) => self.fire_timer(i),
                Due::Frame => self.fire_frame(),
            }
        }
    }

    fn fire_timer(&self, index: usize) {
        let mut timer = {
            let mut queue = self.queue.borrow_mut();
            let timer = queue.timers.swap_remove(index);
            queue.now = timer.due;
            timer
        };

        (timer.callback)(timer.due);

        if let Some(period) = timer.period
            && !timer.token.is_cancelled()
        {
            timer.due += period;
            let mut queue = self.queue.borrow_mut();
            queue.push_timer(timer.due, Some(period), timer.token, timer.callback);
        }
    }

    fn fire_frame(&self) {
        let (now, frames) = {
            let mut queue = self.queue.borrow_mut();
            queue.frame_index += 1;
            queue.now = queue.frame_index as f64 * queue.frame_ms;
            (queue.now, std::mem::take(&mut queue.frames))
        };

        for frame in frames {
            if !frame.token.is_cancelled() {
                (frame.callback)(now);
            }
        }
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> f64 {
        self.queue.borrow().now
    }

    fn request_tick(&self, callback: FrameCallback) -> CancelHandle {
        let (handle, token) = CancelHandle::new();
        self.queue
            .borrow_mut()
            .frames
            .push(PendingFrame { token, callback });
        handle
    }

    fn request_interval(&self, period_ms: f64, callback: TimerCallback) -> CancelHandle {
        let (handle, token) = CancelHandle::new();
        let mut queue = self.queue.borrow_mut();
        let due = queue.now + period_ms;
        queue.push_timer(due, Some(period_ms), token, callback);
        handle
    }

    fn request_timeout(&self, delay_ms: f64, callback: TimerCallback) -> CancelHandle {
        let (handle, token) = CancelHandle::new();
        let mut queue = self.queue.borrow_mut();
        let due = queue.now + delay_ms;
        queue.push_timer(due, None, token, callback);
        handle
    }
}
