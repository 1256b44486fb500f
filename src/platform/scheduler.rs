//! Scheduler capability and cancellation handles

use std::cell::Cell;
use std::rc::Rc;

/// Runs once on the next frame, receiving the frame timestamp (ms)
pub type FrameCallback = Box<dyn FnOnce(f64)>;
/// Runs when a timer fires, receiving the current time (ms)
pub type TimerCallback = Box<dyn FnMut(f64)>;

/// Host-provided timing primitives
///
/// All methods take `&self` so callbacks may schedule further work while the
/// scheduler is dispatching. Implementations must never invoke a callback
/// whose [`CancelHandle`] has been dropped or cancelled.
pub trait Scheduler {
    /// Current time in milliseconds
    fn now(&self) -> f64;

    /// Run `callback` once on the next frame
    fn request_tick(&self, callback: FrameCallback) -> CancelHandle;

    /// Run `callback` every `period_ms` until cancelled
    fn request_interval(&self, period_ms: f64, callback: TimerCallback) -> CancelHandle;

    /// Run `callback` once after `delay_ms`
    fn request_timeout(&self, delay_ms: f64, callback: TimerCallback) -> CancelHandle;
}

/// Shared cancellation flag checked by the scheduler before dispatch
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Owner side of a scheduled callback
///
/// Dropping the handle cancels the callback, so whoever holds it controls
/// the callback's lifetime.
#[derive(Debug)]
pub struct CancelHandle {
    token: CancelToken,
}

impl CancelHandle {
    /// Create a handle and the token the scheduler keeps alongside the callback
    pub fn new() -> (Self, CancelToken) {
        let token = CancelToken::default();
        (
            Self {
                token: token.clone(),
            },
            token,
        )
    }

    pub fn cancel(&self) {
        self.token.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
