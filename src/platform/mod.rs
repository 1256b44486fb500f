//! Platform abstraction layer
//!
//! The simulation never reads a clock or registers callbacks directly; it
//! goes through the [`Scheduler`] capability supplied by the host:
//! - Frame callbacks (one per display frame)
//! - Repeating timers (session clock)
//! - One-shot timers (end-of-session grace delay)
//!
//! [`VirtualScheduler`] implements the capability over virtual time for
//! tests and headless runs.

pub mod scheduler;
pub mod virtual_clock;

pub use scheduler::{CancelHandle, CancelToken, FrameCallback, Scheduler, TimerCallback};
pub use virtual_clock::VirtualScheduler;
