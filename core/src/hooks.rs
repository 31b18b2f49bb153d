//! UI hooks: the loading indicator and the callback scheduler.
//!
//! # Design
//! The client knows nothing about any concrete UI. The host injects a
//! [`LoadingIndicator`] to surface network activity and a scheduler to move
//! completion callbacks onto whatever thread it reserves for them. Both
//! default to the simplest possible behavior: doing nothing, and running
//! the callback right where the request finished.

use std::sync::Arc;

/// Hooks fired around every request issued with `show_loading = true`.
///
/// `show` fires on the thread the operation was started from, before any
/// network work. `hide` fires after the outcome is known, on success and
/// failure alike; for background operations it runs through the callback
/// scheduler, immediately before the completion.
pub trait LoadingIndicator: Send + Sync {
    fn show(&self) {}
    fn hide(&self) {}
}

/// Indicator that ignores both hooks.
#[derive(Debug, Default)]
pub struct NoopIndicator;

impl LoadingIndicator for NoopIndicator {}

/// A deferred unit of work handed to the callback scheduler.
pub type Job = Box<dyn FnOnce() + Send>;

/// Runs completion callbacks in the host's chosen context.
///
/// Background operations finish on a worker thread; the scheduler is how
/// the host routes the completion (and the indicator's `hide`) onto, say,
/// its main thread.
pub type CallbackScheduler = Arc<dyn Fn(Job) + Send + Sync>;

/// Scheduler that runs each job immediately on the thread handing it over.
pub fn inline_scheduler() -> CallbackScheduler {
    Arc::new(|job: Job| job())
}
