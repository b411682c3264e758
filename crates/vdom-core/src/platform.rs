//! Platform abstraction for the deferred task queue.
//!
//! The runtime never runs deferred work on its own; it asks the host to run
//! another tick of its event loop through a [`RuntimeScheduler`], and the
//! host drains the queue when that tick comes around.

/// Requests ticks from the host event loop.
///
/// Implementations must be safe to share across threads, even though the
/// runtime itself only drives them from the UI thread.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host drain the runtime's task queue on its next tick.
    fn schedule_tick(&self);
}
