//! Tick signalling for hosts that pump `vdom-core` from a plain loop.
//!
//! [`TickSignal`] is the [`RuntimeScheduler`]: scheduling raises a flag the
//! host polls between inputs. [`StdRuntime`] pairs it with a [`Runtime`] and
//! settles the task queue one tick at a time.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use vdom_core::{Runtime, RuntimeHandle, RuntimeScheduler};

/// Raised when the runtime asks for a tick, lowered when the host runs one.
#[derive(Debug, Default)]
pub struct TickSignal {
    raised: AtomicBool,
    requests: AtomicUsize,
}

impl TickSignal {
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Lowers the signal and reports whether it was raised.
    pub fn lower(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }

    /// Tick requests received so far, including ones that found the signal
    /// already raised.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl RuntimeScheduler for TickSignal {
    fn schedule_tick(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !self.raised.swap(true, Ordering::AcqRel) {
            log::trace!("tick requested");
        }
    }
}

/// How [`StdRuntime::settle`] stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    /// No work left after `ticks` ticks.
    Idle { ticks: usize },
    /// The tick budget ran out with work still queued.
    Busy,
}

#[derive(Clone)]
pub struct StdRuntime {
    signal: Arc<TickSignal>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let signal = Arc::new(TickSignal::default());
        let runtime = Runtime::new(signal.clone());
        Self { signal, runtime }
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn signal(&self) -> &TickSignal {
        &self.signal
    }

    /// Whether a tick was requested or deferred tasks are still queued.
    pub fn has_work(&self) -> bool {
        self.signal.is_raised() || self.runtime.has_pending_tasks()
    }

    /// Runs one tick and returns how many tasks ran.
    pub fn tick(&self) -> usize {
        self.signal.lower();
        self.runtime.drain_tasks()
    }

    /// Ticks until no work is left or `max_ticks` have run. `after_tick`
    /// runs after every tick; its error stops settling.
    pub fn settle<E>(
        &self,
        max_ticks: usize,
        mut after_tick: impl FnMut() -> Result<(), E>,
    ) -> Result<Settled, E> {
        for ticks in 0..max_ticks {
            if !self.has_work() {
                return Ok(Settled::Idle { ticks });
            }
            self.tick();
            after_tick()?;
        }
        if self.has_work() {
            log::warn!("still busy after {max_ticks} ticks");
            return Ok(Settled::Busy);
        }
        Ok(Settled::Idle { ticks: max_ticks })
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/std_runtime_tests.rs"]
mod tests;
