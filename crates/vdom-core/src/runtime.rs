use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;

pub(crate) type Task = Box<dyn FnOnce() + 'static>;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    pending_tasks: RefCell<VecDeque<Task>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            pending_tasks: RefCell::new(VecDeque::new()),
        }
    }

    fn enqueue_task(&self, task: Task) {
        self.pending_tasks.borrow_mut().push_back(task);
        self.scheduler.schedule_tick();
    }

    /// Runs the tasks queued before this call. Tasks enqueued while draining
    /// wait for the next tick.
    fn drain_tasks(&self) -> usize {
        let tasks: Vec<Task> = {
            let mut pending = self.pending_tasks.borrow_mut();
            pending.drain(..).collect()
        };
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    fn has_tasks(&self) -> bool {
        !self.pending_tasks.borrow().is_empty()
    }
}

/// Owner of the deferred task queue.
///
/// Work enqueued through a [`RuntimeHandle`] never runs synchronously; it
/// runs when the host calls [`Runtime::drain_tasks`], which is what makes a
/// render scheduled during an action land after the action's call stack
/// unwinds.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.inner.has_tasks()
    }

    /// Runs one tick worth of deferred tasks and returns how many ran.
    pub fn drain_tasks(&self) -> usize {
        self.inner.drain_tasks()
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_tick(&self) {}
}

#[cfg(test)]
#[derive(Default)]
pub struct TestScheduler {
    ticks: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl TestScheduler {
    pub fn ticks(&self) -> usize {
        self.ticks.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl RuntimeScheduler for TestScheduler {
    fn schedule_tick(&self) {
        self.ticks
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Defers `task` to the next tick. When the runtime is gone there is no
    /// loop left to defer to, so the task runs immediately.
    pub fn spawn_task(&self, task: Box<dyn FnOnce() + 'static>) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_task(task);
        } else {
            log::debug!("runtime dropped; running deferred task inline");
            task();
        }
    }

    pub fn drain_tasks(&self) -> usize {
        self.0
            .upgrade()
            .map(|inner| inner.drain_tasks())
            .unwrap_or(0)
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_tasks())
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
