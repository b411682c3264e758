use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use std::sync::Arc;

use vdom_core::{
    App, AppConfig, ControllerError, DefaultScheduler, Document, Event, MemoryDocument, NodeId,
    Runtime, RuntimeHandle,
};

/// Headless harness for exercising mounted apps in tests.
///
/// Owns an in-memory document with a `<div id="app">` mount point and a
/// runtime whose ticks are driven by hand through [`VdomTestRule::pump_until_idle`].
pub struct VdomTestRule {
    runtime: Runtime,
    document: Rc<RefCell<MemoryDocument>>,
    mount: NodeId,
}

impl VdomTestRule {
    pub fn new() -> Self {
        let (document, mount) =
            MemoryDocument::with_mount_point("app").expect("build #app mount point");
        Self {
            runtime: Runtime::new(Arc::new(DefaultScheduler)),
            document: Rc::new(RefCell::new(document)),
            mount,
        }
    }

    /// Mounts `config` against the rule's document. The first render is
    /// still pending afterwards.
    pub fn mount<S: 'static>(
        &self,
        config: AppConfig<S>,
    ) -> Result<App<S, MemoryDocument>, ControllerError> {
        App::mount(config, Rc::clone(&self.document), self.runtime.handle())
    }

    /// Drains ticks until no deferred work is left. Returns the number of
    /// tasks that ran.
    pub fn pump_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.runtime.has_pending_tasks() {
            ran += self.runtime.drain_tasks();
        }
        ran
    }

    /// Dispatches `kind` to every listener of the first node matching
    /// `selector`. Returns `false` when nothing matches.
    pub fn fire(&self, selector: &str, kind: &str, value: Option<&str>) -> bool {
        let Some(target) = self.find(selector) else {
            return false;
        };
        let mut event = Event::new(kind, target);
        if let Some(value) = value {
            event = event.with_value(value);
        }
        MemoryDocument::dispatch_event(&self.document, &event);
        true
    }

    pub fn click(&self, selector: &str) -> bool {
        self.fire(selector, "click", None)
    }

    /// Types `text` into the input matching `selector`: sets its live value,
    /// then fires `input`.
    pub fn input(&self, selector: &str, text: &str) -> bool {
        self.find(selector).is_some_and(|target| {
            MemoryDocument::type_into(&self.document, target, text).is_ok()
        })
    }

    pub fn html(&self) -> String {
        self.document.borrow().inner_html(self.mount)
    }

    pub fn document(&self) -> Ref<'_, MemoryDocument> {
        self.document.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, MemoryDocument> {
        self.document.borrow_mut()
    }

    pub fn mount_node(&self) -> NodeId {
        self.mount
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    fn find(&self, selector: &str) -> Option<NodeId> {
        self.document.borrow().query_selector(selector)
    }
}

impl Default for VdomTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `VdomTestRule`.
pub fn run_test_app<R>(f: impl FnOnce(&mut VdomTestRule) -> R) -> R {
    let mut rule = VdomTestRule::new();
    f(&mut rule)
}
