//! Render controller: owns application state, wraps user actions and
//! coalesces re-renders into one deferred pass per tick.
//!
//! ```text
//!   Actions::call ──► action(&mut state) ──► resolve_view()
//!                                               │ view(&state, &actions)
//!                                               ▼
//!                                        schedule_render()  Idle ──► Pending
//!                                               │ (runtime task queue)
//!                                               ▼
//!                     host tick ──► render() ──► diff_and_patch ──► Idle
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::document::Document;
use crate::reconcile;
use crate::runtime::RuntimeHandle;
use crate::vnode::{Child, VNode};
use crate::{NodeError, NodeId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControllerError {
    #[error("no element matches mount selector `{selector}`")]
    MountTargetNotFound { selector: String },
    #[error("unknown action `{name}`")]
    UnknownAction { name: String },
    #[error("application state is in use; actions cannot run while the view is being built")]
    StateBusy,
    #[error("the application has been dropped")]
    Detached,
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Argument or return value of an action.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ActionValue {
    #[default]
    Unit,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ActionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// A non-negative whole number, as a list index.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Number(number) if *number >= 0.0 && number.fract() == 0.0 => {
                Some(*number as usize)
            }
            _ => None,
        }
    }
}

impl From<()> for ActionValue {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for ActionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ActionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ActionValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<usize> for ActionValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for ActionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ActionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

pub type Action<S> = Rc<dyn Fn(&mut S, &[ActionValue]) -> ActionValue>;

/// User actions by name, in registration order.
pub struct ActionTree<S> {
    actions: IndexMap<String, Action<S>>,
}

impl<S> ActionTree<S> {
    pub fn new() -> Self {
        Self {
            actions: IndexMap::new(),
        }
    }

    pub fn with<F, R>(mut self, name: impl Into<String>, action: F) -> Self
    where
        S: 'static,
        F: Fn(&mut S, &[ActionValue]) -> R + 'static,
        R: Into<ActionValue>,
    {
        self.insert(name, action);
        self
    }

    pub fn insert<F, R>(&mut self, name: impl Into<String>, action: F)
    where
        S: 'static,
        F: Fn(&mut S, &[ActionValue]) -> R + 'static,
        R: Into<ActionValue>,
    {
        let action: Action<S> =
            Rc::new(move |state: &mut S, args: &[ActionValue]| action(state, args).into());
        self.actions.insert(name.into(), action);
    }

    pub fn get(&self, name: &str) -> Option<&Action<S>> {
        self.actions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<S> Default for ActionTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for ActionTree<S> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
        }
    }
}

impl<S> fmt::Debug for ActionTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

trait Dispatcher<S> {
    fn inspect(&self, f: &mut dyn FnMut(&S)) -> Result<(), ControllerError>;
    fn mutate(&self, f: &mut dyn FnMut(&mut S)) -> Result<(), ControllerError>;
    fn resolve_view(&self) -> Result<(), ControllerError>;
}

/// The wrapped action set handed to the view. Calling an action mutates the
/// live state and then re-derives the view.
pub struct Actions<S> {
    tree: Rc<ActionTree<S>>,
    host: Weak<dyn Dispatcher<S>>,
}

impl<S> Clone for Actions<S> {
    fn clone(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            host: Weak::clone(&self.host),
        }
    }
}

impl<S> fmt::Debug for Actions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actions")
            .field("tree", &self.tree)
            .field("attached", &(self.host.strong_count() > 0))
            .finish()
    }
}

impl<S> Actions<S> {
    /// Runs the named action with `args` and returns its value unchanged.
    pub fn call(&self, name: &str, args: &[ActionValue]) -> Result<ActionValue, ControllerError> {
        let action = self
            .tree
            .get(name)
            .cloned()
            .ok_or_else(|| ControllerError::UnknownAction {
                name: name.to_owned(),
            })?;
        let host = self.host()?;
        let mut result = ActionValue::Unit;
        host.mutate(&mut |state| result = action(state, args))?;
        log::debug!("action `{name}` dispatched");
        host.resolve_view()?;
        Ok(result)
    }

    /// Runs an ad-hoc mutation with the same re-render side effect as a named action.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, ControllerError> {
        let host = self.host()?;
        let mut f = Some(f);
        let mut result = None;
        host.mutate(&mut |state| {
            if let Some(f) = f.take() {
                result = Some(f(state));
            }
        })?;
        host.resolve_view()?;
        result.ok_or(ControllerError::StateBusy)
    }

    /// Reads the live state without scheduling a render. Event handlers
    /// use this to see state newer than the render that installed them.
    pub fn state<R>(&self, f: impl FnOnce(&S) -> R) -> Result<R, ControllerError> {
        let host = self.host()?;
        let mut f = Some(f);
        let mut result = None;
        host.inspect(&mut |state| {
            if let Some(f) = f.take() {
                result = Some(f(state));
            }
        })?;
        result.ok_or(ControllerError::StateBusy)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tree.names()
    }

    fn host(&self) -> Result<Rc<dyn Dispatcher<S>>, ControllerError> {
        self.host.upgrade().ok_or(ControllerError::Detached)
    }
}

pub type View<S> = Box<dyn Fn(&S, &Actions<S>) -> VNode>;

/// Where the application is attached in the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MountTarget {
    Node(NodeId),
    Selector(String),
}

impl From<NodeId> for MountTarget {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for MountTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_owned())
    }
}

impl From<String> for MountTarget {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

/// Bootstrap options: mount target, initial state, view and actions.
pub struct AppConfig<S> {
    pub el: MountTarget,
    pub state: S,
    pub view: View<S>,
    pub actions: ActionTree<S>,
}

impl<S> AppConfig<S> {
    pub fn new(
        el: impl Into<MountTarget>,
        state: S,
        view: impl Fn(&S, &Actions<S>) -> VNode + 'static,
    ) -> Self {
        Self {
            el: el.into(),
            state,
            view: Box::new(view),
            actions: ActionTree::new(),
        }
    }

    pub fn actions(mut self, actions: ActionTree<S>) -> Self {
        self.actions = actions;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPhase {
    /// No render is queued.
    Idle,
    /// A render task sits in the runtime queue.
    Pending,
    /// A render failed; the rendered tree no longer matches the last
    /// virtual tree and nothing is rendered again.
    Failed,
}

#[derive(Clone)]
struct Rendered {
    tree: Rc<Child>,
    index: usize,
}

struct Pipeline {
    phase: RenderPhase,
    previous: Option<Rendered>,
    next: Option<Rc<Child>>,
    renders: usize,
    error: Option<NodeError>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            phase: RenderPhase::Idle,
            previous: None,
            next: None,
            renders: 0,
            error: None,
        }
    }
}

struct ControllerInner<S, D> {
    state: RefCell<S>,
    view: View<S>,
    actions: Actions<S>,
    document: Rc<RefCell<D>>,
    mount: NodeId,
    runtime: RuntimeHandle,
    pipeline: RefCell<Pipeline>,
    this: Weak<Self>,
}

impl<S: 'static, D: Document + 'static> ControllerInner<S, D> {
    fn schedule_render(&self) {
        {
            let mut pipeline = self.pipeline.borrow_mut();
            match pipeline.phase {
                RenderPhase::Idle => pipeline.phase = RenderPhase::Pending,
                RenderPhase::Pending => {
                    log::trace!("render already pending; coalesced");
                    return;
                }
                RenderPhase::Failed => return,
            }
        }
        log::trace!("render scheduled");
        let this = Weak::clone(&self.this);
        self.runtime.spawn_task(Box::new(move || {
            if let Some(inner) = this.upgrade() {
                inner.render();
            }
        }));
    }

    fn render(&self) {
        let (previous, next) = {
            let pipeline = self.pipeline.borrow();
            if pipeline.phase != RenderPhase::Pending {
                return;
            }
            (pipeline.previous.clone(), pipeline.next.clone())
        };
        let Some(next) = next else {
            self.pipeline.borrow_mut().phase = RenderPhase::Idle;
            return;
        };

        let result = self.patch(previous.as_ref(), &next);
        let mut pipeline = self.pipeline.borrow_mut();
        match result {
            Ok(index) => {
                pipeline.previous = Some(Rendered { tree: next, index });
                pipeline.phase = RenderPhase::Idle;
                pipeline.renders += 1;
                log::debug!("render #{} committed", pipeline.renders);
            }
            Err(err) => {
                log::error!("render failed: {err}");
                pipeline.phase = RenderPhase::Failed;
                pipeline.error = Some(err);
            }
        }
    }

    /// Brings the document in line with `next` and returns the index of the
    /// rendered root under the mount node.
    fn patch(&self, previous: Option<&Rendered>, next: &Child) -> Result<usize, NodeError> {
        let mut document = self.document.borrow_mut();
        match previous {
            Some(previous) => {
                reconcile::diff_and_patch(
                    &mut *document,
                    self.mount,
                    Some(previous.tree.as_ref()),
                    Some(next),
                    previous.index,
                )?;
                Ok(previous.index)
            }
            None => {
                let index = document.child_count(self.mount)?;
                let root = reconcile::materialize(&mut *document, next)?;
                document.append_child(self.mount, root)?;
                Ok(index)
            }
        }
    }
}

impl<S: 'static, D: Document + 'static> Dispatcher<S> for ControllerInner<S, D> {
    fn inspect(&self, f: &mut dyn FnMut(&S)) -> Result<(), ControllerError> {
        let state = self
            .state
            .try_borrow()
            .map_err(|_| ControllerError::StateBusy)?;
        f(&state);
        Ok(())
    }

    fn mutate(&self, f: &mut dyn FnMut(&mut S)) -> Result<(), ControllerError> {
        let mut state = self
            .state
            .try_borrow_mut()
            .map_err(|_| ControllerError::StateBusy)?;
        f(&mut state);
        Ok(())
    }

    fn resolve_view(&self) -> Result<(), ControllerError> {
        let tree = {
            let state = self
                .state
                .try_borrow()
                .map_err(|_| ControllerError::StateBusy)?;
            (self.view)(&state, &self.actions)
        };
        self.pipeline.borrow_mut().next = Some(Rc::new(Child::Element(tree)));
        self.schedule_render();
        Ok(())
    }
}

/// A mounted application.
///
/// Dropping the `App` detaches its [`Actions`]; handlers still installed in
/// the document then fail with [`ControllerError::Detached`].
pub struct App<S: 'static, D: Document + 'static> {
    inner: Rc<ControllerInner<S, D>>,
}

impl<S: 'static, D: Document + 'static> App<S, D> {
    /// Resolves the mount target, builds the initial virtual tree and
    /// schedules the first render for the next tick.
    pub fn mount(
        config: AppConfig<S>,
        document: Rc<RefCell<D>>,
        runtime: RuntimeHandle,
    ) -> Result<Self, ControllerError> {
        let AppConfig {
            el,
            state,
            view,
            actions,
        } = config;
        let mount = resolve_mount(&*document.borrow(), el)?;
        let tree = Rc::new(actions);
        let inner = Rc::new_cyclic(|this: &Weak<ControllerInner<S, D>>| {
            let host: Weak<dyn Dispatcher<S>> = this.clone();
            ControllerInner {
                state: RefCell::new(state),
                view,
                actions: Actions { tree, host },
                document,
                mount,
                runtime,
                pipeline: RefCell::new(Pipeline::default()),
                this: this.clone(),
            }
        });
        inner.resolve_view()?;
        log::debug!("app mounted at node {mount}");
        Ok(Self { inner })
    }

    pub fn actions(&self) -> Actions<S> {
        self.inner.actions.clone()
    }

    /// Runs the named action; see [`Actions::call`].
    pub fn dispatch(&self, name: &str, args: &[ActionValue]) -> Result<ActionValue, ControllerError> {
        self.inner.actions.call(name, args)
    }

    pub fn mount_node(&self) -> NodeId {
        self.inner.mount
    }

    /// The rendered root under the mount node, once the first render ran.
    pub fn root_node(&self) -> Option<NodeId> {
        let index = self.inner.pipeline.borrow().previous.as_ref()?.index;
        self.inner
            .document
            .borrow()
            .child_at(self.inner.mount, index)
            .ok()
            .flatten()
    }

    pub fn phase(&self) -> RenderPhase {
        self.inner.pipeline.borrow().phase
    }

    pub fn is_render_pending(&self) -> bool {
        self.phase() == RenderPhase::Pending
    }

    /// Number of committed render passes.
    pub fn render_count(&self) -> usize {
        self.inner.pipeline.borrow().renders
    }

    pub fn take_render_error(&self) -> Option<NodeError> {
        self.inner.pipeline.borrow_mut().error.take()
    }

    pub fn document(&self) -> Rc<RefCell<D>> {
        Rc::clone(&self.inner.document)
    }
}

fn resolve_mount<D: Document>(document: &D, el: MountTarget) -> Result<NodeId, ControllerError> {
    match el {
        MountTarget::Node(node) if document.contains(node) => Ok(node),
        MountTarget::Node(node) => Err(NodeError::Missing { id: node }.into()),
        MountTarget::Selector(selector) => document
            .query_selector(&selector)
            .ok_or(ControllerError::MountTargetNotFound { selector }),
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
