#![doc = r"Core runtime pieces for Vdom-RS: virtual trees, the reconciler and the render controller."]

pub mod controller;
pub mod document;
pub mod event;
pub mod platform;
pub mod reconcile;
pub mod runtime;
pub mod vnode;

pub use controller::{
    Action, ActionTree, ActionValue, Actions, App, AppConfig, ControllerError, MountTarget,
    RenderPhase, View,
};
pub use document::{Document, DomNode, Element, MemoryDocument, Mutation};
pub use event::{Event, EventHandler};
pub use platform::RuntimeScheduler;
pub use reconcile::{classify, diff_and_patch, materialize, Change};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use vnode::{h, AttrValue, Attribute, Attributes, Child, Primitive, VNode};

#[cfg(test)]
pub use runtime::TestScheduler;

pub type NodeId = usize;

/// Errors raised by a [`Document`] or by the reconciler while patching one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("node {id} missing")]
    Missing { id: NodeId },
    #[error("node {id} is a text node; expected an element")]
    NotAnElement { id: NodeId },
    #[error("`{tag}` is not a valid element name")]
    InvalidTag { tag: String },
    #[error("node {child} is not a child of node {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("node {child} cannot be inserted under its own descendant {parent}")]
    Hierarchy { parent: NodeId, child: NodeId },
    #[error("precondition violated: node {parent} has {len} children, no child at index {index}")]
    MissingChild {
        parent: NodeId,
        index: usize,
        len: usize,
    },
}
