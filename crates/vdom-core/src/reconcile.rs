//! Diff-and-patch engine.
//!
//! Children are matched purely by position: there are no keys, so removing
//! an item from the front of a list patches every following sibling against
//! its neighbour and drops the last one.

use crate::document::Document;
use crate::vnode::{Attributes, Child, VNode};
use crate::{NodeError, NodeId};

/// How two virtual nodes at the same position differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// One side is an element and the other a primitive, or the primitives
    /// are of different kinds.
    TypeChanged,
    TextChanged,
    TagChanged,
    /// Same tag, both carry a `value` attribute and it differs.
    ValueChanged,
    AttributesChanged,
    Unchanged,
}

impl Change {
    /// Whether the change is handled by materializing a fresh subtree.
    pub fn replaces_node(self) -> bool {
        matches!(self, Self::TypeChanged | Self::TextChanged | Self::TagChanged)
    }
}

pub fn classify(old: &Child, new: &Child) -> Change {
    match (old, new) {
        (Child::Text(a), Child::Text(b)) => {
            if !a.same_kind(b) {
                Change::TypeChanged
            } else if a != b {
                Change::TextChanged
            } else {
                Change::Unchanged
            }
        }
        (Child::Element(a), Child::Element(b)) => classify_elements(a, b),
        _ => Change::TypeChanged,
    }
}

fn classify_elements(old: &VNode, new: &VNode) -> Change {
    if old.tag() != new.tag() {
        return Change::TagChanged;
    }
    if let (Some(a), Some(b)) = (old.attributes().value(), new.attributes().value()) {
        if a != b {
            return Change::ValueChanged;
        }
    }
    if !old.attributes().same_statics(new.attributes()) {
        return Change::AttributesChanged;
    }
    Change::Unchanged
}

/// Builds a brand-new rendered subtree for `node`. Nothing is attached to
/// the document tree; the caller appends or inserts the returned root.
pub fn materialize<D: Document + ?Sized>(doc: &mut D, node: &Child) -> Result<NodeId, NodeError> {
    let root = create_node(doc, node)?;
    let mut pending: Vec<(NodeId, &Child)> = Vec::new();
    push_children(&mut pending, root, node);
    while let Some((parent, child)) = pending.pop() {
        let id = create_node(doc, child)?;
        doc.append_child(parent, id)?;
        push_children(&mut pending, id, child);
    }
    Ok(root)
}

fn push_children<'a>(pending: &mut Vec<(NodeId, &'a Child)>, parent: NodeId, node: &'a Child) {
    if let Child::Element(element) = node {
        pending.extend(element.children().iter().rev().map(|child| (parent, child)));
    }
}

fn create_node<D: Document + ?Sized>(doc: &mut D, node: &Child) -> Result<NodeId, NodeError> {
    match node {
        Child::Text(value) => Ok(doc.create_text(&value.to_string())),
        Child::Element(element) => {
            let id = doc.create_element(element.tag())?;
            let attributes = element.attributes();
            for (name, value) in attributes.statics() {
                doc.set_attribute(id, name, &value.to_string())?;
            }
            for (kind, handler) in attributes.events() {
                doc.add_event_listener(id, kind, handler.clone())?;
            }
            Ok(id)
        }
    }
}

struct Patch<'a> {
    parent: NodeId,
    old: Option<&'a Child>,
    new: Option<&'a Child>,
    index: usize,
}

/// Reconciles the child of `parent` at `index` from `old` to `new`.
///
/// When `old` is present, `index` must address an existing child of
/// `parent`; otherwise this fails with [`NodeError::MissingChild`] before
/// touching that node. Patching stops at the first error.
pub fn diff_and_patch<D: Document + ?Sized>(
    doc: &mut D,
    parent: NodeId,
    old: Option<&Child>,
    new: Option<&Child>,
    index: usize,
) -> Result<(), NodeError> {
    let mut work = vec![Patch {
        parent,
        old,
        new,
        index,
    }];
    while let Some(patch) = work.pop() {
        apply(doc, patch, &mut work)?;
    }
    Ok(())
}

fn apply<'a, D: Document + ?Sized>(
    doc: &mut D,
    patch: Patch<'a>,
    work: &mut Vec<Patch<'a>>,
) -> Result<(), NodeError> {
    let Patch {
        parent,
        old,
        new,
        index,
    } = patch;
    let (old, new) = match (old, new) {
        (None, None) => return Ok(()),
        (None, Some(new)) => {
            let node = materialize(doc, new)?;
            log::trace!("append {node} under {parent}");
            return doc.append_child(parent, node);
        }
        (Some(_), None) => {
            let target = target_at(doc, parent, index)?;
            log::trace!("remove {target} from {parent}");
            return doc.remove_child(parent, target);
        }
        (Some(old), Some(new)) => (old, new),
    };

    let target = target_at(doc, parent, index)?;
    let change = classify(old, new);
    log::trace!("node {target} at {parent}[{index}]: {change:?}");
    match (change, old, new) {
        (change, _, _) if change.replaces_node() => {
            let node = materialize(doc, new)?;
            doc.replace_child(parent, node, target)
        }
        (Change::ValueChanged, _, Child::Element(element)) => match element.attributes().value() {
            Some(value) => doc.set_value(target, &value.to_string()),
            None => Ok(()),
        },
        (Change::AttributesChanged, Child::Element(old), Child::Element(new)) => {
            patch_attributes(doc, target, old.attributes(), new.attributes())
        }
        (Change::Unchanged, Child::Element(old), Child::Element(new)) => {
            schedule_children(work, target, old.children(), new.children());
            Ok(())
        }
        _ => Ok(()),
    }
}

fn target_at<D: Document + ?Sized>(
    doc: &D,
    parent: NodeId,
    index: usize,
) -> Result<NodeId, NodeError> {
    let len = doc.child_count(parent)?;
    doc.child_at(parent, index)?
        .ok_or(NodeError::MissingChild { parent, index, len })
}

/// Clears every old static attribute, then writes every new one. Event
/// listeners are left as they were registered at materialization.
fn patch_attributes<D: Document + ?Sized>(
    doc: &mut D,
    target: NodeId,
    old: &Attributes,
    new: &Attributes,
) -> Result<(), NodeError> {
    for (name, _) in old.statics() {
        doc.remove_attribute(target, name)?;
    }
    for (name, value) in new.statics() {
        doc.set_attribute(target, name, &value.to_string())?;
    }
    Ok(())
}

/// Queues positional patches for every child index of `target`.
///
/// Shared indices are patched in ascending order, extra new children are
/// appended in order, and surplus old children are removed from the last
/// index down so each removal still addresses an existing node.
fn schedule_children<'a>(
    work: &mut Vec<Patch<'a>>,
    target: NodeId,
    old: &'a [Child],
    new: &'a [Child],
) {
    let shared = old.len().min(new.len());
    let mut ordered: Vec<Patch<'a>> = (0..shared)
        .map(|i| Patch {
            parent: target,
            old: Some(&old[i]),
            new: Some(&new[i]),
            index: i,
        })
        .collect();
    ordered.extend((shared..new.len()).map(|i| Patch {
        parent: target,
        old: None,
        new: Some(&new[i]),
        index: i,
    }));
    ordered.extend((shared..old.len()).rev().map(|i| Patch {
        parent: target,
        old: Some(&old[i]),
        new: None,
        index: i,
    }));
    work.extend(ordered.into_iter().rev());
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
