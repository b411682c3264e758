//! The live document contract and an in-memory implementation of it.
//!
//! The reconciler only talks to a [`Document`]; [`MemoryDocument`] is the
//! headless tree used by the app shell, the demos and the tests. It records
//! every mutation so callers can assert on exactly what a patch touched.

use std::cell::RefCell;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::event::{Event, EventHandler};
use crate::{NodeError, NodeId};

/// Mutable tree of rendered nodes.
///
/// Every method that takes a node id fails with [`NodeError::Missing`] when
/// the id does not name a live node.
pub trait Document {
    fn create_element(&mut self, tag: &str) -> Result<NodeId, NodeError>;
    fn create_text(&mut self, text: &str) -> NodeId;
    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
    /// Detaches `child` from `parent` and discards its subtree.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
    /// Puts `new_child` at the position of `old_child` and discards the old subtree.
    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), NodeError>;
    fn child_at(&self, parent: NodeId, index: usize) -> Result<Option<NodeId>, NodeError>;
    fn child_count(&self, parent: NodeId) -> Result<usize, NodeError>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), NodeError>;
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), NodeError>;
    /// Sets the live `value` property without touching the `value` attribute.
    fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), NodeError>;
    fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        handler: EventHandler,
    ) -> Result<(), NodeError>;
    /// First element in document order matching `selector` (`#id`, `.class` or a tag name).
    fn query_selector(&self, selector: &str) -> Option<NodeId>;
    fn contains(&self, node: NodeId) -> bool;
}

/// A mutation applied to a [`MemoryDocument`], in application order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    CreateElement { id: NodeId, tag: String },
    CreateText { id: NodeId, text: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
    ReplaceChild { parent: NodeId, new_child: NodeId, old_child: NodeId },
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    SetValue { node: NodeId, value: String },
    AddEventListener { node: NodeId, kind: String },
}

#[derive(Clone, Debug)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    value: Option<String>,
    listeners: Vec<(String, EventHandler)>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            attributes: IndexMap::new(),
            value: None,
            listeners: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Live value: the `value` property when set, otherwise the `value` attribute.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().or_else(|| self.attribute("value"))
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug)]
pub enum DomNode {
    Element(Element),
    Text(String),
}

impl DomNode {
    pub fn children(&self) -> &[NodeId] {
        match self {
            Self::Element(element) => element.children(),
            Self::Text(_) => &[],
        }
    }
}

struct Slot {
    node: DomNode,
    parent: Option<NodeId>,
}

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Headless [`Document`] backed by a node arena.
///
/// Node ids are never reused; removed subtrees leave empty slots behind.
pub struct MemoryDocument {
    nodes: Vec<Option<Slot>>,
    root: NodeId,
    mutations: Vec<Mutation>,
}

impl MemoryDocument {
    /// Creates a document whose root is an empty `body` element.
    pub fn new() -> Self {
        let body = Slot {
            node: DomNode::Element(Element::new("body")),
            parent: None,
        };
        Self {
            nodes: vec![Some(body)],
            root: 0,
            mutations: Vec::new(),
        }
    }

    /// A document whose body holds a single `<div>` with the given id.
    /// Returns the document and that mount point, with an empty mutation log.
    pub fn with_mount_point(id: &str) -> Result<(Self, NodeId), NodeError> {
        let mut document = Self::new();
        let mount = document.create_element("div")?;
        document.set_attribute(mount, "id", id)?;
        document.append_child(document.root, mount)?;
        document.mutations.clear();
        Ok((document, mount))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.slot(id).ok().map(|slot| &slot.node)
    }

    pub fn element(&self, id: NodeId) -> Result<&Element, NodeError> {
        match &self.slot(id)?.node {
            DomNode::Element(element) => Ok(element),
            DomNode::Text(_) => Err(NodeError::NotAnElement { id }),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).ok().and_then(|slot| slot.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(DomNode::children).unwrap_or(&[])
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.node(id)? {
            DomNode::Text(text) => Some(text.as_str()),
            DomNode::Element(_) => None,
        }
    }

    /// Concatenated text of `id` and all its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            match self.node(next) {
                Some(DomNode::Text(text)) => out.push_str(text),
                Some(DomNode::Element(element)) => {
                    stack.extend(element.children().iter().rev().copied());
                }
                None => {}
            }
        }
        out
    }

    /// Listeners registered on `id` for `kind`, in registration order.
    pub fn listeners(&self, id: NodeId, kind: &str) -> Vec<EventHandler> {
        self.element(id)
            .map(|element| {
                element
                    .listeners
                    .iter()
                    .filter(|(k, _)| k == kind)
                    .map(|(_, handler)| handler.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Calls every listener of the event's target registered for its kind
    /// and returns how many ran. Listeners run with the document unborrowed.
    pub fn dispatch_event(document: &RefCell<Self>, event: &Event) -> usize {
        let handlers = document.borrow().listeners(event.target(), event.kind());
        log::debug!(
            "{} on node {} ({} listeners)",
            event.kind(),
            event.target(),
            handlers.len()
        );
        for handler in &handlers {
            handler.call(event);
        }
        handlers.len()
    }

    /// Replaces the live value of `target`, then fires `input` carrying it.
    pub fn type_into(
        document: &RefCell<Self>,
        target: NodeId,
        text: &str,
    ) -> Result<usize, NodeError> {
        document.borrow_mut().set_value(target, text)?;
        let event = Event::new("input", target).with_value(text);
        Ok(Self::dispatch_event(document, &event))
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Every element matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        match Selector::parse(selector) {
            Some(selector) => {
                let all = self.matching(&selector).collect();
                all
            }
            None => Vec::new(),
        }
    }

    fn matching<'a>(&'a self, selector: &'a Selector<'a>) -> impl Iterator<Item = NodeId> + 'a {
        let mut stack = vec![self.root];
        std::iter::from_fn(move || {
            while let Some(id) = stack.pop() {
                if let Some(DomNode::Element(element)) = self.node(id) {
                    stack.extend(element.children().iter().rev().copied());
                    if selector.matches(element) {
                        return Some(id);
                    }
                }
            }
            None
        })
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes `id` and its subtree as HTML.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(&mut out, id);
        out
    }

    /// Serializes the children of `id` as HTML.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(&mut out, child);
        }
        out
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.node(id) {
            Some(DomNode::Element(element)) => {
                let _ = write!(output, "{indent}[{id}] <{}", element.tag);
                for (name, value) in element.attributes() {
                    let _ = write!(output, " {name}=\"{value}\"");
                }
                output.push_str(">\n");
                for &child in element.children() {
                    self.dump_node(output, child, depth + 1);
                }
            }
            Some(DomNode::Text(text)) => {
                let _ = writeln!(output, "{indent}[{id}] {text:?}");
            }
            None => {
                let _ = writeln!(output, "{indent}[{id}] (missing)");
            }
        }
    }

    fn write_html(&self, out: &mut String, id: NodeId) {
        match self.node(id) {
            Some(DomNode::Text(text)) => out.push_str(&escape(text)),
            Some(DomNode::Element(element)) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in element.attributes() {
                    let _ = write!(out, " {name}=\"{}\"", escape(value));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                    return;
                }
                for &child in element.children() {
                    self.write_html(out, child);
                }
                let _ = write!(out, "</{}>", element.tag);
            }
            None => {}
        }
    }

    fn slot(&self, id: NodeId) -> Result<&Slot, NodeError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(NodeError::Missing { id })
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, NodeError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(NodeError::Missing { id })
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, NodeError> {
        match &mut self.slot_mut(id)?.node {
            DomNode::Element(element) => Ok(element),
            DomNode::Text(_) => Err(NodeError::NotAnElement { id }),
        }
    }

    fn insert_slot(&mut self, node: DomNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(Slot { node, parent: None }));
        id
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, child: NodeId) -> Result<(), NodeError> {
        if let Some(parent) = self.slot_mut(child)?.parent.take() {
            self.element_mut(parent)?.children.retain(|&c| c != child);
        }
        Ok(())
    }

    fn position_of(&self, parent: NodeId, child: NodeId) -> Result<usize, NodeError> {
        self.element(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(NodeError::NotAChild { parent, child })
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(slot) = self.nodes.get_mut(next).and_then(Option::take) {
                stack.extend_from_slice(slot.node.children());
            }
        }
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn create_element(&mut self, tag: &str) -> Result<NodeId, NodeError> {
        if !is_valid_tag(tag) {
            return Err(NodeError::InvalidTag {
                tag: tag.to_owned(),
            });
        }
        let id = self.insert_slot(DomNode::Element(Element::new(tag)));
        self.mutations.push(Mutation::CreateElement {
            id,
            tag: tag.to_owned(),
        });
        Ok(id)
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.insert_slot(DomNode::Text(text.to_owned()));
        self.mutations.push(Mutation::CreateText {
            id,
            text: text.to_owned(),
        });
        id
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.element(parent)?;
        self.slot(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(NodeError::Hierarchy { parent, child });
        }
        self.detach(child)?;
        self.element_mut(parent)?.children.push(child);
        self.slot_mut(child)?.parent = Some(parent);
        self.mutations.push(Mutation::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let position = self.position_of(parent, child)?;
        self.element_mut(parent)?.children.remove(position);
        self.free_subtree(child);
        self.mutations.push(Mutation::RemoveChild { parent, child });
        Ok(())
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), NodeError> {
        self.slot(new_child)?;
        if self.is_ancestor_or_self(new_child, parent) {
            return Err(NodeError::Hierarchy {
                parent,
                child: new_child,
            });
        }
        self.position_of(parent, old_child)?;
        self.detach(new_child)?;
        let position = self.position_of(parent, old_child)?;
        self.element_mut(parent)?.children[position] = new_child;
        self.slot_mut(new_child)?.parent = Some(parent);
        self.free_subtree(old_child);
        self.mutations.push(Mutation::ReplaceChild {
            parent,
            new_child,
            old_child,
        });
        Ok(())
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Result<Option<NodeId>, NodeError> {
        Ok(self.slot(parent)?.node.children().get(index).copied())
    }

    fn child_count(&self, parent: NodeId) -> Result<usize, NodeError> {
        Ok(self.slot(parent)?.node.children().len())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        self.element_mut(node)?
            .attributes
            .insert(name.to_owned(), value.to_owned());
        self.mutations.push(Mutation::SetAttribute {
            node,
            name: name.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), NodeError> {
        self.element_mut(node)?.attributes.shift_remove(name);
        self.mutations.push(Mutation::RemoveAttribute {
            node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), NodeError> {
        self.element_mut(node)?.value = Some(value.to_owned());
        self.mutations.push(Mutation::SetValue {
            node,
            value: value.to_owned(),
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        handler: EventHandler,
    ) -> Result<(), NodeError> {
        self.element_mut(node)?
            .listeners
            .push((kind.to_owned(), handler));
        self.mutations.push(Mutation::AddEventListener {
            node,
            kind: kind.to_owned(),
        });
        Ok(())
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector)?;
        let first = self.matching(&selector).next();
        first
    }

    fn contains(&self, node: NodeId) -> bool {
        self.slot(node).is_ok()
    }
}

enum Selector<'a> {
    Id(&'a str),
    Class(&'a str),
    Tag(&'a str),
}

impl<'a> Selector<'a> {
    fn parse(selector: &'a str) -> Option<Self> {
        let selector = selector.trim();
        if let Some(id) = selector.strip_prefix('#') {
            return (!id.is_empty()).then_some(Self::Id(id));
        }
        if let Some(class) = selector.strip_prefix('.') {
            return (!class.is_empty()).then_some(Self::Class(class));
        }
        is_valid_tag(selector).then_some(Self::Tag(selector))
    }

    fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Id(id) => element.attribute("id") == Some(*id),
            Self::Class(class) => element.has_class(class),
            Self::Tag(tag) => element.tag.eq_ignore_ascii_case(tag),
        }
    }
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        _ => false,
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
#[path = "tests/document_tests.rs"]
mod tests;
