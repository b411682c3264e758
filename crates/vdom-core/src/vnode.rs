//! Virtual tree nodes and the `h` builder.
//!
//! A [`VNode`] is never mutated after construction; the view function builds
//! a fresh tree on every render and the reconciler compares it against the
//! previous one.

use std::fmt;

use indexmap::IndexMap;

use crate::event::{Event, EventHandler};

/// A leaf value rendered as a text node.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Text(String),
    Number(f64),
}

impl Primitive {
    /// Whether both values are of the same primitive kind (text vs number).
    pub fn same_kind(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Text(_), Self::Text(_)) | (Self::Number(_), Self::Number(_))
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Value of a static attribute. Written to the document in its string form.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<usize> for AttrValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

/// One entry of an attribute set: either a literal attribute or an event
/// subscription keyed by event kind (`"click"`, `"input"`, ...).
#[derive(Clone, Debug)]
pub enum Attribute {
    Static { name: String, value: AttrValue },
    Event { kind: String, handler: EventHandler },
}

/// Attributes of a [`VNode`].
///
/// Static attributes keep insertion order. Two sets compare equal when they
/// hold the same static name/value pairs in any order; event handlers never
/// take part in the comparison.
#[derive(Clone, Default)]
pub struct Attributes {
    statics: IndexMap<String, AttrValue>,
    events: Vec<(String, EventHandler)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.statics.insert(name.into(), value.into());
        self
    }

    /// Registers `handler` for events of `kind` (without any `on` prefix).
    pub fn on(mut self, kind: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        self.events.push((kind.into(), EventHandler::new(handler)));
        self
    }

    pub fn push(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::Static { name, value } => {
                self.statics.insert(name, value);
            }
            Attribute::Event { kind, handler } => self.events.push((kind, handler)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.statics.get(name)
    }

    /// The `value` attribute, which the reconciler treats as live input state.
    pub fn value(&self) -> Option<&AttrValue> {
        self.get("value")
    }

    pub fn statics(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.statics.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn events(&self) -> impl Iterator<Item = (&str, &EventHandler)> {
        self.events.iter().map(|(kind, handler)| (kind.as_str(), handler))
    }

    pub fn same_statics(&self, other: &Self) -> bool {
        self.statics == other.statics
    }

    pub fn is_empty(&self) -> bool {
        self.statics.is_empty() && self.events.is_empty()
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for attribute in iter {
            attributes.push(attribute);
        }
        attributes
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<&str> = self.events.iter().map(|(kind, _)| kind.as_str()).collect();
        f.debug_struct("Attributes")
            .field("statics", &self.statics)
            .field("events", &events)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct VNode {
    tag: String,
    attributes: Attributes,
    children: Vec<Child>,
}

impl VNode {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }
}

/// A position in the virtual tree: a nested element or a primitive leaf.
#[derive(Clone, Debug)]
pub enum Child {
    Element(VNode),
    Text(Primitive),
}

impl Child {
    pub fn as_element(&self) -> Option<&VNode> {
        match self {
            Self::Element(node) => Some(node),
            Self::Text(_) => None,
        }
    }
}

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Self::Element(node)
    }
}

impl From<Primitive> for Child {
    fn from(value: Primitive) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Self::Text(Primitive::Text(value.to_owned()))
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Self::Text(Primitive::Text(value))
    }
}

impl From<&String> for Child {
    fn from(value: &String) -> Self {
        Self::Text(Primitive::Text(value.clone()))
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Self::Text(Primitive::Number(value))
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Self::Text(Primitive::Number(f64::from(value)))
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Self::Text(Primitive::Number(value as f64))
    }
}

impl From<usize> for Child {
    fn from(value: usize) -> Self {
        Self::Text(Primitive::Number(value as f64))
    }
}

/// Builds a virtual node. No validation is done on `tag`; an illegal name
/// fails when the node is materialized.
pub fn h<A, I>(tag: impl Into<String>, attributes: A, children: I) -> VNode
where
    A: Into<Option<Attributes>>,
    I: IntoIterator,
    I::Item: Into<Child>,
{
    VNode {
        tag: tag.into(),
        attributes: attributes.into().unwrap_or_default(),
        children: children.into_iter().map(Into::into).collect(),
    }
}

/// Variadic form of [`h`]: `h!("p", None, "count: ", count)`.
#[macro_export]
macro_rules! h {
    ($tag:expr) => {
        $crate::h($tag, None, ::std::vec::Vec::<$crate::Child>::new())
    };
    ($tag:expr, $attrs:expr $(, $child:expr)* $(,)?) => {{
        let children: ::std::vec::Vec<$crate::Child> =
            ::std::vec![$($crate::Child::from($child)),*];
        $crate::h($tag, $attrs, children)
    }};
}

#[cfg(test)]
#[path = "tests/vnode_tests.rs"]
mod tests;
