//! Structural snapshots used to compare a virtual tree with the document
//! built from it.

use std::fmt;

use vdom_core::{Child, DomNode, MemoryDocument, NodeId};

/// Tag, static attributes, live value and children of a node, with event
/// handlers left out. Attributes are sorted by name.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeShape {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        value: Option<String>,
        children: Vec<NodeShape>,
    },
    Text(String),
}

impl NodeShape {
    pub fn of_child(child: &Child) -> Self {
        match child {
            Child::Text(primitive) => Self::Text(primitive.to_string()),
            Child::Element(node) => {
                let mut attributes: Vec<(String, String)> = node
                    .attributes()
                    .statics()
                    .filter(|(name, _)| *name != "value")
                    .map(|(name, value)| (name.to_owned(), value.to_string()))
                    .collect();
                attributes.sort();
                Self::Element {
                    tag: node.tag().to_owned(),
                    attributes,
                    value: node.attributes().value().map(ToString::to_string),
                    children: node.children().iter().map(Self::of_child).collect(),
                }
            }
        }
    }

    /// Snapshot of the subtree rooted at `id`, or `None` when it is missing.
    pub fn of_node(document: &MemoryDocument, id: NodeId) -> Option<Self> {
        match document.node(id)? {
            DomNode::Text(text) => Some(Self::Text(text.clone())),
            DomNode::Element(element) => {
                let mut attributes: Vec<(String, String)> = element
                    .attributes()
                    .filter(|(name, _)| *name != "value")
                    .map(|(name, value)| (name.to_owned(), value.to_owned()))
                    .collect();
                attributes.sort();
                let children = element
                    .children()
                    .iter()
                    .map(|child| Self::of_node(document, *child))
                    .collect::<Option<Vec<_>>>()?;
                Some(Self::Element {
                    tag: element.tag().to_owned(),
                    attributes,
                    value: element.value().map(str::to_owned),
                    children,
                })
            }
        }
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Element {
                tag,
                attributes,
                value,
                children,
            } => {
                write!(f, "<{tag}")?;
                for (name, attr) in attributes {
                    write!(f, " {name}={attr:?}")?;
                }
                if let Some(value) = value {
                    write!(f, " .value={value:?}")?;
                }
                f.write_str(">")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{tag}>")
            }
        }
    }
}

/// Panics with a dump of the document when the subtree at `id` does not
/// correspond to `expected`.
#[track_caller]
pub fn assert_renders(document: &MemoryDocument, id: NodeId, expected: &Child) {
    let expected_shape = NodeShape::of_child(expected);
    match NodeShape::of_node(document, id) {
        Some(actual) if actual == expected_shape => {}
        Some(actual) => panic!(
            "rendered tree does not match\n  expected: {expected_shape}\n    actual: {actual}\n{}",
            document.dump_tree(Some(id))
        ),
        None => panic!("node {id} is missing from the document"),
    }
}
