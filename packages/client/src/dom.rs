//! # Live Document Backend
//!
//! The core never touches a concrete document. Everything it does to the
//! live tree goes through [`Dom`], implemented by the browser binding and by
//! the in-memory document in [`crate::memory`].

use std::fmt;
use thiserror::Error;

/// Coarse node classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    DocumentType,
    /// Element with its lowercase tag name
    Element(String),
    Text,
    Comment,
    Other,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Invalid tag name: {0}")]
    InvalidTag(String),

    #[error("Invalid attribute name: {0}")]
    InvalidAttribute(String),

    #[error("Node is not an element")]
    NotAnElement,

    #[error("Node does not carry a live value")]
    NotAControl,

    #[error("Node is not a child of the given parent")]
    NotAChild,

    #[error("Hierarchy error: {0}")]
    Hierarchy(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// A mutable live document tree.
///
/// `Node` handles must compare by identity: two distinct nodes with the same
/// content are never equal.
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;

    /// The document object; the mirror never addresses anything above it
    fn root(&self) -> Self::Node;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Attached children in document order
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn attribute(&self, node: &Self::Node, key: &str) -> Option<String>;

    fn has_attribute(&self, node: &Self::Node, key: &str) -> bool {
        self.attribute(node, key).is_some()
    }

    /// Live editable value, for nodes that carry one (form controls)
    fn value(&self, node: &Self::Node) -> Option<String>;

    fn create_element(&mut self, tag: &str) -> Result<Self::Node, DomError>;

    fn create_text(&mut self, content: &str) -> Self::Node;

    fn set_attribute(&mut self, node: &Self::Node, key: &str, value: &str) -> Result<(), DomError>;

    fn remove_attribute(&mut self, node: &Self::Node, key: &str) -> Result<(), DomError>;

    fn set_value(&mut self, node: &Self::Node, value: &str) -> Result<(), DomError>;

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    /// A child that is already attached elsewhere is moved.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), DomError>;

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    fn replace_child(
        &mut self,
        parent: &Self::Node,
        new_child: &Self::Node,
        old_child: &Self::Node,
    ) -> Result<(), DomError>;
}

/// An interaction event as seen by a listener
pub trait DomEvent<N> {
    /// Event type, e.g. `click`
    fn kind(&self) -> String;

    /// The node the event was dispatched to
    fn target(&self) -> Option<N>;

    /// The node the listener was registered on
    fn current_target(&self) -> Option<N>;

    fn prevent_default(&self);

    fn stop_propagation(&self);
}
