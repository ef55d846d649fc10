//! # In-Memory Backend
//!
//! Headless implementations of [`Dom`], [`History`] and [`Channel`].
//! They follow browser semantics closely enough to drive a [`Session`]
//! natively, one instance per simulated session.
//!
//! [`Session`]: crate::Session

use crate::channel::{Channel, ChannelError};
use crate::dom::{Dom, DomEvent, DomError, NodeKind};
use crate::navigation::{History, HistoryError};
use std::cell::Cell;
use std::collections::BTreeMap;

/// Elements whose live value is distinct from their `value` attribute
const CONTROL_TAGS: &[&str] = &["input", "textarea", "select"];

/// Elements serialized without a closing tag
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Handle into a [`MemoryDocument`]; equality is identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Doctype(String),
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        /// Set once the live value diverges from the `value` attribute
        dirty_value: Option<String>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Entry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree. Detached nodes stay allocated.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    entries: Vec<Entry>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty document
    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// A document whose first child is `<!doctype html>`
    pub fn with_doctype() -> Self {
        let mut doc = Self::new();
        let doctype = doc.alloc(NodeData::Doctype("html".to_string()));
        doc.entries[0].children.push(doctype);
        doc.entries[doctype.0].parent = Some(NodeId(0));
        doc
    }

    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::Comment(content.to_string()))
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.entry(node)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.entry(node)?.data {
            NodeData::Text(content) => Some(content),
            _ => None,
        }
    }

    pub fn attributes(&self, node: NodeId) -> Option<&BTreeMap<String, String>> {
        match &self.entry(node)?.data {
            NodeData::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// Simulate the user editing a control
    pub fn user_input(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.set_value(&node, value)
    }

    /// Serialize a subtree as HTML, for assertions
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serialize the children of a node as HTML
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(entry) = self.entry(node) {
            for child in &entry.children {
                self.write_html(*child, &mut out);
            }
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.entry(node) else {
            return;
        };

        match &entry.data {
            NodeData::Document => {
                for child in &entry.children {
                    self.write_html(*child, out);
                }
            }
            NodeData::Doctype(name) => {
                out.push_str("<!doctype ");
                out.push_str(name);
                out.push('>');
            }
            NodeData::Element {
                tag, attributes, ..
            } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape(value, true));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for child in &entry.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            NodeData::Text(content) => out.push_str(&escape(content, false)),
            NodeData::Comment(content) => {
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
            }
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.entries.push(Entry {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.entries.len() - 1)
    }

    fn entry(&self, node: NodeId) -> Option<&Entry> {
        self.entries.get(node.0)
    }

    fn entry_mut(&mut self, node: NodeId) -> Result<&mut Entry, DomError> {
        self.entries
            .get_mut(node.0)
            .ok_or_else(|| DomError::Backend(format!("unknown node {}", node.0)))
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.entry(node).and_then(|entry| entry.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.entry_mut(node)?.parent.take() {
            self.entry_mut(parent)?.children.retain(|child| *child != node);
        }
        Ok(())
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        match self.entry(parent).map(|entry| &entry.data) {
            Some(NodeData::Document | NodeData::Element { .. }) => {}
            _ => return Err(DomError::Hierarchy("parent cannot have children".to_string())),
        }
        if matches!(
            self.entry(child).map(|entry| &entry.data),
            Some(NodeData::Document) | None
        ) {
            return Err(DomError::Hierarchy("node cannot be inserted".to_string()));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Hierarchy("insertion would create a cycle".to_string()));
        }
        Ok(())
    }

    fn element_mut(
        &mut self,
        node: NodeId,
    ) -> Result<(&str, &mut BTreeMap<String, String>, &mut Option<String>), DomError> {
        match &mut self.entry_mut(node)?.data {
            NodeData::Element {
                tag,
                attributes,
                dirty_value,
            } => Ok((tag.as_str(), attributes, dirty_value)),
            _ => Err(DomError::NotAnElement),
        }
    }
}

impl Dom for MemoryDocument {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.entry(*node).map(|entry| &entry.data) {
            Some(NodeData::Document) => NodeKind::Document,
            Some(NodeData::Doctype(_)) => NodeKind::DocumentType,
            Some(NodeData::Element { tag, .. }) => NodeKind::Element(tag.clone()),
            Some(NodeData::Text(_)) => NodeKind::Text,
            Some(NodeData::Comment(_)) => NodeKind::Comment,
            None => NodeKind::Other,
        }
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.entry(*node)?.parent
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.entry(*node)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, node: &NodeId, key: &str) -> Option<String> {
        self.attributes(*node)?.get(&key.to_ascii_lowercase()).cloned()
    }

    fn value(&self, node: &NodeId) -> Option<String> {
        match &self.entry(*node)?.data {
            NodeData::Element {
                tag,
                attributes,
                dirty_value,
            } if CONTROL_TAGS.contains(&tag.as_str()) => Some(
                dirty_value
                    .clone()
                    .or_else(|| attributes.get("value").cloned())
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        if !is_valid_name(tag) {
            return Err(DomError::InvalidTag(tag.to_string()));
        }
        Ok(self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            dirty_value: None,
        }))
    }

    fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::Text(content.to_string()))
    }

    fn set_attribute(&mut self, node: &NodeId, key: &str, value: &str) -> Result<(), DomError> {
        if !is_valid_name(key) {
            return Err(DomError::InvalidAttribute(key.to_string()));
        }
        let (_, attributes, _) = self.element_mut(*node)?;
        attributes.insert(key.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, key: &str) -> Result<(), DomError> {
        let (_, attributes, _) = self.element_mut(*node)?;
        attributes.remove(&key.to_ascii_lowercase());
        Ok(())
    }

    fn set_value(&mut self, node: &NodeId, value: &str) -> Result<(), DomError> {
        let (tag, _, dirty_value) = self.element_mut(*node)?;
        if !CONTROL_TAGS.contains(&tag) {
            return Err(DomError::NotAControl);
        }
        *dirty_value = Some(value.to_string());
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> Result<(), DomError> {
        self.check_insertable(*parent, *child)?;
        if let Some(reference) = reference {
            if self.parent(reference) != Some(*parent) {
                return Err(DomError::NotAChild);
            }
            if reference == child {
                return Ok(());
            }
        }

        self.detach(*child)?;

        let siblings = &mut self.entry_mut(*parent)?.children;
        let position = match reference {
            Some(reference) => siblings
                .iter()
                .position(|sibling| sibling == reference)
                .ok_or(DomError::NotAChild)?,
            None => siblings.len(),
        };
        siblings.insert(position, *child);
        self.entry_mut(*child)?.parent = Some(*parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        if self.parent(child) != Some(*parent) {
            return Err(DomError::NotAChild);
        }
        self.detach(*child)
    }

    fn replace_child(
        &mut self,
        parent: &NodeId,
        new_child: &NodeId,
        old_child: &NodeId,
    ) -> Result<(), DomError> {
        if self.parent(old_child) != Some(*parent) {
            return Err(DomError::NotAChild);
        }
        if new_child == old_child {
            return Ok(());
        }
        self.check_insertable(*parent, *new_child)?;
        self.detach(*new_child)?;

        let siblings = &mut self.entry_mut(*parent)?.children;
        let position = siblings
            .iter()
            .position(|sibling| sibling == old_child)
            .ok_or(DomError::NotAChild)?;
        siblings[position] = *new_child;
        self.entry_mut(*new_child)?.parent = Some(*parent);
        self.entry_mut(*old_child)?.parent = None;
        Ok(())
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| !c.is_whitespace() && !matches!(c, '<' | '>' | '/' | '=' | '"' | '\''))
}

fn escape(text: &str, quote: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// A dispatched event; records whether a listener suppressed it
#[derive(Debug)]
pub struct SyntheticEvent {
    kind: String,
    target: Option<NodeId>,
    current_target: Option<NodeId>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl SyntheticEvent {
    pub fn new(kind: impl Into<String>, current_target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target: Some(current_target),
            current_target: Some(current_target),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// The same event bubbling: dispatched to `target`, seen by a listener
    /// on `current_target`
    pub fn bubbled(kind: impl Into<String>, target: NodeId, current_target: NodeId) -> Self {
        Self {
            target: Some(target),
            ..Self::new(kind, current_target)
        }
    }

    /// An event with no current target (already finished dispatching)
    pub fn detached(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            current_target: None,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

impl DomEvent<NodeId> for SyntheticEvent {
    fn kind(&self) -> String {
        self.kind.clone()
    }

    fn target(&self) -> Option<NodeId> {
        self.target
    }

    fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }
}

/// Session history as a list of path-only locations
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            entries: vec![location.into()],
            index: 0,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    /// Simulate the back button; `false` if there is nowhere to go
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Simulate the forward button; `false` if there is nowhere to go
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn push(&mut self, url: &str) -> Result<(), HistoryError> {
        self.entries.truncate(self.index + 1);
        self.entries.push(url.to_string());
        self.index += 1;
        Ok(())
    }

    fn replace(&mut self, url: &str) -> Result<(), HistoryError> {
        self.entries[self.index] = url.to_string();
        Ok(())
    }

    fn location(&self) -> Result<String, HistoryError> {
        Ok(self.current().to_string())
    }
}

/// Channel that records every sent frame
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    sent: Vec<String>,
    closed: bool,
    failing: bool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose sends always fail
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Channel for MemoryChannel {
    fn send(&mut self, message: &str) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        if self.failing {
            return Err(ChannelError::Send("simulated failure".to_string()));
        }
        self.sent.push(message.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_before_and_serialize() {
        let mut doc = MemoryDocument::with_doctype();
        let root = doc.root();
        let div = doc.create_element("DIV").unwrap();
        let text = doc.create_text("a < b");
        doc.set_attribute(&div, "id", "main").unwrap();
        doc.insert_before(&div, &text, None).unwrap();
        doc.insert_before(&root, &div, None).unwrap();

        assert_eq!(doc.to_html(root), r#"<!doctype html><div id="main">a &lt; b</div>"#);
        assert_eq!(doc.kind(&div), NodeKind::Element("div".to_string()));
    }

    #[test]
    fn test_insert_moves_attached_node() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.insert_before(&root, &a, None).unwrap();
        doc.insert_before(&root, &b, None).unwrap();

        doc.insert_before(&root, &b, Some(&a)).unwrap();
        assert_eq!(doc.children(&root), vec![b, a]);
    }

    #[test]
    fn test_hierarchy_errors() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let div = doc.create_element("div").unwrap();
        let text = doc.create_text("t");
        doc.insert_before(&root, &div, None).unwrap();

        assert!(matches!(
            doc.insert_before(&text, &div, None),
            Err(DomError::Hierarchy(_))
        ));
        assert!(matches!(
            doc.insert_before(&div, &root, None),
            Err(DomError::Hierarchy(_))
        ));
        assert_eq!(doc.remove_child(&div, &text), Err(DomError::NotAChild));
        assert_eq!(doc.set_attribute(&text, "id", "x"), Err(DomError::NotAnElement));
        assert!(matches!(doc.create_element("1x"), Err(DomError::InvalidTag(_))));
    }

    #[test]
    fn test_replace_child_detaches_old() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let old = doc.create_element("p").unwrap();
        let new = doc.create_element("span").unwrap();
        doc.insert_before(&root, &old, None).unwrap();

        doc.replace_child(&root, &new, &old).unwrap();
        assert_eq!(doc.children(&root), vec![new]);
        assert_eq!(doc.parent(&old), None);
    }

    #[test]
    fn test_control_value_diverges_from_attribute() {
        let mut doc = MemoryDocument::new();
        let input = doc.create_element("input").unwrap();
        doc.set_attribute(&input, "value", "a").unwrap();
        assert_eq!(doc.value(&input).as_deref(), Some("a"));

        doc.user_input(input, "typed").unwrap();
        assert_eq!(doc.value(&input).as_deref(), Some("typed"));
        assert_eq!(doc.attribute(&input, "value").as_deref(), Some("a"));

        let div = doc.create_element("div").unwrap();
        assert_eq!(doc.value(&div), None);
        assert_eq!(doc.set_value(&div, "x"), Err(DomError::NotAControl));
    }

    #[test]
    fn test_history_push_truncates_forward_entries() {
        let mut history = MemoryHistory::new("/");
        history.push("/a").unwrap();
        history.push("/b").unwrap();
        assert!(history.back());
        history.push("/c").unwrap();

        assert_eq!(history.entries(), &["/", "/a", "/c"]);
        assert!(!history.forward());
    }

    #[test]
    fn test_channel_refuses_after_close() {
        let mut channel = MemoryChannel::new();
        channel.send("one").unwrap();
        channel.close().unwrap();

        assert_eq!(channel.send("two"), Err(ChannelError::Closed));
        assert_eq!(channel.sent(), &["one"]);
    }
}
