//! `Dom` backend over the browser document

use tether_client::{Dom, DomError, DomEvent, NodeKind};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, Node};

/// Text of a thrown JS value, for error messages
pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

fn hierarchy(value: JsValue) -> DomError {
    DomError::Hierarchy(describe(&value))
}

pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn element<'a>(&self, node: &'a Node) -> Result<&'a Element, DomError> {
        node.dyn_ref::<Element>().ok_or(DomError::NotAnElement)
    }
}

impl Dom for WebDom {
    type Node = Node;

    fn root(&self) -> Node {
        self.document.clone().into()
    }

    fn kind(&self, node: &Node) -> NodeKind {
        match node.node_type() {
            Node::DOCUMENT_NODE => NodeKind::Document,
            Node::DOCUMENT_TYPE_NODE => NodeKind::DocumentType,
            Node::ELEMENT_NODE => match node.dyn_ref::<Element>() {
                Some(element) => NodeKind::Element(element.local_name()),
                None => NodeKind::Other,
            },
            Node::TEXT_NODE => NodeKind::Text,
            Node::COMMENT_NODE => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn attribute(&self, node: &Node, key: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(key)
    }

    fn has_attribute(&self, node: &Node, key: &str) -> bool {
        node.dyn_ref::<Element>()
            .map(|element| element.has_attribute(key))
            .unwrap_or(false)
    }

    fn value(&self, node: &Node) -> Option<String> {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            Some(input.value())
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            Some(area.value())
        } else {
            node.dyn_ref::<HtmlSelectElement>().map(|select| select.value())
        }
    }

    fn create_element(&mut self, tag: &str) -> Result<Node, DomError> {
        self.document
            .create_element(tag)
            .map(Node::from)
            .map_err(|_| DomError::InvalidTag(tag.to_string()))
    }

    fn create_text(&mut self, content: &str) -> Node {
        self.document.create_text_node(content).into()
    }

    fn set_attribute(&mut self, node: &Node, key: &str, value: &str) -> Result<(), DomError> {
        self.element(node)?
            .set_attribute(key, value)
            .map_err(|_| DomError::InvalidAttribute(key.to_string()))
    }

    fn remove_attribute(&mut self, node: &Node, key: &str) -> Result<(), DomError> {
        self.element(node)?
            .remove_attribute(key)
            .map_err(|_| DomError::InvalidAttribute(key.to_string()))
    }

    fn set_value(&mut self, node: &Node, value: &str) -> Result<(), DomError> {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else {
            return Err(DomError::NotAControl);
        }
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: &Node,
        child: &Node,
        reference: Option<&Node>,
    ) -> Result<(), DomError> {
        parent
            .insert_before(child, reference)
            .map(drop)
            .map_err(hierarchy)
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) -> Result<(), DomError> {
        if child.parent_node().as_ref() != Some(parent) {
            return Err(DomError::NotAChild);
        }
        parent.remove_child(child).map(drop).map_err(hierarchy)
    }

    fn replace_child(
        &mut self,
        parent: &Node,
        new_child: &Node,
        old_child: &Node,
    ) -> Result<(), DomError> {
        if old_child.parent_node().as_ref() != Some(parent) {
            return Err(DomError::NotAChild);
        }
        parent
            .replace_child(new_child, old_child)
            .map(drop)
            .map_err(hierarchy)
    }
}

/// A browser event delivered to a registered listener
pub struct WebEvent(pub web_sys::Event);

impl DomEvent<Node> for WebEvent {
    fn kind(&self) -> String {
        self.0.type_()
    }

    fn target(&self) -> Option<Node> {
        self.0.target()?.dyn_into::<Node>().ok()
    }

    fn current_target(&self) -> Option<Node> {
        self.0.current_target()?.dyn_into::<Node>().ok()
    }

    fn prevent_default(&self) {
        self.0.prevent_default();
    }

    fn stop_propagation(&self) {
        self.0.stop_propagation();
    }
}
