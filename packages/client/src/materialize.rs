//! # Node Materializer
//!
//! Builds detached live nodes from wire descriptions. Mirroring is a
//! separate step ([`MirrorNode::build`]) taken once the insertion point is
//! known.
//!
//! [`MirrorNode::build`]: crate::mirror::MirrorNode::build

use crate::dom::{Dom, DomError};
use tether_protocol::NodeDescription;

/// Create a live node (and its subtree) attached nowhere
pub fn materialize<D: Dom>(dom: &mut D, description: &NodeDescription) -> Result<D::Node, DomError> {
    match description {
        NodeDescription::Text(content) => Ok(dom.create_text(content)),
        NodeDescription::Element {
            tag,
            attributes,
            children,
        } => {
            let node = dom.create_element(tag)?;
            for (key, value) in attributes {
                dom.set_attribute(&node, key, value)?;
            }
            for child in children {
                let child = materialize(dom, child)?;
                dom.insert_before(&node, &child, None)?;
            }
            Ok(node)
        }
    }
}
