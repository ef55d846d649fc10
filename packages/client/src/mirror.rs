//! # Structural Mirror
//!
//! Shadow tree whose shape tracks the live document, so nodes can be
//! addressed by [`Path`] and live nodes resolved back to one.
//!
//! ```text
//! live document             mirror
//! #document                 MirrorNode(#document)
//! ├── <!doctype>            │   (skipped)
//! └── html                  └── [0] MirrorNode(html)
//!     ├── head                  ├── [0] MirrorNode(head)
//!     └── body                  └── [1] MirrorNode(body)
//! ```
//!
//! Lookups from live node to path compare handles by identity, never by
//! content: two empty `div`s are different nodes.

use crate::dom::{Dom, NodeKind};
use tether_protocol::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MirrorError {
    #[error("Path {path} does not resolve: index {index} at depth {depth} but only {len} children")]
    Unresolved {
        path: Path,
        depth: usize,
        index: usize,
        len: usize,
    },

    #[error("Node is not attached under the document root")]
    Detached,

    #[error("Live node under {parent} has no mirror entry")]
    Unmirrored { parent: Path },
}

/// Shadow of one live node
#[derive(Debug, Clone)]
pub struct MirrorNode<N> {
    node: N,
    children: Vec<MirrorNode<N>>,
    /// Live value of a form control, read when the entry was built
    value: Option<String>,
}

impl<N: Clone + PartialEq> MirrorNode<N> {
    /// Wrap a live node and all of its attached descendants
    pub fn build<D: Dom<Node = N>>(dom: &D, node: N) -> Self {
        let children = dom
            .children(&node)
            .into_iter()
            .filter(|child| dom.kind(child) != NodeKind::DocumentType)
            .map(|child| MirrorNode::build(dom, child))
            .collect();
        let value = dom.value(&node);

        Self {
            node,
            children,
            value,
        }
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn children(&self) -> &[MirrorNode<N>] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&MirrorNode<N>> {
        self.children.get(index)
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Whether this entry tracks a live value
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Nodes in this subtree, itself included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(MirrorNode::size).sum::<usize>()
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<MirrorNode<N>> {
        &mut self.children
    }

    pub(crate) fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }
}

/// The mirror of a whole document
#[derive(Debug, Clone)]
pub struct Mirror<N> {
    root: MirrorNode<N>,
}

impl<N: Clone + PartialEq> Mirror<N> {
    /// Snapshot the full document as it is right now
    pub fn snapshot<D: Dom<Node = N>>(dom: &D) -> Self {
        Self {
            root: MirrorNode::build(dom, dom.root()),
        }
    }

    pub fn root(&self) -> &MirrorNode<N> {
        &self.root
    }

    pub fn resolve(&self, path: &[usize]) -> Result<&MirrorNode<N>, MirrorError> {
        let mut tree = &self.root;
        for (depth, &index) in path.iter().enumerate() {
            tree = tree.children.get(index).ok_or_else(|| MirrorError::Unresolved {
                path: Path::from(path),
                depth,
                index,
                len: tree.children.len(),
            })?;
        }
        Ok(tree)
    }

    pub fn resolve_mut(&mut self, path: &[usize]) -> Result<&mut MirrorNode<N>, MirrorError> {
        let mut tree = &mut self.root;
        for (depth, &index) in path.iter().enumerate() {
            let len = tree.children.len();
            tree = tree.children.get_mut(index).ok_or_else(|| MirrorError::Unresolved {
                path: Path::from(path),
                depth,
                index,
                len,
            })?;
        }
        Ok(tree)
    }

    /// Path of a live node, found by walking its ancestors up to the root
    pub fn locate<D: Dom<Node = N>>(&self, dom: &D, node: &N) -> Result<Path, MirrorError> {
        let mut ancestors = Vec::new();
        let mut current = node.clone();
        while current != self.root.node {
            let parent = dom.parent(&current).ok_or(MirrorError::Detached)?;
            ancestors.push(current);
            current = parent;
        }

        let mut tree = &self.root;
        let mut path = Path::root();
        for ancestor in ancestors.iter().rev() {
            let index = tree
                .children
                .iter()
                .position(|child| child.node == *ancestor)
                .ok_or_else(|| MirrorError::Unmirrored {
                    parent: path.clone(),
                })?;
            path.push(index);
            tree = &tree.children[index];
        }

        Ok(path)
    }

    /// Whether the mirror has the same shape and node identities as the live tree
    pub fn matches<D: Dom<Node = N>>(&self, dom: &D) -> bool {
        fn matches_node<D: Dom>(dom: &D, tree: &MirrorNode<D::Node>) -> bool {
            let live: Vec<_> = dom
                .children(&tree.node)
                .into_iter()
                .filter(|child| dom.kind(child) != NodeKind::DocumentType)
                .collect();

            live.len() == tree.children.len()
                && live
                    .iter()
                    .zip(&tree.children)
                    .all(|(node, child)| *node == child.node && matches_node(dom, child))
        }

        self.root.node == dom.root() && matches_node(dom, &self.root)
    }
}
