//! # Patch Applier
//!
//! Applies inbound batches to the live tree and the mirror in lockstep.
//!
//! ## Semantics
//!
//! - Instructions run strictly in array order. Each one is finished (live
//!   tree and mirror both updated) before the next is decoded, so paths and
//!   indices always refer to the state left by everything before them.
//! - Positions are taken from the mirror's children. Live children the
//!   mirror skips (the doctype) never shift an index.
//! - Any violation stops the batch. Nothing is rolled back: instructions
//!   already applied stay applied, the rest are dropped.
//!
//! ### Create
//! - Index equal to (or past) the child count appends
//!
//! ### Move
//! - `to` is relative to the children after `from` was taken out
//!
//! ### Set / Unset
//! - The `value` key (any case) of a control that tracks a live value edits that value,
//!   not the attribute. Unset clears it to the empty string.
//! - Unset of an attribute that is not there is a violation

use crate::dom::Dom;
use crate::errors::{BatchError, PatchError};
use crate::materialize::materialize;
use crate::mirror::{Mirror, MirrorNode};
use crate::navigation::{History, NavigationBridge};
use tether_protocol::{Batch, Instruction, NodeDescription, Path};
use tracing::{debug, instrument};

/// Attribute key that addresses a control's live value
pub const VALUE_KEY: &str = "value";

/// Outcome of a fully applied batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: usize,
}

pub struct PatchApplier<'a, D: Dom, H> {
    dom: &'a mut D,
    mirror: &'a mut Mirror<D::Node>,
    navigation: &'a mut NavigationBridge<H>,
}

impl<'a, D: Dom, H: History> PatchApplier<'a, D, H> {
    pub fn new(
        dom: &'a mut D,
        mirror: &'a mut Mirror<D::Node>,
        navigation: &'a mut NavigationBridge<H>,
    ) -> Self {
        Self {
            dom,
            mirror,
            navigation,
        }
    }

    /// Apply one wire message
    #[instrument(skip_all, fields(bytes = message.len()))]
    pub fn apply_batch(&mut self, message: &str) -> Result<BatchSummary, BatchError> {
        let batch = Batch::parse(message).map_err(|e| BatchError {
            applied: 0,
            cause: e.into(),
        })?;

        let mut summary = BatchSummary::default();
        for decoded in batch.instructions() {
            let result = decoded
                .map_err(PatchError::from)
                .and_then(|instruction| self.apply(&instruction));

            if let Err(cause) = result {
                return Err(BatchError {
                    applied: summary.applied,
                    cause,
                });
            }
            summary.applied += 1;
        }

        Ok(summary)
    }

    /// Apply a single instruction to completion
    pub fn apply(&mut self, instruction: &Instruction) -> Result<(), PatchError> {
        debug!(kind = instruction.kind(), "Applying instruction");

        match instruction {
            Instruction::Create {
                parent,
                index,
                node,
            } => self.apply_create(parent, *index, node),

            Instruction::Delete { parent, index } => self.apply_delete(parent, *index),

            Instruction::Replace {
                parent,
                index,
                node,
            } => self.apply_replace(parent, *index, node),

            Instruction::Move { parent, from, to } => self.apply_move(parent, *from, *to),

            Instruction::Set { target, key, value } => self.apply_set(target, key, value),

            Instruction::Unset { target, key } => self.apply_unset(target, key),

            Instruction::PushUrl { url } => Ok(self.navigation.push_url(url)?),

            Instruction::ReplaceUrl { url } => Ok(self.navigation.replace_url(url)?),
        }
    }

    fn apply_create(
        &mut self,
        parent: &Path,
        index: usize,
        description: &NodeDescription,
    ) -> Result<(), PatchError> {
        let tree = self.mirror.resolve_mut(parent)?;
        let index = index.min(tree.children().len());

        let node = materialize(self.dom, description)?;
        debug!(parent = %parent, index, nodes = description.node_count(), "Materialized subtree");
        let reference = tree.child(index).map(|child| child.node().clone());
        self.dom.insert_before(tree.node(), &node, reference.as_ref())?;

        let subtree = MirrorNode::build(&*self.dom, node);
        tree.children_mut().insert(index, subtree);
        Ok(())
    }

    fn apply_delete(&mut self, parent: &Path, index: usize) -> Result<(), PatchError> {
        let tree = self.mirror.resolve_mut(parent)?;
        let child = existing_child(tree, parent, index)?;

        self.dom.remove_child(tree.node(), &child)?;
        tree.children_mut().remove(index);
        Ok(())
    }

    fn apply_replace(
        &mut self,
        parent: &Path,
        index: usize,
        description: &NodeDescription,
    ) -> Result<(), PatchError> {
        let tree = self.mirror.resolve_mut(parent)?;
        let old = existing_child(tree, parent, index)?;

        let node = materialize(self.dom, description)?;
        debug!(parent = %parent, index, nodes = description.node_count(), "Materialized subtree");
        self.dom.replace_child(tree.node(), &node, &old)?;
        tree.children_mut()[index] = MirrorNode::build(&*self.dom, node);
        Ok(())
    }

    fn apply_move(&mut self, parent: &Path, from: usize, to: usize) -> Result<(), PatchError> {
        let tree = self.mirror.resolve_mut(parent)?;
        let len = tree.children().len();
        existing_child(tree, parent, from)?;
        // `to` counts positions among the remaining children
        if to >= len {
            return Err(PatchError::IndexOutOfRange {
                parent: parent.clone(),
                index: to,
                len: len - 1,
            });
        }

        let moved = tree.children_mut().remove(from);
        let reference = tree.child(to).map(|child| child.node().clone());
        self.dom
            .insert_before(tree.node(), moved.node(), reference.as_ref())?;
        tree.children_mut().insert(to, moved);
        Ok(())
    }

    fn apply_set(&mut self, target: &Path, key: &str, value: &str) -> Result<(), PatchError> {
        let tree = self.mirror.resolve_mut(target)?;

        if key.eq_ignore_ascii_case(VALUE_KEY) && tree.has_value() {
            self.dom.set_value(tree.node(), value)?;
            tree.set_value(value);
        } else {
            self.dom.set_attribute(tree.node(), key, value)?;
        }
        Ok(())
    }

    fn apply_unset(&mut self, target: &Path, key: &str) -> Result<(), PatchError> {
        let tree = self.mirror.resolve_mut(target)?;

        if key.eq_ignore_ascii_case(VALUE_KEY) && tree.has_value() {
            self.dom.set_value(tree.node(), "")?;
            tree.set_value("");
            return Ok(());
        }

        if !self.dom.has_attribute(tree.node(), key) {
            return Err(PatchError::MissingAttribute {
                target: target.clone(),
                key: key.to_string(),
            });
        }
        self.dom.remove_attribute(tree.node(), key)?;
        Ok(())
    }
}

/// Live node of an existing child, or a range violation
fn existing_child<N: Clone + PartialEq>(
    tree: &MirrorNode<N>,
    parent: &Path,
    index: usize,
) -> Result<N, PatchError> {
    tree.child(index)
        .map(|child| child.node().clone())
        .ok_or_else(|| PatchError::IndexOutOfRange {
            parent: parent.clone(),
            index,
            len: tree.children().len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomError;
    use crate::memory::{MemoryDocument, MemoryHistory};
    use crate::mirror::MirrorError;

    struct Fixture {
        doc: MemoryDocument,
        mirror: Mirror<crate::memory::NodeId>,
        navigation: NavigationBridge<MemoryHistory>,
    }

    impl Fixture {
        fn new() -> Self {
            let doc = MemoryDocument::new();
            let mirror = Mirror::snapshot(&doc);
            Self {
                doc,
                mirror,
                navigation: NavigationBridge::new(MemoryHistory::default()),
            }
        }

        fn apply(&mut self, message: &str) -> Result<BatchSummary, BatchError> {
            PatchApplier::new(&mut self.doc, &mut self.mirror, &mut self.navigation)
                .apply_batch(message)
        }

        fn html(&self) -> String {
            self.doc.inner_html(self.doc.root())
        }
    }

    #[test]
    fn test_create_into_empty_root() {
        let mut fx = Fixture::new();
        let summary = fx.apply(r#"[["create",0,["div",{},"hi"]]]"#).unwrap();

        assert_eq!(summary.applied, 1);
        assert_eq!(fx.html(), "<div>hi</div>");
        assert_eq!(fx.mirror.root().size(), 3);
        assert!(fx.mirror.matches(&fx.doc));
    }

    #[test]
    fn test_create_past_end_appends() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,"a"],["create",9,"b"],["create",1,"c"]]"#)
            .unwrap();

        assert_eq!(fx.html(), "acb");
        assert!(fx.mirror.matches(&fx.doc));
    }

    #[test]
    fn test_nested_create_uses_updated_state() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,["ul",{}]],["create",0,0,["li",{},"one"]],["create",0,1,["li",{},"two"]]]"#)
            .unwrap();

        assert_eq!(fx.html(), "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn test_delete_and_out_of_range() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,"a"],["create",1,"b"]]"#).unwrap();
        fx.apply(r#"[["delete",0]]"#).unwrap();
        assert_eq!(fx.html(), "b");

        let err = fx.apply(r#"[["delete",1]]"#).unwrap_err();
        assert_eq!(err.applied, 0);
        assert!(matches!(
            err.cause,
            PatchError::IndexOutOfRange { index: 1, len: 1, .. }
        ));
    }

    #[test]
    fn test_replace_rebuilds_mirror_entry() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,["p",{},"old",["b",{}]]]]"#).unwrap();
        fx.apply(r#"[["replace",0,["span",{"id":"x"},"y"]]]"#).unwrap();

        assert_eq!(fx.html(), r#"<span id="x">y</span>"#);
        assert_eq!(fx.mirror.root().size(), 3);
        assert!(fx.mirror.matches(&fx.doc));
    }

    #[test]
    fn test_move_forward_and_backward() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,"a"],["create",1,"b"],["create",2,"c"]]"#)
            .unwrap();

        fx.apply(r#"[["move",0,2]]"#).unwrap();
        assert_eq!(fx.html(), "bca");

        fx.apply(r#"[["move",2,0]]"#).unwrap();
        assert_eq!(fx.html(), "abc");
        assert!(fx.mirror.matches(&fx.doc));

        let err = fx.apply(r#"[["move",0,3]]"#).unwrap_err();
        assert!(matches!(err.cause, PatchError::IndexOutOfRange { index: 3, .. }));
        assert_eq!(fx.html(), "abc");
    }

    #[test]
    fn test_move_preserves_subtree_identity() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,["i",{}]],["create",1,["b",{},"x"]]]"#)
            .unwrap();
        let bold = *fx.mirror.resolve(&[1]).unwrap().node();

        fx.apply(r#"[["move",1,0]]"#).unwrap();

        assert_eq!(*fx.mirror.resolve(&[0]).unwrap().node(), bold);
        assert_eq!(fx.html(), "<b>x</b><i></i>");
    }

    #[test]
    fn test_set_and_unset_attribute() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,["div",{}]],["set",0,"class","on"]]"#)
            .unwrap();
        assert_eq!(fx.html(), r#"<div class="on"></div>"#);

        fx.apply(r#"[["unset",0,"class"]]"#).unwrap();
        assert_eq!(fx.html(), "<div></div>");

        let err = fx.apply(r#"[["unset",0,"class"]]"#).unwrap_err();
        assert!(matches!(err.cause, PatchError::MissingAttribute { ref key, .. } if key == "class"));
    }

    #[test]
    fn test_value_key_targets_live_value() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,["input",{"value":"a"}]]]"#).unwrap();
        let input = *fx.mirror.resolve(&[0]).unwrap().node();

        fx.apply(r#"[["set",0,"value","typed"]]"#).unwrap();
        assert_eq!(fx.doc.value(&input).as_deref(), Some("typed"));
        assert_eq!(fx.doc.attribute(&input, "value").as_deref(), Some("a"));
        assert_eq!(fx.mirror.resolve(&[0]).unwrap().value(), Some("typed"));

        fx.apply(r#"[["unset",0,"value"]]"#).unwrap();
        assert_eq!(fx.doc.value(&input).as_deref(), Some(""));
        assert_eq!(fx.doc.attribute(&input, "value").as_deref(), Some("a"));
    }

    #[test]
    fn test_value_key_matches_any_case() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,["input",{"value":"a"}]]]"#).unwrap();
        let input = *fx.mirror.resolve(&[0]).unwrap().node();

        fx.apply(r#"[["set",0,"VALUE","typed"]]"#).unwrap();
        assert_eq!(fx.doc.value(&input).as_deref(), Some("typed"));
        assert_eq!(fx.doc.attribute(&input, "value").as_deref(), Some("a"));

        fx.apply(r#"[["unset",0,"Value"]]"#).unwrap();
        assert_eq!(fx.doc.value(&input).as_deref(), Some(""));
        assert!(fx.doc.has_attribute(&input, "value"));
    }

    #[test]
    fn test_value_key_on_plain_element_is_attribute() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,["li",{}]],["set",0,"value","3"]]"#)
            .unwrap();
        assert_eq!(fx.html(), r#"<li value="3"></li>"#);
    }

    #[test]
    fn test_set_on_text_node_fails() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["create",0,"t"]]"#).unwrap();

        let err = fx.apply(r#"[["set",0,"id","x"]]"#).unwrap_err();
        assert!(matches!(err.cause, PatchError::Dom(DomError::NotAnElement)));
    }

    #[test]
    fn test_unresolved_path() {
        let mut fx = Fixture::new();
        let err = fx.apply(r#"[["create",3,0,"x"]]"#).unwrap_err();

        assert!(matches!(
            err.cause,
            PatchError::Mirror(MirrorError::Unresolved { depth: 0, index: 3, .. })
        ));
    }

    #[test]
    fn test_unknown_instruction_keeps_prior_work() {
        let mut fx = Fixture::new();
        let err = fx
            .apply(r#"[["create",0,"a"],["create",1,"b"],["frobnicate",0],["create",2,"c"]]"#)
            .unwrap_err();

        assert_eq!(err.applied, 2);
        assert!(matches!(err.cause, PatchError::Protocol(_)));
        assert_eq!(fx.html(), "ab");
        assert!(fx.mirror.matches(&fx.doc));
    }

    #[test]
    fn test_navigation_instructions() {
        let mut fx = Fixture::new();
        fx.apply(r#"[["push_url","/a"],["push_url","/b"],["replace_url","/c"]]"#)
            .unwrap();

        assert_eq!(fx.navigation.history().entries(), &["/", "/a", "/c"]);
    }

    #[test]
    fn test_doctype_does_not_shift_indices() {
        let mut doc = MemoryDocument::with_doctype();
        let mut mirror = Mirror::snapshot(&doc);
        let mut navigation = NavigationBridge::new(MemoryHistory::default());
        let mut applier = PatchApplier::new(&mut doc, &mut mirror, &mut navigation);

        applier
            .apply_batch(r#"[["create",0,["html",{}]],["create",0,"first"]]"#)
            .unwrap();

        assert_eq!(doc.to_html(doc.root()), "<!doctype html>first<html></html>");
        assert!(mirror.matches(&doc));
    }
}
