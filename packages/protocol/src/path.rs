//! Structural addresses
//!
//! A path is a sequence of child indices applied from the root:
//! `[2, 0]` selects `root.children[2].children[0]`. Paths carry no identity,
//! so they are only meaningful against a specific, fully applied tree state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    /// The empty path, addressing the root itself
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Path of the `index`-th child of the node at this path
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn push(&mut self, index: usize) {
        self.0.push(index);
    }

}

impl Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}
