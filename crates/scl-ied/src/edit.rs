// crates/scl-ied/src/edit.rs
//! Edit operations emitted towards the host document.

use crate::types::ElementId;
use alloc::string::String;
use alloc::vec::Vec;

/// A single structural edit of the instance tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EditOp {
    /// Inserts a detached `node` below `parent`, before `reference` or at the end.
    Insert {
        parent: ElementId,
        node: ElementId,
        reference: Option<ElementId>,
    },
    /// Replaces the text content of `element`.
    SetText { element: ElementId, text: String },
    /// Detaches `node` and its subtree.
    Remove { node: ElementId },
}

/// The ordered operations of one user action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EditBatch {
    ops: Vec<EditOp>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn push(&mut self, op: EditOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn iter(&self) -> core::slice::Iter<'_, EditOp> {
        self.ops.iter()
    }

    pub fn into_ops(self) -> Vec<EditOp> {
        self.ops
    }
}

impl From<Vec<EditOp>> for EditBatch {
    fn from(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }
}

impl Extend<EditOp> for EditBatch {
    fn extend<T: IntoIterator<Item = EditOp>>(&mut self, iter: T) {
        self.ops.extend(iter);
    }
}

impl<'a> IntoIterator for &'a EditBatch {
    type Item = &'a EditOp;
    type IntoIter = core::slice::Iter<'a, EditOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
