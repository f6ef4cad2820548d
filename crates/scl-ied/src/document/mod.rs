// crates/scl-ied/src/document/mod.rs

//! An arena of named, attributed elements mirroring an SCL document.
//!
//! Elements are addressed by [`ElementId`] handles. Detached elements (created
//! for a pending insert, or removed by an edit) stay in the arena so handles held
//! by edit batches never dangle.

mod index;

pub use index::ChildIndex;

use crate::edit::{EditBatch, EditOp};
use crate::hal::{EditSink, SclError};
use crate::types::ElementId;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use log::{debug, trace, warn};

/// One element of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// The element arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    elements: Vec<Element>,
    root: ElementId,
}

impl Document {
    /// Creates a document holding only a root element.
    pub fn new(root_tag: &str) -> Self {
        Self {
            elements: vec![Element::new(root_tag)],
            root: ElementId(0),
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Number of elements in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        id.0 < self.elements.len()
    }

    fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    fn get_mut(&mut self, id: ElementId) -> Result<&mut Element, SclError> {
        self.elements
            .get_mut(id.0)
            .ok_or(SclError::ElementNotFound(id))
    }

    // --- Read access ---

    /// Tag name of the element, or `""` for an unknown handle.
    pub fn tag(&self, id: ElementId) -> &str {
        self.get(id).map_or("", |e| e.tag.as_str())
    }

    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.get(id).and_then(|e| {
            e.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        })
    }

    /// All attributes in document order.
    pub fn attributes(&self, id: ElementId) -> &[(String, String)] {
        self.get(id).map_or(&[], |e| e.attributes.as_slice())
    }

    pub fn text(&self, id: ElementId) -> &str {
        self.get(id).map_or("", |e| e.text.as_str())
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map_or(&[], |e| e.children.as_slice())
    }

    /// Direct children whose tag is one of `tags`.
    pub fn child_elements<'a>(
        &'a self,
        id: ElementId,
        tags: &'a [&'a str],
    ) -> impl Iterator<Item = ElementId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| tags.contains(&self.tag(*c)))
    }

    /// First direct child with the given tag.
    pub fn first_child(&self, id: ElementId, tag: &str) -> Option<ElementId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.tag(*c) == tag)
    }

    /// First direct child with the given tag and `name` attribute.
    pub fn child_named(&self, id: ElementId, tag: &str, name: &str) -> Option<ElementId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.tag(*c) == tag && self.attr(*c, "name") == Some(name))
    }

    /// All descendants in document (pre-)order, excluding `id` itself.
    pub fn descendants(&self, id: ElementId) -> Descendants<'_> {
        let mut stack: Vec<ElementId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Nearest ancestor-or-self with the given tag.
    pub fn closest(&self, id: ElementId, tag: &str) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.tag(c) == tag {
                return Some(c);
            }
            current = self.parent(c);
        }
        None
    }

    /// Returns `true` if the element is reachable from the root.
    pub fn is_attached(&self, id: ElementId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut current = id;
        while let Some(p) = self.parent(current) {
            current = p;
        }
        current == self.root
    }

    fn is_ancestor_or_self(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    // --- Construction ---

    /// Allocates a new detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.elements.push(Element::new(tag));
        ElementId(self.elements.len() - 1)
    }

    pub fn set_attribute(
        &mut self,
        id: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), SclError> {
        let element = self.get_mut(id)?;
        match element.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => element
                .attributes
                .push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn set_text(&mut self, id: ElementId, text: &str) -> Result<(), SclError> {
        self.get_mut(id)?.text = text.to_string();
        Ok(())
    }

    /// Appends `text` to the current text content (used by loaders for split text events).
    pub fn push_text(&mut self, id: ElementId, text: &str) -> Result<(), SclError> {
        self.get_mut(id)?.text.push_str(text);
        Ok(())
    }

    /// Links a detached child at the end of `parent`'s children.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), SclError> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &mut self,
        parent: ElementId,
        node: ElementId,
        reference: Option<ElementId>,
    ) -> Result<(), SclError> {
        if !self.contains(parent) {
            return Err(SclError::ElementNotFound(parent));
        }
        if !self.contains(node) {
            return Err(SclError::ElementNotFound(node));
        }
        if node == self.root || self.parent(node).is_some() || self.is_ancestor_or_self(node, parent)
        {
            return Err(SclError::AlreadyAttached(node));
        }
        let position = match reference {
            Some(r) => self
                .children(parent)
                .iter()
                .position(|c| *c == r)
                .ok_or(SclError::NotAChild {
                    parent,
                    reference: r,
                })?,
            None => self.children(parent).len(),
        };
        self.get_mut(parent)?.children.insert(position, node);
        self.get_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn detach(&mut self, node: ElementId) -> Result<(), SclError> {
        if node == self.root {
            return Err(SclError::RootRemoval);
        }
        let parent = self.parent(node).ok_or(SclError::Detached(node))?;
        self.get_mut(parent)?.children.retain(|c| *c != node);
        self.get_mut(node)?.parent = None;
        Ok(())
    }

    // --- Edit application ---

    fn apply_op(&mut self, op: &EditOp) -> Result<(), SclError> {
        match op {
            EditOp::Insert {
                parent,
                node,
                reference,
            } => self.insert_before(*parent, *node, *reference),
            EditOp::SetText { element, text } => self.set_text(*element, text),
            EditOp::Remove { node } => self.detach(*node),
        }
    }

    /// Applies a batch in order, all or nothing.
    ///
    /// On the first failing operation the document is restored to the state it
    /// had before the batch and the error is returned.
    pub fn apply(&mut self, batch: &EditBatch) -> Result<(), SclError> {
        let snapshot = self.elements.clone();
        for (i, op) in batch.iter().enumerate() {
            trace!("[DOC] Applying op {}: {:?}", i, op);
            if let Err(e) = self.apply_op(op) {
                warn!("[DOC] Edit batch rejected at op {}: {}", i, e);
                self.elements = snapshot;
                return Err(e);
            }
        }
        debug!("[DOC] Applied edit batch of {} ops", batch.len());
        Ok(())
    }
}

impl EditSink for Document {
    fn submit(&mut self, batch: &EditBatch) -> Result<(), SclError> {
        self.apply(batch)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<ElementId>,
}

impl Iterator for Descendants<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(next).iter().rev().copied());
        Some(next)
    }
}
