// crates/scl-ied/src/document/index.rs

//! Name-keyed access to the children of one container.

use super::Document;
use crate::constants::ATTR_NAME;
use crate::types::ElementId;
use alloc::collections::BTreeMap;

/// Maps the `name` attribute of a container's children to the child element.
///
/// Built once per container and lookup pass. The first child wins when names
/// repeat.
#[derive(Debug, Default)]
pub struct ChildIndex<'a> {
    by_name: BTreeMap<&'a str, ElementId>,
}

impl<'a> ChildIndex<'a> {
    /// Indexes the direct children of `container` whose tag is in `tags`.
    pub fn build(doc: &'a Document, container: ElementId, tags: &[&str]) -> Self {
        let mut by_name = BTreeMap::new();
        for child in doc.children(container) {
            if !tags.contains(&doc.tag(*child)) {
                continue;
            }
            if let Some(name) = doc.attr(*child, ATTR_NAME) {
                by_name.entry(name).or_insert(*child);
            }
        }
        Self { by_name }
    }

    /// Indexes every named direct child regardless of its tag.
    pub fn build_any(doc: &'a Document, container: ElementId) -> Self {
        let mut by_name = BTreeMap::new();
        for child in doc.children(container) {
            if let Some(name) = doc.attr(*child, ATTR_NAME) {
                by_name.entry(name).or_insert(*child);
            }
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<ElementId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_filters_tags_and_keeps_first() {
        let mut doc = Document::new("LN");
        let root = doc.root();
        let a = doc.create_element("DOI");
        doc.set_attribute(a, "name", "Pos").unwrap();
        let b = doc.create_element("DOI");
        doc.set_attribute(b, "name", "Pos").unwrap();
        let c = doc.create_element("DataSet");
        doc.set_attribute(c, "name", "DS1").unwrap();
        for e in [a, b, c] {
            doc.append_child(root, e).unwrap();
        }

        let index = ChildIndex::build(&doc, root, &["DOI", "SDI", "DAI"]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("Pos"), Some(a));
        assert_eq!(index.get("DS1"), None);

        let any = ChildIndex::build_any(&doc, root);
        assert_eq!(any.get("DS1"), Some(c));
    }
}
