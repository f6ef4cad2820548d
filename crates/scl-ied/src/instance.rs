// crates/scl-ied/src/instance.rs

//! Matches the instance tree of a logical node against a resolved data model.

use crate::constants::{CONTAINER_TAGS, TAG_VAL};
use crate::document::{ChildIndex, Document};
use crate::template::{DataModel, member_name};
use crate::types::ElementId;
use alloc::vec::Vec;

/// What was found below one instance container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Values {
    /// The container holds `Val` elements directly.
    Leaf(Vec<ElementId>),
    /// Matched child containers, keyed by template member.
    Nested(InstanceMap),
}

impl Values {
    /// Stored `Val` elements; empty for nested containers.
    pub fn values(&self) -> &[ElementId] {
        match self {
            Values::Leaf(values) => values,
            Values::Nested(_) => &[],
        }
    }

    pub fn nested(&self) -> Option<&InstanceMap> {
        match self {
            Values::Nested(map) => Some(map),
            Values::Leaf(_) => None,
        }
    }

    /// `true` if nothing below this container was instantiated.
    pub fn is_empty(&self) -> bool {
        match self {
            Values::Leaf(values) => values.is_empty(),
            Values::Nested(map) => map.is_empty(),
        }
    }
}

/// A template member paired with its instance container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceEntry {
    pub member: ElementId,
    pub instance: ElementId,
    pub values: Values,
}

/// Sparse mapping from template member to instance. Members without a
/// same-named container have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceMap {
    entries: Vec<InstanceEntry>,
}

impl InstanceMap {
    pub fn get(&self, member: ElementId) -> Option<&InstanceEntry> {
        self.entries.iter().find(|e| e.member == member)
    }

    pub fn contains(&self, member: ElementId) -> bool {
        self.get(member).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, InstanceEntry> {
        self.entries.iter()
    }
}

/// Walks the instance tree below `instance_root` in parallel with `model`.
pub fn match_instances(doc: &Document, instance_root: ElementId, model: &DataModel) -> Values {
    let values: Vec<ElementId> = doc.child_elements(instance_root, &[TAG_VAL]).collect();
    if !values.is_empty() {
        return Values::Leaf(values);
    }

    let index = ChildIndex::build(doc, instance_root, &CONTAINER_TAGS);
    let mut map = InstanceMap::default();
    if index.is_empty() {
        return Values::Nested(map);
    }
    for entry in model {
        let Some(instance) = index.get(member_name(doc, entry.member)) else {
            continue;
        };
        map.entries.push(InstanceEntry {
            member: entry.member,
            instance,
            values: match_instances(doc, instance, &entry.children),
        });
    }
    Values::Nested(map)
}
