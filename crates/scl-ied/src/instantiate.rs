// crates/scl-ied/src/instantiate.rs

//! Builds the structural edits that bring an instance path into existence, and
//! finds what to remove when a value goes away.

use crate::constants::{ATTR_NAME, CONTAINER_TAGS, TAG_DA_TYPE, TAG_DO, TAG_SDO};
use crate::document::{ChildIndex, Document};
use crate::edit::{EditBatch, EditOp};
use crate::hal::SclError;
use crate::log::my_trace;
use crate::types::{ContainerTag, ElementId, PathStep};

/// Result of [`instantiate_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instantiation {
    /// The deepest container of the path, existing or newly created.
    pub parent: ElementId,
    /// Inserts of the missing containers, outermost first.
    pub edits: EditBatch,
}

/// Container tag used to instantiate a template member.
///
/// `DA`/`BDA` members referencing a `DAType` are structured and become `SDI`;
/// plain attributes become `DAI`.
pub fn step_for_member(
    doc: &Document,
    member: ElementId,
    declaration: Option<ElementId>,
) -> PathStep {
    let tag = match doc.tag(member) {
        TAG_DO => ContainerTag::Doi,
        TAG_SDO => ContainerTag::Sdi,
        _ if declaration.is_some_and(|d| doc.tag(d) == TAG_DA_TYPE) => ContainerTag::Sdi,
        _ => ContainerTag::Dai,
    };
    PathStep::new(doc.attr(member, ATTR_NAME).unwrap_or_default(), tag)
}

/// The container at the end of `path` below `root`, if every step exists.
pub fn find_instance(doc: &Document, root: ElementId, path: &[PathStep]) -> Option<ElementId> {
    path.iter().try_fold(root, |container, step| {
        ChildIndex::build(doc, container, &CONTAINER_TAGS).get(&step.name)
    })
}

/// Walks `path` below `root`, creating detached containers for the missing steps.
///
/// The document is only touched to allocate the new elements; linking them in
/// is left to the returned insert operations.
pub fn instantiate_path(
    doc: &mut Document,
    path: &[PathStep],
    root: ElementId,
) -> Result<Instantiation, SclError> {
    if path.is_empty() {
        return Err(SclError::EmptyPath);
    }

    let mut edits = EditBatch::new();
    let mut current = root;
    let mut created = false;
    for step in path {
        let existing = if created {
            None
        } else {
            ChildIndex::build(doc, current, &CONTAINER_TAGS).get(&step.name)
        };
        current = match existing {
            Some(child) => child,
            None => {
                let node = doc.create_element(step.tag.as_str());
                doc.set_attribute(node, ATTR_NAME, &step.name)?;
                my_trace!("[INST] New {} '{}' below {}", step.tag, step.name, current);
                edits.push(EditOp::Insert {
                    parent: current,
                    node,
                    reference: None,
                });
                created = true;
                node
            }
        };
    }

    Ok(Instantiation {
        parent: current,
        edits,
    })
}

/// The outermost element to remove so that deleting `leaf` leaves no empty
/// containers behind.
///
/// Climbs while the parent is a `DOI`/`SDI`/`DAI` whose only child is the
/// current element. Children of every tag count, so a `DAI` next to an `SDI`
/// keeps its `DOI`.
pub fn find_instance_to_remove(doc: &Document, leaf: ElementId) -> ElementId {
    let mut node = leaf;
    while let Some(parent) = doc.parent(node) {
        if !ContainerTag::is_container(doc.tag(parent)) || doc.children(parent).len() != 1 {
            break;
        }
        node = parent;
    }
    node
}
