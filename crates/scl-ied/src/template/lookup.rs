// crates/scl-ied/src/template/lookup.rs

//! Point lookups on the template catalog used when rendering and editing one leaf.

use super::TemplateCatalog;
use crate::constants::{
    ATTR_BTYPE, ATTR_DESC, ATTR_FC, ATTR_NAME, ATTR_ORD, ATTR_TYPE, ATTR_VAL_KIND, BTYPE_ENUM,
    CONTAINER_TAGS, MEMBER_TAGS, TAG_BDA, TAG_DA, TAG_ENUM_TYPE, TAG_ENUM_VAL, TAG_VAL,
    VAL_KIND_READ_ONLY,
};
use crate::document::{ChildIndex, Document};
use crate::types::{ElementId, PathStep};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Template facts about the leaf attribute at the end of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafAttribute {
    /// The leaf `DA` or `BDA`.
    pub member: ElementId,
    /// The `DA` carrying the functional constraint (the leaf itself for plain DAs).
    pub data_attribute: ElementId,
    pub fc: String,
    pub b_type: String,
    /// The `EnumType` of an `Enum` attribute.
    pub enum_type: Option<ElementId>,
    pub read_only: bool,
}

impl LeafAttribute {
    pub fn is_enum(&self) -> bool {
        self.b_type == BTYPE_ENUM
    }
}

/// Follows `path` from the `LNodeType` of `ln` and returns the template member
/// of every step. `None` if any step has no same-named member.
pub fn walk_path(
    doc: &Document,
    catalog: &TemplateCatalog,
    ln: ElementId,
    path: &[PathStep],
) -> Option<Vec<ElementId>> {
    let mut declaration = catalog.lnode_type(doc, ln)?;
    let mut members = Vec::with_capacity(path.len());
    for (i, step) in path.iter().enumerate() {
        let member = ChildIndex::build(doc, declaration, &MEMBER_TAGS).get(&step.name)?;
        members.push(member);
        if i + 1 < path.len() {
            declaration = doc
                .attr(member, ATTR_TYPE)
                .and_then(|id| catalog.declaration(id))?;
        }
    }
    Some(members)
}

/// Resolves the leaf `DA`/`BDA` at the end of `path` below `ln`.
pub fn leaf_attribute(
    doc: &Document,
    catalog: &TemplateCatalog,
    ln: ElementId,
    path: &[PathStep],
) -> Option<LeafAttribute> {
    let members = walk_path(doc, catalog, ln, path)?;
    leaf_from_members(doc, catalog, &members)
}

/// Leaf facts from the template members of a path, outermost first.
pub fn leaf_from_members(
    doc: &Document,
    catalog: &TemplateCatalog,
    members: &[ElementId],
) -> Option<LeafAttribute> {
    let member = *members.last()?;
    let tag = doc.tag(member);
    if tag != TAG_DA && tag != TAG_BDA {
        return None;
    }
    let data_attribute = members
        .iter()
        .copied()
        .find(|m| doc.tag(*m) == TAG_DA)
        .unwrap_or(member);

    let b_type = doc.attr(member, ATTR_BTYPE).unwrap_or_default().to_string();
    let enum_type = if b_type == BTYPE_ENUM {
        doc.attr(member, ATTR_TYPE)
            .and_then(|id| catalog.declaration(id))
            .filter(|decl| doc.tag(*decl) == TAG_ENUM_TYPE)
    } else {
        None
    };
    let is_ro = |e: ElementId| doc.attr(e, ATTR_VAL_KIND) == Some(VAL_KIND_READ_ONLY);

    Some(LeafAttribute {
        member,
        data_attribute,
        fc: doc
            .attr(data_attribute, ATTR_FC)
            .unwrap_or_default()
            .to_string(),
        b_type,
        enum_type,
        read_only: is_ro(member) || is_ro(data_attribute),
    })
}

/// Text of the first `Val` of a template member, or `""`.
pub fn template_default(doc: &Document, member: ElementId) -> String {
    doc.first_child(member, TAG_VAL)
        .map(|v| doc.text(v).to_string())
        .unwrap_or_default()
}

/// `(ord, label)` pairs of an `EnumType`, in declaration order.
pub fn enum_options(doc: &Document, enum_type: ElementId) -> Vec<(String, String)> {
    doc.child_elements(enum_type, &[TAG_ENUM_VAL])
        .map(|ev| {
            (
                doc.attr(ev, ATTR_ORD).unwrap_or_default().to_string(),
                doc.text(ev).trim().to_string(),
            )
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub fn ldevice_description(doc: &Document, ldevice: ElementId) -> Option<&str> {
    non_empty(doc.attr(ldevice, ATTR_DESC))
}

/// `desc` of the logical node, else of its `LNodeType`.
pub fn ln_description<'a>(
    doc: &'a Document,
    catalog: &TemplateCatalog,
    ln: ElementId,
) -> Option<&'a str> {
    non_empty(doc.attr(ln, ATTR_DESC)).or_else(|| {
        catalog
            .lnode_type(doc, ln)
            .and_then(|t| non_empty(doc.attr(t, ATTR_DESC)))
    })
}

/// Description of the member at `path` below `ln`.
///
/// The instance container's `desc` wins over the member's, which wins over the
/// `desc` of the declaration the member references.
pub fn member_description<'a>(
    doc: &'a Document,
    catalog: &TemplateCatalog,
    ln: ElementId,
    path: &[PathStep],
    member: ElementId,
) -> Option<&'a str> {
    let mut container = Some(ln);
    for step in path {
        container = container.and_then(|c| ChildIndex::build(doc, c, &CONTAINER_TAGS).get(&step.name));
    }
    container
        .filter(|c| *c != ln)
        .and_then(|c| non_empty(doc.attr(c, ATTR_DESC)))
        .or_else(|| non_empty(doc.attr(member, ATTR_DESC)))
        .or_else(|| {
            doc.attr(member, ATTR_TYPE)
                .and_then(|id| catalog.declaration(id))
                .and_then(|decl| non_empty(doc.attr(decl, ATTR_DESC)))
        })
}

/// Name attribute of a member, or `""`.
pub(crate) fn member_name(doc: &Document, member: ElementId) -> &str {
    doc.attr(member, ATTR_NAME).unwrap_or_default()
}
