// crates/scl-ied/src/editor/view.rs

//! Render-ready snapshot of the selected IED.
//!
//! The view is rebuilt from the document on every request. It carries element
//! handles so the host can route user actions back to the editor.

use super::LnState;
use crate::constants::{
    ATTR_BTYPE, ATTR_INST, ATTR_LN_CLASS, ATTR_NAME, ATTR_TYPE, TAG_BDA, TAG_DA, TAG_LDEVICE,
};
use crate::document::Document;
use crate::instance::InstanceMap;
use crate::instantiate::step_for_member;
use crate::search::{RenderFilter, member_path};
use crate::setting_group::{SettingGroups, classify};
use crate::template::{
    DataModel, LeafAttribute, TemplateCatalog, enum_options, leaf_from_members, member_description,
    template_default,
};
use crate::types::{ElementId, PathStep};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EditorView {
    /// Name of the selected IED; empty when nothing is selected.
    pub ied: String,
    pub search_term: String,
    pub servers: Vec<ServerView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServerView {
    /// Name of the enclosing `AccessPoint`.
    pub access_point: String,
    pub ldevices: Vec<LDeviceView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LDeviceView {
    pub element: ElementId,
    pub inst: String,
    pub identity: String,
    pub description: Option<String>,
    pub setting_groups: SettingGroups,
    pub lns: Vec<LnView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LnView {
    pub element: ElementId,
    /// `LN` or `LN0`.
    pub tag: String,
    /// First component of every search path below this node.
    pub key: String,
    /// `{prefix}{lnClass}{inst}`.
    pub label: String,
    pub ln_type: String,
    pub description: Option<String>,
    pub state: LnState,
    /// Empty while collapsed.
    pub members: Vec<MemberRow>,
}

/// One template member below an open logical node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MemberRow {
    pub member: ElementId,
    pub name: String,
    /// `DO`, `SDO`, `DA` or `BDA`.
    pub tag: String,
    /// `type`, or `bType` for primitive attributes.
    pub type_label: String,
    pub description: Option<String>,
    /// Instantiation path from the logical node to this member.
    pub path: Vec<PathStep>,
    /// A same-named instance container exists.
    pub instantiated: bool,
    /// A leaf without any stored value.
    pub uninitialized: bool,
    pub leaf: Option<LeafView>,
    pub children: Vec<MemberRow>,
}

/// The value part of a leaf attribute row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LeafView {
    /// Input for the value that currently counts.
    pub input: ValueInputSpec,
    /// One row per setting group; empty without groups.
    pub groups: Vec<GroupRow>,
    pub fc: String,
    pub can_add: bool,
    pub can_edit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GroupRow {
    pub ordinal: u32,
    pub active: bool,
    /// Differs from the active group's value; a candidate for sync.
    pub stale: bool,
    pub value: Option<ElementId>,
    /// `None` marks a missing group value, shown as an error row with a fix.
    pub input: Option<ValueInputSpec>,
}

/// What the value-input widget needs to render one value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValueInputSpec {
    /// `{ldInst}-{lnClass}{lnInst}-{name}-…`, unique within the IED view.
    pub element_id: String,
    pub b_type: String,
    pub value: String,
    pub enum_ordinals: Vec<String>,
    pub enum_labels: Vec<String>,
    pub label: String,
    pub read_only: bool,
}

/// Id of the value input of the leaf at `path` below `ln`.
pub fn value_input_id(doc: &Document, ln: ElementId, path: &[PathStep]) -> String {
    let ld_inst = doc
        .closest(ln, TAG_LDEVICE)
        .and_then(|ld| doc.attr(ld, ATTR_INST))
        .unwrap_or_default();
    let mut id = format!(
        "{}-{}{}",
        ld_inst,
        doc.attr(ln, ATTR_LN_CLASS).unwrap_or_default(),
        doc.attr(ln, ATTR_INST).unwrap_or_default()
    );
    for step in path {
        id.push('-');
        id.push_str(&step.name);
    }
    id
}

fn type_label(doc: &Document, member: ElementId) -> String {
    let tag = doc.tag(member);
    let label = if tag == TAG_DA || tag == TAG_BDA {
        doc.attr(member, ATTR_TYPE)
            .or_else(|| doc.attr(member, ATTR_BTYPE))
    } else {
        doc.attr(member, ATTR_TYPE)
    };
    label.unwrap_or_default().to_string()
}

/// Everything the row builder needs about the logical node being rendered.
pub(crate) struct LnScope<'a> {
    pub doc: &'a Document,
    pub catalog: &'a TemplateCatalog,
    pub filter: &'a RenderFilter,
    pub ln: ElementId,
    pub key: &'a str,
    pub groups: SettingGroups,
}

impl LnScope<'_> {
    /// Rows for the members of `model`, honouring the search filter.
    pub fn member_rows(
        &self,
        model: &DataModel,
        matched: Option<&InstanceMap>,
        path: &mut Vec<PathStep>,
        members: &mut Vec<ElementId>,
    ) -> Vec<MemberRow> {
        let mut rows = Vec::with_capacity(model.len());
        for entry in model {
            path.push(step_for_member(self.doc, entry.member, entry.declaration));
            members.push(entry.member);

            let names: Vec<&str> = path.iter().map(|s| s.name.as_str()).collect();
            if self.filter.shows_member(&member_path(self.key, &names)) {
                let instance = matched.and_then(|m| m.get(entry.member));
                let values = instance.map_or(&[][..], |i| i.values.values());
                let uninitialized = entry.is_leaf() && values.is_empty();

                let children = if entry.is_leaf() {
                    Vec::new()
                } else {
                    self.member_rows(
                        &entry.children,
                        instance.and_then(|i| i.values.nested()),
                        path,
                        members,
                    )
                };
                let leaf = if entry.is_leaf() {
                    leaf_from_members(self.doc, self.catalog, members)
                        .map(|leaf| self.leaf_view(&leaf, path, values))
                } else {
                    None
                };

                rows.push(MemberRow {
                    member: entry.member,
                    name: self.doc.attr(entry.member, ATTR_NAME).unwrap_or_default().to_string(),
                    tag: self.doc.tag(entry.member).to_string(),
                    type_label: type_label(self.doc, entry.member),
                    description: member_description(self.doc, self.catalog, self.ln, path, entry.member)
                        .map(String::from),
                    path: path.clone(),
                    instantiated: instance.is_some(),
                    uninitialized,
                    leaf,
                    children,
                });
            }

            members.pop();
            path.pop();
        }
        rows
    }

    fn leaf_view(&self, leaf: &LeafAttribute, path: &[PathStep], values: &[ElementId]) -> LeafView {
        let doc = self.doc;
        let (enum_ordinals, enum_labels): (Vec<String>, Vec<String>) = leaf
            .enum_type
            .map(|e| enum_options(doc, e).into_iter().unzip())
            .unwrap_or_default();
        let layout = classify(doc, values, self.groups, &leaf.fc);
        let element_id = value_input_id(doc, self.ln, path);
        let label = path.last().map(|s| s.name.clone()).unwrap_or_default();

        let spec = |element_id: String, value: String| ValueInputSpec {
            element_id,
            b_type: leaf.b_type.clone(),
            value,
            enum_ordinals: enum_ordinals.clone(),
            enum_labels: enum_labels.clone(),
            label: label.clone(),
            read_only: leaf.read_only,
        };

        let current = layout
            .current()
            .map(|v| doc.text(v).to_string())
            .unwrap_or_else(|| template_default(doc, leaf.member));
        let groups = layout
            .slots()
            .iter()
            .map(|slot| GroupRow {
                ordinal: slot.ordinal,
                active: slot.active,
                stale: slot.stale,
                value: slot.value,
                input: slot.value.map(|v| {
                    spec(
                        format!("{}-{}", element_id, slot.ordinal),
                        doc.text(v).to_string(),
                    )
                }),
            })
            .collect();

        LeafView {
            input: spec(element_id, current),
            groups,
            fc: leaf.fc.clone(),
            can_add: values.is_empty() && !leaf.read_only,
            can_edit: !values.is_empty() && !leaf.read_only,
        }
    }
}
