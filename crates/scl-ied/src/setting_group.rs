// crates/scl-ied/src/setting_group.rs

//! Setting groups: per-group values of `SG`/`SE` attributes.
//!
//! A logical device declares its group count and active group in
//! `LN0/SettingControl`, or borrows them from another device of the same IED
//! through `LN0/DOI[GrRef]/DAI[setSrcRef]`. Leaf values of setting attributes are
//! `Val` elements tagged with an `sGroup` ordinal.

use crate::constants::{
    ATTR_ACT_SG, ATTR_INST, ATTR_LD_NAME, ATTR_NAME, ATTR_NUM_OF_SGS, ATTR_SGROUP,
    FC_SETTING_GROUP, FC_SETTING_GROUP_EDITABLE, GR_REF_DOI, SET_SRC_REF_DAI, TAG_DAI, TAG_DOI,
    TAG_IED, TAG_LDEVICE, TAG_LN0, TAG_SETTING_CONTROL, TAG_VAL,
};
use crate::document::Document;
use crate::edit::{EditBatch, EditOp};
use crate::hal::SclError;
use crate::instantiate::find_instance_to_remove;
use crate::log::{my_debug, my_warn};
use crate::types::{ElementId, parse_u32_or_zero};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Group count and active group of a logical device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SettingGroups {
    /// `numOfSGs`; 0 means the device has no setting groups.
    pub num_of_sgs: u32,
    /// `actSG`; 0 when absent.
    pub act_sg: u32,
}

impl SettingGroups {
    pub fn is_enabled(&self) -> bool {
        self.num_of_sgs > 0
    }

    /// The active ordinal, if it lies within `1..=num_of_sgs`.
    pub fn active(&self) -> Option<u32> {
        (1..=self.num_of_sgs)
            .contains(&self.act_sg)
            .then_some(self.act_sg)
    }
}

/// Text of `LN0/DOI[GrRef]/DAI[setSrcRef]/Val`, if any.
fn setting_source(doc: &Document, ln0: ElementId) -> Option<&str> {
    let gr_ref = doc.child_named(ln0, TAG_DOI, GR_REF_DOI)?;
    let src_ref = doc.child_named(gr_ref, TAG_DAI, SET_SRC_REF_DAI)?;
    let val = doc.first_child(src_ref, TAG_VAL)?;
    // References may carry a node suffix (`LD/LLN0`); only the device part counts.
    let reference = doc.text(val).trim();
    let device = reference.split('/').next().unwrap_or(reference);
    (!device.is_empty()).then_some(device)
}

/// Finds the `LDevice` of the same IED that `reference` names.
///
/// Matches `ldName`, then `<iedName><inst>`, then the bare `inst`.
fn find_ldevice(doc: &Document, from: ElementId, reference: &str) -> Option<ElementId> {
    let ied = doc.closest(from, TAG_IED)?;
    let ied_name = doc.attr(ied, ATTR_NAME).unwrap_or_default();
    let devices: Vec<ElementId> = doc
        .descendants(ied)
        .filter(|e| doc.tag(*e) == TAG_LDEVICE)
        .collect();

    let by_ld_name = devices
        .iter()
        .copied()
        .find(|ld| doc.attr(*ld, ATTR_LD_NAME) == Some(reference));
    by_ld_name.or_else(|| {
        devices.iter().copied().find(|ld| {
            let inst = doc.attr(*ld, ATTR_INST).unwrap_or_default();
            reference
                .strip_prefix(ied_name)
                .is_some_and(|rest| rest == inst)
                || reference == inst
        })
    })
}

/// Resolves the setting groups governing `ldevice`.
///
/// Follows `GrRef` redirections until a device with a `SettingControl` is found.
/// A device without either, an unresolvable reference or a cycle yields the
/// default (no groups).
pub fn resolve_setting_groups(doc: &Document, ldevice: ElementId) -> SettingGroups {
    let mut visited: Vec<ElementId> = Vec::new();
    let mut current = ldevice;
    loop {
        if visited.contains(&current) {
            my_warn!("[SG] GrRef cycle through {}, assuming no setting groups", current);
            return SettingGroups::default();
        }
        visited.push(current);

        let Some(ln0) = doc.first_child(current, TAG_LN0) else {
            return SettingGroups::default();
        };
        if let Some(control) = doc.first_child(ln0, TAG_SETTING_CONTROL) {
            let groups = SettingGroups {
                num_of_sgs: parse_u32_or_zero(doc.attr(control, ATTR_NUM_OF_SGS)),
                act_sg: parse_u32_or_zero(doc.attr(control, ATTR_ACT_SG)),
            };
            my_debug!("[SG] {} resolved to {:?}", ldevice, groups);
            return groups;
        }
        match setting_source(doc, ln0).and_then(|r| find_ldevice(doc, current, r)) {
            Some(next) => current = next,
            None => return SettingGroups::default(),
        }
    }
}

/// `true` for the functional constraints whose values are kept per group.
pub fn is_setting_fc(fc: &str) -> bool {
    fc == FC_SETTING_GROUP || fc == FC_SETTING_GROUP_EDITABLE
}

fn ordinal_of(doc: &Document, value: ElementId) -> u32 {
    parse_u32_or_zero(doc.attr(value, ATTR_SGROUP))
}

/// The value stored for group `ordinal`.
///
/// An explicit `sGroup` match wins. Otherwise a lone value without an ordinal
/// stands for group 1.
pub fn value_for_group(doc: &Document, values: &[ElementId], ordinal: u32) -> Option<ElementId> {
    values
        .iter()
        .copied()
        .find(|v| ordinal_of(doc, *v) == ordinal)
        .or_else(|| match values {
            [only] if ordinal == 1 && ordinal_of(doc, *only) == 0 => Some(*only),
            _ => None,
        })
}

/// One setting group's slot for a leaf attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GroupSlot {
    pub ordinal: u32,
    /// `None` when the group has no value, a visible inconsistency.
    pub value: Option<ElementId>,
    pub active: bool,
    /// The value's content differs from the active group's.
    pub stale: bool,
}

/// How the values of one leaf attribute are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ValueLayout {
    /// No setting groups: at most one value counts.
    Single(Option<ElementId>),
    /// One slot per group ordinal, in ascending order.
    Grouped(Vec<GroupSlot>),
}

impl ValueLayout {
    pub fn is_grouped(&self) -> bool {
        matches!(self, ValueLayout::Grouped(_))
    }

    pub fn slots(&self) -> &[GroupSlot] {
        match self {
            ValueLayout::Grouped(slots) => slots,
            ValueLayout::Single(_) => &[],
        }
    }

    pub fn slot(&self, ordinal: u32) -> Option<&GroupSlot> {
        self.slots().iter().find(|s| s.ordinal == ordinal)
    }

    /// The value that currently counts: the single value, or the active group's.
    pub fn current(&self) -> Option<ElementId> {
        match self {
            ValueLayout::Single(value) => *value,
            ValueLayout::Grouped(slots) => slots.iter().find(|s| s.active).and_then(|s| s.value),
        }
    }

    /// Ordinals without a value.
    pub fn missing(&self) -> Vec<u32> {
        self.slots()
            .iter()
            .filter(|s| s.value.is_none())
            .map(|s| s.ordinal)
            .collect()
    }

    /// Ordinals whose value no longer matches the active group's.
    pub fn stale(&self) -> Vec<u32> {
        self.slots()
            .iter()
            .filter(|s| s.stale)
            .map(|s| s.ordinal)
            .collect()
    }
}

/// Lays out the stored `values` of a leaf with functional constraint `fc`.
pub fn classify(
    doc: &Document,
    values: &[ElementId],
    groups: SettingGroups,
    fc: &str,
) -> ValueLayout {
    if !groups.is_enabled() || !is_setting_fc(fc) {
        return ValueLayout::Single(values.first().copied());
    }
    let mut slots: Vec<GroupSlot> = (1..=groups.num_of_sgs)
        .map(|ordinal| GroupSlot {
            ordinal,
            value: value_for_group(doc, values, ordinal),
            active: ordinal == groups.act_sg,
            stale: false,
        })
        .collect();
    let active_text = slots
        .iter()
        .find(|s| s.active)
        .and_then(|s| s.value)
        .map(|v| doc.text(v));
    if let Some(active_text) = active_text {
        for slot in slots.iter_mut().filter(|s| !s.active) {
            slot.stale = slot.value.is_some_and(|v| doc.text(v) != active_text);
        }
    }
    ValueLayout::Grouped(slots)
}

/// Allocates a detached `Val` for group `ordinal` holding `text`.
pub(crate) fn new_group_value(
    doc: &mut Document,
    ordinal: u32,
    text: &str,
) -> Result<ElementId, SclError> {
    let val = doc.create_element(TAG_VAL);
    doc.set_attribute(val, ATTR_SGROUP, &ordinal.to_string())?;
    doc.set_text(val, text)?;
    Ok(val)
}

/// Content used to fill a missing group: the active value's, else `default`.
fn fill_text(doc: &Document, layout: &ValueLayout, default: &str) -> String {
    layout
        .current()
        .map(|v| doc.text(v).to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Inserts a value holding `text` for every slot without one, each before the
/// value of the next present higher group.
///
/// Returns the batch and the new values with their ordinals.
pub(crate) fn insert_missing(
    doc: &mut Document,
    dai: ElementId,
    slots: &[GroupSlot],
    text: &str,
) -> Result<(EditBatch, Vec<(u32, ElementId)>), SclError> {
    let mut batch = EditBatch::new();
    let mut created = Vec::new();
    for (i, slot) in slots.iter().enumerate() {
        if slot.value.is_some() {
            continue;
        }
        let val = new_group_value(doc, slot.ordinal, text)?;
        let reference = slots[i + 1..].iter().find_map(|s| s.value);
        batch.push(EditOp::Insert {
            parent: dai,
            node: val,
            reference,
        });
        created.push((slot.ordinal, val));
    }
    Ok((batch, created))
}

fn backfill(
    doc: &mut Document,
    dai: ElementId,
    layout: &ValueLayout,
    default: &str,
) -> Result<(EditBatch, Vec<(u32, ElementId)>), SclError> {
    let ValueLayout::Grouped(slots) = layout else {
        return Err(SclError::NotGrouped);
    };
    let text = fill_text(doc, layout, default);
    insert_missing(doc, dai, slots, &text)
}

/// Creates the values of every group that has none.
pub fn add_missing_groups(
    doc: &mut Document,
    dai: ElementId,
    layout: &ValueLayout,
    default: &str,
) -> Result<EditBatch, SclError> {
    let (batch, created) = backfill(doc, dai, layout, default)?;
    my_debug!("[SG] Adding {} missing group values below {}", created.len(), dai);
    Ok(batch)
}

/// Copies the active group's content into group `target`.
pub fn sync_group(
    doc: &Document,
    layout: &ValueLayout,
    target: u32,
) -> Result<EditBatch, SclError> {
    if !layout.is_grouped() {
        return Err(SclError::NotGrouped);
    }
    let source = layout.current().ok_or(SclError::NoActiveGroup)?;
    let slot = layout
        .slot(target)
        .ok_or(SclError::MissingGroupValue(target))?;
    let element = slot.value.ok_or(SclError::MissingGroupValue(target))?;

    let mut batch = EditBatch::new();
    if element != source {
        batch.push(EditOp::SetText {
            element,
            text: doc.text(source).to_string(),
        });
    }
    Ok(batch)
}

/// Removes every value of the attribute along with the containers left empty.
///
/// Missing groups are backfilled first so the batch records the content each
/// group had before the removal. The removal then takes the whole `DAI`, so
/// values outside the slots go as well.
pub fn delete_groups(
    doc: &mut Document,
    dai: ElementId,
    layout: &ValueLayout,
    default: &str,
) -> Result<EditBatch, SclError> {
    let (mut batch, created) = backfill(doc, dai, layout, default)?;
    let node = find_instance_to_remove(doc, dai);
    batch.push(EditOp::Remove { node });
    my_debug!(
        "[SG] Backfilled {} group values, removing {} with {}",
        created.len(),
        node,
        dai
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::tests::add;
    use alloc::vec;

    fn device_with_control(doc: &mut Document, ied: ElementId, inst: &str, control: &[(&str, &str)]) -> ElementId {
        let ld = add(doc, ied, "LDevice", &[("inst", inst)]);
        let ln0 = add(doc, ld, "LN0", &[("lnClass", "LLN0")]);
        add(doc, ln0, "SettingControl", control);
        ld
    }

    fn device_with_gr_ref(doc: &mut Document, ied: ElementId, inst: &str, target: &str) -> ElementId {
        let ld = add(doc, ied, "LDevice", &[("inst", inst)]);
        let ln0 = add(doc, ld, "LN0", &[("lnClass", "LLN0")]);
        let gr = add(doc, ln0, "DOI", &[("name", "GrRef")]);
        let src = add(doc, gr, "DAI", &[("name", "setSrcRef")]);
        let val = add(doc, src, "Val", &[]);
        doc.set_text(val, target).unwrap();
        ld
    }

    fn ied() -> (Document, ElementId) {
        let mut doc = Document::new("SCL");
        let root = doc.root();
        let ied = add(&mut doc, root, "IED", &[("name", "IED1")]);
        (doc, ied)
    }

    fn dai_with(doc: &mut Document, groups: &[Option<&str>], texts: &[&str]) -> (ElementId, Vec<ElementId>) {
        let root = doc.root();
        let dai = add(doc, root, "DAI", &[("name", "setVal")]);
        let values = groups
            .iter()
            .zip(texts)
            .map(|(g, t)| {
                let v = match g {
                    Some(g) => add(doc, dai, "Val", &[("sGroup", *g)]),
                    None => add(doc, dai, "Val", &[]),
                };
                doc.set_text(v, t).unwrap();
                v
            })
            .collect();
        (dai, values)
    }

    #[test]
    fn test_setting_control_direct() {
        let (mut doc, ied) = ied();
        let ld = device_with_control(&mut doc, ied, "PROT", &[("numOfSGs", "4"), ("actSG", "2")]);
        let groups = resolve_setting_groups(&doc, ld);
        assert_eq!(groups, SettingGroups { num_of_sgs: 4, act_sg: 2 });
        assert_eq!(groups.active(), Some(2));
    }

    #[test]
    fn test_setting_control_defaults_on_malformed() {
        let (mut doc, ied) = ied();
        let ld = device_with_control(&mut doc, ied, "PROT", &[("numOfSGs", "x")]);
        let groups = resolve_setting_groups(&doc, ld);
        assert_eq!(groups, SettingGroups::default());
        assert!(!groups.is_enabled());
        assert_eq!(groups.active(), None);
    }

    #[test]
    fn test_gr_ref_chain_is_followed() {
        let (mut doc, ied) = ied();
        device_with_control(&mut doc, ied, "PROT", &[("numOfSGs", "3"), ("actSG", "1")]);
        let middle = device_with_gr_ref(&mut doc, ied, "CTRL", "IED1PROT");
        let head = device_with_gr_ref(&mut doc, ied, "MEAS", "CTRL/LLN0");
        assert_eq!(resolve_setting_groups(&doc, middle).num_of_sgs, 3);
        assert_eq!(resolve_setting_groups(&doc, head).act_sg, 1);
    }

    #[test]
    fn test_gr_ref_cycle_and_dead_end_mean_no_groups() {
        let (mut doc, ied) = ied();
        let a = device_with_gr_ref(&mut doc, ied, "A", "B");
        device_with_gr_ref(&mut doc, ied, "B", "A");
        let dangling = device_with_gr_ref(&mut doc, ied, "C", "Nowhere");
        let bare = add(&mut doc, ied, "LDevice", &[("inst", "D")]);
        assert_eq!(resolve_setting_groups(&doc, a), SettingGroups::default());
        assert_eq!(resolve_setting_groups(&doc, dangling), SettingGroups::default());
        assert_eq!(resolve_setting_groups(&doc, bare), SettingGroups::default());
    }

    #[test]
    fn test_classify_single_for_non_setting_fc() {
        let mut doc = Document::new("SCL");
        let (_, values) = dai_with(&mut doc, &[Some("1"), Some("2")], &["a", "b"]);
        let groups = SettingGroups { num_of_sgs: 2, act_sg: 1 };
        assert_eq!(classify(&doc, &values, groups, "CF"), ValueLayout::Single(Some(values[0])));
        assert_eq!(
            classify(&doc, &values, SettingGroups::default(), "SG"),
            ValueLayout::Single(Some(values[0]))
        );
    }

    #[test]
    fn test_classify_reports_missing_and_active() {
        let mut doc = Document::new("SCL");
        let (_, values) = dai_with(&mut doc, &[Some("3"), Some("1")], &["c", "a"]);
        let groups = SettingGroups { num_of_sgs: 3, act_sg: 3 };
        let layout = classify(&doc, &values, groups, "SE");
        assert_eq!(
            layout,
            ValueLayout::Grouped(vec![
                GroupSlot { ordinal: 1, value: Some(values[1]), active: false, stale: true },
                GroupSlot { ordinal: 2, value: None, active: false, stale: false },
                GroupSlot { ordinal: 3, value: Some(values[0]), active: true, stale: false },
            ])
        );
        assert_eq!(layout.missing(), vec![2]);
        assert_eq!(layout.stale(), vec![1]);
        assert_eq!(layout.current(), Some(values[0]));
    }

    #[test]
    fn test_lone_untagged_value_is_group_one() {
        let mut doc = Document::new("SCL");
        let (_, values) = dai_with(&mut doc, &[None], &["x"]);
        assert_eq!(value_for_group(&doc, &values, 1), Some(values[0]));
        assert_eq!(value_for_group(&doc, &values, 2), None);

        let mut doc = Document::new("SCL");
        let (_, values) = dai_with(&mut doc, &[Some("2")], &["x"]);
        assert_eq!(value_for_group(&doc, &values, 1), None);
        assert_eq!(value_for_group(&doc, &values, 2), Some(values[0]));
    }

    #[test]
    fn test_add_missing_inserts_in_ordinal_position() {
        let mut doc = Document::new("SCL");
        let (dai, values) = dai_with(&mut doc, &[Some("2")], &["10"]);
        let groups = SettingGroups { num_of_sgs: 3, act_sg: 2 };
        let layout = classify(&doc, &values, groups, "SG");
        let batch = add_missing_groups(&mut doc, dai, &layout, "0").unwrap();
        assert_eq!(batch.len(), 2);
        doc.apply(&batch).unwrap();

        let ordinals: Vec<&str> = doc
            .children(dai)
            .iter()
            .map(|v| doc.attr(*v, "sGroup").unwrap())
            .collect();
        assert_eq!(ordinals, vec!["1", "2", "3"]);
        assert!(doc.children(dai).iter().all(|v| doc.text(*v) == "10"));
    }

    #[test]
    fn test_add_missing_uses_default_without_active_value() {
        let mut doc = Document::new("SCL");
        let (dai, values) = dai_with(&mut doc, &[Some("1")], &["7"]);
        let groups = SettingGroups { num_of_sgs: 2, act_sg: 2 };
        let layout = classify(&doc, &values, groups, "SG");
        let batch = add_missing_groups(&mut doc, dai, &layout, "5").unwrap();
        doc.apply(&batch).unwrap();
        assert_eq!(doc.text(doc.children(dai)[1]), "5");
    }

    #[test]
    fn test_sync_group_copies_active_content() {
        let mut doc = Document::new("SCL");
        let (_, values) = dai_with(&mut doc, &[Some("1"), Some("2")], &["old", "new"]);
        let groups = SettingGroups { num_of_sgs: 3, act_sg: 2 };
        let layout = classify(&doc, &values, groups, "SG");
        let batch = sync_group(&doc, &layout, 1).unwrap();
        assert_eq!(
            batch.ops(),
            &[EditOp::SetText { element: values[0], text: "new".into() }]
        );
        assert_eq!(sync_group(&doc, &layout, 3), Err(SclError::MissingGroupValue(3)));
        assert!(sync_group(&doc, &layout, 2).unwrap().is_empty());

        let single = ValueLayout::Single(Some(values[0]));
        assert_eq!(sync_group(&doc, &single, 1), Err(SclError::NotGrouped));
    }

    #[test]
    fn test_stale_needs_an_active_value() {
        let mut doc = Document::new("SCL");
        let (_, values) = dai_with(&mut doc, &[Some("1"), Some("2"), Some("3")], &["5", "5", "6"]);
        let layout = classify(&doc, &values, SettingGroups { num_of_sgs: 3, act_sg: 1 }, "SG");
        assert_eq!(layout.stale(), vec![3]);

        // Group 2 is active but holds nothing to compare against.
        let (_, values) = dai_with(&mut doc, &[Some("1"), Some("3")], &["5", "6"]);
        let layout = classify(&doc, &values, SettingGroups { num_of_sgs: 3, act_sg: 2 }, "SG");
        assert!(layout.stale().is_empty());
        assert_eq!(layout.missing(), vec![2]);
    }

    #[test]
    fn test_delete_groups_backfills_before_removing() {
        let mut doc = Document::new("SCL");
        let (dai, values) = dai_with(&mut doc, &[Some("2")], &["42"]);
        let groups = SettingGroups { num_of_sgs: 3, act_sg: 2 };
        let layout = classify(&doc, &values, groups, "SG");
        let batch = delete_groups(&mut doc, dai, &layout, "").unwrap();

        let ops = batch.ops();
        assert_eq!(ops.len(), 3);
        for op in &ops[..2] {
            let EditOp::Insert { parent, node, .. } = op else {
                panic!("Expected backfill insert, got {:?}", op);
            };
            assert_eq!(*parent, dai);
            assert_eq!(doc.text(*node), "42");
        }
        assert_eq!(ops[2], EditOp::Remove { node: dai });

        doc.apply(&batch).unwrap();
        assert!(!doc.is_attached(dai));
    }

    #[test]
    fn test_delete_groups_prunes_empty_containers() {
        let mut doc = Document::new("SCL");
        let root = doc.root();
        let ln = add(&mut doc, root, "LN", &[("lnClass", "PTOC")]);
        let doi = add(&mut doc, ln, "DOI", &[("name", "StrVal")]);
        let dai = add(&mut doc, doi, "DAI", &[("name", "setVal")]);
        let v2 = add(&mut doc, dai, "Val", &[("sGroup", "2")]);
        doc.set_text(v2, "1").unwrap();

        let layout = classify(&doc, &[v2], SettingGroups { num_of_sgs: 3, act_sg: 2 }, "SG");
        let batch = delete_groups(&mut doc, dai, &layout, "").unwrap();
        assert_eq!(batch.ops().last(), Some(&EditOp::Remove { node: doi }));
        doc.apply(&batch).unwrap();
        assert!(doc.children(ln).is_empty());
        assert!(!doc.is_attached(dai));
    }

    #[test]
    fn test_delete_groups_drops_out_of_range_ordinals() {
        let mut doc = Document::new("SCL");
        let (dai, values) = dai_with(&mut doc, &[Some("1"), Some("2"), Some("3")], &["a", "b", "c"]);
        // The group count was lowered after group 3 was written.
        let layout = classify(&doc, &values, SettingGroups { num_of_sgs: 2, act_sg: 1 }, "SG");
        let batch = delete_groups(&mut doc, dai, &layout, "").unwrap();
        assert_eq!(batch.ops(), &[EditOp::Remove { node: dai }]);
        doc.apply(&batch).unwrap();
        assert!(!doc.is_attached(dai));
        assert!(values.iter().all(|v| !doc.is_attached(*v)));
    }

    #[test]
    fn test_delete_groups_drops_duplicates_and_untagged() {
        let mut doc = Document::new("SCL");
        let (dai, values) =
            dai_with(&mut doc, &[Some("1"), Some("1"), None, Some("2")], &["a", "a2", "x", "b"]);
        let layout = classify(&doc, &values, SettingGroups { num_of_sgs: 2, act_sg: 1 }, "SG");
        assert!(layout.missing().is_empty());
        let batch = delete_groups(&mut doc, dai, &layout, "").unwrap();
        doc.apply(&batch).unwrap();
        assert!(values.iter().all(|v| !doc.is_attached(*v)));
    }
}
