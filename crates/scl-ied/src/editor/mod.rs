// crates/scl-ied/src/editor/mod.rs

//! The editing session for one IED of a loaded document.
//!
//! The session never owns the document. Views are built from a shared borrow
//! and every action returns the [`EditBatch`] the host should submit through its
//! [`crate::EditSink`]. Actions that allocate new elements take the document
//! mutably, but only detached elements are ever touched.

pub mod view;

pub use view::{
    EditorView, GroupRow, LDeviceView, LeafView, LnView, MemberRow, ServerView, ValueInputSpec,
    value_input_id,
};

use crate::config::EditorConfig;
use crate::constants::{
    ATTR_INST, ATTR_LN_CLASS, ATTR_LN_TYPE, ATTR_NAME, ATTR_PREFIX, LN_TAGS, TAG_IED,
    TAG_LDEVICE, TAG_VAL,
};
use crate::document::Document;
use crate::edit::{EditBatch, EditOp};
use crate::hal::SclError;
use crate::instance::match_instances;
use crate::instantiate::{Instantiation, find_instance, find_instance_to_remove, instantiate_path};
use crate::log::{LnContext, my_debug, my_info, my_trace};
use crate::search::{Debouncer, RenderFilter, ldevice_identity, ln_identity, ln_key, search, servers};
use crate::setting_group::{self, SettingGroups, ValueLayout, classify, resolve_setting_groups};
use crate::template::{
    DataModel, LeafAttribute, TemplateCache, TemplateCatalog, ldevice_description, leaf_attribute,
    ln_description, resolve, template_default,
};
use crate::types::{ElementId, PathStep};
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use view::LnScope;

/// What the host should do after feeding input or time to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// Call `tick()` again after the given number of microseconds.
    SetTimer(u64),
    /// No immediate action is required.
    NoAction,
}

/// Render state of one logical node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LnState {
    #[default]
    Collapsed,
    /// Matched against the instance tree on every view.
    Open,
}

impl LnState {
    pub fn toggled(self) -> Self {
        match self {
            LnState::Collapsed => LnState::Open,
            LnState::Open => LnState::Collapsed,
        }
    }
}

/// Names of the IEDs in the document, in document order.
pub fn ied_names(doc: &Document) -> Vec<&str> {
    doc.child_elements(doc.root(), &[TAG_IED])
        .filter_map(|ied| doc.attr(ied, ATTR_NAME))
        .collect()
}

/// Template and instance facts about one leaf targeted by an action.
struct LeafTarget {
    leaf: LeafAttribute,
    dai: Option<ElementId>,
    layout: ValueLayout,
}

fn path_label(path: &[PathStep]) -> String {
    path.iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

pub struct IedEditor {
    config: EditorConfig,
    catalog: TemplateCatalog,
    cache: TemplateCache,
    /// Resolved models by `LNodeType`; kept while logical nodes close.
    models: BTreeMap<ElementId, DataModel>,
    ied: Option<ElementId>,
    ied_name: String,
    ln_states: BTreeMap<ElementId, LnState>,
    search_term: String,
    filter: RenderFilter,
    debouncer: Debouncer,
}

impl IedEditor {
    pub fn new(doc: &Document, config: EditorConfig) -> Self {
        let debouncer = Debouncer::new(config.search_debounce_us);
        Self {
            config,
            catalog: TemplateCatalog::build(doc),
            cache: TemplateCache::new(),
            models: BTreeMap::new(),
            ied: None,
            ied_name: String::new(),
            ln_states: BTreeMap::new(),
            search_term: String::new(),
            filter: RenderFilter::all(),
            debouncer,
        }
    }

    /// Switches to another document. Cached template paths and models are dropped.
    pub fn load_document(&mut self, doc: &Document) {
        self.catalog = TemplateCatalog::build(doc);
        self.cache.clear();
        self.models.clear();
        self.ied = None;
        self.ied_name.clear();
        self.reset_selection_state();
        my_info!("[EDITOR] Loaded document with {} template declarations", self.catalog.len());
    }

    /// Selects the IED named `name`.
    ///
    /// Resets the search and the open logical nodes; cached template paths are
    /// kept since the catalog did not change.
    pub fn select_ied(&mut self, doc: &Document, name: &str) -> Result<(), SclError> {
        let ied = doc
            .child_named(doc.root(), TAG_IED, name)
            .ok_or_else(|| SclError::IedNotFound(name.to_string()))?;
        self.ied = Some(ied);
        self.ied_name = name.to_string();
        self.reset_selection_state();
        my_info!("[EDITOR] Selected IED '{}'", name);
        Ok(())
    }

    fn reset_selection_state(&mut self) {
        self.ln_states.clear();
        self.search_term.clear();
        self.filter = RenderFilter::all();
        self.debouncer.cancel();
    }

    pub fn selected_ied(&self) -> Option<ElementId> {
        self.ied
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Number of `LNodeType` declarations with a resolved model.
    pub fn cached_models(&self) -> usize {
        self.models.len()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filter(&self) -> &RenderFilter {
        &self.filter
    }

    // --- Logical node state ---

    pub fn ln_state(&self, ln: ElementId) -> LnState {
        self.ln_states.get(&ln).copied().unwrap_or_default()
    }

    /// Expands or collapses a logical node and returns its new state.
    pub fn toggle_ln(&mut self, doc: &Document, ln: ElementId) -> Result<LnState, SclError> {
        if !LN_TAGS.contains(&doc.tag(ln)) {
            return Err(SclError::NotALogicalNode(ln));
        }
        let state = self.ln_state(ln).toggled();
        self.ln_states.insert(ln, state);
        let identity = ln_identity(doc, ln);
        my_debug!(LnContext { ied: &self.ied_name, ln: &identity }, "[EDITOR] Now {:?}", state);
        Ok(state)
    }

    /// The data model of a logical node.
    ///
    /// Resolved on first use of its `LNodeType`, recording the paths taken
    /// below `ln`, and served from the session afterwards.
    pub fn data_model(&mut self, doc: &Document, ln: ElementId) -> Option<&DataModel> {
        let declaration = self.resolve_model(doc, ln)?;
        self.models.get(&declaration)
    }

    fn resolve_model(&mut self, doc: &Document, ln: ElementId) -> Option<ElementId> {
        let declaration = self.catalog.lnode_type(doc, ln)?;
        if !self.models.contains_key(&declaration) {
            let model = resolve(
                doc,
                &self.catalog,
                &mut self.cache,
                declaration,
                &[ln_key(doc, ln)],
            );
            my_trace!("[EDITOR] Resolved {} with {} members", declaration, model.len());
            self.models.insert(declaration, model);
        }
        Some(declaration)
    }

    // --- View ---

    /// Builds the view of the selected IED; empty when none is selected.
    pub fn view(&mut self, doc: &Document) -> EditorView {
        let Some(ied) = self.ied else {
            return EditorView::default();
        };
        let mut view = EditorView {
            ied: self.ied_name.clone(),
            search_term: self.search_term.clone(),
            servers: Vec::new(),
        };
        for server in servers(doc, ied) {
            let access_point = doc
                .parent(server)
                .and_then(|ap| doc.attr(ap, ATTR_NAME))
                .unwrap_or_default()
                .to_string();
            let mut ldevices = Vec::new();
            for ld in doc.child_elements(server, &[TAG_LDEVICE]) {
                if let Some(ld_view) = self.ldevice_view(doc, ld) {
                    ldevices.push(ld_view);
                }
            }
            view.servers.push(ServerView {
                access_point,
                ldevices,
            });
        }
        view
    }

    fn ldevice_view(&mut self, doc: &Document, ld: ElementId) -> Option<LDeviceView> {
        let identity = ldevice_identity(doc, ld);
        if !self.filter.shows_ldevice(&identity) {
            return None;
        }
        let setting_groups = resolve_setting_groups(doc, ld);
        let mut lns = Vec::new();
        for ln in doc.child_elements(ld, &LN_TAGS) {
            if let Some(ln_view) = self.ln_view(doc, ln, setting_groups) {
                lns.push(ln_view);
            }
        }
        Some(LDeviceView {
            element: ld,
            inst: doc.attr(ld, ATTR_INST).unwrap_or_default().to_string(),
            identity,
            description: ldevice_description(doc, ld).map(String::from),
            setting_groups,
            lns,
        })
    }

    fn ln_view(&mut self, doc: &Document, ln: ElementId, groups: SettingGroups) -> Option<LnView> {
        let key = ln_key(doc, ln);
        if !self.filter.shows_ln(&key) {
            return None;
        }
        let state = self.ln_state(ln);
        let declaration = match state {
            LnState::Open => self.resolve_model(doc, ln),
            LnState::Collapsed => None,
        };
        let members = match declaration.and_then(|d| self.models.get(&d)) {
            Some(model) => {
                let values = match_instances(doc, ln, model);
                let scope = LnScope {
                    doc,
                    catalog: &self.catalog,
                    filter: &self.filter,
                    ln,
                    key: &key,
                    groups,
                };
                scope.member_rows(model, values.nested(), &mut Vec::new(), &mut Vec::new())
            }
            None => Vec::new(),
        };
        let attr = |name: &str| doc.attr(ln, name).unwrap_or_default();
        Some(LnView {
            element: ln,
            tag: doc.tag(ln).to_string(),
            label: format!("{}{}{}", attr(ATTR_PREFIX), attr(ATTR_LN_CLASS), attr(ATTR_INST)),
            ln_type: attr(ATTR_LN_TYPE).to_string(),
            description: ln_description(doc, &self.catalog, ln).map(String::from),
            key,
            state,
            members,
        })
    }

    // --- Actions ---

    fn leaf_target(
        &self,
        doc: &Document,
        ln: ElementId,
        path: &[PathStep],
    ) -> Result<LeafTarget, SclError> {
        if !LN_TAGS.contains(&doc.tag(ln)) {
            return Err(SclError::NotALogicalNode(ln));
        }
        if path.is_empty() {
            return Err(SclError::EmptyPath);
        }
        let leaf = leaf_attribute(doc, &self.catalog, ln, path)
            .ok_or_else(|| SclError::UnresolvedPath(path_label(path)))?;
        let groups = doc
            .closest(ln, TAG_LDEVICE)
            .map(|ld| resolve_setting_groups(doc, ld))
            .unwrap_or_default();
        let dai = find_instance(doc, ln, path);
        let values: Vec<ElementId> = dai
            .map(|d| doc.child_elements(d, &[TAG_VAL]).collect())
            .unwrap_or_default();
        let layout = classify(doc, &values, groups, &leaf.fc);
        Ok(LeafTarget { leaf, dai, layout })
    }

    fn writable_target(
        &self,
        doc: &Document,
        ln: ElementId,
        path: &[PathStep],
    ) -> Result<LeafTarget, SclError> {
        let target = self.leaf_target(doc, ln, path)?;
        if target.leaf.read_only {
            return Err(SclError::ReadOnly(path_label(path)));
        }
        Ok(target)
    }

    /// Instantiates the leaf at `path` and stores a value in it.
    ///
    /// Grouped attributes get one value per missing group. Without `input` the
    /// template default is stored.
    pub fn add_value(
        &self,
        doc: &mut Document,
        ln: ElementId,
        path: &[PathStep],
        input: Option<&str>,
    ) -> Result<EditBatch, SclError> {
        let target = self.writable_target(doc, ln, path)?;
        let text = match input {
            Some(text) => text.to_string(),
            None => template_default(doc, target.leaf.member),
        };
        let Instantiation { parent, mut edits } = instantiate_path(doc, path, ln)?;
        match &target.layout {
            ValueLayout::Grouped(slots) => {
                let (batch, _) = setting_group::insert_missing(doc, parent, slots, &text)?;
                edits.extend(batch.into_ops());
            }
            ValueLayout::Single(None) => {
                let val = doc.create_element(TAG_VAL);
                doc.set_text(val, &text)?;
                edits.push(EditOp::Insert {
                    parent,
                    node: val,
                    reference: None,
                });
            }
            ValueLayout::Single(Some(existing)) => {
                my_trace!("[EDITOR] {} already holds {}", parent, existing);
            }
        }
        let identity = ln_identity(doc, ln);
        my_info!(
            LnContext { ied: &self.ied_name, ln: &identity },
            "[EDITOR] Add {} ({} ops)",
            path_label(path),
            edits.len()
        );
        Ok(edits)
    }

    /// Writes `input` verbatim into `value`, creating missing containers first.
    pub fn save_value(
        &self,
        doc: &mut Document,
        ln: ElementId,
        path: &[PathStep],
        value: ElementId,
        input: &str,
    ) -> Result<EditBatch, SclError> {
        self.writable_target(doc, ln, path)?;
        let Instantiation { mut edits, .. } = instantiate_path(doc, path, ln)?;
        edits.push(EditOp::SetText {
            element: value,
            text: input.to_string(),
        });
        let identity = ln_identity(doc, ln);
        my_info!(
            LnContext { ied: &self.ied_name, ln: &identity },
            "[EDITOR] Save {} = '{}'",
            path_label(path),
            input
        );
        Ok(edits)
    }

    /// Removes `value` together with the containers it leaves empty.
    pub fn delete_value(
        &self,
        doc: &Document,
        ln: ElementId,
        path: &[PathStep],
        value: ElementId,
    ) -> Result<EditBatch, SclError> {
        self.writable_target(doc, ln, path)?;
        let node = find_instance_to_remove(doc, value);
        let identity = ln_identity(doc, ln);
        my_info!(
            LnContext { ied: &self.ied_name, ln: &identity },
            "[EDITOR] Delete {} at {}",
            path_label(path),
            node
        );
        let mut batch = EditBatch::new();
        batch.push(EditOp::Remove { node });
        Ok(batch)
    }

    /// Creates the values of every setting group missing one.
    pub fn add_missing_groups(
        &self,
        doc: &mut Document,
        ln: ElementId,
        path: &[PathStep],
    ) -> Result<EditBatch, SclError> {
        let target = self.writable_target(doc, ln, path)?;
        if !target.layout.is_grouped() {
            return Err(SclError::NotGrouped);
        }
        let default = template_default(doc, target.leaf.member);
        let Instantiation { parent, mut edits } = instantiate_path(doc, path, ln)?;
        let batch = setting_group::add_missing_groups(doc, parent, &target.layout, &default)?;
        edits.extend(batch.into_ops());
        Ok(edits)
    }

    /// Copies the active group's value into group `ordinal`.
    pub fn sync_group(
        &self,
        doc: &Document,
        ln: ElementId,
        path: &[PathStep],
        ordinal: u32,
    ) -> Result<EditBatch, SclError> {
        let target = self.writable_target(doc, ln, path)?;
        setting_group::sync_group(doc, &target.layout, ordinal)
    }

    /// Removes the values of every setting group of the attribute.
    pub fn delete_groups(
        &self,
        doc: &mut Document,
        ln: ElementId,
        path: &[PathStep],
    ) -> Result<EditBatch, SclError> {
        let target = self.writable_target(doc, ln, path)?;
        let Some(dai) = target.dai else {
            return Ok(EditBatch::new());
        };
        let default = template_default(doc, target.leaf.member);
        setting_group::delete_groups(doc, dai, &target.layout, &default)
    }

    // --- Search ---

    /// Feeds a keystroke of the search field.
    pub fn set_search_input(&mut self, term: &str, now_us: u64) -> EditorAction {
        self.debouncer.input(term, now_us)
    }

    /// Runs a debounced search once its window has elapsed.
    pub fn tick(&mut self, doc: &Document, now_us: u64) -> EditorAction {
        if let Some(term) = self.debouncer.tick(now_us) {
            self.search_now(doc, &term);
            return EditorAction::NoAction;
        }
        match self.debouncer.deadline() {
            Some(deadline) => EditorAction::SetTimer(deadline.saturating_sub(now_us)),
            None => EditorAction::NoAction,
        }
    }

    /// Runs a search immediately, bypassing the debouncer.
    pub fn search_now(&mut self, doc: &Document, term: &str) {
        self.search_term = term.to_string();
        self.filter = match self.ied {
            Some(ied) => search(
                doc,
                ied,
                &self.catalog,
                &mut self.cache,
                term,
                &self.config.search_attributes,
            ),
            None => RenderFilter::all(),
        };
    }

    pub fn clear_search(&mut self) {
        self.debouncer.cancel();
        self.search_term.clear();
        self.filter = RenderFilter::all();
    }
}
