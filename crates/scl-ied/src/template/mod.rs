// crates/scl-ied/src/template/mod.rs

//! Resolves the `DataTypeTemplates` graph into data models.
//!
//! A data model is the tree of template members reachable from one declaration
//! (`LNodeType` → `DO`/`SDO` → `DOType` → `DA`/`BDA` → `DAType`, ending at
//! `EnumType` or a primitive `bType`). Its shape only depends on the declaration,
//! but the same declaration can be reached through many instantiation paths.
//! Every path taken is recorded in a [`TemplateCache`] so the search filter can
//! match against the concrete path rather than the shared declaration.

mod lookup;

pub use lookup::{
    LeafAttribute, enum_options, ldevice_description, leaf_attribute, leaf_from_members,
    ln_description, member_description, template_default, walk_path,
};
pub(crate) use lookup::member_name;

use crate::constants::{
    ATTR_ID, ATTR_LN_TYPE, ATTR_NAME, ATTR_TYPE, MEMBER_TAGS, TAG_DATA_TYPE_TEMPLATES,
    TAG_LNODE_TYPE,
};
use crate::document::Document;
use crate::types::ElementId;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::{trace, warn};

// --- Catalog ---

/// Index of the declarations of the document's `DataTypeTemplates` by `id`.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    root: Option<ElementId>,
    by_id: BTreeMap<String, ElementId>,
}

impl TemplateCatalog {
    /// Indexes the `DataTypeTemplates` child of the document root, if any.
    pub fn build(doc: &Document) -> Self {
        let root = doc.first_child(doc.root(), TAG_DATA_TYPE_TEMPLATES);
        let mut by_id = BTreeMap::new();
        if let Some(templates) = root {
            for declaration in doc.children(templates) {
                if let Some(id) = doc.attr(*declaration, ATTR_ID) {
                    by_id.entry(id.to_string()).or_insert(*declaration);
                }
            }
        }
        trace!("[TPL] Indexed {} template declarations", by_id.len());
        Self { root, by_id }
    }

    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Looks up a declaration by its `id`.
    pub fn declaration(&self, id: &str) -> Option<ElementId> {
        self.by_id.get(id).copied()
    }

    /// The `LNodeType` referenced by a logical node's `lnType`.
    pub fn lnode_type(&self, doc: &Document, ln: ElementId) -> Option<ElementId> {
        doc.attr(ln, ATTR_LN_TYPE)
            .and_then(|id| self.declaration(id))
            .filter(|decl| doc.tag(*decl) == TAG_LNODE_TYPE)
    }
}

// --- Path cache ---

/// Records every space-joined path by which a declaration or member was reached.
///
/// Owned by the editor session; rebuilt when a different document is loaded
/// since recorded paths are meaningless against another catalog.
#[derive(Debug, Clone, Default)]
pub struct TemplateCache {
    paths: BTreeMap<ElementId, BTreeSet<String>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path` for `element`. Returns `false` if it was already known.
    pub fn record(&mut self, element: ElementId, path: String) -> bool {
        self.paths.entry(element).or_default().insert(path)
    }

    /// All paths recorded for `element`.
    pub fn paths_for(&self, element: ElementId) -> impl Iterator<Item = &str> {
        self.paths
            .get(&element)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn contains_path(&self, element: ElementId, path: &str) -> bool {
        self.paths
            .get(&element)
            .is_some_and(|set| set.contains(path))
    }

    /// Number of elements with at least one recorded path.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

// --- Data model ---

/// One template member and the model of the type it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    /// The `DO`, `SDO`, `DA` or `BDA` element.
    pub member: ElementId,
    /// The declaration named by the member's `type`, when found in the catalog.
    pub declaration: Option<ElementId>,
    /// Members of the referenced declaration; empty at leaves.
    pub children: DataModel,
}

impl ModelEntry {
    /// `true` when the member has no expandable structure.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Ordered members of a resolved declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataModel {
    entries: Vec<ModelEntry>,
}

impl DataModel {
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn iter(&self) -> core::slice::Iter<'_, ModelEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry keyed by the given template member.
    pub fn get(&self, member: ElementId) -> Option<&ModelEntry> {
        self.entries.iter().find(|e| e.member == member)
    }

    /// The entry whose member carries the given `name`.
    pub fn find_by_name(&self, doc: &Document, name: &str) -> Option<&ModelEntry> {
        self.entries
            .iter()
            .find(|e| doc.attr(e.member, ATTR_NAME) == Some(name))
    }
}

impl<'a> IntoIterator for &'a DataModel {
    type Item = &'a ModelEntry;
    type IntoIter = core::slice::Iter<'a, ModelEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Expands `declaration` into its data model.
///
/// `path` is the instantiation path leading to the declaration, typically a
/// single `"{LN tag} {LN identity}"` component. Each member's referenced type is
/// looked up in `catalog`; types that cannot be found become leaves. A
/// declaration that is already being expanded further up the same branch is not
/// expanded again.
pub fn resolve(
    doc: &Document,
    catalog: &TemplateCatalog,
    cache: &mut TemplateCache,
    declaration: ElementId,
    path: &[String],
) -> DataModel {
    let mut path = path.to_vec();
    let mut stack = Vec::new();
    resolve_inner(doc, catalog, cache, declaration, &mut path, &mut stack)
}

fn resolve_inner(
    doc: &Document,
    catalog: &TemplateCatalog,
    cache: &mut TemplateCache,
    declaration: ElementId,
    path: &mut Vec<String>,
    stack: &mut Vec<ElementId>,
) -> DataModel {
    cache.record(declaration, path.join(" "));
    stack.push(declaration);

    // Declarations outside a template catalog cannot reference anything.
    let in_catalog = doc
        .closest(declaration, TAG_DATA_TYPE_TEMPLATES)
        .is_some();

    let mut model = DataModel::default();
    for member in doc.child_elements(declaration, &MEMBER_TAGS) {
        path.push(doc.attr(member, ATTR_NAME).unwrap_or_default().to_string());
        cache.record(member, path.join(" "));

        let target = if in_catalog {
            doc.attr(member, ATTR_TYPE)
                .and_then(|type_id| catalog.declaration(type_id))
        } else {
            None
        };

        let children = match target {
            Some(decl) if stack.contains(&decl) => {
                warn!(
                    "[TPL] Recursive type reference at '{}', not expanding {}",
                    path.join(" "),
                    doc.attr(decl, ATTR_ID).unwrap_or_default()
                );
                DataModel::default()
            }
            Some(decl) => resolve_inner(doc, catalog, cache, decl, path, stack),
            None => DataModel::default(),
        };

        model.entries.push(ModelEntry {
            member,
            declaration: target,
            children,
        });
        path.pop();
    }

    stack.pop();
    model
}
