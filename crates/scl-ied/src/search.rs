// crates/scl-ied/src/search.rs

//! Attribute search over an IED and the template catalog.
//!
//! A search does not alter any model. It yields a [`RenderFilter`]: the set of
//! space-joined paths (`"LN0 IED1>>LD1>LLN0 Mod stVal"`) whose nodes, and the
//! ancestors and descendants of those nodes, stay visible.

use crate::constants::{
    ATTR_INST, ATTR_LN_CLASS, ATTR_NAME, ATTR_PREFIX, LN_TAGS, TAG_ACCESS_POINT, TAG_IED,
    TAG_LDEVICE, TAG_SERVER,
};
use crate::document::Document;
use crate::editor::EditorAction;
use crate::template::{TemplateCache, TemplateCatalog, resolve};
use crate::types::{ContainerTag, ElementId};
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::{debug, trace};

// --- Identities ---

fn ied_name(doc: &Document, element: ElementId) -> &str {
    doc.closest(element, TAG_IED)
        .and_then(|ied| doc.attr(ied, ATTR_NAME))
        .unwrap_or_default()
}

/// `"{iedName}>>{inst}"`.
pub fn ldevice_identity(doc: &Document, ldevice: ElementId) -> String {
    format!(
        "{}>>{}",
        ied_name(doc, ldevice),
        doc.attr(ldevice, ATTR_INST).unwrap_or_default()
    )
}

/// `"{iedName}>>{ldInst}>{prefix}{lnClass}{inst}"`.
pub fn ln_identity(doc: &Document, ln: ElementId) -> String {
    let ld_inst = doc
        .closest(ln, TAG_LDEVICE)
        .and_then(|ld| doc.attr(ld, ATTR_INST))
        .unwrap_or_default();
    format!(
        "{}>>{}>{}{}{}",
        ied_name(doc, ln),
        ld_inst,
        doc.attr(ln, ATTR_PREFIX).unwrap_or_default(),
        doc.attr(ln, ATTR_LN_CLASS).unwrap_or_default(),
        doc.attr(ln, ATTR_INST).unwrap_or_default()
    )
}

/// First component of every search path below `ln`: `"{tag} {identity}"`.
pub fn ln_key(doc: &Document, ln: ElementId) -> String {
    format!("{} {}", doc.tag(ln), ln_identity(doc, ln))
}

/// Search path of an instance container: its LN key followed by the names of
/// the containers leading to it. `None` outside a logical node.
pub fn instance_path(doc: &Document, container: ElementId) -> Option<String> {
    let mut names = Vec::new();
    let mut current = container;
    loop {
        if LN_TAGS.contains(&doc.tag(current)) {
            names.push(ln_key(doc, current));
            break;
        }
        names.push(doc.attr(current, ATTR_NAME).unwrap_or_default().to_string());
        current = doc.parent(current)?;
    }
    names.reverse();
    Some(names.join(" "))
}

/// Joins an LN key and member names into a search path.
pub fn member_path(ln_key: &str, names: &[&str]) -> String {
    let mut path = String::from(ln_key);
    for name in names {
        path.push(' ');
        path.push_str(name);
    }
    path
}

/// `true` if `prefix` equals `path` or ends at one of its component boundaries.
fn is_component_prefix(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
}

// --- Filter ---

/// Visibility of the rendered tree after a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderFilter {
    /// `None` renders everything.
    paths: Option<BTreeSet<String>>,
}

impl RenderFilter {
    /// A filter that hides nothing.
    pub fn all() -> Self {
        Self { paths: None }
    }

    pub fn from_paths(paths: BTreeSet<String>) -> Self {
        Self { paths: Some(paths) }
    }

    pub fn is_active(&self) -> bool {
        self.paths.is_some()
    }

    /// Recorded paths; empty for an inactive filter.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths
            .iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// A device is shown when it matched itself or holds a matched path.
    pub fn shows_ldevice(&self, identity: &str) -> bool {
        let Some(paths) = &self.paths else {
            return true;
        };
        let nested = format!("{}>", identity);
        paths.iter().any(|p| {
            p == identity
                || p.split(' ')
                    .nth(1)
                    .is_some_and(|ln_identity| ln_identity.starts_with(&nested))
        })
    }

    /// A logical node is shown when it matched or holds a matched path.
    pub fn shows_ln(&self, ln_key: &str) -> bool {
        match &self.paths {
            None => true,
            Some(paths) => paths.iter().any(|p| is_component_prefix(ln_key, p)),
        }
    }

    /// A member is shown when it lies on the way to a match or inside a match.
    pub fn shows_member(&self, path: &str) -> bool {
        match &self.paths {
            None => true,
            Some(paths) => paths
                .iter()
                .any(|p| is_component_prefix(path, p) || is_component_prefix(p, path)),
        }
    }
}

// --- Scan ---

fn matches(doc: &Document, element: ElementId, needle: &str, attributes: &[String]) -> bool {
    doc.attributes(element).iter().any(|(name, value)| {
        attributes.iter().any(|a| a == name) && value.to_lowercase().contains(needle)
    })
}

/// Servers of the IED, in document order.
pub fn servers(doc: &Document, ied: ElementId) -> Vec<ElementId> {
    doc.child_elements(ied, &[TAG_ACCESS_POINT])
        .filter_map(|ap| doc.first_child(ap, TAG_SERVER))
        .collect()
}

/// Resolves every logical node of the IED so the cache knows all template paths.
fn warm_cache(
    doc: &Document,
    ied: ElementId,
    catalog: &TemplateCatalog,
    cache: &mut TemplateCache,
) {
    for ln in doc
        .descendants(ied)
        .filter(|e| LN_TAGS.contains(&doc.tag(*e)))
    {
        if let Some(declaration) = catalog.lnode_type(doc, ln) {
            resolve(doc, catalog, cache, declaration, &[ln_key(doc, ln)]);
        }
    }
}

/// Runs a search for `term` below `ied` and across the template catalog.
///
/// The comparison is a case-insensitive substring match on `attributes`. An
/// empty term yields a filter that shows everything.
pub fn search(
    doc: &Document,
    ied: ElementId,
    catalog: &TemplateCatalog,
    cache: &mut TemplateCache,
    term: &str,
    attributes: &[String],
) -> RenderFilter {
    if term.is_empty() {
        return RenderFilter::all();
    }
    let needle = term.to_lowercase();
    warm_cache(doc, ied, catalog, cache);

    let mut paths = BTreeSet::new();
    for server in servers(doc, ied) {
        for element in doc.descendants(server) {
            if !matches(doc, element, &needle, attributes) {
                continue;
            }
            let tag = doc.tag(element);
            if tag == TAG_LDEVICE {
                paths.insert(ldevice_identity(doc, element));
            } else if LN_TAGS.contains(&tag) {
                paths.insert(ln_key(doc, element));
            } else if ContainerTag::is_container(tag) {
                if let Some(path) = instance_path(doc, element) {
                    paths.insert(path);
                }
            }
        }
    }

    if let Some(templates) = catalog.root() {
        for element in doc.descendants(templates) {
            if matches(doc, element, &needle, attributes) {
                paths.extend(cache.paths_for(element).map(String::from));
            }
        }
    }

    debug!("[SEARCH] '{}' matched {} paths", term, paths.len());
    trace!("[SEARCH] Paths: {:?}", paths);
    RenderFilter::from_paths(paths)
}

// --- Debounce ---

/// Coalesces search input until it has been quiet for a window.
///
/// Times are supplied by the host in microseconds. Each input restarts the
/// window; only the last term fires.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_us: u64,
    pending: Option<(String, u64)>,
}

impl Debouncer {
    pub fn new(window_us: u64) -> Self {
        Self {
            window_us,
            pending: None,
        }
    }

    /// Records new input and asks the host to call `tick()` after the window.
    pub fn input(&mut self, term: &str, now_us: u64) -> EditorAction {
        self.pending = Some((term.to_string(), now_us));
        EditorAction::SetTimer(self.window_us)
    }

    /// Returns the pending term once the window has elapsed since the last input.
    pub fn tick(&mut self, now_us: u64) -> Option<String> {
        let (_, last_input) = self.pending.as_ref()?;
        if now_us.saturating_sub(*last_input) < self.window_us {
            return None;
        }
        self.pending.take().map(|(term, _)| term)
    }

    /// Time at which the pending term becomes due.
    pub fn deadline(&self) -> Option<u64> {
        self.pending
            .as_ref()
            .map(|(_, at)| at.saturating_add(self.window_us))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SEARCH_ATTRIBUTES;
    use crate::template::tests::add;
    use alloc::vec;

    fn attributes() -> Vec<String> {
        SEARCH_ATTRIBUTES.iter().map(|a| a.to_string()).collect()
    }

    struct Fixture {
        doc: Document,
        ied: ElementId,
        ld: ElementId,
        ln0: ElementId,
        xcbr: ElementId,
        catalog: TemplateCatalog,
    }

    /// IED1/LD1 with LLN0 (type L0) and XCBR1 (type X). `L0.Health` is an ENS
    /// whose `stVal` carries a distinctive description.
    fn fixture() -> Fixture {
        let mut doc = Document::new("SCL");
        let root = doc.root();
        let ied = add(&mut doc, root, "IED", &[("name", "IED1")]);
        let ap = add(&mut doc, ied, "AccessPoint", &[("name", "AP1")]);
        let server = add(&mut doc, ap, "Server", &[]);
        let ld = add(&mut doc, server, "LDevice", &[("inst", "LD1")]);
        let ln0 = add(&mut doc, ld, "LN0", &[("lnClass", "LLN0"), ("lnType", "L0"), ("inst", "")]);
        let xcbr = add(
            &mut doc,
            ld,
            "LN",
            &[("prefix", "Q0"), ("lnClass", "XCBR"), ("inst", "1"), ("lnType", "X")],
        );
        let mod_doi = add(&mut doc, xcbr, "DOI", &[("name", "Mod")]);
        add(&mut doc, mod_doi, "DAI", &[("name", "ctlModel"), ("desc", "Breaker control")]);

        let dtt = add(&mut doc, root, "DataTypeTemplates", &[]);
        let l0 = add(&mut doc, dtt, "LNodeType", &[("id", "L0")]);
        add(&mut doc, l0, "DO", &[("name", "Health"), ("type", "ENS")]);
        add(&mut doc, l0, "DO", &[("name", "Beh"), ("type", "ENS2")]);
        let x = add(&mut doc, dtt, "LNodeType", &[("id", "X")]);
        add(&mut doc, x, "DO", &[("name", "Mod"), ("type", "ENS2")]);
        let ens = add(&mut doc, dtt, "DOType", &[("id", "ENS")]);
        add(&mut doc, ens, "DA", &[("name", "stVal"), ("desc", "Zebra health"), ("bType", "Enum")]);
        add(&mut doc, ens, "DA", &[("name", "q"), ("bType", "Quality")]);
        let ens2 = add(&mut doc, dtt, "DOType", &[("id", "ENS2")]);
        add(&mut doc, ens2, "DA", &[("name", "ctlModel"), ("bType", "Enum")]);

        let catalog = TemplateCatalog::build(&doc);
        Fixture { doc, ied, ld, ln0, xcbr, catalog }
    }

    #[test]
    fn test_identities() {
        let f = fixture();
        assert_eq!(ldevice_identity(&f.doc, f.ld), "IED1>>LD1");
        assert_eq!(ln_identity(&f.doc, f.ln0), "IED1>>LD1>LLN0");
        assert_eq!(ln_key(&f.doc, f.xcbr), "LN IED1>>LD1>Q0XCBR1");
        let dai = f.doc.descendants(f.xcbr).last().unwrap();
        assert_eq!(
            instance_path(&f.doc, dai).as_deref(),
            Some("LN IED1>>LD1>Q0XCBR1 Mod ctlModel")
        );
        assert_eq!(instance_path(&f.doc, f.ld), None);
    }

    #[test]
    fn test_empty_term_shows_everything() {
        let f = fixture();
        let mut cache = TemplateCache::new();
        let filter = search(&f.doc, f.ied, &f.catalog, &mut cache, "", &attributes());
        assert!(!filter.is_active());
        assert!(filter.shows_ln("anything"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_nested_template_match_reveals_ancestors_only() {
        let f = fixture();
        let mut cache = TemplateCache::new();
        let filter = search(&f.doc, f.ied, &f.catalog, &mut cache, "zEbRa", &attributes());

        let lln0 = ln_key(&f.doc, f.ln0);
        assert!(filter.shows_ldevice("IED1>>LD1"));
        assert!(filter.shows_ln(&lln0));
        assert!(filter.shows_member(&member_path(&lln0, &["Health"])));
        assert!(filter.shows_member(&member_path(&lln0, &["Health", "stVal"])));

        assert!(!filter.shows_member(&member_path(&lln0, &["Health", "q"])));
        assert!(!filter.shows_member(&member_path(&lln0, &["Beh"])));
        assert!(!filter.shows_ln(&ln_key(&f.doc, f.xcbr)));
        assert!(!filter.shows_ldevice("IED1>>LD2"));
    }

    #[test]
    fn test_instance_match_records_container_path() {
        let f = fixture();
        let mut cache = TemplateCache::new();
        let filter = search(&f.doc, f.ied, &f.catalog, &mut cache, "breaker", &attributes());
        let paths: Vec<&str> = filter.paths().collect();
        assert_eq!(paths, vec!["LN IED1>>LD1>Q0XCBR1 Mod ctlModel"]);
        assert!(!filter.shows_ln(&ln_key(&f.doc, f.ln0)));
    }

    #[test]
    fn test_declaration_match_reveals_every_use() {
        let f = fixture();
        let mut cache = TemplateCache::new();
        let filter = search(&f.doc, f.ied, &f.catalog, &mut cache, "ENS2", &attributes());
        let lln0 = ln_key(&f.doc, f.ln0);
        let xcbr = ln_key(&f.doc, f.xcbr);
        assert!(filter.shows_member(&member_path(&lln0, &["Beh", "ctlModel"])));
        assert!(filter.shows_member(&member_path(&xcbr, &["Mod"])));
        assert!(!filter.shows_member(&member_path(&lln0, &["Health"])));
    }

    #[test]
    fn test_ln_and_ldevice_matches() {
        let f = fixture();
        let mut cache = TemplateCache::new();
        let filter = search(&f.doc, f.ied, &f.catalog, &mut cache, "xcbr", &attributes());
        let xcbr = ln_key(&f.doc, f.xcbr);
        assert!(filter.shows_ln(&xcbr));
        assert!(filter.shows_member(&member_path(&xcbr, &["Mod", "ctlModel"])));
        assert!(!filter.shows_ln(&ln_key(&f.doc, f.ln0)));

        let filter = search(&f.doc, f.ied, &f.catalog, &mut cache, "ld1", &attributes());
        assert!(filter.shows_ldevice("IED1>>LD1"));
    }

    #[test]
    fn test_component_prefix_is_not_substring() {
        let filter = RenderFilter::from_paths(
            ["LN IED1>>LD1>XCBR1 Pos".to_string()].into_iter().collect(),
        );
        assert!(filter.shows_member("LN IED1>>LD1>XCBR1 Pos"));
        assert!(!filter.shows_member("LN IED1>>LD1>XCBR1 PosX"));
        assert!(!filter.shows_ln("LN IED1>>LD1>XCBR"));
        assert!(!filter.shows_ldevice("IED1>>LD"));
    }

    #[test]
    fn test_debouncer_fires_last_term_once() {
        let mut debouncer = Debouncer::new(250_000);
        assert_eq!(debouncer.input("x", 0), EditorAction::SetTimer(250_000));
        debouncer.input("xc", 100_000);
        debouncer.input("xcb", 200_000);
        assert_eq!(debouncer.deadline(), Some(450_000));
        assert_eq!(debouncer.tick(250_000), None);
        assert_eq!(debouncer.tick(449_999), None);
        assert_eq!(debouncer.tick(450_000).as_deref(), Some("xcb"));
        assert_eq!(debouncer.tick(900_000), None);
        assert!(!debouncer.is_pending());

        debouncer.input("y", 1_000_000);
        debouncer.cancel();
        assert_eq!(debouncer.tick(2_000_000), None);
    }
}
