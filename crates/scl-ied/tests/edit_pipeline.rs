// crates/scl-ied/tests/edit_pipeline.rs

use scl_ied::{
    ContainerTag, Document, EditBatch, EditOp, EditSink, EditorConfig, ElementId, IedEditor,
    PathStep, SclError,
};

/// A host that owns the document and records every batch it accepted.
struct RecordingHost {
    doc: Document,
    accepted: Vec<EditBatch>,
}

impl EditSink for RecordingHost {
    fn submit(&mut self, batch: &EditBatch) -> Result<(), SclError> {
        self.doc.apply(batch)?;
        self.accepted.push(batch.clone());
        Ok(())
    }
}

fn element(doc: &mut Document, parent: ElementId, tag: &str, attrs: &[(&str, &str)]) -> ElementId {
    let id = doc.create_element(tag);
    for (name, value) in attrs {
        doc.set_attribute(id, name, value).unwrap();
    }
    doc.append_child(parent, id).unwrap();
    id
}

/// IED `Bay1` / LD `CB` / `XCBR1` of type `XCBR_T` with an empty instance tree.
fn breaker_document() -> (Document, ElementId) {
    let mut doc = Document::new("SCL");
    let root = doc.root();
    let ied = element(&mut doc, root, "IED", &[("name", "Bay1")]);
    let ap = element(&mut doc, ied, "AccessPoint", &[("name", "P1")]);
    let server = element(&mut doc, ap, "Server", &[]);
    let ld = element(&mut doc, server, "LDevice", &[("inst", "CB")]);
    let xcbr = element(
        &mut doc,
        ld,
        "LN",
        &[("lnClass", "XCBR"), ("inst", "1"), ("lnType", "XCBR_T")],
    );

    let dtt = element(&mut doc, root, "DataTypeTemplates", &[]);
    let lnt = element(&mut doc, dtt, "LNodeType", &[("id", "XCBR_T"), ("lnClass", "XCBR")]);
    element(&mut doc, lnt, "DO", &[("name", "Pos"), ("type", "DPC_T")]);
    element(&mut doc, lnt, "DO", &[("name", "OpCnt"), ("type", "INS_T")]);
    let dpc = element(&mut doc, dtt, "DOType", &[("id", "DPC_T"), ("cdc", "DPC")]);
    element(&mut doc, dpc, "DA", &[("name", "ctlModel"), ("bType", "Enum"), ("type", "CtlModel_E"), ("fc", "CF")]);
    element(&mut doc, dpc, "DA", &[("name", "sboTimeout"), ("bType", "INT32U"), ("fc", "CF")]);
    let ins = element(&mut doc, dtt, "DOType", &[("id", "INS_T"), ("cdc", "INS")]);
    element(&mut doc, ins, "DA", &[("name", "stVal"), ("bType", "INT32"), ("fc", "ST")]);
    let ctl = element(&mut doc, dtt, "EnumType", &[("id", "CtlModel_E")]);
    let direct = element(&mut doc, ctl, "EnumVal", &[("ord", "1")]);
    doc.set_text(direct, "direct-with-normal-security").unwrap();

    (doc, xcbr)
}

fn pos(leaf: &str) -> Vec<PathStep> {
    vec![
        PathStep::new("Pos", ContainerTag::Doi),
        PathStep::new(leaf, ContainerTag::Dai),
    ]
}

#[test]
fn test_second_value_reuses_created_container() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (doc, xcbr) = breaker_document();
    let mut host = RecordingHost {
        doc,
        accepted: Vec::new(),
    };
    let mut editor = IedEditor::new(&host.doc, EditorConfig::default());
    editor.select_ied(&host.doc, "Bay1").unwrap();

    let batch = editor
        .add_value(&mut host.doc, xcbr, &pos("ctlModel"), Some("direct-with-normal-security"))
        .unwrap();
    host.submit(&batch).unwrap();
    let batch = editor
        .add_value(&mut host.doc, xcbr, &pos("sboTimeout"), Some("30000"))
        .unwrap();
    // Only the DAI and its value: the DOI exists now.
    assert_eq!(batch.len(), 2);
    host.submit(&batch).unwrap();
    assert_eq!(host.accepted.len(), 2);

    let doi = host.doc.children(xcbr)[0];
    assert_eq!(host.doc.children(doi).len(), 2);

    editor.toggle_ln(&host.doc, xcbr).unwrap();
    let view = editor.view(&host.doc);
    let members = &view.servers[0].ldevices[0].lns[0].members;
    assert!(members[0].instantiated);
    assert!(!members[1].instantiated);
    let leaf = members[0].children[1].leaf.as_ref().unwrap();
    assert_eq!(leaf.input.value, "30000");
    assert_eq!(leaf.input.element_id, "CB-XCBR1-Pos-sboTimeout");
}

#[test]
fn test_deleting_one_of_two_siblings_keeps_container() {
    let (doc, xcbr) = breaker_document();
    let mut host = RecordingHost {
        doc,
        accepted: Vec::new(),
    };
    let mut editor = IedEditor::new(&host.doc, EditorConfig::default());
    editor.select_ied(&host.doc, "Bay1").unwrap();
    for (leaf, text) in [("ctlModel", "direct-with-normal-security"), ("sboTimeout", "30000")] {
        let batch = editor
            .add_value(&mut host.doc, xcbr, &pos(leaf), Some(text))
            .unwrap();
        host.submit(&batch).unwrap();
    }

    let doi = host.doc.children(xcbr)[0];
    let ctl_model = host.doc.children(doi)[0];
    let val = host.doc.children(ctl_model)[0];
    let batch = editor
        .delete_value(&host.doc, xcbr, &pos("ctlModel"), val)
        .unwrap();
    assert_eq!(batch.ops(), &[EditOp::Remove { node: ctl_model }]);
    host.submit(&batch).unwrap();
    assert!(host.doc.is_attached(doi));
    assert_eq!(host.doc.children(doi).len(), 1);
}

#[test]
fn test_rejected_batch_leaves_document_untouched() {
    let (doc, xcbr) = breaker_document();
    let mut host = RecordingHost {
        doc,
        accepted: Vec::new(),
    };
    let editor = IedEditor::new(&host.doc, EditorConfig::default());
    let mut batch = editor
        .add_value(&mut host.doc, xcbr, &pos("sboTimeout"), Some("100"))
        .unwrap();
    // The DOI insert is replayed, so the second copy fails as already attached.
    let first = batch.ops()[0].clone();
    batch.push(first);

    assert!(matches!(host.submit(&batch), Err(SclError::AlreadyAttached(_))));
    assert!(host.doc.children(xcbr).is_empty());
    assert!(host.accepted.is_empty());
}
