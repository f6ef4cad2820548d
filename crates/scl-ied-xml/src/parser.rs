// crates/scl-ied-xml/src/parser.rs

use crate::error::SclXmlError;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::{info, trace, warn};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use scl_ied::{Document, ElementId};

const ROOT_TAG: &str = "SCL";

/// An element whose end tag has not been read yet.
struct OpenElement {
    id: ElementId,
    tag: String,
    /// Text collected across split text, CDATA and entity events.
    text: String,
}

/// Parses an SCL (Substation Configuration Language) string slice into a
/// [`Document`].
///
/// Element tags are stored by their local name. Attribute keys keep their
/// qualified name, so `xsi:type` and `type` stay distinct.
///
/// # Errors
/// Returns an `SclXmlError` if the XML is malformed, the root element is not
/// `SCL`, or the input ends inside an element.
pub fn load_scl_from_str(xml_content: &str) -> Result<Document, SclXmlError> {
    let mut reader = Reader::from_str(xml_content);
    let mut doc: Option<Document> = None;
    let mut stack: Vec<OpenElement> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let open = open_element(&mut doc, &stack, &e, &reader)?;
                stack.push(open);
            }
            Event::Empty(e) => {
                let open = open_element(&mut doc, &stack, &e, &reader)?;
                close_element(&mut doc, open)?;
            }
            Event::End(_) => {
                // quick-xml already rejects mismatched end tags.
                if let Some(open) = stack.pop() {
                    close_element(&mut doc, open)?;
                }
            }
            Event::Text(e) => {
                if let Some(open) = stack.last_mut() {
                    let text = e.decode().map_err(quick_xml::Error::from)?;
                    open.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(open) = stack.last_mut() {
                    let text = e.decode().map_err(quick_xml::Error::from)?;
                    open.text.push_str(&text);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(open) = stack.last_mut() {
                    push_reference(&mut open.text, &e)?;
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and DOCTYPE carry no model data.
            _ => (),
        }
    }

    if let Some(open) = stack.last() {
        return Err(SclXmlError::UnexpectedEof(open.tag.clone()));
    }
    let doc = doc.ok_or(SclXmlError::EmptyDocument)?;
    info!("[XML] Loaded SCL document with {} elements", doc.len());
    Ok(doc)
}

/// Creates the element for a start (or empty) tag and links it below the
/// innermost open element.
fn open_element(
    doc: &mut Option<Document>,
    stack: &[OpenElement],
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<OpenElement, SclXmlError> {
    let local = e.local_name();
    let tag = core::str::from_utf8(local.as_ref())?;

    let id = match doc.as_mut() {
        None => {
            if tag != ROOT_TAG {
                return Err(SclXmlError::NotScl(tag.to_string()));
            }
            doc.insert(Document::new(ROOT_TAG)).root()
        }
        Some(document) => {
            let parent = stack
                .last()
                .ok_or_else(|| SclXmlError::MultipleRoots(tag.to_string()))?;
            let id = document.create_element(tag);
            document.append_child(parent.id, id)?;
            id
        }
    };
    let document = doc.as_mut().ok_or(SclXmlError::EmptyDocument)?;

    for attr in e.attributes() {
        let attr = attr?;
        let key = core::str::from_utf8(attr.key.as_ref())?;
        let value = attr.decode_and_unescape_value(reader.decoder())?;
        document.set_attribute(id, key, &value)?;
    }
    trace!("[XML] <{}> as {}", tag, id);

    Ok(OpenElement {
        id,
        tag: tag.to_string(),
        text: String::new(),
    })
}

/// Stores the collected text of an element; whitespace-only text is dropped.
fn close_element(doc: &mut Option<Document>, open: OpenElement) -> Result<(), SclXmlError> {
    let text = open.text.trim();
    if text.is_empty() {
        return Ok(());
    }
    if let Some(document) = doc.as_mut() {
        document.set_text(open.id, text)?;
    }
    Ok(())
}

/// Appends the replacement text of an entity or character reference.
fn push_reference(text: &mut String, e: &BytesRef<'_>) -> Result<(), SclXmlError> {
    if let Some(ch) = e.resolve_char_ref()? {
        text.push(ch);
        return Ok(());
    }
    let name = e.decode().map_err(quick_xml::Error::from)?;
    match resolve_predefined_entity(&name) {
        Some(replacement) => {
            text.push_str(replacement);
            Ok(())
        }
        None => {
            warn!("[XML] Unknown entity '&{};'", name);
            Err(SclXmlError::UnknownEntity(name.to_string()))
        }
    }
}
