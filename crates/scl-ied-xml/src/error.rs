// crates/scl-ied-xml/src/error.rs

use alloc::fmt;
use alloc::string::String;
use core::str::Utf8Error;
use quick_xml::Error as XmlError;
use quick_xml::events::attributes::AttrError;
use scl_ied::SclError;

/// Errors that can occur while loading an SCL file.
#[derive(Debug)]
pub enum SclXmlError {
    /// An error from the underlying `quick-xml` reader (e.g., mismatched end tag).
    Xml(XmlError),

    /// A malformed attribute (e.g., missing quotes or duplicates).
    Attribute(AttrError),

    /// A tag or attribute name was not valid UTF-8.
    Utf8(Utf8Error),

    /// The element model rejected a construction step.
    Core(SclError),

    /// The root element is not `SCL`.
    NotScl(String),

    /// A second top-level element follows the `SCL` root.
    MultipleRoots(String),

    /// The input holds no element at all.
    EmptyDocument,

    /// The input ended while the named element was still open.
    UnexpectedEof(String),

    /// An entity reference that is neither predefined nor a character reference.
    UnknownEntity(String),
}

impl From<XmlError> for SclXmlError {
    fn from(e: XmlError) -> Self {
        SclXmlError::Xml(e)
    }
}

impl From<AttrError> for SclXmlError {
    fn from(e: AttrError) -> Self {
        SclXmlError::Attribute(e)
    }
}

impl From<Utf8Error> for SclXmlError {
    fn from(e: Utf8Error) -> Self {
        SclXmlError::Utf8(e)
    }
}

impl From<SclError> for SclXmlError {
    fn from(e: SclError) -> Self {
        SclXmlError::Core(e)
    }
}

impl fmt::Display for SclXmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SclXmlError::Xml(e) => write!(f, "XML parsing error: {}", e),
            SclXmlError::Attribute(e) => write!(f, "Malformed attribute: {}", e),
            SclXmlError::Utf8(e) => write!(f, "Invalid UTF-8 in name: {}", e),
            SclXmlError::Core(e) => write!(f, "Element model error: {}", e),
            SclXmlError::NotScl(tag) => {
                write!(f, "Root element is <{}>, expected <SCL>", tag)
            }
            SclXmlError::MultipleRoots(tag) => {
                write!(f, "Unexpected top-level element <{}> after the SCL root", tag)
            }
            SclXmlError::EmptyDocument => write!(f, "The document holds no element"),
            SclXmlError::UnexpectedEof(tag) => {
                write!(f, "Input ended inside <{}>", tag)
            }
            SclXmlError::UnknownEntity(name) => write!(f, "Unknown entity '&{};'", name),
        }
    }
}

impl core::error::Error for SclXmlError {}
