use crate::edit::EditBatch;
use crate::types::ElementId;
use alloc::string::String;
use core::fmt;

/// Defines a portable, descriptive Error type for the SCL editing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SclError {
    /// An instantiation path without any step was requested.
    EmptyPath,
    /// The handle does not refer to an element of this document.
    ElementNotFound(ElementId),
    /// An insert named a node that is already part of the tree.
    AlreadyAttached(ElementId),
    /// An insert reference is not a child of the insert parent.
    NotAChild {
        parent: ElementId,
        reference: ElementId,
    },
    /// A remove named a node that is not attached to the tree.
    Detached(ElementId),
    /// The document root cannot be removed.
    RootRemoval,
    /// The element is not an `LN` or `LN0`.
    NotALogicalNode(ElementId),
    /// The path does not lead to a template leaf attribute.
    UnresolvedPath(String),
    /// The template marks the attribute as read-only.
    ReadOnly(String),
    /// No value exists for the given setting-group ordinal.
    MissingGroupValue(u32),
    /// The active setting group has no value to copy from.
    NoActiveGroup,
    /// The attribute is not kept per setting group.
    NotGrouped,
    /// No IED with the given name exists in the document.
    IedNotFound(String),
}

impl fmt::Display for SclError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "Cannot instantiate an empty path"),
            Self::ElementNotFound(id) => write!(f, "Element {} does not exist", id),
            Self::AlreadyAttached(id) => write!(f, "Element {} is already attached", id),
            Self::NotAChild { parent, reference } => write!(
                f,
                "Reference {} is not a child of parent {}",
                reference, parent
            ),
            Self::Detached(id) => write!(f, "Element {} is not attached to the document", id),
            Self::RootRemoval => write!(f, "The document root cannot be removed"),
            Self::NotALogicalNode(id) => write!(f, "Element {} is not a logical node", id),
            Self::UnresolvedPath(path) => write!(f, "No template attribute at path '{}'", path),
            Self::ReadOnly(path) => write!(f, "Attribute '{}' is read-only", path),
            Self::MissingGroupValue(ord) => write!(f, "No value for setting group {}", ord),
            Self::NoActiveGroup => write!(f, "The active setting group has no value"),
            Self::NotGrouped => write!(f, "The attribute is not kept per setting group"),
            Self::IedNotFound(name) => write!(f, "IED '{}' not found", name),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SclError {}

/// The outward edit channel towards the host document.
///
/// The engine never mutates the live instance tree itself. Every user action is
/// turned into one ordered [`EditBatch`] that the host applies atomically: either
/// every operation takes effect or none does.
pub trait EditSink {
    /// Applies one batch of operations as a single transaction.
    fn submit(&mut self, batch: &EditBatch) -> Result<(), SclError>;
}
