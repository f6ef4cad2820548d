use crate::constants;
use alloc::string::String;
use core::fmt;

/// A handle to an element stored in a [`crate::document::Document`] arena.
///
/// Handles stay valid for the lifetime of the document, including for elements
/// that have been created but not yet attached, or removed by an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The three instance container tags that mirror template members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ContainerTag {
    /// `DOI`, instance of a `DO`.
    Doi,
    /// `SDI`, instance of an `SDO` (or a structured `BDA`/`DA` below a `DOI`).
    Sdi,
    /// `DAI`, instance of a `DA` or `BDA` leaf.
    Dai,
}

impl ContainerTag {
    /// The XML tag name of this container.
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerTag::Doi => constants::TAG_DOI,
            ContainerTag::Sdi => constants::TAG_SDI,
            ContainerTag::Dai => constants::TAG_DAI,
        }
    }

    /// Parses a tag name into a container tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            constants::TAG_DOI => Some(ContainerTag::Doi),
            constants::TAG_SDI => Some(ContainerTag::Sdi),
            constants::TAG_DAI => Some(ContainerTag::Dai),
            _ => None,
        }
    }

    /// Returns `true` if the given tag names one of the instance containers.
    pub fn is_container(tag: &str) -> bool {
        Self::from_tag(tag).is_some()
    }
}

impl fmt::Display for ContainerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named step of an instantiation path below a logical node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PathStep {
    /// The `name` attribute shared by the template member and its instance.
    pub name: String,
    /// The container tag to create when the step is missing.
    pub tag: ContainerTag,
}

impl PathStep {
    pub fn new(name: impl Into<String>, tag: ContainerTag) -> Self {
        Self {
            name: name.into(),
            tag,
        }
    }
}

/// Parses a numeric SCL attribute (`numOfSGs`, `actSG`, `sGroup`, `ord`).
///
/// Absent, empty or malformed values yield 0.
pub fn parse_u32_or_zero(value: Option<&str>) -> u32 {
    value
        .map(str::trim)
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_tag_roundtrip_names() {
        assert_eq!(ContainerTag::from_tag("DOI"), Some(ContainerTag::Doi));
        assert_eq!(ContainerTag::from_tag("SDI"), Some(ContainerTag::Sdi));
        assert_eq!(ContainerTag::from_tag("DAI"), Some(ContainerTag::Dai));
        assert_eq!(ContainerTag::from_tag("Val"), None);
        assert_eq!(ContainerTag::Sdi.as_str(), "SDI");
        assert!(ContainerTag::is_container("DAI"));
        assert!(!ContainerTag::is_container("LN"));
    }

    #[test]
    fn test_parse_u32_or_zero_defaults() {
        assert_eq!(parse_u32_or_zero(Some("3")), 3);
        assert_eq!(parse_u32_or_zero(Some(" 2 ")), 2);
        assert_eq!(parse_u32_or_zero(Some("two")), 0);
        assert_eq!(parse_u32_or_zero(Some("-1")), 0);
        assert_eq!(parse_u32_or_zero(Some("")), 0);
        assert_eq!(parse_u32_or_zero(None), 0);
    }
}
