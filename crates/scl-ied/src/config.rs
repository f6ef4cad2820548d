// crates/scl-ied/src/config.rs

use crate::constants::{DEFAULT_SEARCH_DEBOUNCE_US, SEARCH_ATTRIBUTES};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Tunables of an editor session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EditorConfig {
    /// Quiescence window of the search input, in microseconds.
    pub search_debounce_us: u64,
    /// Attributes scanned for search matches.
    pub search_attributes: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            search_debounce_us: DEFAULT_SEARCH_DEBOUNCE_US,
            search_attributes: SEARCH_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
        }
    }
}
