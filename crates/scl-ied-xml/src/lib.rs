// src/lib.rs

#![no_std]
#![doc = "Loads IEC 61850 SCL (Substation Configuration Language) files into the"]
#![doc = "`scl-ied` element model."]
#![doc = ""]
#![doc = "This `no_std + alloc` library walks the file with `quick-xml`'s event reader"]
#![doc = "and builds a `scl_ied::Document` the editing engine can resolve and edit."]

extern crate alloc;

// --- Crate Modules ---

mod error;
mod parser;

// --- Public API Re-exports ---

pub use error::SclXmlError;
pub use parser::load_scl_from_str;
