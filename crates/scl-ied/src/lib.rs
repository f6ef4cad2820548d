#![cfg_attr(not(feature = "std"), no_std)]


// 'alloc' is used for dynamic allocation (element arena, strings, batches)
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod constants;
pub mod hal;
pub mod edit;
pub mod config;
mod log;

// --- Element Model ---
pub mod document;

// --- Template / Instance Resolution ---
pub mod template;
pub mod instance;
pub mod instantiate;
pub mod setting_group;

// --- Editing Session ---
pub mod search;
pub mod editor;

// --- Top-level Exports ---
pub use types::{ContainerTag, ElementId, PathStep};
pub use hal::{EditSink, SclError};
pub use edit::{EditBatch, EditOp};
pub use config::EditorConfig;
pub use document::{ChildIndex, Document};
pub use template::{DataModel, ModelEntry, TemplateCache, TemplateCatalog, resolve};
pub use instance::{InstanceMap, Values, match_instances};
pub use instantiate::{Instantiation, find_instance_to_remove, instantiate_path};
pub use setting_group::{SettingGroups, ValueLayout};
pub use search::{Debouncer, RenderFilter, search};
pub use editor::{EditorAction, EditorView, IedEditor, LnState, ied_names};
