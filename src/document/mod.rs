//! Structured SDF document model.
//!
//! A [`Document`] holds the recognized header items and, per cell type and
//! instance, the timing entries of that instance. Entries are tagged records
//! keyed by an [`EntryKey`] derived from their kind and pins. The model is
//! produced by [`Document::from_ast`] and is plain value data afterwards.

mod builder;
mod types;
mod validate;

pub use types::*;
pub use validate::validate_document;
