//! # SDF Timing
//!
//! A reader and canonical writer for the Standard Delay Format (SDF).
//!
//! This library provides:
//! - A grammar-based parser turning SDF text into a structured document
//! - A document model keyed by cell type, instance and timing entry
//! - A writer producing deterministic, canonical SDF text
//! - JSON interchange of documents through serde
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`sdf`] - Lexer, expression parser and grammar parser
//! - [`document`] - Document model, builder and validation
//! - [`writer`] - Canonical SDF emission
//! - [`files`] - File handling (CLI only)
//!
//! ## Usage
//!
//! ```
//! use sdf_timing::{emit, parse, EmitOptions};
//!
//! let doc = parse(r#"(DELAYFILE (SDFVERSION "3.0") (TIMESCALE 100ps))"#).unwrap();
//! let text = emit(&doc, &EmitOptions::default());
//! assert_eq!(text, "(DELAYFILE\n  (SDFVERSION \"3.0\")\n  (TIMESCALE 100 ps)\n)");
//! ```
//!
//! ### Native CLI
//!
//! ```bash
//! sdftool reformat --dir out/ design.sdf
//! sdftool to-json --indent 2 design.sdf > design.json
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { reformat } from 'sdf_timing';
//!
//! const canonical = reformat(sdfText, 2);
//! ```

pub mod document;
pub mod error;
pub mod sdf;
pub mod writer;

#[cfg(feature = "cli")]
pub mod files;

// Re-export main types for convenience
pub use document::{validate_document, Document, Entry, EntryKey, EntryKind, Family, Triple};
pub use error::{Result, SdfError};
pub use writer::{emit, EmitOptions};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse SDF text into a document.
pub fn parse(text: &str) -> Result<Document> {
    let ast = sdf::parse(text)?;
    Document::from_ast(ast)
}
