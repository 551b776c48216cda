//! WASM bindings for SDF Timing.
//!
//! This module provides JavaScript-friendly wrappers around [`crate::parse`]
//! and [`crate::emit`] for use in web tooling.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { reformat, sdf_to_json } from 'sdf_timing';
//!
//! await init();
//!
//! const canonical = reformat(sdfText, 2);
//! const doc = JSON.parse(sdf_to_json(sdfText));
//! ```

use wasm_bindgen::prelude::*;

use crate::writer::{emit, EmitOptions};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Parse SDF text and return it in canonical form.
///
/// # Arguments
/// * `sdf` - The SDF source text
/// * `indent_width` - Spaces per indentation level
#[wasm_bindgen]
pub fn reformat(sdf: &str, indent_width: usize) -> Result<String, JsValue> {
    let doc = crate::parse(sdf).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let options = EmitOptions::new().with_indent_width(indent_width);
    Ok(emit(&doc, &options))
}

/// Parse SDF text and return the document as JSON.
#[wasm_bindgen]
pub fn sdf_to_json(sdf: &str) -> Result<String, JsValue> {
    let doc = crate::parse(sdf).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&doc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    crate::VERSION.to_string()
}
