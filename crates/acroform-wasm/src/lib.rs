//! WebAssembly/JavaScript bindings for acroform-rs.
//!
//! Exposes field detection, filling and page transcripts to JavaScript via
//! wasm-bindgen. Field lists and transcripts cross the boundary as plain
//! objects through serde_wasm_bindgen.

use std::collections::HashMap;

use wasm_bindgen::prelude::*;

use acroform::{FieldDescriptor, FieldValue, FillOptions, FormPdf, PageText, TranscriptOptions};

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// Detect the fields of a form (Uint8Array in JavaScript), in reading order.
#[wasm_bindgen(js_name = "detectFields")]
pub fn detect_fields(data: &[u8]) -> Result<JsValue, JsError> {
    let fields = acroform::detect_fields(data).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&fields).map_err(js_err)
}

/// Fill a form and return the new document bytes.
///
/// `values` maps field names to strings or booleans.
#[wasm_bindgen(js_name = "fillForm")]
pub fn fill_form(
    data: &[u8],
    values: JsValue,
    flatten: Option<bool>,
) -> Result<Vec<u8>, JsError> {
    let values: HashMap<String, FieldValue> =
        serde_wasm_bindgen::from_value(values).map_err(js_err)?;
    let options = FillOptions {
        flatten: flatten.unwrap_or(false),
    };
    acroform::fill_form(data, &values, &options).map_err(js_err)
}

/// Per-page transcripts with markers for `fields`, as returned by
/// `detectFields`.
#[wasm_bindgen(js_name = "extractPageText")]
pub fn extract_page_text(data: &[u8], fields: JsValue) -> Result<JsValue, JsError> {
    let fields: Vec<FieldDescriptor> = serde_wasm_bindgen::from_value(fields).map_err(js_err)?;
    let pages = acroform::extract_page_text(data, &fields).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&pages).map_err(js_err)
}

/// A form opened once for repeated queries (WASM binding).
///
/// # JavaScript Usage
///
/// ```js
/// const form = WasmForm.open(pdfBytes);
/// const fields = form.detectFields();
/// for (const page of form.pageTexts()) console.log(page.text);
/// ```
#[wasm_bindgen]
pub struct WasmForm {
    inner: FormPdf,
    fields: Vec<FieldDescriptor>,
}

#[wasm_bindgen]
impl WasmForm {
    /// Open a form from raw bytes and detect its fields.
    pub fn open(data: &[u8]) -> Result<WasmForm, JsError> {
        let inner = FormPdf::open(data, None).map_err(js_err)?;
        let fields = inner.detect_fields().value;
        Ok(WasmForm { inner, fields })
    }

    #[wasm_bindgen(getter, js_name = "pageCount")]
    pub fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    #[wasm_bindgen(getter, js_name = "fieldCount")]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The detected fields as an array of objects.
    #[wasm_bindgen(js_name = "detectFields")]
    pub fn detect_fields(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.fields).map_err(js_err)
    }

    /// Transcripts of every page, marking the detected fields.
    #[wasm_bindgen(js_name = "pageTexts")]
    pub fn page_texts(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.transcripts()).map_err(js_err)
    }
}

impl WasmForm {
    fn transcripts(&self) -> Vec<PageText> {
        self.inner
            .page_texts(&self.fields, TranscriptOptions::default())
            .collect()
    }
}
