//! acroform: Detect, label and fill the fields of PDF forms.
//!
//! This is the public API facade crate for acroform-rs. It re-exports types
//! from acroform-core and uses acroform-parse for reading and writing PDFs.
//!
//! # Architecture
//!
//! - **acroform-core**: Backend-independent data model and algorithms
//! - **acroform-parse**: lopdf-backed widget, field and text readers plus the filler
//! - **acroform** (this crate): Public API that ties everything together
//!
//! # Example
//!
//! ```ignore
//! let fields = acroform::detect_fields(&bytes)?;
//! let mut values = HashMap::new();
//! values.insert("applicant_name".to_string(), FieldValue::Text("Ada".into()));
//! let filled = acroform::fill_form(&bytes, &values, &FillOptions::default())?;
//! ```

mod form;
mod page_text;

use std::collections::HashMap;

pub use acroform_core;
pub use acroform_core::{
    BBox, DetectOptions, EntityStore, ExtractResult, ExtractWarning, FieldDescriptionService,
    FieldDescriptor, FieldKind, FieldPosition, FieldValue, FillOptions, FillReport, FormError,
    MetadataSource, PageDescription, PageImage, PageText, TextRun, TranscriptOptions, WarningCode,
    is_reading_order, sort_reading_order,
};
pub use acroform_parse;
pub use acroform_parse::{FilledForm, is_truthy};
pub use form::FormPdf;
pub use page_text::PageTexts;

/// Detect every field of the form in `bytes`, in reading order.
///
/// Per-field problems are logged and dropped; use [`detect_fields_with`]
/// to receive them. Only a document that cannot be parsed is an error.
pub fn detect_fields(bytes: &[u8]) -> Result<Vec<FieldDescriptor>, FormError> {
    Ok(detect_fields_with(bytes, &DetectOptions::default())?.value)
}

/// Detect fields with explicit thresholds, keeping the warnings.
pub fn detect_fields_with(
    bytes: &[u8],
    options: &DetectOptions,
) -> Result<ExtractResult<Vec<FieldDescriptor>>, FormError> {
    let pdf = FormPdf::open(bytes, Some(options.clone()))?;
    Ok(pdf.detect_fields())
}

/// Fill the form in `bytes` and return the new document.
///
/// Fields missing from `values` keep their current value. Fields that
/// cannot be written are logged and left untouched.
pub fn fill_form(
    bytes: &[u8],
    values: &HashMap<String, FieldValue>,
    options: &FillOptions,
) -> Result<Vec<u8>, FormError> {
    Ok(fill_form_with_report(bytes, values, options)?.value.bytes)
}

/// Fill the form and report what was written.
pub fn fill_form_with_report(
    bytes: &[u8],
    values: &HashMap<String, FieldValue>,
    options: &FillOptions,
) -> Result<ExtractResult<FilledForm>, FormError> {
    Ok(acroform_parse::fill_document(bytes, values, options)?)
}

/// Per-page transcripts of `bytes` with markers for `fields`.
///
/// `fields` is normally the output of [`detect_fields`].
pub fn extract_page_text(
    bytes: &[u8],
    fields: &[FieldDescriptor],
) -> Result<Vec<PageText>, FormError> {
    let pdf = FormPdf::open(bytes, None)?;
    Ok(pdf
        .page_texts(fields, TranscriptOptions::default())
        .collect())
}

/// Detect fields of several documents in parallel.
///
/// Results come back in input order; one unreadable document does not
/// affect the others.
#[cfg(feature = "parallel")]
pub fn detect_fields_batch<B>(
    documents: &[B],
    options: &DetectOptions,
) -> Vec<Result<Vec<FieldDescriptor>, FormError>>
where
    B: AsRef<[u8]> + Sync,
{
    use rayon::prelude::*;

    documents
        .par_iter()
        .map(|bytes| detect_fields_with(bytes.as_ref(), options).map(|result| result.value))
        .collect()
}

