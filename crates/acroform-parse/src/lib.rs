//! acroform-parse: lopdf-backed readers and writer for AcroForms.
//!
//! This crate opens documents with [`lopdf`] and implements the passes that
//! touch PDF objects: widget geometry ([`extract_widgets`]), the structural
//! field tree ([`read_fields`]), page text runs for label search
//! ([`page_text_runs`]) and form filling ([`fill_document`]). It depends on
//! acroform-core for shared data types.

pub mod cmap;
pub mod document;
pub mod error;
pub mod fields;
pub mod fill;
pub mod text_runs;
pub mod widgets;

pub use acroform_core;
pub use cmap::CMap;
pub use document::{DEFAULT_PAGE_HEIGHT, FormDocument, decode_pdf_string, encode_pdf_string};
pub use error::BackendError;
pub use fields::{ChoiceOption, StructuralField, read_fields};
pub use fill::{FilledForm, fill_document, is_truthy};
pub use text_runs::page_text_runs;
pub use widgets::{WidgetIndex, extract_widgets};
