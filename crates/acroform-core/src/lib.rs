//! acroform-core: Backend-independent data types and algorithms.
//!
//! This crate provides the form data model ([`FieldDescriptor`],
//! [`WidgetGeometry`], [`FieldPosition`]) and the algorithms that work on it
//! without touching PDF bytes: label ranking, widget reconciliation,
//! reading-order sorting and page transcripts. The lopdf-backed readers
//! live in `acroform-parse`.

pub mod error;
pub mod form_field;
pub mod geometry;
pub mod label;
pub mod options;
pub mod reconcile;
pub mod services;
pub mod sort;
pub mod transcript;

pub use error::{ExtractResult, ExtractWarning, FormError, WarningCode};
pub use form_field::{
    FieldDescriptor, FieldKind, FieldPosition, FieldValue, MetadataSource, RawFieldKind,
    WidgetGeometry, field_flags,
};
pub use geometry::{BBox, Ctm, Point};
pub use label::{
    LabelMetadata, ResolvedLabel, TextRun, find_nearby_text, normalize_label, resolve_label,
};
pub use options::{CHECKBOX_MAX_SIZE, DetectOptions, FillOptions, FillReport, TranscriptOptions};
pub use reconcile::{
    SyntheticNamer, group_by_name, infer_widget_kind, orphan_widgets, reconcile_widgets,
};
pub use services::{EntityStore, FieldDescriptionService, PageDescription, PageImage};
pub use sort::{is_reading_order, line_bands, sort_reading_order};
pub use transcript::{PageText, build_page_text, is_box_glyph, unplaced_fields_line};
