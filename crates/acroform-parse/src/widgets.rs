//! Widget geometry extraction.
//!
//! Enumerates every `/Widget` annotation on every page, in page order and
//! then `/Annots` order, without deduplication. Malformed pages and
//! annotations are skipped with a warning.

use std::collections::HashMap;

use acroform_core::{
    DetectOptions, ExtractResult, ExtractWarning, RawFieldKind, WarningCode, WidgetGeometry,
};
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, warn};

use crate::document::{
    FormDocument, as_dict, dict_get, dict_rect, dict_text, field_inherited, name_str,
};

/// All widgets of a document plus the first widget seen for each name.
#[derive(Debug, Clone, Default)]
pub struct WidgetIndex {
    pub widgets: Vec<WidgetGeometry>,
    /// Field name to index into `widgets` of its first widget.
    pub first_by_name: HashMap<String, usize>,
}

impl WidgetIndex {
    pub fn new(widgets: Vec<WidgetGeometry>) -> Self {
        let mut first_by_name = HashMap::new();
        for (i, widget) in widgets.iter().enumerate() {
            first_by_name.entry(widget.field_name.clone()).or_insert(i);
        }
        Self {
            widgets,
            first_by_name,
        }
    }

    /// The first widget carrying `name`.
    pub fn first(&self, name: &str) -> Option<&WidgetGeometry> {
        self.first_by_name.get(name).map(|&i| &self.widgets[i])
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

/// Whether a dictionary is a widget annotation.
pub(crate) fn is_widget(doc: &Document, dict: &Dictionary) -> bool {
    dict_get(doc, dict, b"Subtype").and_then(name_str).as_deref() == Some("Widget")
}

/// Fully qualified field name of a widget or field dictionary.
///
/// Partial names (`/T`) along the `/Parent` chain are joined with `.`,
/// outermost first. Returns `None` when no level has a name.
pub(crate) fn qualified_name(doc: &Document, dict: &Dictionary, max_depth: usize) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = Some(dict);
    let mut depth = 0;
    while let Some(node) = current {
        if depth > max_depth {
            break;
        }
        if let Some(part) = dict_text(doc, node, b"T").filter(|t| !t.is_empty()) {
            parts.push(part);
        }
        current = node.get(b"Parent").ok().and_then(|p| as_dict(doc, p));
        depth += 1;
    }
    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join("."))
}

/// Declared `/FT` of a widget or field, inherited through `/Parent`.
pub(crate) fn raw_kind(doc: &Document, dict: &Dictionary, max_depth: usize) -> Option<RawFieldKind> {
    field_inherited(doc, dict, b"FT", max_depth)
        .and_then(name_str)
        .and_then(|name| RawFieldKind::from_pdf_name(&name))
}

/// `/Ff` of a widget or field, inherited through `/Parent`.
pub(crate) fn inherited_flags(doc: &Document, dict: &Dictionary, max_depth: usize) -> u32 {
    match field_inherited(doc, dict, b"Ff", max_depth) {
        Some(Object::Integer(n)) => *n as u32,
        _ => 0,
    }
}

/// The `/Annots` entries of a page, references left unresolved.
pub(crate) fn page_annotations<'a>(doc: &'a Document, page_dict: &'a Dictionary) -> &'a [Object] {
    dict_get(doc, page_dict, b"Annots")
        .and_then(|obj| obj.as_array().ok())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Enumerate every widget annotation in the document.
pub fn extract_widgets(doc: &FormDocument, options: &DetectOptions) -> ExtractResult<WidgetIndex> {
    let inner = doc.inner();
    let mut widgets = Vec::new();
    let mut warnings = Vec::new();

    for (page_index, &page_id) in doc.page_ids().iter().enumerate() {
        let page = u32::try_from(page_index + 1).unwrap_or(u32::MAX);
        let page_dict = match inner.get_object(page_id).and_then(|o| o.as_dict()) {
            Ok(dict) => dict,
            Err(e) => {
                warn!(page, error = %e, "skipping unreadable page");
                warnings.push(
                    ExtractWarning::new(WarningCode::MalformedAnnotation, format!("unreadable page: {e}"))
                        .on_page(page),
                );
                continue;
            }
        };
        let page_height = doc.page_height(page_id);

        for annot in page_annotations(inner, page_dict) {
            let Some(dict) = as_dict(inner, annot) else {
                debug!(page, "skipping annotation that is not a dictionary");
                warnings.push(
                    ExtractWarning::new(WarningCode::MalformedAnnotation, "annotation is not a dictionary")
                        .on_page(page),
                );
                continue;
            };
            if !is_widget(inner, dict) {
                continue;
            }
            let widget_index = widgets.len();
            let field_name = qualified_name(inner, dict, options.max_field_depth)
                .or_else(|| dict_text(inner, dict, b"NM").filter(|n| !n.is_empty()))
                .unwrap_or_else(|| format!("widget_{widget_index}"));
            let Some(rect) = dict_rect(inner, dict) else {
                debug!(page, field = %field_name, "skipping widget without /Rect");
                warnings.push(
                    ExtractWarning::new(WarningCode::MalformedAnnotation, "widget has no readable /Rect")
                        .for_field(&field_name)
                        .on_page(page),
                );
                continue;
            };
            widgets.push(WidgetGeometry {
                page,
                rect,
                raw_kind: raw_kind(inner, dict, options.max_field_depth),
                flags: inherited_flags(inner, dict, options.max_field_depth),
                field_name,
                widget_index,
                page_height,
            });
        }
    }

    debug!(widgets = widgets.len(), "widget scan complete");
    ExtractResult::with_warnings(WidgetIndex::new(widgets), warnings)
}
