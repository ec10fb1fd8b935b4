//! Writing values into form fields.
//!
//! Values are written into the structural field objects: `/V` for every
//! kind, plus `/AS` on checkbox and radio widgets. Existing appearance
//! streams and `/MK` styling are never removed or regenerated; instead the
//! form's `/NeedAppearances` flag asks viewers to refresh stale
//! appearances. Flattening, when requested, runs on a copy of the filled
//! document and falls back to the interactive copy if it fails.

use std::collections::HashMap;

use acroform_core::{
    BBox, DetectOptions, ExtractResult, ExtractWarning, FieldKind, FieldValue, FillOptions,
    FillReport, RawFieldKind, WarningCode,
};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::{debug, info, warn};

use crate::document::{
    FormDocument, as_dict, dict_get, dict_rect, encode_pdf_string, extract_bbox_from_array,
    get_page_resources, name_str, resolve,
};
use crate::error::BackendError;
use crate::fields::{StructuralField, read_fields};
use crate::widgets::is_widget;

/// Export value used for checkboxes whose widgets declare no on-state.
const DEFAULT_EXPORT_VALUE: &str = "Yes";

/// Font size bounds for flattened text.
const MIN_FONT_SIZE: f64 = 4.0;
const MAX_FONT_SIZE: f64 = 12.0;

/// Left padding for flattened text in non-comb fields.
const TEXT_PADDING: f64 = 2.0;

/// Resource name of the Helvetica font used by flattened text.
const FLATTEN_FONT: &str = "Helv";

/// The filled document and what happened while filling it.
#[derive(Debug, Clone)]
pub struct FilledForm {
    pub bytes: Vec<u8>,
    pub report: FillReport,
    /// Whether the returned bytes are flattened.
    pub flattened: bool,
}

/// Whether a fill value checks a checkbox.
///
/// `true`, or the strings `"true"` and `"on"` in any ASCII case.
pub fn is_truthy(value: &FieldValue) -> bool {
    match value {
        FieldValue::Checked(checked) => *checked,
        FieldValue::Text(text) => {
            let text = text.trim();
            text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("on")
        }
    }
}

enum Written {
    Value,
    Nothing,
}

/// Fill the form in `bytes` with `values`, keyed by qualified field name.
///
/// Fails only when the document cannot be opened or serialized. Fields
/// that cannot be written are counted in [`FillReport::failed`] and
/// reported as [`WarningCode::Write`] warnings; a failed flatten yields a
/// [`WarningCode::Flatten`] warning and the interactive document.
pub fn fill_document(
    bytes: &[u8],
    values: &HashMap<String, FieldValue>,
    options: &FillOptions,
) -> Result<ExtractResult<FilledForm>, BackendError> {
    let mut doc = FormDocument::open(bytes)?;
    let detect = DetectOptions::default();
    let fields = read_fields(&doc, &detect).value;

    let mut report = FillReport::default();
    let mut warnings = Vec::new();

    for field in &fields {
        let Some(value) = values.get(&field.name) else {
            report.skipped += 1;
            continue;
        };
        match write_field(doc.inner_mut(), field, value) {
            Ok(Written::Value) => report.filled += 1,
            Ok(Written::Nothing) => report.skipped += 1,
            Err(e) => {
                warn!(field = %field.name, error = %e, "failed to write field");
                report.failed += 1;
                warnings.push(
                    ExtractWarning::new(WarningCode::Write, e.to_string()).for_field(&field.name),
                );
            }
        }
    }

    let unknown = values
        .keys()
        .filter(|name| !fields.iter().any(|f| &f.name == *name))
        .count();
    if unknown > 0 {
        debug!(unknown, "fill values name fields the form does not have");
    }

    if let Err(e) = set_need_appearances(doc.inner_mut()) {
        warn!(error = %e, "could not set /NeedAppearances");
    }
    info!(
        filled = report.filled,
        skipped = report.skipped,
        failed = report.failed,
        "form filled"
    );

    let (mut output, flattened) = if options.flatten {
        flatten_or_keep(doc, &mut warnings)
    } else {
        (doc.into_inner(), false)
    };

    let mut bytes = Vec::new();
    output
        .save_to(&mut bytes)
        .map_err(|e| BackendError::Write(format!("failed to serialize PDF: {e}")))?;

    Ok(ExtractResult::with_warnings(
        FilledForm {
            bytes,
            report,
            flattened,
        },
        warnings,
    ))
}

/// Flatten a copy of the filled document.
///
/// On failure the interactive document is returned unchanged and a
/// [`WarningCode::Flatten`] warning is recorded.
fn flatten_or_keep(doc: FormDocument, warnings: &mut Vec<ExtractWarning>) -> (Document, bool) {
    let fields = read_fields(&doc, &DetectOptions::default()).value;
    let mut copy = doc.inner().clone();
    match flatten(&mut copy, doc.page_ids(), &fields) {
        Ok(widgets) => {
            debug!(widgets, "form flattened");
            (copy, true)
        }
        Err(e) => {
            warn!(error = %e, "flatten failed, keeping interactive form");
            warnings.push(ExtractWarning::new(WarningCode::Flatten, e.to_string()));
            (doc.into_inner(), false)
        }
    }
}

fn write_field(
    doc: &mut Document,
    field: &StructuralField,
    value: &FieldValue,
) -> Result<Written, BackendError> {
    let Some(field_id) = field.object_id else {
        return Err(BackendError::Write(
            "field is an inline dictionary and cannot be updated".to_string(),
        ));
    };
    match (field.raw_kind, field.kind) {
        (None, _) => Err(BackendError::Write("field has no usable /FT".to_string())),
        (_, FieldKind::Text) => write_text(doc, field, field_id, &value.to_string()),
        (_, FieldKind::Checkbox) => write_checkbox(doc, field, field_id, is_truthy(value)),
        (Some(RawFieldKind::Button), FieldKind::Radio) => {
            write_radio(doc, field, field_id, &value.to_string())
        }
        (_, FieldKind::Select | FieldKind::Radio) => {
            write_choice(doc, field, field_id, &value.to_string())
        }
    }
}

fn write_text(
    doc: &mut Document,
    field: &StructuralField,
    field_id: ObjectId,
    text: &str,
) -> Result<Written, BackendError> {
    let length = text.chars().count();
    let value = match field.max_len {
        Some(max) if length > max && field.is_comb() => {
            debug!(field = %field.name, max, length, "truncating value to comb length");
            text.chars().take(max).collect()
        }
        Some(max) if length > max => {
            return Err(BackendError::Write(format!(
                "value has {length} characters, field allows {max}"
            )));
        }
        _ => text.to_string(),
    };
    dict_mut(doc, field_id)?.set("V", encode_pdf_string(&value));
    Ok(Written::Value)
}

fn write_checkbox(
    doc: &mut Document,
    field: &StructuralField,
    field_id: ObjectId,
    checked: bool,
) -> Result<Written, BackendError> {
    let export = field
        .on_states
        .first()
        .map_or(DEFAULT_EXPORT_VALUE, String::as_str);
    let state = if checked { export } else { "Off" };
    dict_mut(doc, field_id)?.set("V", Object::Name(state.as_bytes().to_vec()));

    for &widget_id in &field.widget_ids {
        let widget_state = if checked {
            widget_on_states(doc, widget_id)
                .into_iter()
                .next()
                .unwrap_or_else(|| export.to_string())
        } else {
            "Off".to_string()
        };
        dict_mut(doc, widget_id)?.set("AS", Object::Name(widget_state.into_bytes()));
    }
    Ok(Written::Value)
}

fn write_radio(
    doc: &mut Document,
    field: &StructuralField,
    field_id: ObjectId,
    option: &str,
) -> Result<Written, BackendError> {
    if option.is_empty() {
        return Ok(Written::Nothing);
    }
    if !field.on_states.iter().any(|state| state == option) {
        return Err(BackendError::Write(format!(
            "no widget has an appearance state named {option:?}"
        )));
    }
    dict_mut(doc, field_id)?.set("V", Object::Name(option.as_bytes().to_vec()));
    for &widget_id in &field.widget_ids {
        let declares = widget_on_states(doc, widget_id).iter().any(|s| s == option);
        let state = if declares { option } else { "Off" };
        dict_mut(doc, widget_id)?.set("AS", Object::Name(state.as_bytes().to_vec()));
    }
    Ok(Written::Value)
}

/// Select a combo or list box option by display text or export value.
fn write_choice(
    doc: &mut Document,
    field: &StructuralField,
    field_id: ObjectId,
    option: &str,
) -> Result<Written, BackendError> {
    if option.is_empty() {
        return Ok(Written::Nothing);
    }
    let export = field
        .choices
        .iter()
        .find(|c| c.display == option)
        .or_else(|| field.choices.iter().find(|c| c.export == option))
        .map(|c| c.export.as_str());
    let export = match export {
        Some(export) => export,
        None if field.choices.is_empty()
            || field.flags & acroform_core::field_flags::EDIT != 0 =>
        {
            option
        }
        None => {
            return Err(BackendError::Write(format!("{option:?} is not one of the options")));
        }
    };
    let dict = dict_mut(doc, field_id)?;
    dict.set("V", encode_pdf_string(export));
    // Selected indices would contradict the new value.
    dict.remove(b"I");
    Ok(Written::Value)
}

/// Mutable dictionary of an object, including a stream's dictionary.
fn dict_mut(doc: &mut Document, id: ObjectId) -> Result<&mut Dictionary, BackendError> {
    match doc.get_object_mut(id) {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        Ok(Object::Stream(stream)) => Ok(&mut stream.dict),
        Ok(_) => Err(BackendError::Write(format!(
            "object {} {} is not a dictionary",
            id.0, id.1
        ))),
        Err(e) => Err(BackendError::Write(format!(
            "object {} {} is missing: {e}",
            id.0, id.1
        ))),
    }
}

/// The non-`Off` normal appearance states of one widget.
fn widget_on_states(doc: &Document, widget_id: ObjectId) -> Vec<String> {
    doc.get_object(widget_id)
        .ok()
        .and_then(|obj| as_dict(doc, obj))
        .and_then(|widget| normal_appearances(doc, widget))
        .map(|normal| {
            normal
                .iter()
                .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
                .filter(|state| state != "Off")
                .collect()
        })
        .unwrap_or_default()
}

/// The `/AP /N` entry of a widget when it is a dictionary of states.
fn normal_appearances<'a>(doc: &'a Document, widget: &'a Dictionary) -> Option<&'a Dictionary> {
    let ap = dict_get(doc, widget, b"AP").and_then(|ap| as_dict(doc, ap))?;
    match dict_get(doc, ap, b"N")? {
        Object::Dictionary(states) => Some(states),
        _ => None,
    }
}

fn catalog_id(doc: &Document) -> Result<ObjectId, BackendError> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| BackendError::Write(format!("trailer has no /Root reference: {e}")))
}

/// Set `/NeedAppearances true` on the interactive form, wherever it lives.
fn set_need_appearances(doc: &mut Document) -> Result<(), BackendError> {
    let root = catalog_id(doc)?;
    let entry = dict_mut(doc, root)?.get(b"AcroForm").ok().cloned();
    match entry {
        Some(Object::Reference(id)) => {
            dict_mut(doc, id)?.set("NeedAppearances", true);
        }
        Some(Object::Dictionary(_)) => {
            if let Ok(Object::Dictionary(form)) = dict_mut(doc, root)?.get_mut(b"AcroForm") {
                form.set("NeedAppearances", true);
            }
        }
        _ => {}
    }
    Ok(())
}

/// One thing to paint in place of a widget.
enum Paint {
    Text {
        rect: BBox,
        text: String,
        /// Cell count of a comb field.
        comb: Option<usize>,
    },
    Appearance {
        rect: BBox,
        stream_id: ObjectId,
        bbox: BBox,
    },
}

/// Bake widget values into page content and drop interactivity.
///
/// Text-like fields are drawn with Helvetica. Other widgets, checked
/// checkboxes and radios included, are drawn by invoking their current
/// normal appearance stream, which keeps their styling. Returns the
/// number of widgets removed.
fn flatten(
    doc: &mut Document,
    page_ids: &[ObjectId],
    fields: &[StructuralField],
) -> Result<usize, BackendError> {
    let owners: HashMap<ObjectId, &StructuralField> = fields
        .iter()
        .flat_map(|f| f.widget_ids.iter().map(move |&id| (id, f)))
        .collect();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut removed = 0;
    for &page_id in page_ids {
        let plan = plan_page(doc, page_id, &owners)?;
        removed += plan.removed;
        if !plan.paints.is_empty() {
            paint_page(doc, page_id, font_id, &plan.paints)?;
        }
        let page = dict_mut(doc, page_id)?;
        if plan.kept.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", plan.kept);
        }
    }

    let root = catalog_id(doc)?;
    dict_mut(doc, root)?.remove(b"AcroForm");
    Ok(removed)
}

struct PagePlan {
    /// Annotations that are not widgets.
    kept: Vec<Object>,
    paints: Vec<Paint>,
    removed: usize,
}

/// Split a page's annotations into the ones to keep and paints for the
/// widgets being removed.
fn plan_page(
    doc: &Document,
    page_id: ObjectId,
    owners: &HashMap<ObjectId, &StructuralField>,
) -> Result<PagePlan, BackendError> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| BackendError::Write(format!("failed to read page: {e}")))?;
    let annots = dict_get(doc, page, b"Annots")
        .and_then(|obj| obj.as_array().ok())
        .cloned()
        .unwrap_or_default();

    let mut plan = PagePlan {
        kept: Vec::new(),
        paints: Vec::new(),
        removed: 0,
    };
    for annot in annots {
        let Some(widget) = as_dict(doc, &annot).filter(|d| is_widget(doc, d)) else {
            plan.kept.push(annot);
            continue;
        };
        plan.removed += 1;
        let Some(rect) = dict_rect(doc, widget) else { continue };
        let owner = annot.as_reference().ok().and_then(|id| owners.get(&id).copied());
        match owner {
            Some(field) if is_text_like(field) => {
                if let Some(text) = drawn_text(field) {
                    plan.paints.push(Paint::Text {
                        rect,
                        text,
                        comb: field.max_len.filter(|_| field.is_comb()),
                    });
                }
            }
            _ => {
                if let Some((stream_id, bbox)) = current_appearance(doc, widget) {
                    plan.paints.push(Paint::Appearance {
                        rect,
                        stream_id,
                        bbox,
                    });
                }
            }
        }
    }
    Ok(plan)
}

fn is_text_like(field: &StructuralField) -> bool {
    matches!(field.kind, FieldKind::Text | FieldKind::Select)
        || field.raw_kind == Some(RawFieldKind::Choice)
}

/// Text to draw for a text-like field, `None` when empty.
fn drawn_text(field: &StructuralField) -> Option<String> {
    let value = field.value.as_text().filter(|v| !v.is_empty())?;
    let shown = field
        .choices
        .iter()
        .find(|c| c.export == value)
        .map_or(value, |c| c.display.as_str());
    Some(shown.to_string())
}

/// The appearance stream a widget currently shows, with its `/BBox`.
fn current_appearance(doc: &Document, widget: &Dictionary) -> Option<(ObjectId, BBox)> {
    let ap = dict_get(doc, widget, b"AP").and_then(|ap| as_dict(doc, ap))?;
    let normal = ap.get(b"N").ok()?;
    let stream_ref = match resolve(doc, normal) {
        Object::Stream(_) => normal,
        Object::Dictionary(states) => {
            let state = dict_get(doc, widget, b"AS").and_then(name_str)?;
            if state == "Off" {
                return None;
            }
            states.get(state.as_bytes()).ok()?
        }
        _ => return None,
    };
    let stream_id = stream_ref.as_reference().ok()?;
    let stream = doc.get_object(stream_id).ok()?.as_stream().ok()?;
    let bbox = dict_get(doc, &stream.dict, b"BBox")
        .and_then(|b| b.as_array().ok())
        .and_then(|arr| extract_bbox_from_array(arr).ok())?;
    Some((stream_id, bbox))
}

/// Windows-1252 bytes for Helvetica's WinAnsiEncoding; unmappable
/// characters become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let mut buf = [0u8; 4];
            let (bytes, _, unmappable) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
            if unmappable {
                b'?'
            } else {
                bytes.first().copied().unwrap_or(b'?')
            }
        })
        .collect()
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn show_text(ops: &mut Vec<Operation>, size: f64, x: f64, y: f64, bytes: Vec<u8>) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(FLATTEN_FONT.as_bytes().to_vec()), real(size)],
    ));
    ops.push(Operation::new("Td", vec![real(x), real(y)]));
    ops.push(Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)]));
    ops.push(Operation::new("ET", vec![]));
}

/// Content operations for one paint, clipped to the widget rectangle.
fn paint_operations(paint: &Paint, xobject_name: &str) -> Vec<Operation> {
    let mut ops = vec![Operation::new("q", vec![])];
    match paint {
        Paint::Text { rect, text, comb } => {
            ops.push(Operation::new(
                "re",
                vec![real(rect.x0), real(rect.y0), real(rect.width()), real(rect.height())],
            ));
            ops.push(Operation::new("W", vec![]));
            ops.push(Operation::new("n", vec![]));
            let size = (rect.height() * 0.7).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
            // Centers cap height, which is about 0.7 em in Helvetica.
            let y = rect.y0 + (rect.height() - size * 0.7) / 2.0;
            match comb {
                Some(cells) if *cells > 0 => {
                    let cell = rect.width() / *cells as f64;
                    for (i, c) in text.chars().take(*cells).enumerate() {
                        let x = rect.x0 + i as f64 * cell + (cell - size * 0.5) / 2.0;
                        show_text(&mut ops, size, x, y, win_ansi(&c.to_string()));
                    }
                }
                _ => show_text(&mut ops, size, rect.x0 + TEXT_PADDING, y, win_ansi(text)),
            }
        }
        Paint::Appearance { rect, bbox, .. } => {
            let sx = if bbox.width() > 0.0 { rect.width() / bbox.width() } else { 1.0 };
            let sy = if bbox.height() > 0.0 { rect.height() / bbox.height() } else { 1.0 };
            ops.push(Operation::new(
                "cm",
                vec![
                    real(sx),
                    real(0.0),
                    real(0.0),
                    real(sy),
                    real(rect.x0 - bbox.x0 * sx),
                    real(rect.y0 - bbox.y0 * sy),
                ],
            ));
            ops.push(Operation::new(
                "Do",
                vec![Object::Name(xobject_name.as_bytes().to_vec())],
            ));
        }
    }
    ops.push(Operation::new("Q", vec![]));
    ops
}

/// Append paints to a page: its existing content is wrapped in `q`/`Q`
/// and the paints drawn afterwards through page resources that gain the
/// flatten font and the appearance XObjects.
fn paint_page(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    paints: &[Paint],
) -> Result<(), BackendError> {
    let mut resources = get_page_resources(doc, page_id).cloned().unwrap_or_default();
    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|f| as_dict(doc, f))
        .cloned()
        .unwrap_or_default();
    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| as_dict(doc, x))
        .cloned()
        .unwrap_or_default();
    fonts.set(FLATTEN_FONT, font_id);

    let mut operations = vec![Operation::new("Q", vec![])];
    for paint in paints {
        let name = match paint {
            Paint::Appearance { stream_id, .. } => {
                let name = format!("FlatAP{}", stream_id.0);
                xobjects.set(name.as_bytes().to_vec(), *stream_id);
                mark_form_xobject(doc, *stream_id)?;
                name
            }
            Paint::Text { .. } => String::new(),
        };
        operations.extend(paint_operations(paint, &name));
    }
    resources.set("Font", fonts);
    if !xobjects.is_empty() {
        resources.set("XObject", xobjects);
    }

    let drawing = Content { operations }
        .encode()
        .map_err(|e| BackendError::Write(format!("failed to encode flattened content: {e}")))?;

    let existing = match doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .ok()
        .and_then(|page| page.get(b"Contents").ok())
    {
        Some(contents) => match resolve(doc, contents) {
            Object::Array(items) => items.clone(),
            _ => vec![contents.clone()],
        },
        None => Vec::new(),
    };
    let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let drawing_id = doc.add_object(Stream::new(dictionary! {}, drawing));

    let mut contents = vec![Object::Reference(open_id)];
    contents.extend(existing);
    contents.push(Object::Reference(drawing_id));

    let page = dict_mut(doc, page_id)?;
    page.set("Contents", contents);
    page.set("Resources", resources);
    Ok(())
}

/// Appearance streams often omit `/Subtype /Form`, which `Do` requires.
fn mark_form_xobject(doc: &mut Document, stream_id: ObjectId) -> Result<(), BackendError> {
    let dict = dict_mut(doc, stream_id)?;
    dict.set("Type", "XObject");
    dict.set("Subtype", "Form");
    Ok(())
}
