//! Structural field reading.
//!
//! Walks the `/AcroForm /Fields` tree and reports one entry per terminal
//! field with its kind, value, options and flags. A field's rectangle and
//! page are looked up with two ordered strategy lists ([`RECT_STRATEGIES`]
//! and [`PAGE_STRATEGIES`]) because producers disagree on where they put
//! widget geometry and how they reference pages.

use std::collections::HashSet;

use acroform_core::{
    BBox, DetectOptions, ExtractResult, ExtractWarning, FieldDescriptor, FieldKind, FieldPosition,
    FieldValue, LabelMetadata, RawFieldKind, ResolvedLabel, WarningCode, field_flags,
};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::document::{
    FormDocument, as_dict, dict_get, dict_rect, dict_text, field_inherited, name_str, resolve,
    text_of,
};
use crate::widgets::{inherited_flags, is_widget, page_annotations};

/// One choice-field option: the value stored in `/V` and the text shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub export: String,
    pub display: String,
}

/// A terminal field as declared by the form structure.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralField {
    /// Fully qualified name, unique within the document.
    pub name: String,
    /// `/FT` as declared, `None` when missing or unknown.
    pub raw_kind: Option<RawFieldKind>,
    pub kind: FieldKind,
    pub value: FieldValue,
    /// Display options for select and radio fields.
    pub options: Option<Vec<String>>,
    /// Choice options with export values, for writing `/V`.
    pub choices: Vec<ChoiceOption>,
    pub flags: u32,
    pub max_len: Option<usize>,
    pub metadata: LabelMetadata,
    pub position: Option<FieldPosition>,
    /// Object id of the field dictionary; `None` for inline dictionaries.
    pub object_id: Option<ObjectId>,
    /// Widget annotations of this field. Holds the field itself when field
    /// and widget are merged into one dictionary.
    pub widget_ids: Vec<ObjectId>,
    /// Appearance states other than `Off` found on the widgets.
    pub on_states: Vec<String>,
}

impl StructuralField {
    pub fn required(&self) -> bool {
        self.flags & field_flags::REQUIRED != 0
    }

    pub fn is_comb(&self) -> bool {
        self.flags & field_flags::COMB != 0
    }

    /// Build the public descriptor with a resolved label.
    pub fn descriptor(&self, label: ResolvedLabel) -> FieldDescriptor {
        FieldDescriptor {
            name: self.name.clone(),
            label: label.label,
            kind: self.kind,
            value: self.value.clone(),
            options: self.options.clone(),
            required: self.required(),
            position: self.position.clone(),
            metadata_source: label.source,
            is_synthesized_widget: false,
        }
    }

    fn fallback(name: String, object_id: Option<ObjectId>) -> Self {
        Self {
            name,
            raw_kind: None,
            kind: FieldKind::Text,
            value: FieldValue::Text(String::new()),
            options: None,
            choices: Vec::new(),
            flags: 0,
            max_len: None,
            metadata: LabelMetadata::default(),
            position: None,
            object_id,
            widget_ids: Vec::new(),
            on_states: Vec::new(),
        }
    }
}

/// What a field dictionary resolves to.
enum Resolved {
    Field(FieldKind),
    /// Push buttons and signatures hold no fillable value.
    Skip(&'static str),
    Unknown,
}

fn resolve_kind(raw: Option<RawFieldKind>, flags: u32) -> Resolved {
    match raw {
        Some(RawFieldKind::Text) => Resolved::Field(FieldKind::Text),
        Some(RawFieldKind::Button) if flags & field_flags::PUSHBUTTON != 0 => {
            Resolved::Skip("push button")
        }
        Some(RawFieldKind::Button) if flags & field_flags::RADIO != 0 => {
            Resolved::Field(FieldKind::Radio)
        }
        Some(RawFieldKind::Button) => Resolved::Field(FieldKind::Checkbox),
        Some(RawFieldKind::Choice) if flags & field_flags::COMBO != 0 => {
            Resolved::Field(FieldKind::Select)
        }
        // List boxes show every option at once, like a radio group.
        Some(RawFieldKind::Choice) => Resolved::Field(FieldKind::Radio),
        Some(RawFieldKind::Signature) => Resolved::Skip("signature"),
        None => Resolved::Unknown,
    }
}

struct Walker<'a> {
    doc: &'a FormDocument,
    options: &'a DetectOptions,
    visited: HashSet<ObjectId>,
    names: HashSet<String>,
    fields: Vec<StructuralField>,
    warnings: Vec<ExtractWarning>,
}

/// Read every terminal field of the document's form.
///
/// A document without `/AcroForm` yields an empty list. Fields that cannot
/// be read fall back to an empty text field with no position; push buttons
/// and signature fields are left out.
pub fn read_fields(doc: &FormDocument, options: &DetectOptions) -> ExtractResult<Vec<StructuralField>> {
    let Some(acroform) = doc.acroform() else {
        debug!("document has no AcroForm");
        return ExtractResult::ok(Vec::new());
    };
    let inner = doc.inner();
    let roots: &[Object] = dict_get(inner, acroform, b"Fields")
        .and_then(|obj| obj.as_array().ok())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut walker = Walker {
        doc,
        options,
        visited: HashSet::new(),
        names: HashSet::new(),
        fields: Vec::new(),
        warnings: Vec::new(),
    };
    for root in roots {
        walker.walk(root, None, 0);
    }

    debug!(fields = walker.fields.len(), "structural field scan complete");
    ExtractResult::with_warnings(walker.fields, walker.warnings)
}

impl<'a> Walker<'a> {
    fn inner(&self) -> &'a Document {
        self.doc.inner()
    }

    /// Recursively walk the form field tree, collecting terminal fields.
    ///
    /// Intermediate nodes carry partial names (joined with `.`); a node is
    /// terminal when none of its kids carries a `/T` of its own.
    fn walk(&mut self, node: &'a Object, parent_name: Option<&str>, depth: usize) {
        if depth >= self.options.max_field_depth {
            warn!(depth, "field tree too deep, stopping descent");
            return;
        }
        let object_id = match node {
            Object::Reference(id) => {
                if !self.visited.insert(*id) {
                    return;
                }
                Some(*id)
            }
            _ => None,
        };
        let inner = self.inner();
        let Some(dict) = as_dict(inner, node) else {
            self.warnings.push(ExtractWarning::new(
                WarningCode::FieldRead,
                "field entry is not a dictionary",
            ));
            return;
        };

        let partial = dict_text(inner, dict, b"T").filter(|t| !t.is_empty());
        let full_name = match (parent_name, partial) {
            (Some(parent), Some(name)) => format!("{parent}.{name}"),
            (Some(parent), None) => parent.to_string(),
            (None, Some(name)) => name,
            (None, None) => String::new(),
        };

        let kids = kids_of(inner, dict);
        let child_fields: Vec<&'a Object> = kids
            .iter()
            .filter(|kid| as_dict(inner, kid).is_some_and(|d| d.has(b"T")))
            .collect();
        if !child_fields.is_empty() {
            for kid in child_fields {
                self.walk(kid, Some(&full_name), depth + 1);
            }
            return;
        }

        if full_name.is_empty() {
            debug!("skipping field without a name");
            self.warnings.push(ExtractWarning::new(
                WarningCode::FieldRead,
                "field has no /T in its hierarchy",
            ));
            return;
        }
        if self.names.contains(&full_name) {
            self.warnings.push(
                ExtractWarning::new(WarningCode::FieldRead, "duplicate field name")
                    .for_field(&full_name),
            );
            return;
        }

        if let Some(field) = self.read_terminal(full_name, object_id, dict) {
            self.names.insert(field.name.clone());
            self.fields.push(field);
        }
    }

    fn read_terminal(
        &mut self,
        name: String,
        object_id: Option<ObjectId>,
        dict: &'a Dictionary,
    ) -> Option<StructuralField> {
        let inner = self.inner();
        let depth = self.options.max_field_depth;
        let raw_kind = field_inherited(inner, dict, b"FT", depth)
            .and_then(name_str)
            .and_then(|n| RawFieldKind::from_pdf_name(&n));
        let flags = inherited_flags(inner, dict, depth);

        let kind = match resolve_kind(raw_kind, flags) {
            Resolved::Field(kind) => kind,
            Resolved::Skip(what) => {
                debug!(field = %name, "skipping {what} field");
                return None;
            }
            Resolved::Unknown => {
                warn!(field = %name, "field has no usable /FT, reading as empty text");
                self.warnings.push(
                    ExtractWarning::new(WarningCode::FieldRead, "missing or unknown /FT")
                        .for_field(&name),
                );
                return Some(StructuralField::fallback(name, object_id));
            }
        };

        let widgets = widget_dicts(inner, object_id, dict);
        let on_states = on_states(inner, &widgets);
        let choices = if raw_kind == Some(RawFieldKind::Choice) {
            choice_options(inner, dict)
        } else {
            Vec::new()
        };
        let options = match kind {
            FieldKind::Select => Some(choices.iter().map(|c| c.display.clone()).collect()),
            FieldKind::Radio if raw_kind == Some(RawFieldKind::Choice) => {
                Some(choices.iter().map(|c| c.display.clone()).collect())
            }
            FieldKind::Radio => Some(on_states.clone()),
            _ => None,
        };

        let stored = field_inherited(inner, dict, b"V", depth);
        let value = match kind {
            FieldKind::Checkbox => {
                let state = stored
                    .and_then(name_str)
                    .or_else(|| widgets.first().and_then(|(_, w)| dict_get(inner, w, b"AS")).and_then(name_str));
                FieldValue::Checked(state.is_some_and(|s| !s.is_empty() && s != "Off"))
            }
            FieldKind::Radio if raw_kind == Some(RawFieldKind::Button) => FieldValue::Text(
                stored
                    .and_then(name_str)
                    .filter(|s| s != "Off")
                    .unwrap_or_default(),
            ),
            _ => FieldValue::Text(stored.and_then(first_text).unwrap_or_default()),
        };

        let metadata = LabelMetadata {
            tooltip: field_inherited(inner, dict, b"TU", depth).and_then(text_of),
            alternate_name: field_inherited(inner, dict, b"TM", depth).and_then(text_of),
        };
        let max_len = match field_inherited(inner, dict, b"MaxLen", depth) {
            Some(Object::Integer(n)) => usize::try_from(*n).ok(),
            _ => None,
        };

        let position = self.locate(&name, object_id, dict);

        Some(StructuralField {
            name,
            raw_kind,
            kind,
            value,
            options,
            choices,
            flags,
            max_len,
            metadata,
            position,
            object_id,
            widget_ids: widgets.iter().filter_map(|(id, _)| *id).collect(),
            on_states,
        })
    }

    fn locate(
        &mut self,
        name: &str,
        object_id: Option<ObjectId>,
        dict: &'a Dictionary,
    ) -> Option<FieldPosition> {
        let ctx = LookupContext {
            doc: self.doc,
            field_id: object_id,
            dict,
            max_depth: self.options.max_field_depth,
        };
        let position = locate_field(&ctx);
        if position.is_none() {
            debug!(field = %name, "no rectangle or page for field");
            self.warnings.push(
                ExtractWarning::new(WarningCode::GeometryLookup, "no strategy found a rectangle and page")
                    .for_field(name),
            );
        }
        position
    }
}

/// A field dictionary's `/Kids`, resolved to an array.
fn kids_of<'a>(doc: &'a Document, dict: &'a Dictionary) -> &'a [Object] {
    dict_get(doc, dict, b"Kids")
        .and_then(|obj| obj.as_array().ok())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Widget dictionaries of a terminal field: its kids, or the field itself
/// when field and widget share one dictionary.
fn widget_dicts<'a>(
    doc: &'a Document,
    field_id: Option<ObjectId>,
    dict: &'a Dictionary,
) -> Vec<(Option<ObjectId>, &'a Dictionary)> {
    let kids: Vec<_> = kids_of(doc, dict)
        .iter()
        .filter_map(|kid| {
            let id = kid.as_reference().ok();
            as_dict(doc, kid).map(|d| (id, d))
        })
        .collect();
    if !kids.is_empty() {
        return kids;
    }
    if is_widget(doc, dict) || dict.has(b"Rect") {
        return vec![(field_id, dict)];
    }
    Vec::new()
}

/// Names of the non-`Off` normal appearance states, in widget order.
fn on_states(doc: &Document, widgets: &[(Option<ObjectId>, &Dictionary)]) -> Vec<String> {
    let mut states: Vec<String> = Vec::new();
    for (_, widget) in widgets {
        let normal = dict_get(doc, widget, b"AP")
            .and_then(|ap| as_dict(doc, ap))
            .and_then(|ap| dict_get(doc, ap, b"N"))
            .and_then(|n| as_dict(doc, n));
        let Some(normal) = normal else { continue };
        for (key, _) in normal.iter() {
            let state = String::from_utf8_lossy(key).into_owned();
            if state != "Off" && !states.contains(&state) {
                states.push(state);
            }
        }
    }
    states
}

/// Text of a value that may be a string, a name, or an array of them
/// (multi-select); arrays yield their first entry.
fn first_text(obj: &Object) -> Option<String> {
    match obj {
        Object::Array(items) => items.iter().find_map(text_of),
        other => text_of(other),
    }
}

/// Options from a choice field's `/Opt`.
///
/// Entries are either a text string or an `[export display]` pair.
fn choice_options(doc: &Document, dict: &Dictionary) -> Vec<ChoiceOption> {
    let Some(items) = dict_get(doc, dict, b"Opt").and_then(|o| o.as_array().ok()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match resolve(doc, item) {
            Object::Array(pair) if pair.len() >= 2 => {
                let export = text_of(resolve(doc, &pair[0]))?;
                let display = text_of(resolve(doc, &pair[1]))?;
                Some(ChoiceOption { export, display })
            }
            other => text_of(other).map(|text| ChoiceOption {
                export: text.clone(),
                display: text,
            }),
        })
        .collect()
}

/// Inputs shared by the rectangle strategies.
pub(crate) struct LookupContext<'a> {
    pub doc: &'a FormDocument,
    pub field_id: Option<ObjectId>,
    pub dict: &'a Dictionary,
    pub max_depth: usize,
}

/// A widget rectangle found for a field.
pub(crate) struct Located<'a> {
    pub rect: BBox,
    pub widget_id: Option<ObjectId>,
    pub widget: &'a Dictionary,
    /// Set when the strategy already knows the page (0-based).
    pub page_index: Option<usize>,
}

pub(crate) type RectStrategy = for<'a> fn(&LookupContext<'a>) -> Option<Located<'a>>;

/// Rectangle strategies, tried in order.
pub(crate) const RECT_STRATEGIES: &[(&str, RectStrategy)] = &[
    ("field /Rect", rect_from_field),
    ("first kid /Rect", rect_from_first_kid),
    ("kid traversal", rect_from_kid_traversal),
    ("page annotation scan", rect_from_annotation_scan),
];

fn rect_from_field<'a>(ctx: &LookupContext<'a>) -> Option<Located<'a>> {
    Some(Located {
        rect: dict_rect(ctx.doc.inner(), ctx.dict)?,
        widget_id: ctx.field_id,
        widget: ctx.dict,
        page_index: None,
    })
}

fn rect_from_first_kid<'a>(ctx: &LookupContext<'a>) -> Option<Located<'a>> {
    let doc = ctx.doc.inner();
    let kid = kids_of(doc, ctx.dict).first()?;
    let widget = as_dict(doc, kid)?;
    Some(Located {
        rect: dict_rect(doc, widget)?,
        widget_id: kid.as_reference().ok(),
        widget,
        page_index: None,
    })
}

fn rect_from_kid_traversal<'a>(ctx: &LookupContext<'a>) -> Option<Located<'a>> {
    let doc = ctx.doc.inner();
    let mut stack: Vec<(&'a Object, usize)> =
        kids_of(doc, ctx.dict).iter().rev().map(|k| (k, 1)).collect();
    let mut seen = HashSet::new();
    while let Some((kid, depth)) = stack.pop() {
        if depth > ctx.max_depth {
            continue;
        }
        if let Ok(id) = kid.as_reference() {
            if !seen.insert(id) {
                continue;
            }
        }
        let Some(widget) = as_dict(doc, kid) else { continue };
        if let Some(rect) = dict_rect(doc, widget) {
            return Some(Located {
                rect,
                widget_id: kid.as_reference().ok(),
                widget,
                page_index: None,
            });
        }
        stack.extend(kids_of(doc, widget).iter().rev().map(|k| (k, depth + 1)));
    }
    None
}

fn rect_from_annotation_scan<'a>(ctx: &LookupContext<'a>) -> Option<Located<'a>> {
    let field_id = ctx.field_id?;
    let doc = ctx.doc.inner();
    for (page_index, &page_id) in ctx.doc.page_ids().iter().enumerate() {
        let Some(page) = doc.get_object(page_id).ok().and_then(|o| o.as_dict().ok()) else {
            continue;
        };
        for annot in page_annotations(doc, page) {
            let Some(widget) = as_dict(doc, annot) else { continue };
            let belongs = annot.as_reference().ok() == Some(field_id)
                || widget.get(b"Parent").ok().and_then(|p| p.as_reference().ok()) == Some(field_id);
            if !belongs || !is_widget(doc, widget) {
                continue;
            }
            if let Some(rect) = dict_rect(doc, widget) {
                return Some(Located {
                    rect,
                    widget_id: annot.as_reference().ok(),
                    widget,
                    page_index: Some(page_index),
                });
            }
        }
    }
    None
}

/// Inputs shared by the page strategies.
pub(crate) struct PageQuery<'a> {
    pub doc: &'a FormDocument,
    /// The `/P` entry of the widget (or of the field when the widget has none).
    pub page_ref: Option<&'a Object>,
    pub widget_id: Option<ObjectId>,
}

pub(crate) type PageStrategy = fn(&PageQuery<'_>) -> Option<usize>;

/// Page strategies, tried in order. Each returns a 0-based page index.
pub(crate) const PAGE_STRATEGIES: &[(&str, PageStrategy)] = &[
    ("exact reference", page_by_reference),
    ("object number", page_by_object_number),
    ("inline dictionary", page_by_inline_dictionary),
    ("annotation membership", page_by_annotation_membership),
];

pub(crate) fn page_by_reference(query: &PageQuery<'_>) -> Option<usize> {
    let id = query.page_ref?.as_reference().ok()?;
    query.doc.page_ids().iter().position(|&p| p == id)
}

/// Matches on object number alone; some writers bump generation numbers
/// on pages without updating `/P`.
pub(crate) fn page_by_object_number(query: &PageQuery<'_>) -> Option<usize> {
    let (number, _) = query.page_ref?.as_reference().ok()?;
    query.doc.page_ids().iter().position(|&(n, _)| n == number)
}

/// Matches an inline `/P` dictionary against each page dictionary by
/// their printed form.
pub(crate) fn page_by_inline_dictionary(query: &PageQuery<'_>) -> Option<usize> {
    let Object::Dictionary(inline) = query.page_ref? else {
        return None;
    };
    let wanted = format!("{inline:?}");
    let doc = query.doc.inner();
    query.doc.page_ids().iter().position(|&id| {
        doc.get_object(id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .is_some_and(|page| format!("{page:?}") == wanted)
    })
}

pub(crate) fn page_by_annotation_membership(query: &PageQuery<'_>) -> Option<usize> {
    let widget_id = query.widget_id?;
    let doc = query.doc.inner();
    query.doc.page_ids().iter().position(|&id| {
        doc.get_object(id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .is_some_and(|page| {
                page_annotations(doc, page)
                    .iter()
                    .any(|a| a.as_reference().ok() == Some(widget_id))
            })
    })
}

/// Run the rectangle strategies, then the page strategies, and build a
/// position from the first hit of each.
pub(crate) fn locate_field(ctx: &LookupContext<'_>) -> Option<FieldPosition> {
    let (strategy, located) = RECT_STRATEGIES
        .iter()
        .find_map(|(label, strategy)| strategy(ctx).map(|hit| (*label, hit)))?;

    let page_index = located.page_index.or_else(|| {
        let query = PageQuery {
            doc: ctx.doc,
            page_ref: located
                .widget
                .get(b"P")
                .ok()
                .or_else(|| ctx.dict.get(b"P").ok()),
            widget_id: located.widget_id,
        };
        PAGE_STRATEGIES
            .iter()
            .find_map(|(_, strategy)| strategy(&query))
    })?;
    debug!(strategy, page = page_index + 1, "located field widget");

    let page_id = *ctx.doc.page_ids().get(page_index)?;
    let page = u32::try_from(page_index + 1).ok()?;
    Some(FieldPosition::new(page, located.rect, ctx.doc.page_height(page_id)))
}
