//! Widget reconciliation.
//!
//! The structural form reader reports one field per name, but some form
//! tools attach many widgets to that single name (a 22-digit account
//! number drawn as 22 boxes). Reconciliation compares the structural
//! field list against every widget found on the pages and synthesizes
//! a descriptor for each widget the structural list does not cover, so
//! each box can be addressed on its own.
//!
//! The first widget of a name (in page-enumeration order) is taken to be
//! the structural field's own widget. That pairing follows how the
//! readers enumerate annotations and is not guaranteed by the file format.

use std::collections::{HashMap, HashSet};

use crate::sort::sort_reading_order;
use crate::{
    DetectOptions, FieldDescriptor, FieldKind, FieldValue, MetadataSource, RawFieldKind,
    WidgetGeometry,
};

/// Guess the kind of a widget that has no structural field of its own.
///
/// Small button widgets (both sides under `checkbox_max_size`) are
/// checkboxes, choice widgets are selects, and everything else is text.
pub fn infer_widget_kind(widget: &WidgetGeometry, checkbox_max_size: f64) -> FieldKind {
    match widget.raw_kind {
        Some(RawFieldKind::Button)
            if widget.rect.width() < checkbox_max_size
                && widget.rect.height() < checkbox_max_size =>
        {
            FieldKind::Checkbox
        }
        Some(RawFieldKind::Choice) => FieldKind::Select,
        _ => FieldKind::Text,
    }
}

/// Group widgets by field name, keeping first-appearance order.
pub fn group_by_name(widgets: &[WidgetGeometry]) -> Vec<(&str, Vec<&WidgetGeometry>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&WidgetGeometry>)> = Vec::new();
    for widget in widgets {
        let name = widget.field_name.as_str();
        match slots.get(name) {
            Some(&slot) => groups[slot].1.push(widget),
            None => {
                slots.insert(name, groups.len());
                groups.push((name, vec![widget]));
            }
        }
    }
    groups
}

/// Widgets not represented by a structural field, in enumeration order.
///
/// For a name the structural reader reported, every widget after the
/// first is an orphan; for a name it never reported, all of them are.
/// Radio kids are options of their group, not orphans, and widgets of
/// push buttons or signature fields are never orphans.
pub fn orphan_widgets<'a>(
    structural: &[FieldDescriptor],
    widgets: &'a [WidgetGeometry],
) -> Vec<&'a WidgetGeometry> {
    let known: HashMap<&str, FieldKind> = structural
        .iter()
        .map(|f| (f.name.as_str(), f.kind))
        .collect();
    let mut orphans: Vec<&WidgetGeometry> = group_by_name(widgets)
        .into_iter()
        .flat_map(|(name, group)| {
            let skip = match known.get(name) {
                Some(FieldKind::Radio) => group.len(),
                Some(_) => 1,
                None => 0,
            };
            group.into_iter().skip(skip)
        })
        .filter(|w| w.holds_value())
        .collect();
    orphans.sort_by_key(|w| w.widget_index);
    orphans
}

/// Hands out `{base}_{n}` names that collide with nothing already used.
#[derive(Debug, Default)]
pub struct SyntheticNamer {
    used: HashSet<String>,
    next: HashMap<String, usize>,
}

impl SyntheticNamer {
    pub fn new<'a>(taken: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            used: taken.into_iter().map(str::to_string).collect(),
            next: HashMap::new(),
        }
    }

    /// Next free name for `base`.
    ///
    /// Numbering starts at 2 when `base` itself is taken (the structural
    /// field counts as occurrence 1) and at 1 otherwise.
    pub fn next_name(&mut self, base: &str) -> String {
        let start = if self.used.contains(base) { 2 } else { 1 };
        let counter = self.next.entry(base.to_string()).or_insert(start);
        loop {
            let candidate = format!("{base}_{counter}");
            *counter += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

fn synthesize(widget: &WidgetGeometry, name: String, options: &DetectOptions) -> FieldDescriptor {
    let kind = infer_widget_kind(widget, options.checkbox_max_size);
    FieldDescriptor {
        label: name.clone(),
        name,
        kind,
        value: FieldValue::empty_for(kind),
        options: kind.has_options().then(Vec::new),
        required: false,
        position: Some(widget.position()),
        metadata_source: MetadataSource::Fallback,
        is_synthesized_widget: true,
    }
}

/// Merge structural fields with widget geometry and sort into reading order.
///
/// Synthesized descriptors carry their own name as label; callers that
/// can read page text may relabel them afterwards.
pub fn reconcile_widgets(
    structural: Vec<FieldDescriptor>,
    widgets: &[WidgetGeometry],
    options: &DetectOptions,
) -> Vec<FieldDescriptor> {
    let orphans = orphan_widgets(&structural, widgets);
    let mut namer = SyntheticNamer::new(structural.iter().map(|f| f.name.as_str()));

    let mut fields = structural;
    for widget in orphans {
        let name = namer.next_name(&widget.field_name);
        fields.push(synthesize(widget, name, options));
    }

    sort_reading_order(&mut fields, options.line_tolerance);
    fields
}
