//! Label resolution for form fields.
//!
//! A label is chosen from a priority chain: the field's tooltip (`/TU`),
//! its alternate name (`/TM`), visible text found near the field on its
//! page, and finally the raw field name. The nearby-text search works on
//! [`TextRun`]s decoded from the page content stream.

use unicode_normalization::UnicodeNormalization;

use crate::{BBox, DetectOptions, MetadataSource, Point};

/// A run of text drawn by one text-showing operator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRun {
    pub text: String,
    /// Baseline start of the run in user space (bottom-left origin).
    pub origin: Point,
    /// Advance width of the run in user space.
    pub width: f64,
    /// Effective font size in user space.
    pub font_size: f64,
}

impl TextRun {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64, font_size: f64) -> Self {
        Self {
            text: text.into(),
            origin: Point::new(x, y),
            width,
            font_size,
        }
    }

    /// X coordinate where the run ends.
    pub fn end_x(&self) -> f64 {
        self.origin.x + self.width
    }
}

/// Label-bearing metadata read from a field dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMetadata {
    /// `/TU`, shown by viewers as the field's tooltip.
    pub tooltip: Option<String>,
    /// `/TM`, the mapping name used on export.
    pub alternate_name: Option<String>,
}

/// A resolved label and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLabel {
    pub label: String,
    pub source: MetadataSource,
}

/// Collapse whitespace to single spaces, trim, and NFC-normalize.
pub fn normalize_label(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.nfc().collect()
}

/// Resolve the display label for a field.
///
/// `runs` is only invoked when neither metadata entry yields a label and
/// `rect` is known, so callers can decode page text lazily. Returning
/// `None` from `runs` means the page text is unavailable, which is treated
/// the same as finding nothing.
pub fn resolve_label<'a>(
    name: &str,
    metadata: &LabelMetadata,
    rect: Option<&BBox>,
    runs: impl FnOnce() -> Option<&'a [TextRun]>,
    options: &DetectOptions,
) -> ResolvedLabel {
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(normalize_label)
            .filter(|s| !s.is_empty())
    };

    if let Some(label) = non_empty(&metadata.tooltip) {
        return ResolvedLabel {
            label,
            source: MetadataSource::Tooltip,
        };
    }
    if let Some(label) = non_empty(&metadata.alternate_name) {
        return ResolvedLabel {
            label,
            source: MetadataSource::AlternateName,
        };
    }
    if let Some(rect) = rect {
        if let Some(label) = runs().and_then(|runs| find_nearby_text(rect, runs, options)) {
            return ResolvedLabel {
                label,
                source: MetadataSource::NearbyText,
            };
        }
    }

    let fallback = normalize_label(name);
    ResolvedLabel {
        label: if fallback.is_empty() {
            "field".to_string()
        } else {
            fallback
        },
        source: MetadataSource::Fallback,
    }
}

struct Candidate<'a> {
    run: &'a TextRun,
    dy: f64,
    dx: f64,
}

/// Search the runs left of and around `rect` for the best label text.
///
/// Candidates are runs whose origin lies in `rect` grown by
/// `label_search_left` to the left and `label_search_vertical` above and
/// below. They rank by vertical distance from the field's bottom edge,
/// bucketed by `label_tie_band`, then by horizontal distance from its
/// left edge. A runner-up within `label_second_line_band` of the winner
/// is joined to it, upper line first.
pub fn find_nearby_text(rect: &BBox, runs: &[TextRun], options: &DetectOptions) -> Option<String> {
    let region =
        rect.expand_left_and_vertical(options.label_search_left, options.label_search_vertical);

    let mut candidates: Vec<Candidate<'_>> = runs
        .iter()
        .filter(|run| !run.text.trim().is_empty() && region.contains(run.origin))
        .map(|run| Candidate {
            run,
            dy: (run.origin.y - rect.y0).abs(),
            dx: (rect.x0 - run.origin.x).abs(),
        })
        .collect();

    let min_dy = candidates.iter().map(|c| c.dy).reduce(f64::min)?;
    let band = options.label_tie_band.max(f64::EPSILON);
    let bucket = |c: &Candidate<'_>| ((c.dy - min_dy) / band).floor();
    candidates.sort_by(|a, b| bucket(a).total_cmp(&bucket(b)).then(a.dx.total_cmp(&b.dx)));

    let best = candidates[0].run;
    let best_text = normalize_label(&best.text);

    let second = candidates.get(1).map(|c| c.run).filter(|run| {
        (run.origin.y - best.origin.y).abs() <= options.label_second_line_band
            && normalize_label(&run.text) != best_text
    });

    let label = match second {
        Some(run) if run.origin.y > best.origin.y => {
            format!("{} {}", normalize_label(&run.text), best_text)
        }
        Some(run) => format!("{} {}", best_text, normalize_label(&run.text)),
        None => best_text,
    };
    Some(label).filter(|s| !s.is_empty())
}
