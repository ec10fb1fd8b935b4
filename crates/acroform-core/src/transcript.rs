//! Page transcripts with inline field markers.
//!
//! A transcript is the page's text rebuilt line by line in reading order,
//! with markers showing where each form field sits: `[name]` for
//! checkbox-like fields and `(name)` for text-like fields. Markers are
//! placed by three heuristics, tried in order on every line:
//!
//! 1. a lone box/check glyph becomes the nearest checkbox on that line;
//! 2. a run of two or more placeholder glyphs becomes the nearest text
//!    field on that line. On a line mentioning `IBAN`, runs instead take
//!    the next unused text fields of the page in page order, one per run;
//! 3. a `label:` with nothing marked after it takes the next unused text
//!    field that sits after the colon on that line.
//!
//! Any field left over is appended to the end of its line as `«[name]»`
//! or `«(name)»`, and fields on no text line get a line of their own.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::sort::line_bands;
use crate::{FieldDescriptor, FieldKind, TextRun, TranscriptOptions};

/// Box and check glyphs as decoded from symbol fonts (private-use area)
/// and their standard Unicode counterparts.
pub const BOX_GLYPHS: &[char] = &[
    '\u{F06F}', // Wingdings "o": empty box
    '\u{F071}', // Wingdings "q": empty box
    '\u{F0A8}', // Wingdings: empty box
    '\u{F0FD}', // Wingdings: box with x
    '\u{F0FE}', // Wingdings: box with check
    '\u{F078}', // Wingdings "x": box with x
    '\u{2610}',
    '\u{2611}',
    '\u{2612}',
    '\u{25A1}',
];

/// Underscore-like glyphs that mark a write-in area when repeated.
const BLANK_GLYPHS: &[char] = &['_', '\u{F05F}', '\u{2026}'];

/// Slack, in units, when asking whether a field sits after a colon.
const COLON_SLACK: f64 = 2.0;

static IBAN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bIBAN\b").expect("valid regex"));
static LABEL_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N})]:").expect("valid regex"));

/// One page's transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    pub text: String,
}

pub fn is_box_glyph(c: char) -> bool {
    BOX_GLYPHS.contains(&c)
}

fn is_placeholder(c: char) -> bool {
    is_box_glyph(c) || BLANK_GLYPHS.contains(&c)
}

fn is_checkbox_like(field: &FieldDescriptor) -> bool {
    matches!(field.kind, FieldKind::Checkbox | FieldKind::Radio)
}

fn marker(field: &FieldDescriptor) -> String {
    if is_checkbox_like(field) {
        format!("[{}]", field.name)
    } else {
        format!("({})", field.name)
    }
}

#[derive(Debug)]
struct Line {
    y: f64,
    chars: Vec<char>,
    /// X position of each char in `chars`.
    xs: Vec<f64>,
    /// Right edge of the text pushed so far.
    end: Option<f64>,
}

impl Line {
    fn empty(y: f64) -> Self {
        Self {
            y,
            chars: Vec::new(),
            xs: Vec::new(),
            end: None,
        }
    }

    fn push_run(&mut self, run: &TextRun, word_gap: f64) {
        let glyphs: Vec<char> = run.text.chars().collect();
        let Some(&first) = glyphs.first() else {
            return;
        };
        if let (Some(&last), Some(end)) = (self.chars.last(), self.end) {
            if run.origin.x - end > word_gap && !last.is_whitespace() && !first.is_whitespace() {
                self.chars.push(' ');
                self.xs.push(end);
            }
        }
        let step = run.width / glyphs.len() as f64;
        for (i, c) in glyphs.into_iter().enumerate() {
            self.chars.push(c);
            self.xs.push(run.origin.x + step * i as f64);
        }
        self.end = Some(self.end.map_or(run.end_x(), |e| e.max(run.end_x())));
    }

    fn is_synthetic(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Edit to a line: replace `start..end` (or insert when equal) with `text`.
#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

fn group_lines(runs: &[TextRun], options: &TranscriptOptions) -> Vec<Line> {
    let runs: Vec<&TextRun> = runs.iter().filter(|r| !r.text.is_empty()).collect();
    let ys: Vec<f64> = runs.iter().map(|r| r.origin.y).collect();
    let bands = line_bands(&ys, options.line_tolerance);
    let count = bands.iter().max().map_or(0, |m| m + 1);

    let mut members: Vec<Vec<&TextRun>> = vec![Vec::new(); count];
    for (run, band) in runs.into_iter().zip(bands) {
        members[band].push(run);
    }

    members
        .into_iter()
        .filter(|m| !m.is_empty())
        .map(|mut members| {
            members.sort_by(|a, b| a.origin.x.total_cmp(&b.origin.x));
            let y = members
                .iter()
                .map(|r| r.origin.y)
                .fold(f64::NEG_INFINITY, f64::max);
            let mut line = Line::empty(y);
            for run in members {
                line.push_run(run, options.word_gap);
            }
            line
        })
        .collect()
}

struct Annotator<'f> {
    /// Fields on this page, in the caller's (reading) order.
    fields: Vec<&'f FieldDescriptor>,
    /// Line index each field belongs to.
    field_line: Vec<usize>,
    claimed: Vec<bool>,
}

impl<'f> Annotator<'f> {
    fn x0(&self, i: usize) -> f64 {
        self.fields[i].position.as_ref().map_or(0.0, |p| p.rect[0])
    }

    /// Nearest unclaimed field on `line` matching `want`, by distance to `x`.
    fn nearest_on_line(
        &self,
        line: usize,
        x: f64,
        want: impl Fn(&FieldDescriptor) -> bool,
    ) -> Option<usize> {
        (0..self.fields.len())
            .filter(|&i| !self.claimed[i] && self.field_line[i] == line && want(self.fields[i]))
            .min_by(|&a, &b| (self.x0(a) - x).abs().total_cmp(&(self.x0(b) - x).abs()))
    }

    fn claim(&mut self, i: usize) -> String {
        self.claimed[i] = true;
        marker(self.fields[i])
    }

    fn annotate(&mut self, line_idx: usize, line: &Line) -> String {
        let n = line.chars.len();
        let mut edits: Vec<Edit> = Vec::new();

        // Lone box glyphs.
        for i in 0..n {
            let c = line.chars[i];
            let lone = is_box_glyph(c)
                && !(i > 0 && is_placeholder(line.chars[i - 1]))
                && !(i + 1 < n && is_placeholder(line.chars[i + 1]));
            if !lone {
                continue;
            }
            if let Some(f) = self.nearest_on_line(line_idx, line.xs[i], is_checkbox_like) {
                let text = self.claim(f);
                edits.push(Edit {
                    start: i,
                    end: i + 1,
                    text,
                });
            }
        }

        // Placeholder runs.
        let mut runs: Vec<(usize, usize)> = Vec::new();
        let mut i = 0;
        while i < n {
            if is_placeholder(line.chars[i]) {
                let start = i;
                while i < n && is_placeholder(line.chars[i]) {
                    i += 1;
                }
                if i - start >= 2 {
                    runs.push((start, i));
                }
            } else {
                i += 1;
            }
        }
        let text: String = line.chars.iter().collect();
        if IBAN_TOKEN.is_match(&text) {
            let mut pool = (0..self.fields.len())
                .filter(|&f| !self.claimed[f] && !is_checkbox_like(self.fields[f]))
                .collect::<Vec<_>>()
                .into_iter();
            for &(start, end) in &runs {
                let Some(f) = pool.next() else { break };
                let text = self.claim(f);
                edits.push(Edit { start, end, text });
            }
        } else {
            for &(start, end) in &runs {
                let want = |f: &FieldDescriptor| !is_checkbox_like(f);
                if let Some(f) = self.nearest_on_line(line_idx, line.xs[start], want) {
                    let text = self.claim(f);
                    edits.push(Edit { start, end, text });
                }
            }
        }

        // Unmarked `label:` patterns.
        let char_at: HashMap<usize, usize> = text
            .char_indices()
            .enumerate()
            .map(|(ci, (bi, _))| (bi, ci))
            .collect();
        let colons: Vec<usize> = LABEL_COLON
            .find_iter(&text)
            .filter_map(|m| char_at.get(&(m.end() - 1)).copied())
            .collect();
        for colon in colons {
            let next = (colon + 1..n).find(|&k| !line.chars[k].is_whitespace());
            let marked_after = edits
                .iter()
                .any(|e| e.start == colon + 1 || Some(e.start) == next);
            if marked_after {
                continue;
            }
            let lo = line.xs[colon] - COLON_SLACK;
            let hi = next.map_or(f64::INFINITY, |k| line.xs[k]);
            let candidate = (0..self.fields.len())
                .filter(|&f| {
                    !self.claimed[f]
                        && self.field_line[f] == line_idx
                        && !is_checkbox_like(self.fields[f])
                        && self.x0(f) >= lo
                        && self.x0(f) <= hi
                })
                .min_by(|&a, &b| self.x0(a).total_cmp(&self.x0(b)));
            if let Some(f) = candidate {
                let text = format!(" {}", self.claim(f));
                edits.push(Edit {
                    start: colon + 1,
                    end: colon + 1,
                    text,
                });
            }
        }

        // Leftovers on this line.
        let mut tail = String::new();
        for f in 0..self.fields.len() {
            if !self.claimed[f] && self.field_line[f] == line_idx {
                tail.push_str(&format!(" «{}»", self.claim(f)));
            }
        }

        let mut out = apply_edits(&line.chars, edits);
        out.push_str(&tail);
        out.trim().to_string()
    }
}

fn apply_edits(chars: &[char], mut edits: Vec<Edit>) -> String {
    // Insertions sort before a replacement starting at the same index.
    edits.sort_by_key(|e| (e.start, e.end != e.start));
    let mut out = String::new();
    let mut edits = edits.into_iter().peekable();
    let mut i = 0;
    while i <= chars.len() {
        let mut skip_to = None;
        while let Some(edit) = edits.next_if(|e| e.start <= i) {
            if edit.start < i {
                continue;
            }
            out.push_str(&edit.text);
            if edit.end > edit.start {
                skip_to = Some(edit.end);
                break;
            }
        }
        if let Some(end) = skip_to {
            i = end;
            continue;
        }
        if let Some(&c) = chars.get(i) {
            out.push(c);
        }
        i += 1;
    }
    out
}

/// Build the transcript of page `page` from its text runs.
///
/// `fields` may hold fields from any page; only those positioned on
/// `page` are placed, in the order given.
pub fn build_page_text(
    page: u32,
    runs: &[TextRun],
    fields: &[FieldDescriptor],
    options: &TranscriptOptions,
) -> String {
    let mut lines = group_lines(runs, options);
    let page_fields: Vec<&FieldDescriptor> =
        fields.iter().filter(|f| f.page() == Some(page)).collect();

    // Attach each field to the closest text line within tolerance.
    let mut field_line: Vec<Option<usize>> = page_fields
        .iter()
        .map(|f| {
            let y0 = f.position.as_ref().map_or(0.0, |p| p.rect[1]);
            lines
                .iter()
                .enumerate()
                .filter(|(_, l)| (l.y - y0).abs() < options.line_tolerance)
                .min_by(|(_, a), (_, b)| (a.y - y0).abs().total_cmp(&(b.y - y0).abs()))
                .map(|(i, _)| i)
        })
        .collect();

    // Fields on no text line get lines of their own.
    let loose: Vec<usize> = (0..page_fields.len())
        .filter(|&i| field_line[i].is_none())
        .collect();
    let loose_ys: Vec<f64> = loose
        .iter()
        .map(|&i| page_fields[i].position.as_ref().map_or(0.0, |p| p.rect[1]))
        .collect();
    let bands = line_bands(&loose_ys, options.line_tolerance);
    let mut band_line: HashMap<usize, usize> = HashMap::new();
    for ((&i, band), y) in loose.iter().zip(bands).zip(loose_ys) {
        let line = *band_line.entry(band).or_insert_with(|| {
            lines.push(Line::empty(y));
            lines.len() - 1
        });
        field_line[i] = Some(line);
    }

    let mut annotator = Annotator {
        claimed: vec![false; page_fields.len()],
        fields: page_fields,
        field_line: field_line.into_iter().map(|l| l.unwrap_or(0)).collect(),
    };

    let mut order: Vec<usize> = (0..lines.len()).collect();
    order.sort_by(|&a, &b| {
        lines[b]
            .y
            .total_cmp(&lines[a].y)
            .then(lines[a].is_synthetic().cmp(&lines[b].is_synthetic()))
    });

    order
        .into_iter()
        .map(|idx| annotator.annotate(idx, &lines[idx]))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A line listing fields that have no position, if there are any.
pub fn unplaced_fields_line(fields: &[FieldDescriptor]) -> Option<String> {
    let markers: Vec<String> = fields
        .iter()
        .filter(|f| f.position.is_none())
        .map(|f| format!("«{}»", marker(f)))
        .collect();
    (!markers.is_empty()).then(|| markers.join(" "))
}
