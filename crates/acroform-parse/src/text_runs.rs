//! Text runs from page content streams.
//!
//! A small content-stream interpreter that tracks just enough graphics and
//! text state to place shown strings on the page. Each `Tj`, `TJ`, `'` or
//! `"` operator yields one [`TextRun`] at its baseline origin in user
//! space. Form XObjects invoked with `Do` are followed up to
//! [`DetectOptions::max_xobject_depth`] levels.

use std::collections::HashMap;
use std::rc::Rc;

use acroform_core::{Ctm, DetectOptions, TextRun};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use crate::cmap::CMap;
use crate::document::{
    FormDocument, as_dict, decode_content_stream, dict_get, dict_i64, get_page_content_bytes,
    get_page_resources, name_str, object_to_f64,
};
use crate::error::BackendError;

/// Glyph width used when a font declares none, in thousandths of an em.
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// A `TJ` adjustment pulling glyphs further apart than this (thousandths
/// of an em) reads as a word break.
const TJ_SPACE_THRESHOLD: f64 = 200.0;

/// Symbolic fonts without a ToUnicode map have their codes placed at
/// this private-use offset, where Wingdings-style box glyphs live.
const SYMBOL_BASE: u32 = 0xF000;

/// `/Flags` bits from the font descriptor.
const FLAG_SYMBOLIC: i64 = 1 << 2;
const FLAG_NONSYMBOLIC: i64 = 1 << 5;

/// One decoded glyph.
struct Glyph {
    text: String,
    /// Advance in thousandths of an em.
    width: f64,
    /// Single-byte code 32, which also receives word spacing.
    is_space: bool,
}

/// What the interpreter needs from a font dictionary.
struct Font {
    cmap: Option<CMap>,
    symbolic: bool,
    /// Composite (`Type0`) fonts read two-byte codes.
    two_byte: bool,
    first_char: u32,
    widths: Vec<f64>,
    default_width: f64,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            cmap: None,
            symbolic: false,
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            default_width: DEFAULT_GLYPH_WIDTH,
        }
    }
}

impl Font {
    fn load(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = dict_get(doc, dict, b"Subtype").and_then(name_str);
        let base_font = dict_get(doc, dict, b"BaseFont")
            .and_then(name_str)
            .unwrap_or_default();
        let two_byte = subtype.as_deref() == Some("Type0");

        let cmap = dict_get(doc, dict, b"ToUnicode")
            .and_then(|obj| obj.as_stream().ok())
            .and_then(|stream| decode_content_stream(stream).ok())
            .and_then(|data| CMap::parse(&data).ok())
            .filter(|cmap| !cmap.is_empty());

        let flags = dict_get(doc, dict, b"FontDescriptor")
            .and_then(|obj| as_dict(doc, obj))
            .and_then(|descriptor| dict_i64(doc, descriptor, b"Flags"))
            .unwrap_or(0);
        let declared_symbolic = flags & FLAG_SYMBOLIC != 0
            && flags & FLAG_NONSYMBOLIC == 0
            && dict.get(b"Encoding").is_err();
        let symbolic = declared_symbolic
            || base_font.contains("Wingdings")
            || base_font.contains("Dingbats");

        let first_char = dict_i64(doc, dict, b"FirstChar")
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);
        let widths = dict_get(doc, dict, b"Widths")
            .and_then(|obj| obj.as_array().ok())
            .map(|arr| arr.iter().map(|w| object_to_f64(w).unwrap_or(0.0)).collect())
            .unwrap_or_default();

        let default_width = if two_byte {
            dict_get(doc, dict, b"DescendantFonts")
                .and_then(|obj| obj.as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|obj| as_dict(doc, obj))
                .and_then(|descendant| dict_get(doc, descendant, b"DW"))
                .and_then(|dw| object_to_f64(dw).ok())
                .unwrap_or(1000.0)
        } else {
            DEFAULT_GLYPH_WIDTH
        };

        Self {
            cmap,
            symbolic,
            two_byte,
            first_char,
            widths,
            default_width,
        }
    }

    fn glyphs(&self, bytes: &[u8]) -> Vec<Glyph> {
        let step = match &self.cmap {
            Some(cmap) => cmap.code_bytes(),
            None if self.two_byte => 2,
            None => 1,
        };
        bytes
            .chunks(step)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
                Glyph {
                    text: self.unicode(code),
                    width: self.width(code),
                    is_space: step == 1 && code == 32,
                }
            })
            .collect()
    }

    fn unicode(&self, code: u32) -> String {
        if let Some(text) = self.cmap.as_ref().and_then(|cmap| cmap.lookup(code)) {
            return text.to_string();
        }
        if self.two_byte {
            return String::new();
        }
        if self.symbolic {
            return char::from_u32(SYMBOL_BASE + code)
                .map(String::from)
                .unwrap_or_default();
        }
        u8::try_from(code)
            .map(|b| {
                encoding_rs::WINDOWS_1252
                    .decode_without_bom_handling(&[b])
                    .0
                    .into_owned()
            })
            .unwrap_or_default()
    }

    fn width(&self, code: u32) -> f64 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }
}

/// Graphics state saved by `q` and restored by `Q`, text state included.
#[derive(Clone)]
struct GraphicsState {
    ctm: Ctm,
    font: Option<Rc<Font>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    /// `Tz` divided by 100.
    horizontal_scale: f64,
    leading: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Ctm::identity(),
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
        }
    }
}

struct Interpreter<'a> {
    doc: &'a Document,
    max_depth: usize,
    /// Fonts loaded so far, keyed by their object id.
    fonts: HashMap<ObjectId, Rc<Font>>,
    fallback: Rc<Font>,
    runs: Vec<TextRun>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document, max_depth: usize) -> Self {
        Self {
            doc,
            max_depth,
            fonts: HashMap::new(),
            fallback: Rc::new(Font::default()),
            runs: Vec::new(),
        }
    }

    fn run(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        mut gs: GraphicsState,
        depth: usize,
    ) -> Result<(), BackendError> {
        let content = Content::decode(content)
            .map_err(|e| BackendError::Parse(format!("failed to decode content stream: {e}")))?;

        let mut saved: Vec<GraphicsState> = Vec::new();
        let mut tm = Ctm::identity();
        let mut tlm = Ctm::identity();

        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => saved.push(gs.clone()),
                "Q" => {
                    if let Some(previous) = saved.pop() {
                        gs = previous;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix(operands) {
                        gs.ctm = m.concat(&gs.ctm);
                    }
                }
                "BT" => {
                    tm = Ctm::identity();
                    tlm = tm;
                }
                "Tf" => {
                    if let Some(name) = operands.first().and_then(name_str) {
                        gs.font = Some(self.font(resources, &name));
                    }
                    gs.font_size = number(operands, 1).unwrap_or(gs.font_size);
                }
                "Tc" => gs.char_spacing = number(operands, 0).unwrap_or(gs.char_spacing),
                "Tw" => gs.word_spacing = number(operands, 0).unwrap_or(gs.word_spacing),
                "Tz" => {
                    if let Some(scale) = number(operands, 0) {
                        gs.horizontal_scale = scale / 100.0;
                    }
                }
                "TL" => gs.leading = number(operands, 0).unwrap_or(gs.leading),
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                        if op.operator == "TD" {
                            gs.leading = -ty;
                        }
                        tlm = Ctm::translation(tx, ty).concat(&tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix(operands) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => next_line(&mut tm, &mut tlm, gs.leading),
                "Tj" => self.show(&gs, &mut tm, operands.get(..1).unwrap_or_default()),
                "TJ" => {
                    if let Some(Ok(elements)) = operands.first().map(Object::as_array) {
                        self.show(&gs, &mut tm, elements);
                    }
                }
                "'" => {
                    next_line(&mut tm, &mut tlm, gs.leading);
                    self.show(&gs, &mut tm, operands.get(..1).unwrap_or_default());
                }
                "\"" => {
                    gs.word_spacing = number(operands, 0).unwrap_or(gs.word_spacing);
                    gs.char_spacing = number(operands, 1).unwrap_or(gs.char_spacing);
                    next_line(&mut tm, &mut tlm, gs.leading);
                    self.show(&gs, &mut tm, operands.get(2..3).unwrap_or_default());
                }
                "Do" => {
                    if let Some(name) = operands.first().and_then(name_str) {
                        self.invoke_xobject(resources, &name, &gs, depth);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Look up a font resource, loading it on first use.
    fn font(&mut self, resources: Option<&Dictionary>, name: &str) -> Rc<Font> {
        let doc = self.doc;
        let entry = resources
            .and_then(|r| dict_get(doc, r, b"Font"))
            .and_then(|obj| as_dict(doc, obj))
            .and_then(|fonts| fonts.get(name.as_bytes()).ok());
        let Some(entry) = entry else {
            debug!(font = name, "font not found in resources");
            return Rc::clone(&self.fallback);
        };

        let id = entry.as_reference().ok();
        if let Some(cached) = id.and_then(|id| self.fonts.get(&id)) {
            return Rc::clone(cached);
        }
        let font = Rc::new(
            as_dict(doc, entry)
                .map(|dict| Font::load(doc, dict))
                .unwrap_or_default(),
        );
        if let Some(id) = id {
            self.fonts.insert(id, Rc::clone(&font));
        }
        font
    }

    /// Emit one run for a sequence of strings and `TJ` adjustments, then
    /// advance the text matrix past it.
    fn show(&mut self, gs: &GraphicsState, tm: &mut Ctm, elements: &[Object]) {
        let font = gs.font.as_deref().unwrap_or(self.fallback.as_ref());
        let start = tm.concat(&gs.ctm);
        let mut text = String::new();
        let mut advance = 0.0;

        for element in elements {
            match element {
                Object::String(bytes, _) => {
                    for glyph in font.glyphs(bytes) {
                        let mut tx = glyph.width / 1000.0 * gs.font_size + gs.char_spacing;
                        if glyph.is_space {
                            tx += gs.word_spacing;
                        }
                        advance += tx * gs.horizontal_scale;
                        text.push_str(&glyph.text);
                    }
                }
                other => {
                    let Ok(adjust) = object_to_f64(other) else { continue };
                    if adjust < -TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                    advance -= adjust / 1000.0 * gs.font_size * gs.horizontal_scale;
                }
            }
        }

        *tm = Ctm::translation(advance, 0.0).concat(tm);
        if text.trim().is_empty() {
            return;
        }
        trace!(text = %text, x = start.e, y = start.f, "text run");
        self.runs.push(TextRun::new(
            text,
            start.e,
            start.f,
            advance * start.horizontal_scale(),
            gs.font_size * start.vertical_scale(),
        ));
    }

    /// Follow a form XObject. Broken or too deeply nested forms are skipped.
    fn invoke_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &str,
        gs: &GraphicsState,
        depth: usize,
    ) {
        let doc = self.doc;
        let Some(stream) = resources
            .and_then(|r| dict_get(doc, r, b"XObject"))
            .and_then(|obj| as_dict(doc, obj))
            .and_then(|xobjects| dict_get(doc, xobjects, name.as_bytes()))
            .and_then(|obj| obj.as_stream().ok())
        else {
            return;
        };
        if dict_get(doc, &stream.dict, b"Subtype").and_then(name_str).as_deref() != Some("Form") {
            return;
        }
        if depth >= self.max_depth {
            debug!(xobject = name, depth, "form XObject nesting limit reached");
            return;
        }

        let mut inner = gs.clone();
        if let Some(m) = dict_get(doc, &stream.dict, b"Matrix")
            .and_then(|obj| obj.as_array().ok())
            .and_then(|arr| matrix(arr))
        {
            inner.ctm = m.concat(&inner.ctm);
        }
        let form_resources = dict_get(doc, &stream.dict, b"Resources")
            .and_then(|obj| as_dict(doc, obj))
            .or(resources);

        let result = decode_content_stream(stream)
            .and_then(|content| self.run(&content, form_resources, inner, depth + 1));
        if let Err(e) = result {
            debug!(xobject = name, error = %e, "skipping unreadable form XObject");
        }
    }
}

fn number(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(|o| object_to_f64(o).ok())
}

fn matrix(operands: &[Object]) -> Option<Ctm> {
    if operands.len() != 6 {
        return None;
    }
    let v: Vec<f64> = operands
        .iter()
        .map(object_to_f64)
        .collect::<Result<_, _>>()
        .ok()?;
    Some(Ctm::new(v[0], v[1], v[2], v[3], v[4], v[5]))
}

fn next_line(tm: &mut Ctm, tlm: &mut Ctm, leading: f64) {
    *tlm = Ctm::translation(0.0, -leading).concat(tlm);
    *tm = *tlm;
}

/// Decode the text runs of 1-based page `page`.
///
/// Fails when the page does not exist or its content stream cannot be
/// decoded. Unknown fonts fall back to single-byte Windows-1252 codes.
pub fn page_text_runs(
    doc: &FormDocument,
    page: u32,
    options: &DetectOptions,
) -> Result<Vec<TextRun>, BackendError> {
    let page_id = doc
        .page_id(page)
        .ok_or_else(|| BackendError::Parse(format!("page {page} does not exist")))?;
    let inner = doc.inner();
    let page_dict = inner
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| BackendError::Parse(format!("failed to read page {page}: {e}")))?;

    let content = get_page_content_bytes(inner, page_dict)?;
    let resources = get_page_resources(inner, page_id);

    let mut interpreter = Interpreter::new(inner, options.max_xobject_depth);
    interpreter.run(&content, resources, GraphicsState::default(), 0)?;
    debug!(page, runs = interpreter.runs.len(), "page text decoded");
    Ok(interpreter.runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    /// One US Letter page drawing `content`, with resources built by `resources`.
    fn page_with(
        content: &[u8],
        resources: impl FnOnce(&mut Document) -> Dictionary,
    ) -> FormDocument {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let resources = resources(&mut doc);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        FormDocument::from_document(doc)
    }

    fn helvetica(doc: &mut Document) -> Dictionary {
        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        dictionary! { "Font" => dictionary! { "F1" => font } }
    }

    fn runs(doc: &FormDocument) -> Vec<TextRun> {
        page_text_runs(doc, 1, &DetectOptions::default()).unwrap()
    }

    #[test]
    fn simple_text_run_position_and_width() {
        let doc = page_with(b"BT /F1 12 Tf 72 700 Td (Name:) Tj ET", helvetica);
        let runs = runs(&doc);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Name:");
        assert_eq!((runs[0].origin.x, runs[0].origin.y), (72.0, 700.0));
        // Five glyphs at the default half-em width.
        assert!((runs[0].width - 30.0).abs() < 1e-9);
        assert_eq!(runs[0].font_size, 12.0);
    }

    #[test]
    fn consecutive_shows_advance_the_text_matrix() {
        let doc = page_with(b"BT /F1 10 Tf 100 500 Td (ab) Tj (cd) Tj ET", helvetica);
        let runs = runs(&doc);
        assert_eq!(runs.len(), 2);
        assert!((runs[1].origin.x - 110.0).abs() < 1e-9);
        assert_eq!(runs[1].origin.y, 500.0);
    }

    #[test]
    fn ctm_scales_position_and_font_size() {
        let doc = page_with(b"2 0 0 2 10 10 cm BT /F1 10 Tf 5 5 Td (A) Tj ET", helvetica);
        let runs = runs(&doc);
        assert_eq!((runs[0].origin.x, runs[0].origin.y), (20.0, 20.0));
        assert_eq!(runs[0].font_size, 20.0);
        assert!((runs[0].width - 10.0).abs() < 1e-9);
    }

    #[test]
    fn q_and_big_q_restore_the_ctm() {
        let doc = page_with(
            b"q 1 0 0 1 100 0 cm Q BT /F1 10 Tf 5 5 Td (A) Tj ET",
            helvetica,
        );
        assert_eq!(runs(&doc)[0].origin.x, 5.0);
    }

    #[test]
    fn wide_tj_adjustment_becomes_a_space() {
        let doc = page_with(b"BT /F1 10 Tf 0 0 Td [(Post) -300 (code) -20 (s)] TJ ET", helvetica);
        let runs = runs(&doc);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Post codes");
    }

    #[test]
    fn leading_moves_to_next_lines() {
        let doc = page_with(
            b"BT /F1 12 Tf 14 TL 72 700 Td (a) Tj T* (b) Tj (c) ' ET",
            helvetica,
        );
        let ys: Vec<f64> = runs(&doc).iter().map(|r| r.origin.y).collect();
        assert_eq!(ys, vec![700.0, 686.0, 672.0]);
    }

    #[test]
    fn declared_widths_are_used() {
        let doc = page_with(b"BT /F1 10 Tf (AB) Tj ET", |doc| {
            let font = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "TrueType",
                "BaseFont" => "Arial",
                "FirstChar" => 65,
                "Widths" => vec![600.into(), 0.into()],
            });
            dictionary! { "Font" => dictionary! { "F1" => font } }
        });
        // 600 for A, missing width for B falls back to 500.
        assert!((runs(&doc)[0].width - 11.0).abs() < 1e-9);
    }

    #[test]
    fn single_byte_text_is_windows_1252() {
        let doc = page_with(b"BT /F1 10 Tf (Stra\\337e M\\374ller) Tj ET", helvetica);
        assert_eq!(runs(&doc)[0].text, "Straße Müller");
    }

    #[test]
    fn to_unicode_cmap_decodes_two_byte_codes() {
        let doc = page_with(b"BT /F1 10 Tf <00010002> Tj ET", |doc| {
            let cmap = doc.add_object(Stream::new(
                dictionary! {},
                b"begincmap\n2 beginbfchar\n<0001> <004F>\n<0002> <004B>\nendbfchar\nendcmap\n".to_vec(),
            ));
            let font = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => "ABCDEF+Calibri",
                "Encoding" => "Identity-H",
                "ToUnicode" => cmap,
            });
            dictionary! { "Font" => dictionary! { "F1" => font } }
        });
        let runs = runs(&doc);
        assert_eq!(runs[0].text, "OK");
        // No descendant /DW: composite glyphs default to a full em.
        assert!((runs[0].width - 20.0).abs() < 1e-9);
    }

    #[test]
    fn symbolic_font_maps_into_private_use_area() {
        let doc = page_with(b"BT /F1 10 Tf (o) Tj ET", |doc| {
            let descriptor = doc.add_object(dictionary! {
                "Type" => "FontDescriptor",
                "FontName" => "Wingdings-Regular",
                "Flags" => 4,
            });
            let font = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "TrueType",
                "BaseFont" => "Wingdings-Regular",
                "FontDescriptor" => descriptor,
            });
            dictionary! { "Font" => dictionary! { "F1" => font } }
        });
        assert_eq!(runs(&doc)[0].text, "\u{F06F}");
    }

    #[test]
    fn unknown_font_falls_back_to_default_decoding() {
        let doc = page_with(b"BT /F9 10 Tf (Hi) Tj ET", helvetica);
        assert_eq!(runs(&doc)[0].text, "Hi");
    }

    #[test]
    fn whitespace_only_runs_are_dropped() {
        let doc = page_with(b"BT /F1 10 Tf (   ) Tj (x) Tj ET", helvetica);
        let runs = runs(&doc);
        assert_eq!(runs.len(), 1);
        assert!((runs[0].origin.x - 15.0).abs() < 1e-9);
    }

    fn form_resources(doc: &mut Document, content: &[u8], self_reference: bool) -> Dictionary {
        let fonts = helvetica(doc);
        let form_id = doc.new_object_id();
        let mut form_res = fonts.clone();
        if self_reference {
            form_res.set("XObject", dictionary! { "Fm1" => form_id });
        }
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 200.into(), 50.into()],
                "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 400.into()],
                "Resources" => form_res,
            },
            content.to_vec(),
        );
        doc.objects.insert(form_id, Object::Stream(form));
        let mut resources = fonts;
        resources.set("XObject", dictionary! { "Fm1" => form_id });
        resources
    }

    #[test]
    fn form_xobject_text_is_placed_with_its_matrix() {
        let doc = page_with(b"q 1 0 0 1 10 0 cm /Fm1 Do Q", |doc| {
            form_resources(doc, b"BT /F1 9 Tf 2 3 Td (Inside) Tj ET", false)
        });
        let runs = runs(&doc);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Inside");
        assert_eq!((runs[0].origin.x, runs[0].origin.y), (62.0, 403.0));
    }

    #[test]
    fn xobject_depth_limit_is_honored() {
        let doc = page_with(b"/Fm1 Do", |doc| {
            form_resources(doc, b"BT /F1 9 Tf (Inside) Tj ET", false)
        });
        let options = DetectOptions {
            max_xobject_depth: 0,
            ..DetectOptions::default()
        };
        assert!(page_text_runs(&doc, 1, &options).unwrap().is_empty());
    }

    #[test]
    fn self_referencing_form_terminates() {
        let doc = page_with(b"/Fm1 Do", |doc| {
            form_resources(doc, b"BT /F1 9 Tf (Loop) Tj ET /Fm1 Do", true)
        });
        // The page invokes the form once, then it nests up to the depth limit.
        assert_eq!(runs(&doc).len(), DetectOptions::default().max_xobject_depth);
    }

    #[test]
    fn missing_page_is_an_error() {
        let doc = page_with(b"", helvetica);
        assert!(page_text_runs(&doc, 2, &DetectOptions::default()).is_err());
        assert!(runs(&doc).is_empty());
    }
}
