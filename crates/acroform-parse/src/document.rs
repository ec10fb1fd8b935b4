//! Opening documents and reading lopdf objects.
//!
//! [`FormDocument`] wraps a parsed [`lopdf::Document`] with its ordered
//! page list. The free functions here are the small object-access helpers
//! shared by the readers: reference resolution, number and rectangle
//! conversion, inherited lookups and PDF text-string decoding.

use acroform_core::{BBox, FormError};
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::BackendError;

/// US Letter height, used when a page has no readable `/MediaBox`.
pub const DEFAULT_PAGE_HEIGHT: f64 = 792.0;

/// A parsed PDF document with its page list cached.
pub struct FormDocument {
    inner: Document,
    /// Page object ids in page order (index 0 is page 1).
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for FormDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl FormDocument {
    /// Parse a document from bytes.
    ///
    /// Encrypted documents are rejected with [`FormError::PasswordRequired`].
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        let inner = Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Core(FormError::PasswordRequired));
        }
        Ok(Self::from_document(inner))
    }

    pub fn from_document(inner: Document) -> Self {
        // get_pages returns BTreeMap<u32, ObjectId> with 1-based keys
        let page_ids = inner.get_pages().values().copied().collect();
        Self { inner, page_ids }
    }

    pub fn inner(&self) -> &Document {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    pub fn into_inner(self) -> Document {
        self.inner
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    /// Object id of 1-based page `number`.
    pub fn page_id(&self, number: u32) -> Option<ObjectId> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.page_ids.get(index).copied()
    }

    /// 1-based page number of a page object.
    pub fn page_number(&self, id: ObjectId) -> Option<u32> {
        self.page_ids
            .iter()
            .position(|&p| p == id)
            .and_then(|i| u32::try_from(i + 1).ok())
    }

    /// Height of a page's `/MediaBox`, inherited through the page tree.
    pub fn page_height(&self, page_id: ObjectId) -> f64 {
        resolve_inherited(&self.inner, page_id, b"MediaBox")
            .ok()
            .flatten()
            .map(|obj| resolve(&self.inner, obj))
            .and_then(|obj| obj.as_array().ok())
            .and_then(|arr| extract_bbox_from_array(arr).ok())
            .map_or(DEFAULT_PAGE_HEIGHT, |b| b.height())
    }

    /// The document catalog.
    pub fn catalog(&self) -> Option<&Dictionary> {
        let root = self.inner.trailer.get(b"Root").ok()?;
        resolve(&self.inner, root).as_dict().ok()
    }

    /// The interactive form dictionary, if the document has one.
    pub fn acroform(&self) -> Option<&Dictionary> {
        let acroform = self.catalog()?.get(b"AcroForm").ok()?;
        resolve(&self.inner, acroform).as_dict().ok()
    }
}

/// Follow an indirect reference; other objects are returned as-is.
///
/// A dangling reference resolves to itself, so callers see a
/// `Reference` where they expected a dictionary and skip it.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Look up `key` in a dictionary and resolve the value.
pub(crate) fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

/// Resolve an object to a dictionary, following references.
pub(crate) fn as_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &Object) -> Result<f64, BackendError> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(f) => Ok(*f as f64),
        _ => Err(BackendError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Extract a [`BBox`] from a lopdf array of 4 numbers `[x0, y0, x1, y1]`.
///
/// Corners may come in any order; the result is normalized.
pub(crate) fn extract_bbox_from_array(array: &[Object]) -> Result<BBox, BackendError> {
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    }
    let x0 = object_to_f64(&array[0])?;
    let y0 = object_to_f64(&array[1])?;
    let x1 = object_to_f64(&array[2])?;
    let y1 = object_to_f64(&array[3])?;
    Ok(BBox::from_corners(x0, y0, x1, y1))
}

/// Read a dictionary's `/Rect`.
pub(crate) fn dict_rect(doc: &Document, dict: &Dictionary) -> Option<BBox> {
    let arr = dict_get(doc, dict, b"Rect")?.as_array().ok()?;
    extract_bbox_from_array(arr).ok()
}

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
///
/// Returns `None` if the key is not found anywhere in the tree.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current_id = page_id;
    // Page trees are shallow; the bound only matters for cyclic /Parent links.
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Ok(None)
}

/// Look up an inheritable field attribute (`/FT`, `/Ff`, `/V`, `/TU`...)
/// on a field or widget dictionary and its `/Parent` chain.
pub(crate) fn field_inherited<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
    max_depth: usize,
) -> Option<&'a Object> {
    let mut current = dict;
    for _ in 0..=max_depth {
        if let Some(value) = dict_get(doc, current, key) {
            return Some(value);
        }
        current = as_dict(doc, current.get(b"Parent").ok()?)?;
    }
    None
}

/// The value of a `/Name` object as a string.
pub(crate) fn name_str(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// An integer entry, resolving references.
pub(crate) fn dict_i64(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match dict_get(doc, dict, key)? {
        Object::Integer(n) => Some(*n),
        Object::Real(f) => Some(*f as i64),
        _ => None,
    }
}

/// Decode a PDF text string.
///
/// Handles UTF-16BE and UTF-8 byte-order marks. Unmarked strings are
/// read as UTF-8 when valid and otherwise as PDFDocEncoding, which agrees
/// with Windows-1252 on every printable code the forms we see use.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => encoding_rs::WINDOWS_1252
            .decode_without_bom_handling(bytes)
            .0
            .into_owned(),
    }
}

/// Read a text entry, accepting both strings and names.
pub(crate) fn dict_text(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    text_of(dict_get(doc, dict, key)?)
}

pub(crate) fn text_of(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(_) => name_str(obj),
        _ => None,
    }
}

/// Encode text as a PDF string object: literal for ASCII, UTF-16BE otherwise.
pub fn encode_pdf_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, lopdf::StringFormat::Hexadecimal)
}

/// Get the content stream bytes from a page dictionary.
///
/// Handles both single stream references and arrays of stream references.
pub(crate) fn get_page_content_bytes(
    doc: &Document,
    page_dict: &Dictionary,
) -> Result<Vec<u8>, BackendError> {
    let contents_obj = match page_dict.get(b"Contents") {
        Ok(obj) => obj,
        Err(_) => return Ok(Vec::new()), // Page with no content
    };

    match resolve(doc, contents_obj) {
        Object::Stream(stream) => decode_content_stream(stream),
        Object::Array(arr) => {
            let mut content = Vec::new();
            for item in arr {
                let stream = resolve(doc, item).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                let bytes = decode_content_stream(stream)?;
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            Ok(content)
        }
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

/// Decode a content stream, decompressing if needed.
pub(crate) fn decode_content_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Get the resources dictionary for a page, handling inheritance.
pub(crate) fn get_page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let obj = resolve_inherited(doc, page_id, b"Resources").ok()??;
    as_dict(doc, obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn one_page_doc(media_box: Object) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => media_box,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn open_invalid_bytes_returns_error() {
        let err = FormDocument::open(b"not a pdf").unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[test]
    fn page_height_inherited_from_parent() {
        let bytes = one_page_doc(vec![0.into(), 0.into(), 595.into(), 842.into()].into());
        let doc = FormDocument::open(&bytes).unwrap();
        assert_eq!(doc.page_count(), 1);
        let page = doc.page_id(1).unwrap();
        assert_eq!(doc.page_height(page), 842.0);
        assert_eq!(doc.page_number(page), Some(1));
        assert_eq!(doc.page_id(0), None);
        assert_eq!(doc.page_id(2), None);
    }

    #[test]
    fn page_height_defaults_without_media_box() {
        let bytes = one_page_doc(Object::Null);
        let doc = FormDocument::open(&bytes).unwrap();
        let page = doc.page_id(1).unwrap();
        assert_eq!(doc.page_height(page), DEFAULT_PAGE_HEIGHT);
    }

    #[test]
    fn document_without_form_has_no_acroform() {
        let bytes = one_page_doc(vec![0.into(), 0.into(), 612.into(), 792.into()].into());
        let doc = FormDocument::open(&bytes).unwrap();
        assert!(doc.catalog().is_some());
        assert!(doc.acroform().is_none());
    }

    #[test]
    fn bbox_normalizes_corners() {
        let arr: Vec<Object> = vec![100.into(), 50.into(), 20.into(), Object::Real(10.5)];
        let bbox = extract_bbox_from_array(&arr).unwrap();
        assert_eq!((bbox.x0, bbox.y0, bbox.x1, bbox.y1), (20.0, 10.5, 100.0, 50.0));
        assert!(extract_bbox_from_array(&arr[..3]).is_err());
    }

    #[test]
    fn decode_utf16_with_bom() {
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x4E, 0x00, 0xE4]), "Nä");
    }

    #[test]
    fn decode_utf8_with_and_without_bom() {
        assert_eq!(decode_pdf_string(&[0xEF, 0xBB, 0xBF, b'h', b'i']), "hi");
        assert_eq!(decode_pdf_string("Straße".as_bytes()), "Straße");
    }

    #[test]
    fn decode_single_byte_falls_back_to_windows_1252() {
        // 0x80 is the euro sign in Windows-1252 and PDFDocEncoding.
        assert_eq!(decode_pdf_string(&[b'5', 0x80]), "5€");
        assert_eq!(decode_pdf_string(&[b'M', 0xFC, b'n']), "Mün");
    }

    #[test]
    fn encode_round_trips_through_decode() {
        for text in ["plain", "Grüße", ""] {
            let Object::String(bytes, _) = encode_pdf_string(text) else {
                panic!("expected string object");
            };
            assert_eq!(decode_pdf_string(&bytes), text);
        }
    }

    #[test]
    fn field_inherited_walks_parent_chain() {
        let mut doc = Document::with_version("1.7");
        let parent_id = doc.add_object(dictionary! { "FT" => "Tx", "Ff" => 2 });
        let child = dictionary! { "Parent" => parent_id, "T" => Object::string_literal("kid") };
        assert_eq!(
            field_inherited(&doc, &child, b"FT", 8).and_then(name_str).as_deref(),
            Some("Tx")
        );
        assert!(field_inherited(&doc, &child, b"TU", 8).is_none());
    }
}
