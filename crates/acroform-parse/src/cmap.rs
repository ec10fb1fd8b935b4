//! ToUnicode CMap parser for mapping character codes to Unicode strings.
//!
//! Parses CMap data embedded in PDF `/ToUnicode` streams to convert glyph codes
//! to Unicode text. Supports `beginbfchar`/`endbfchar` (single mappings) and
//! `beginbfrange`/`endbfrange` (range mappings) with UTF-16BE encoded values.

use std::collections::HashMap;

use crate::error::BackendError;

/// Ranges wider than this are assumed corrupt and ignored.
const MAX_RANGE_LEN: u32 = 0x1_0000;

/// A parsed ToUnicode CMap that maps character codes to Unicode strings.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    mappings: HashMap<u32, String>,
    /// Byte width of source codes, taken from the first mapping seen.
    code_bytes: Option<usize>,
}

impl CMap {
    /// Parse a ToUnicode CMap from its raw byte content.
    pub fn parse(data: &[u8]) -> Result<Self, BackendError> {
        let text = String::from_utf8_lossy(data);
        let mut cmap = CMap::default();

        for section in sections(&text, "beginbfchar", "endbfchar") {
            cmap.parse_bfchar_section(section)?;
        }
        for section in sections(&text, "beginbfrange", "endbfrange") {
            cmap.parse_bfrange_section(section)?;
        }
        Ok(cmap)
    }

    /// Look up the Unicode string for a character code.
    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(|s| s.as_str())
    }

    /// Width in bytes of the codes this CMap maps (1 unless it declares 2-byte codes).
    pub fn code_bytes(&self) -> usize {
        self.code_bytes.unwrap_or(1)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn note_code_width(&mut self, hex: &str) {
        if self.code_bytes.is_none() {
            self.code_bytes = Some(hex.len().div_ceil(2).max(1));
        }
    }

    /// Each line has format: `<srcCode> <dstUnicode>`
    fn parse_bfchar_section(&mut self, section: &str) -> Result<(), BackendError> {
        for line in section.lines() {
            let tokens = extract_hex_tokens(line);
            if tokens.len() >= 2 {
                self.note_code_width(tokens[0]);
                let src_code = parse_hex_code(tokens[0])?;
                let unicode_str = decode_utf16be_hex(tokens[1])?;
                self.mappings.insert(src_code, unicode_str);
            }
        }
        Ok(())
    }

    /// Each line has format: `<srcLow> <srcHigh> <dstStart>`
    /// or: `<srcLow> <srcHigh> [<str1> <str2> ...]`
    fn parse_bfrange_section(&mut self, section: &str) -> Result<(), BackendError> {
        for line in section.lines() {
            let (head, array) = match line.find('[') {
                Some(at) => (&line[..at], Some(&line[at + 1..])),
                None => (line, None),
            };
            let tokens = extract_hex_tokens(head);
            if tokens.len() < 2 {
                continue;
            }
            self.note_code_width(tokens[0]);
            let src_low = parse_hex_code(tokens[0])?;
            let src_high = parse_hex_code(tokens[1])?;
            if src_high < src_low || src_high - src_low > MAX_RANGE_LEN {
                continue;
            }

            match array {
                Some(array) => {
                    let array = array.split(']').next().unwrap_or(array);
                    for (code, dst_hex) in (src_low..=src_high).zip(extract_hex_tokens(array)) {
                        self.mappings.insert(code, decode_utf16be_hex(dst_hex)?);
                    }
                }
                None => {
                    let Some(dst_hex) = tokens.get(2) else { continue };
                    let dst_start = parse_hex_code(dst_hex)?;
                    for offset in 0..=(src_high - src_low) {
                        let Some(dst) = dst_start.checked_add(offset) else {
                            break;
                        };
                        if let Some(ch) = char::from_u32(dst) {
                            self.mappings.insert(src_low + offset, ch.to_string());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Bodies of every `begin...end` section, in order.
fn sections<'a>(text: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(begin) {
        let body = &rest[start + begin.len()..];
        let Some(stop) = body.find(end) else { break };
        found.push(&body[..stop]);
        rest = &body[stop + end.len()..];
    }
    found
}

/// Parse a hex string like "0041" into a u32 character code.
fn parse_hex_code(hex: &str) -> Result<u32, BackendError> {
    u32::from_str_radix(hex, 16)
        .map_err(|e| BackendError::Parse(format!("invalid hex code '{hex}': {e}")))
}

/// Decode a hex string as UTF-16BE code units into a Unicode string.
///
/// A 2-digit value is treated as a single code unit padded to 4 digits.
fn decode_utf16be_hex(hex: &str) -> Result<String, BackendError> {
    if hex.len() == 2 {
        return decode_utf16be_hex(&format!("00{hex}"));
    }
    if hex.len() % 4 != 0 {
        return Err(BackendError::Parse(format!(
            "UTF-16BE hex string must have length divisible by 4, got '{hex}'"
        )));
    }
    let units = hex
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            std::str::from_utf8(chunk)
                .ok()
                .and_then(|s| u16::from_str_radix(s, 16).ok())
                .ok_or_else(|| BackendError::Parse(format!("invalid UTF-16BE hex '{hex}'")))
        })
        .collect::<Result<Vec<u16>, _>>()?;
    String::from_utf16(&units)
        .map_err(|e| BackendError::Parse(format!("invalid UTF-16BE sequence: {e}")))
}

/// Extract all `<hex>` tokens from a line of text.
fn extract_hex_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let Some(end) = rest[start + 1..].find('>') else { break };
        tokens.push(rest[start + 1..start + 1 + end].trim());
        rest = &rest[start + 1 + end + 1..];
    }
    tokens
}
