//! Form field types for AcroForm detection.
//!
//! [`RawFieldKind`] mirrors the `/FT` entry as the document declares it,
//! [`FieldKind`] is the resolved kind exposed to callers, and
//! [`FieldDescriptor`] is one logical field after reconciliation.
//! [`WidgetGeometry`] is the intermediate per-annotation record produced by
//! the geometry pass.

use std::fmt;

use crate::BBox;

/// Field flag bits from the `/Ff` entry (PDF 1.7 Tables 221, 226, 228, 230).
pub mod field_flags {
    pub const READ_ONLY: u32 = 1;
    pub const REQUIRED: u32 = 1 << 1;
    pub const NO_EXPORT: u32 = 1 << 2;
    pub const MULTILINE: u32 = 1 << 12;
    pub const PASSWORD: u32 = 1 << 13;
    pub const NO_TOGGLE_TO_OFF: u32 = 1 << 14;
    pub const RADIO: u32 = 1 << 15;
    pub const PUSHBUTTON: u32 = 1 << 16;
    pub const COMBO: u32 = 1 << 17;
    pub const EDIT: u32 = 1 << 18;
    pub const COMB: u32 = 1 << 24;
}

/// The type of a PDF form field as declared by `/FT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RawFieldKind {
    /// Text field (`/FT /Tx`).
    Text,
    /// Button field (`/FT /Btn`): checkboxes, radio buttons and push buttons.
    Button,
    /// Choice field (`/FT /Ch`): dropdowns and list boxes.
    Choice,
    /// Signature field (`/FT /Sig`).
    Signature,
}

impl RawFieldKind {
    /// Parse a field type from its PDF name string.
    ///
    /// Returns `None` if the string is not a recognized field type.
    pub fn from_pdf_name(name: &str) -> Option<Self> {
        match name {
            "Tx" => Some(Self::Text),
            "Btn" => Some(Self::Button),
            "Ch" => Some(Self::Choice),
            "Sig" => Some(Self::Signature),
            _ => None,
        }
    }

    /// Return the PDF name string for this field type.
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            Self::Text => "Tx",
            Self::Button => "Btn",
            Self::Choice => "Ch",
            Self::Signature => "Sig",
        }
    }
}

impl fmt::Display for RawFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_pdf_name())
    }
}

/// Resolved kind of a logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum FieldKind {
    Text,
    Checkbox,
    /// Single-selection choice shown as a dropdown.
    Select,
    /// Radio button group, or a choice list with all options visible.
    Radio,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
            Self::Radio => "radio",
        }
    }

    /// Whether descriptors of this kind carry an option list.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value of a field.
///
/// Text, select and radio fields hold a string; checkboxes hold their
/// checked state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum FieldValue {
    Checked(bool),
    Text(String),
}

impl FieldValue {
    /// The default value for a freshly created field of `kind`.
    pub fn empty_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Checkbox => Self::Checked(false),
            _ => Self::Text(String::new()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Checked(_) => None,
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self, Self::Checked(true))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checked(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Which label-resolution strategy produced a descriptor's label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum MetadataSource {
    Tooltip,
    AlternateName,
    NearbyText,
    Fallback,
}

impl MetadataSource {
    /// The camelCase name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tooltip => "tooltip",
            Self::AlternateName => "alternateName",
            Self::NearbyText => "nearbyText",
            Self::Fallback => "fallback",
        }
    }
}

/// Where a field sits on its page.
///
/// `rect` keeps document coordinates (bottom-left origin); `x`, `y`,
/// `width` and `height` are the same box with a top-left origin, ready
/// for display overlays.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldPosition {
    /// 1-based page number.
    pub page: u32,
    pub rect: [f64; 4],
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FieldPosition {
    /// Build a position from a rectangle on a page of `page_height` points.
    ///
    /// `page` is clamped to at least 1 and the rectangle is normalized, so
    /// `width` and `height` are never negative.
    pub fn new(page: u32, rect: BBox, page_height: f64) -> Self {
        let rect = BBox::from_corners(rect.x0, rect.y0, rect.x1, rect.y1);
        Self {
            page: page.max(1),
            rect: rect.to_array(),
            x: rect.x0,
            y: page_height - rect.y1,
            width: rect.width(),
            height: rect.height(),
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.rect[0], self.rect[1], self.rect[2], self.rect[3])
    }
}

/// One logical form field after reconciliation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct FieldDescriptor {
    /// Unique within one extraction result.
    pub name: String,
    /// Display label, never empty.
    pub label: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: FieldKind,
    pub value: FieldValue,
    /// Only present for select and radio fields.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub options: Option<Vec<String>>,
    pub required: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Option<FieldPosition>,
    pub metadata_source: MetadataSource,
    pub is_synthesized_widget: bool,
}

impl FieldDescriptor {
    /// The descriptor used when a field's dictionary cannot be read:
    /// a text field with an empty value and no position.
    pub fn minimal(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind: FieldKind::Text,
            value: FieldValue::Text(String::new()),
            options: None,
            required: false,
            position: None,
            metadata_source: MetadataSource::Fallback,
            is_synthesized_widget: false,
        }
    }

    pub fn page(&self) -> Option<u32> {
        self.position.as_ref().map(|p| p.page)
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.position.as_ref().map(FieldPosition::bbox)
    }
}

/// One physical widget annotation, before deduplication.
///
/// Many entries may share the same `field_name` (split character boxes,
/// repeated checkboxes).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WidgetGeometry {
    /// 1-based page number.
    pub page: u32,
    pub rect: BBox,
    pub field_name: String,
    /// `/FT` of the widget or its nearest ancestor, if any.
    pub raw_kind: Option<RawFieldKind>,
    /// `/Ff` of the widget or its nearest ancestor, 0 when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: u32,
    /// Enumeration order across the whole document.
    pub widget_index: usize,
    /// Height of the page the widget sits on, for display normalization.
    pub page_height: f64,
}

impl WidgetGeometry {
    pub fn position(&self) -> FieldPosition {
        FieldPosition::new(self.page, self.rect, self.page_height)
    }

    /// Whether the widget belongs to a field that can carry a value.
    ///
    /// Push buttons and signature fields cannot.
    pub fn holds_value(&self) -> bool {
        match self.raw_kind {
            Some(RawFieldKind::Signature) => false,
            Some(RawFieldKind::Button) => self.flags & field_flags::PUSHBUTTON == 0,
            _ => true,
        }
    }
}
