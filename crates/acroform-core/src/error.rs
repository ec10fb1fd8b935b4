//! Error and warning types for acroform-rs.
//!
//! Provides [`FormError`] for fatal errors that stop an operation,
//! [`ExtractWarning`] for per-field problems that are recovered locally,
//! and [`ExtractResult`] for pairing a value with collected warnings.

use std::fmt;

/// Fatal error types for form processing.
///
/// Only whole-document failures are fatal; per-field failures become
/// [`ExtractWarning`]s instead.
#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    /// The bytes are not a readable PDF, or its form structure cannot be located.
    DocumentParse(String),
    /// I/O error reading or writing document data.
    Io(String),
    /// The PDF is encrypted and requires a password to open.
    PasswordRequired,
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::DocumentParse(msg) => write!(f, "document parse error: {msg}"),
            FormError::Io(msg) => write!(f, "I/O error: {msg}"),
            FormError::PasswordRequired => write!(f, "PDF is encrypted and requires a password"),
            FormError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for FormError {}

impl From<std::io::Error> for FormError {
    fn from(err: std::io::Error) -> Self {
        FormError::Io(err.to_string())
    }
}

/// Machine-readable category of a recovered problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WarningCode {
    /// A field dictionary could not be read; the field fell back to defaults.
    FieldRead,
    /// A field's rectangle or page could not be resolved; it has no position.
    GeometryLookup,
    /// Page text could not be decoded for nearby-label search.
    LabelSearch,
    /// An annotation or page object was malformed and skipped.
    MalformedAnnotation,
    /// A value could not be written into a field.
    Write,
    /// Flattening failed; the interactive document was kept.
    Flatten,
}

impl WarningCode {
    /// Returns the string tag for this warning code.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::FieldRead => "FIELD_READ",
            WarningCode::GeometryLookup => "GEOMETRY_LOOKUP",
            WarningCode::LabelSearch => "LABEL_SEARCH",
            WarningCode::MalformedAnnotation => "MALFORMED_ANNOTATION",
            WarningCode::Write => "WRITE",
            WarningCode::Flatten => "FLATTEN",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal problem encountered while detecting or filling fields.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub description: String,
    /// 1-based page number, if the problem is tied to a page.
    pub page: Option<u32>,
    /// Qualified field name, if the problem is tied to a field.
    pub field: Option<String>,
}

impl ExtractWarning {
    pub fn new(code: WarningCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            page: None,
            field: None,
        }
    }

    /// Attach a field name (builder pattern).
    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach a 1-based page number (builder pattern).
    pub fn on_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(ref field) = self.field {
            write!(f, " (field {field})")?;
        }
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        Ok(())
    }
}

/// Result wrapper that pairs a value with collected warnings.
#[derive(Debug, Clone)]
pub struct ExtractResult<T> {
    pub value: T,
    pub warnings: Vec<ExtractWarning>,
}

impl<T> ExtractResult<T> {
    /// Create a result with no warnings.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<ExtractWarning>) -> Self {
        Self { value, warnings }
    }

    /// Returns true if there are no warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Number of warnings carrying `code`.
    pub fn count(&self, code: WarningCode) -> usize {
        self.warnings.iter().filter(|w| w.code == code).count()
    }

    /// Transform the value while preserving warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractResult<U> {
        ExtractResult {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
