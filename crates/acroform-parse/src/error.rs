//! Error types for the lopdf backend.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Provides [`BackendError`]
//! that wraps backend-specific errors and converts them to [`FormError`].

use acroform_core::FormError;
use thiserror::Error;

/// Error type for lopdf backend operations.
///
/// Wraps backend-specific errors and provides conversion to [`FormError`]
/// for unified error handling across the library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading or writing PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error changing a document object or serializing the document.
    #[error("write error: {0}")]
    Write(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] FormError),
}

impl From<BackendError> for FormError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => FormError::DocumentParse(msg),
            BackendError::Io(e) => FormError::Io(e.to_string()),
            BackendError::Write(msg) => FormError::Other(msg),
            BackendError::Core(e) => e,
        }
    }
}
