use std::io::{self, IsTerminal, Write};
use std::path::Path;

use acroform::{DetectOptions, FormPdf};

use crate::page_range::PageSelection;

/// Read a file with user-friendly error messages.
///
/// Returns `Err(1)` with a message printed to stderr if the file is not
/// found or cannot be read.
pub fn read_file(file: &Path) -> Result<Vec<u8>, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }
    std::fs::read(file).map_err(|e| {
        eprintln!("Error: failed to read {}: {e}", file.display());
        1
    })
}

/// Open a form with user-friendly error messages.
pub fn open_form(file: &Path, options: DetectOptions) -> Result<FormPdf, i32> {
    let bytes = read_file(file)?;
    FormPdf::open(&bytes, Some(options)).map_err(|e| {
        eprintln!("Error: failed to open PDF: {e}");
        1
    })
}

/// Resolve an optional `--pages` value, printing parse errors.
pub fn resolve_pages(pages: Option<&str>, page_count: usize) -> Result<PageSelection, i32> {
    match pages {
        Some(range) => PageSelection::parse(range, page_count).map_err(|e| {
            eprintln!("Error: {e}");
            1
        }),
        None => Ok(PageSelection::all(page_count)),
    }
}

/// Escape a string for CSV output.
///
/// If the text contains commas, double quotes, or newlines, wraps it in
/// double quotes and escapes any internal double quotes by doubling them.
pub fn csv_escape(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Serialize to a JSON string, reporting failures as exit code 1.
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, i32> {
    serde_json::to_string(value).map_err(|e| {
        eprintln!("Error: failed to serialize JSON: {e}");
        1
    })
}

/// A progress reporter that prints "Processing page N/M..." to stderr,
/// but only when stderr is connected to a TTY (terminal).
pub struct ProgressReporter {
    total: usize,
    is_tty: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter for `total` pages.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            is_tty: io::stderr().is_terminal(),
        }
    }

    /// Report progress for page `current` (1-indexed).
    pub fn report(&self, current: usize) {
        if self.is_tty {
            eprint!("\rProcessing page {}/{}...", current, self.total);
            let _ = io::stderr().flush();
        }
    }

    /// Clear the progress line (if TTY).
    pub fn finish(&self) {
        if self.is_tty {
            eprint!("\r{}\r", " ".repeat(40));
            let _ = io::stderr().flush();
        }
    }
}
