use std::path::Path;

use acroform::{DetectOptions, TranscriptOptions};

use crate::cli::TextFormat;
use crate::shared::{ProgressReporter, open_form, resolve_pages, to_json};

pub fn run(file: &Path, pages: Option<&str>, format: &TextFormat) -> Result<(), i32> {
    let pdf = open_form(file, DetectOptions::default())?;
    let selection = resolve_pages(pages, pdf.page_count())?;
    let progress = ProgressReporter::new(selection.len());

    let fields = pdf.detect_fields().value;
    let mut done = 0;
    for page in pdf.page_texts(&fields, TranscriptOptions::default()) {
        if !selection.contains(page.page) {
            continue;
        }
        done += 1;
        progress.report(done);

        match format {
            TextFormat::Text => {
                println!("--- Page {} ---", page.page);
                println!("{}", page.text);
            }
            TextFormat::Json => {
                let obj = serde_json::json!({
                    "page": page.page,
                    "text": page.text,
                });
                println!("{}", to_json(&obj)?);
            }
        }
    }

    progress.finish();
    Ok(())
}
