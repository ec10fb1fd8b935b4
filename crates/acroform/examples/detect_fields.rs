//! List the fields of a PDF form in reading order.
//!
//! Usage: `cargo run --example detect_fields -- <path-to-pdf>`

use acroform::FormPdf;

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: detect_fields <path-to-pdf>");
        std::process::exit(1);
    });

    let pdf = FormPdf::open_file(&path, None).unwrap_or_else(|e| {
        eprintln!("Error opening PDF: {e}");
        std::process::exit(1);
    });

    let result = pdf.detect_fields();
    println!("Pages: {}", pdf.page_count());
    println!("Fields: {}", result.value.len());
    println!();

    for field in &result.value {
        let page = field
            .page()
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        let synthesized = if field.is_synthesized_widget { " *" } else { "" };
        println!(
            "p{page:<3} {:<10} {:<30} {}{synthesized}",
            field.kind.as_str(),
            field.name,
            field.label
        );
    }
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
}
