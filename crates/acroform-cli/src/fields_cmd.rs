use std::path::Path;

use acroform::{DetectOptions, FieldDescriptor};

use crate::cli::OutputFormat;
use crate::shared::{csv_escape, open_form, resolve_pages, to_json};

pub fn run(
    file: &Path,
    pages: Option<&str>,
    format: &OutputFormat,
    label_search_left: f64,
) -> Result<(), i32> {
    let options = DetectOptions {
        label_search_left,
        ..DetectOptions::default()
    };
    let pdf = open_form(file, options)?;
    let selected = match pages {
        Some(_) => Some(resolve_pages(pages, pdf.page_count())?),
        None => None,
    };

    let detected = pdf.detect_fields().value;
    let fields: Vec<&FieldDescriptor> = detected
        .iter()
        .filter(|field| match &selected {
            None => true,
            Some(selection) => field.page().is_some_and(|p| selection.contains(p)),
        })
        .collect();

    match format {
        OutputFormat::Text => write_text(&fields),
        OutputFormat::Json => println!("{}", to_json(&fields)?),
        OutputFormat::Csv => write_csv(&fields),
    }
    Ok(())
}

/// Page number, or `-` for a field without a position.
fn page_cell(field: &FieldDescriptor) -> String {
    field
        .page()
        .map_or_else(|| "-".to_string(), |p| p.to_string())
}

/// `x, y, width, height` with a top-left origin, empty without a position.
fn geometry_cells(field: &FieldDescriptor) -> [String; 4] {
    match &field.position {
        Some(p) => [p.x, p.y, p.width, p.height].map(|v| format!("{v:.2}")),
        None => Default::default(),
    }
}

fn options_cell(field: &FieldDescriptor) -> String {
    field.options.as_deref().unwrap_or_default().join("; ")
}

fn write_text(fields: &[&FieldDescriptor]) {
    println!("page\tname\ttype\tlabel\tvalue\toptions\tsource\tsynthesized\tx\ty\twidth\theight");
    for field in fields {
        let [x, y, width, height] = geometry_cells(field);
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{x}\t{y}\t{width}\t{height}",
            page_cell(field),
            field.name,
            field.kind,
            field.label,
            field.value,
            options_cell(field),
            field.metadata_source.as_str(),
            field.is_synthesized_widget,
        );
    }
}

fn write_csv(fields: &[&FieldDescriptor]) {
    println!("page,name,type,label,value,options,source,synthesized,x,y,width,height");
    for field in fields {
        let [x, y, width, height] = geometry_cells(field);
        println!(
            "{},{},{},{},{},{},{},{},{x},{y},{width},{height}",
            page_cell(field),
            csv_escape(&field.name),
            field.kind,
            csv_escape(&field.label),
            csv_escape(&field.value.to_string()),
            csv_escape(&options_cell(field)),
            field.metadata_source.as_str(),
            field.is_synthesized_widget,
        );
    }
}
