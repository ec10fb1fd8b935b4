//! Fill text fields of a PDF form from `name=value` arguments.
//!
//! Usage: `cargo run --example fill_form -- <in.pdf> <out.pdf> name=value...`

use std::collections::HashMap;

use acroform::{FieldValue, FillOptions, fill_form_with_report};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("Usage: fill_form <in.pdf> <out.pdf> name=value...");
        std::process::exit(1);
    }

    let bytes = std::fs::read(&args[0]).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", args[0]);
        std::process::exit(1);
    });
    let values: HashMap<String, FieldValue> = args[2..]
        .iter()
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.to_string(), FieldValue::Text(value.to_string())))
        .collect();

    let result = fill_form_with_report(&bytes, &values, &FillOptions::default())
        .unwrap_or_else(|e| {
            eprintln!("Error filling form: {e}");
            std::process::exit(1);
        });
    let report = result.value.report;
    println!(
        "filled {}, skipped {}, failed {}",
        report.filled, report.skipped, report.failed
    );
    std::fs::write(&args[1], &result.value.bytes).unwrap();
}
