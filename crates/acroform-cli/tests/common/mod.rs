//! Fixture forms and helpers shared by the CLI tests.

#![allow(dead_code)]

use std::io::Write;

use assert_cmd::Command;
use lopdf::{Object, Stream, dictionary};

pub fn cmd() -> Command {
    Command::cargo_bin("acroform").unwrap()
}

fn rect(r: [f64; 4]) -> Object {
    Object::Array(r.iter().map(|&v| Object::Real(v as f32)).collect())
}

/// A two-page form.
///
/// Page 1 prints `Name:` before text field `applicant_name`, `I agree`
/// before checkbox `agree` and `IBAN` before a field `iban` split into 4
/// boxes. Page 2 prints `City:` before text field `city` holding "Paris".
pub fn sample_form() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page1 = doc.new_object_id();
    let page2 = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let name = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("applicant_name"),
        "Rect" => rect([200.0, 696.0, 400.0, 712.0]),
        "P" => page1,
    });

    let on = doc.add_object(Stream::new(
        dictionary! { "Type" => "XObject", "Subtype" => "Form", "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()] },
        b"0 0 0 rg 2 2 8 8 re f".to_vec(),
    ));
    let agree = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal("agree"),
        "V" => "Off",
        "AS" => "Off",
        "AP" => dictionary! { "N" => dictionary! { "Yes" => on } },
        "Rect" => rect([200.0, 656.0, 212.0, 668.0]),
        "P" => page1,
    });

    let iban = doc.new_object_id();
    let boxes: Vec<Object> = (0..4)
        .map(|i| {
            let x = 200.0 + f64::from(i) * 18.0;
            doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Widget",
                "Parent" => iban,
                "Rect" => rect([x, 616.0, x + 14.0, 632.0]),
                "P" => page1,
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        iban,
        Object::Dictionary(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("iban"),
            "Kids" => boxes.clone(),
        }),
    );

    let city = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("city"),
        "V" => Object::string_literal("Paris"),
        "Rect" => rect([200.0, 696.0, 400.0, 712.0]),
        "P" => page2,
    });

    let content1 = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 10 Tf 100 700 Td (Name:) Tj ET\n\
          BT /F1 10 Tf 100 660 Td (I agree) Tj ET\n\
          BT /F1 10 Tf 100 620 Td (IBAN) Tj ET\n"
            .to_vec(),
    ));
    let content2 = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 10 Tf 100 700 Td (City:) Tj ET\n".to_vec(),
    ));

    let mut annots1: Vec<Object> = vec![name.into(), agree.into()];
    annots1.extend(boxes);
    for (page_id, content, annots) in [
        (page1, content1, annots1),
        (page2, content2, vec![city.into()]),
    ] {
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
                "Annots" => annots,
            }),
        );
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page1.into(), page2.into()],
            "Count" => 2,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! {
            "Fields" => vec![name.into(), agree.into(), iban.into(), city.into()],
        },
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Write bytes to a temporary file with the given suffix.
pub fn write_temp(bytes: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    f.write_all(bytes).unwrap();
    f.flush().unwrap();
    f
}

pub fn write_temp_pdf(bytes: &[u8]) -> tempfile::NamedTempFile {
    write_temp(bytes, ".pdf")
}

/// Run `acroform fields --format json` on `path` and parse the output.
pub fn fields_json(path: &std::path::Path) -> Vec<serde_json::Value> {
    let output = cmd()
        .args(["fields", path.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}
