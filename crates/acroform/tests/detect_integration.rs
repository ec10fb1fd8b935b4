//! Integration tests for field detection on in-memory forms.

mod common;

use std::collections::HashSet;

use acroform::{
    DetectOptions, FieldKind, FieldValue, FormError, FormPdf, MetadataSource, WarningCode,
    detect_fields, detect_fields_with, is_reading_order, sort_reading_order,
};
use common::{FormBuilder, iban_box_x};
use lopdf::{Dictionary, Object, dictionary};

#[test]
fn nearby_text_labels_a_bare_text_field() {
    let fields = detect_fields(&common::applicant_form()).unwrap();

    assert_eq!(fields.len(), 1);
    let field = &fields[0];
    assert_eq!(field.name, "applicant_name");
    assert_eq!(field.label, "Name:");
    assert_eq!(field.metadata_source, MetadataSource::NearbyText);
    assert_eq!(field.kind, FieldKind::Text);
    assert_eq!(field.value, FieldValue::Text(String::new()));
    assert!(!field.is_synthesized_widget);

    let position = field.position.as_ref().unwrap();
    assert_eq!(position.page, 1);
    assert_eq!(position.x, 200.0);
    assert_eq!(position.y, 792.0 - 712.0);
    assert_eq!(position.width, 200.0);
    assert_eq!(position.height, 16.0);
}

#[test]
fn split_iban_boxes_become_separate_fields() {
    let fields = detect_fields(&common::iban_form()).unwrap();

    assert_eq!(fields.len(), 22);
    assert_eq!(fields[0].name, "iban");
    assert!(!fields[0].is_synthesized_widget);
    for (i, field) in fields.iter().enumerate().skip(1) {
        assert_eq!(field.name, format!("iban_{}", i + 1));
        assert!(field.is_synthesized_widget, "{} should be synthesized", field.name);
        assert_eq!(field.kind, FieldKind::Text);
        assert_eq!(field.value, FieldValue::Text(String::new()));
    }
    for (i, field) in fields.iter().enumerate() {
        assert_eq!(field.position.as_ref().unwrap().x, iban_box_x(i));
    }
}

#[test]
fn iban_boxes_near_the_caption_pick_it_up_as_label() {
    let fields = detect_fields(&common::iban_form()).unwrap();
    assert_eq!(fields[0].label, "IBAN");
    assert_eq!(fields[1].label, "IBAN");
    assert_eq!(fields[1].metadata_source, MetadataSource::NearbyText);
    assert!(fields.iter().all(|f| !f.label.is_empty()));
}

#[test]
fn malformed_bytes_are_a_parse_error() {
    let result = detect_fields(b"definitely not a pdf");
    assert!(matches!(result, Err(FormError::DocumentParse(_))));
}

#[test]
fn document_without_form_yields_no_fields() {
    let mut form = FormBuilder::new(1);
    form.text(1, 72.0, 700.0, "Just a letter");
    let result = detect_fields_with(&form.build(), &DetectOptions::default()).unwrap();
    assert!(result.value.is_empty());
    assert!(result.is_clean());
}

#[test]
fn mixed_form_fields_come_back_in_reading_order() {
    let fields = detect_fields(&common::mixed_form()).unwrap();
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        ["full_name", "agree", "zip", "country", "color", "notes"]
    );

    let kinds: Vec<FieldKind> = fields.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        [
            FieldKind::Text,
            FieldKind::Checkbox,
            FieldKind::Text,
            FieldKind::Select,
            FieldKind::Radio,
            FieldKind::Text,
        ]
    );
    assert_eq!(fields[5].page(), Some(2));
}

#[test]
fn tooltip_beats_page_text() {
    let fields = detect_fields(&common::mixed_form()).unwrap();
    let full_name = fields.iter().find(|f| f.name == "full_name").unwrap();
    assert_eq!(full_name.label, "Applicant full name");
    assert_eq!(full_name.metadata_source, MetadataSource::Tooltip);

    let zip = fields.iter().find(|f| f.name == "zip").unwrap();
    assert_eq!(zip.label, "ZIP:");
    assert_eq!(zip.metadata_source, MetadataSource::NearbyText);
}

#[test]
fn field_values_and_options_are_read() {
    let fields = detect_fields(&common::mixed_form()).unwrap();
    let by_name = |name: &str| fields.iter().find(|f| f.name == name).unwrap();

    assert_eq!(by_name("agree").value, FieldValue::Checked(false));
    assert_eq!(by_name("notes").value, FieldValue::Text("keep me".into()));
    assert_eq!(
        by_name("country").options.as_deref(),
        Some(&["Germany".to_string(), "France".to_string()][..])
    );
    assert_eq!(
        by_name("color").options.as_deref(),
        Some(&["red".to_string(), "blue".to_string()][..])
    );
}

#[test]
fn three_widgets_under_one_name_give_three_fields() {
    let mut form = FormBuilder::new(1);
    let kids = (0..3)
        .map(|i| (Dictionary::new(), [100.0 + 40.0 * i as f64, 400.0, 130.0 + 40.0 * i as f64, 416.0]))
        .collect();
    form.field_with_kids(
        1,
        dictionary! { "FT" => "Tx", "T" => Object::string_literal("F") },
        kids,
    );
    let fields = detect_fields(&form.build()).unwrap();

    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["F", "F_2", "F_3"]);
    assert_eq!(fields.iter().filter(|f| f.is_synthesized_widget).count(), 2);
}

#[test]
fn unlisted_widgets_are_synthesized_with_inferred_kinds() {
    let mut form = FormBuilder::new(1);
    form.text_field(1, "known", [100.0, 700.0, 300.0, 716.0]);
    form.loose_widget(
        1,
        dictionary! { "FT" => "Btn", "T" => Object::string_literal("tick") },
        [100.0, 600.0, 112.0, 612.0],
    );
    form.loose_widget(
        1,
        dictionary! { "FT" => "Ch", "T" => Object::string_literal("pick") },
        [200.0, 600.0, 300.0, 616.0],
    );
    let fields = detect_fields(&form.build()).unwrap();

    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["known", "tick_1", "pick_1"]);
    assert_eq!(fields[1].kind, FieldKind::Checkbox);
    assert_eq!(fields[1].value, FieldValue::Checked(false));
    assert_eq!(fields[2].kind, FieldKind::Select);
    assert_eq!(fields[2].value, FieldValue::Text(String::new()));
}

#[test]
fn field_without_widget_sorts_last_with_fallback_label() {
    let mut form = FormBuilder::new(1);
    form.text_field(1, "placed", [100.0, 700.0, 300.0, 716.0]);
    form.field_with_kids(
        1,
        dictionary! { "FT" => "Tx", "T" => Object::string_literal("hidden_total") },
        Vec::new(),
    );
    let result = detect_fields_with(&form.build(), &DetectOptions::default()).unwrap();

    let names: Vec<&str> = result.value.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["placed", "hidden_total"]);
    let hidden = &result.value[1];
    assert!(hidden.position.is_none());
    assert_eq!(hidden.label, "hidden_total");
    assert_eq!(hidden.metadata_source, MetadataSource::Fallback);
    assert_eq!(result.count(WarningCode::GeometryLookup), 1);
}

#[test]
fn push_buttons_and_signatures_are_not_reported() {
    let mut form = FormBuilder::new(1);
    form.text(1, 100.0, 700.0, "Name:");
    form.text_field(1, "name", [200.0, 696.0, 400.0, 712.0]);
    form.field(
        1,
        dictionary! {
            "FT" => "Btn",
            "Ff" => common::PUSHBUTTON,
            "T" => Object::string_literal("submit"),
        },
        [200.0, 600.0, 280.0, 620.0],
    );
    form.field(
        1,
        dictionary! { "FT" => "Sig", "T" => Object::string_literal("sig") },
        [200.0, 500.0, 400.0, 540.0],
    );
    let fields = detect_fields(&form.build()).unwrap();

    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["name"]);
    assert!(fields.iter().all(|f| !f.is_synthesized_widget));
}

#[test]
fn field_without_type_falls_back_to_empty_text() {
    let mut form = FormBuilder::new(1);
    form.field(
        1,
        dictionary! {
            "T" => Object::string_literal("mystery"),
            "V" => Object::string_literal("ignored"),
        },
        [100.0, 700.0, 300.0, 716.0],
    );
    let result = detect_fields_with(&form.build(), &DetectOptions::default()).unwrap();

    let mystery = result.value.iter().find(|f| f.name == "mystery").unwrap();
    assert_eq!(mystery.kind, FieldKind::Text);
    assert_eq!(mystery.value, FieldValue::Text(String::new()));
    assert!(!mystery.is_synthesized_widget);
    assert!(result.count(WarningCode::FieldRead) >= 1);
}

#[test]
fn names_are_unique_and_order_is_stable() {
    for bytes in [
        common::applicant_form(),
        common::iban_form(),
        common::mixed_form(),
    ] {
        let mut fields = detect_fields(&bytes).unwrap();
        let names: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names.len(), fields.len());
        assert!(fields.iter().all(|f| !f.label.trim().is_empty()));

        let tolerance = DetectOptions::default().line_tolerance;
        assert!(is_reading_order(&fields, tolerance));
        let before: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
        sort_reading_order(&mut fields, tolerance);
        let after: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
        assert_eq!(before, after);
    }
}

#[test]
fn form_pdf_runs_several_passes_over_one_parse() {
    let pdf = FormPdf::open(&common::iban_form(), None).unwrap();
    assert_eq!(pdf.page_count(), 1);
    assert_eq!(pdf.widgets().value.len(), 22);
    assert_eq!(pdf.structural_fields().value.len(), 1);

    let runs = pdf.page_text_runs(1).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, "IBAN");
    assert_eq!(pdf.detect_fields().value.len(), 22);
}

#[test]
fn tight_label_window_falls_back_to_name() {
    let options = DetectOptions {
        label_search_left: 50.0,
        ..DetectOptions::default()
    };
    let result = detect_fields_with(&common::applicant_form(), &options).unwrap();
    assert_eq!(result.value[0].label, "applicant_name");
    assert_eq!(result.value[0].metadata_source, MetadataSource::Fallback);
}

#[cfg(feature = "parallel")]
#[test]
fn batch_detection_keeps_input_order() {
    let docs = vec![
        common::applicant_form(),
        b"broken".to_vec(),
        common::iban_form(),
    ];
    let results = acroform::detect_fields_batch(&docs, &DetectOptions::default());
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().len(), 1);
    assert!(matches!(results[1], Err(FormError::DocumentParse(_))));
    assert_eq!(results[2].as_ref().unwrap().len(), 22);
}

#[cfg(feature = "serde")]
#[test]
fn descriptors_serialize_with_camel_case_keys() {
    let fields = detect_fields(&common::applicant_form()).unwrap();
    let json = serde_json::to_value(&fields[0]).unwrap();
    assert_eq!(json["name"], "applicant_name");
    assert_eq!(json["metadataSource"], "nearbyText");
    assert_eq!(json["isSynthesizedWidget"], false);
}
