//! Serde round-trip and wire-shape tests.
//!
//! Descriptors are handed to a browser UI as JSON, so besides round-trips
//! these tests pin the camelCase field names and the omitted `options`.

#![cfg(feature = "serde")]

use acroform_core::*;

/// Helper: serialize to JSON string, deserialize back, assert equality.
fn roundtrip<T>(value: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let json = serde_json::to_string(value).expect("serialize failed");
    let restored: T = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(*value, restored, "round-trip mismatch for JSON: {json}");
}

fn positioned(name: &str, kind: FieldKind) -> FieldDescriptor {
    let mut field = FieldDescriptor::minimal(name);
    field.kind = kind;
    field.value = FieldValue::empty_for(kind);
    field.position = Some(FieldPosition::new(
        2,
        BBox::new(100.0, 600.0, 250.0, 620.0),
        792.0,
    ));
    field
}

#[test]
fn test_serde_geometry() {
    roundtrip(&Point::new(3.5, 2.25));
    roundtrip(&BBox::new(10.0, 20.0, 300.0, 400.0));
    roundtrip(&Ctm::new(2.0, 0.0, 0.0, 3.0, 10.0, 20.0));
}

#[test]
fn test_serde_descriptor_roundtrip() {
    let mut select = positioned("country", FieldKind::Select);
    select.options = Some(vec!["DE".to_string(), "AT".to_string()]);
    select.metadata_source = MetadataSource::NearbyText;
    roundtrip(&select);
    roundtrip(&FieldDescriptor::minimal("broken"));
}

#[test]
fn test_descriptor_wire_shape() {
    let mut field = positioned("agree", FieldKind::Checkbox);
    field.value = FieldValue::Checked(true);
    field.is_synthesized_widget = true;
    let json = serde_json::to_value(&field).unwrap();

    assert_eq!(json["type"], "checkbox");
    assert_eq!(json["value"], true);
    assert_eq!(json["metadataSource"], "fallback");
    assert_eq!(json["isSynthesizedWidget"], true);
    assert!(json.get("options").is_none());
    assert_eq!(json["position"]["page"], 2);
    assert_eq!(json["position"]["y"], 172.0);
}

#[test]
fn test_text_value_serializes_as_string() {
    let mut field = positioned("name", FieldKind::Text);
    field.value = FieldValue::Text("Ada".to_string());
    let json = serde_json::to_value(&field).unwrap();
    assert_eq!(json["value"], "Ada");
    assert_eq!(json["position"]["rect"][2], 250.0);
}

#[test]
fn test_serde_warning_and_options() {
    roundtrip(
        &ExtractWarning::new(WarningCode::GeometryLookup, "no /Rect")
            .for_field("zip")
            .on_page(1),
    );
    roundtrip(&DetectOptions::default());
    roundtrip(&FillOptions::flattened());
    roundtrip(&TranscriptOptions::default());
}

#[test]
fn test_serde_transcript_and_services() {
    roundtrip(&PageText {
        page: 1,
        text: "Name: (name)".to_string(),
    });
    roundtrip(&PageDescription {
        summary: "Contact details".to_string(),
        field_labels: vec!["Name".to_string()],
    });
    let image = PageImage {
        page: 1,
        mime_type: "image/png".to_string(),
        base64_data: String::new(),
    };
    let json = serde_json::to_value(&image).unwrap();
    assert!(json.get("mimeType").is_some());
}
