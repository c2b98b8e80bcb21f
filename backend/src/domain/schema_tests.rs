//! Regression coverage for this module.

use rstest::rstest;
use serde_json::{Value, json};

use super::*;

fn shaft(fields: Value) -> Record {
    serde_json::from_value(fields).expect("object literal")
}

#[rstest]
#[case("user_entry", EntityKind::UserEntry)]
#[case("measured_shafts", EntityKind::MeasuredShafts)]
#[case("measured_housings", EntityKind::MeasuredHousings)]
fn entity_names_round_trip(#[case] name: &str, #[case] expected: EntityKind) {
    let parsed: EntityKind = name.parse().expect("known entity");
    assert_eq!(parsed, expected);
    assert_eq!(parsed.to_string(), name);
}

#[test]
fn unknown_entity_names_are_rejected() {
    assert!("videos".parse::<EntityKind>().is_err());
}

#[test]
fn normalize_row_writes_every_field_in_order() {
    let schema = EntityKind::MeasuredShafts.schema();
    let row = schema
        .normalize_row(&shaft(json!({
            "shaft_radius": 12.7,
            "product_id": "P1",
            "shaft_height": "25.4",
            "roll_number": "R1",
        })))
        .expect("valid row");

    let names: Vec<&str> = row.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "product_id",
            "roll_number",
            "shaft_height",
            "shaft_radius",
            "measurement_timestamp"
        ]
    );
    assert_eq!(row.number("shaft_height"), Some(25.4));
    assert_eq!(row.get("measurement_timestamp"), Some(&Value::Null));
}

#[test]
fn normalize_row_requires_declared_required_fields() {
    let schema = EntityKind::MeasuredShafts.schema();
    let err = schema
        .normalize_row(&shaft(json!({ "product_id": "P1", "roll_number": "R1", "shaft_height": 1 })))
        .expect_err("radius missing");
    assert_eq!(
        err,
        SchemaViolation::MissingRequired {
            entity: EntityKind::MeasuredShafts,
            field: "shaft_radius",
        }
    );
}

#[rstest]
#[case(json!({ "colour": "red" }))]
#[case(json!({ "shaft_height": "tall" }))]
#[case(json!({ "shaft_height": true }))]
fn normalize_row_rejects_malformed_input(#[case] extra: Value) {
    let mut fields = json!({
        "product_id": "P1",
        "roll_number": "R1",
        "shaft_height": 1.0,
        "shaft_radius": 2.0,
    });
    if let (Some(target), Some(source)) = (fields.as_object_mut(), extra.as_object()) {
        target.extend(source.clone());
    }
    assert!(EntityKind::MeasuredShafts.schema().normalize_row(&shaft(fields)).is_err());
}

#[test]
fn merge_patch_keeps_untouched_fields() {
    let schema = EntityKind::MeasuredShafts.schema();
    let existing = schema
        .normalize_row(&shaft(json!({
            "product_id": "P1",
            "roll_number": "R1",
            "shaft_height": 25.4,
            "shaft_radius": 12.7,
        })))
        .expect("valid row");

    let merged = schema
        .merge_patch(&existing, &shaft(json!({ "shaft_height": 26.0 })))
        .expect("patch applies");
    assert_eq!(merged.number("shaft_height"), Some(26.0));
    assert_eq!(merged.number("shaft_radius"), Some(12.7));
}

#[test]
fn merge_patch_refuses_key_changes() {
    let schema = EntityKind::MeasuredShafts.schema();
    let existing = Record::new().with("product_id", json!("P1"));
    let err = schema
        .merge_patch(&existing, &shaft(json!({ "product_id": "P2" })))
        .expect_err("key change rejected");
    assert!(matches!(err, SchemaViolation::KeyChanged { .. }));
}

#[test]
fn read_stored_maps_legacy_columns() {
    let schema = EntityKind::MeasuredHousings.schema();
    let raw = shaft(json!({
        "product_id": "H1",
        "roll_number": "R1",
        "housing_type": "sqaure",
        "housing_height": "4",
        "housing_radius": "2",
        "timestamp": "2024-05-01T10:00:00",
    }));
    let row = schema.read_stored(&raw);
    assert_eq!(row.get("housing_depth"), Some(&Value::Null));
    assert_eq!(row.number("housing_height"), Some(4.0));
    assert_eq!(
        row.text("measurement_timestamp"),
        Some("2024-05-01T10:00:00.000000Z")
    );
}

#[test]
fn matches_compares_textual_form() {
    let schema = EntityKind::UserEntry.schema();
    let row = Record::new().with("roll_number", json!(1042));
    assert!(schema.matches(&row, "roll_number", "1042"));
    assert!(!schema.matches(&row, "roll_number", "1043"));
}

#[rstest]
#[case("2024-05-01T10:00:00Z")]
#[case("2024-05-01T12:00:00+02:00")]
#[case("2024-05-01 10:00:00")]
fn parse_timestamp_accepts_common_forms(#[case] text: &str) {
    let parsed = parse_timestamp(text).expect("timestamp parses");
    assert_eq!(format_timestamp(parsed), "2024-05-01T10:00:00.000000Z");
}
