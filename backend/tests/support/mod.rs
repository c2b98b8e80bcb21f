//! Shared fixtures for integration tests.
#![allow(dead_code, reason = "each test crate uses a different subset")]

use std::env;

use inspection_backend::domain::Record;
use serde_json::{Value, json};

/// Environment variable naming a disposable PostgreSQL database.
pub const TEST_DATABASE_URL_ENV: &str = "INSPECTION_TEST_DATABASE_URL";

/// Database URL for PostgreSQL-backed suites, or `None` with a skip marker
/// when the variable is unset.
pub fn test_database_url(suite: &str) -> Option<String> {
    match env::var(TEST_DATABASE_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => Some(url),
        _ => {
            eprintln!("SKIP-POSTGRES: {suite} needs {TEST_DATABASE_URL_ENV}");
            None
        }
    }
}

/// Convert a JSON object literal into a [`Record`].
///
/// # Panics
/// Panics when `value` is not an object.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => Record::from(map),
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn shaft_row(product_id: &str, roll_number: &str) -> Record {
    record(json!({
        "product_id": product_id,
        "roll_number": roll_number,
        "shaft_height": 10.0,
        "shaft_radius": 2.5,
        "measurement_timestamp": "2024-05-01T10:00:00Z",
    }))
}

pub fn user_entry_row(roll_number: &str, name: &str) -> Record {
    record(json!({
        "roll_number": roll_number,
        "name": name,
        "date": "2024-05-01",
        "time": "10:00:00",
    }))
}
