//! Loosely typed rows exchanged with the Record Store.
//!
//! A [`Record`] is an insertion-ordered JSON object. Keeping rows as maps lets
//! services tell a missing field apart from a present-but-null one, which the
//! ledger relies on when defaulting housing types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of an entity, keyed by field name.
///
/// # Examples
/// ```
/// use inspection_backend::domain::Record;
/// use serde_json::json;
///
/// let record = Record::new()
///     .with("product_id", json!("P1"))
///     .with("shaft_height", json!(25.4));
/// assert_eq!(record.text("product_id"), Some("P1"));
/// assert_eq!(record.number("shaft_height"), Some(25.4));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Remove a field, returning its value when present.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.shift_remove(field)
    }

    /// Raw value of a field. `Some(Value::Null)` means present but null.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether the field is present, even if null.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// String value of a field, if it holds one.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Textual form of a key field: strings verbatim, numbers rendered.
    #[must_use]
    pub fn key_text(&self, field: &str) -> Option<String> {
        self.0.get(field).and_then(value_key_text)
    }

    /// Numeric value of a field, if it holds one.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    /// Iterate over `(field, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the record, yielding the underlying JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Textual form of a key value, so `"101"` and `101` name the same row.
fn value_key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

impl From<Map<String, Value>> for Record {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Object(value.0)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
