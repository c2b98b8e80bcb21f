//! Declared schemas for every entity the Record Store persists.
//!
//! Each entity has an ordered field list and one unique key field. Both
//! backends normalise rows through the same helpers here, which is what keeps
//! their observable behaviour identical.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use utoipa::ToSchema;

use super::Record;

/// Entities persisted through the Record Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Finalised operator logins.
    UserEntry,
    /// Shaft measurements.
    MeasuredShafts,
    /// Housing measurements.
    MeasuredHousings,
}

impl EntityKind {
    /// Every entity, in a stable order.
    pub const ALL: [Self; 3] = [Self::UserEntry, Self::MeasuredShafts, Self::MeasuredHousings];

    /// Stable storage name of the entity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserEntry => "user_entry",
            Self::MeasuredShafts => "measured_shafts",
            Self::MeasuredHousings => "measured_housings",
        }
    }

    /// Declared schema of the entity.
    #[must_use]
    pub const fn schema(self) -> &'static EntitySchema {
        match self {
            Self::UserEntry => &USER_ENTRY_SCHEMA,
            Self::MeasuredShafts => &SHAFT_SCHEMA,
            Self::MeasuredHousings => &HOUSING_SCHEMA,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when parsing an unknown entity name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity: {0}")]
pub struct ParseEntityKindError(String);

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEntityKindError(s.to_owned()))
    }
}

/// Value kind a field is coerced to before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    /// RFC 3339 timestamp, stored in UTC.
    Timestamp,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Timestamp => "timestamp",
        })
    }
}

/// One declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Column names older data may still use for this field.
    pub legacy_names: &'static [&'static str],
}

impl FieldSpec {
    const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            legacy_names: &[],
        }
    }

    const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            legacy_names: &[],
        }
    }

    const fn or_legacy(mut self, legacy_names: &'static [&'static str]) -> Self {
        self.legacy_names = legacy_names;
        self
    }
}

/// Ordered field list plus unique key of an entity.
#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    pub entity: EntityKind,
    pub key: &'static str,
    pub fields: &'static [FieldSpec],
}

static USER_ENTRY_SCHEMA: EntitySchema = EntitySchema {
    entity: EntityKind::UserEntry,
    key: "roll_number",
    fields: &[
        FieldSpec::required("roll_number", FieldKind::Text),
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::optional("date", FieldKind::Text),
        FieldSpec::optional("time", FieldKind::Text),
        FieldSpec::optional("created_at", FieldKind::Timestamp),
        FieldSpec::optional("last_login", FieldKind::Timestamp),
    ],
};

static SHAFT_SCHEMA: EntitySchema = EntitySchema {
    entity: EntityKind::MeasuredShafts,
    key: "product_id",
    fields: &[
        FieldSpec::required("product_id", FieldKind::Text),
        FieldSpec::required("roll_number", FieldKind::Text),
        FieldSpec::required("shaft_height", FieldKind::Number),
        FieldSpec::required("shaft_radius", FieldKind::Number),
        FieldSpec::optional("measurement_timestamp", FieldKind::Timestamp).or_legacy(&["timestamp"]),
    ],
};

static HOUSING_SCHEMA: EntitySchema = EntitySchema {
    entity: EntityKind::MeasuredHousings,
    key: "product_id",
    fields: &[
        FieldSpec::required("product_id", FieldKind::Text),
        FieldSpec::required("roll_number", FieldKind::Text),
        FieldSpec::optional("housing_type", FieldKind::Text),
        FieldSpec::required("housing_height", FieldKind::Number),
        FieldSpec::required("housing_radius", FieldKind::Number),
        FieldSpec::optional("housing_depth", FieldKind::Number),
        FieldSpec::optional("measurement_timestamp", FieldKind::Timestamp).or_legacy(&["timestamp"]),
    ],
};

/// Ways a row can disagree with its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("{entity} has no field named {field}")]
    UnknownField { entity: EntityKind, field: String },
    #[error("{entity} requires field {field}")]
    MissingRequired {
        entity: EntityKind,
        field: &'static str,
    },
    #[error("{entity}.{field} must be a {expected}")]
    InvalidValue {
        entity: EntityKind,
        field: &'static str,
        expected: FieldKind,
    },
    #[error("{entity}.{field} is the record key and cannot be changed")]
    KeyChanged {
        entity: EntityKind,
        field: &'static str,
    },
}

impl EntitySchema {
    /// Look up a declared field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|spec| spec.name)
    }

    /// Key value of a normalised row.
    #[must_use]
    pub fn key_of(&self, record: &Record) -> Option<String> {
        record.key_text(self.key)
    }

    /// Reject lookups on fields the entity does not declare.
    ///
    /// # Errors
    /// Returns [`SchemaViolation::UnknownField`] for undeclared fields.
    pub fn check_field(&self, name: &str) -> Result<&'static FieldSpec, SchemaViolation> {
        self.field(name).ok_or_else(|| SchemaViolation::UnknownField {
            entity: self.entity,
            field: name.to_owned(),
        })
    }

    /// Normalise a full row for `append`: every declared field is written in
    /// declaration order, absent optional fields become null, and required
    /// fields must hold a value.
    ///
    /// # Errors
    /// Returns a [`SchemaViolation`] for unknown fields, missing required
    /// fields, or values that cannot be coerced to the declared kind.
    pub fn normalize_row(&self, record: &Record) -> Result<Record, SchemaViolation> {
        self.reject_unknown(record)?;
        let mut row = Record::new();
        for spec in self.fields {
            let value = match record.get(spec.name) {
                Some(raw) => self.coerce(spec, raw)?,
                None => Value::Null,
            };
            if spec.required && value.is_null() {
                return Err(SchemaViolation::MissingRequired {
                    entity: self.entity,
                    field: spec.name,
                });
            }
            row.insert(spec.name, value);
        }
        Ok(row)
    }

    /// Merge `patch` into `existing`, coercing only the patched fields.
    ///
    /// # Errors
    /// Fails when the patch names unknown fields, carries uncoercible values,
    /// nulls a required field, or changes the key.
    pub fn merge_patch(&self, existing: &Record, patch: &Record) -> Result<Record, SchemaViolation> {
        self.reject_unknown(patch)?;
        let mut merged = self.read_stored(existing);
        for spec in self.fields {
            let Some(raw) = patch.get(spec.name) else {
                continue;
            };
            let value = self.coerce(spec, raw)?;
            if spec.name == self.key && value.as_str() != merged.text(self.key) {
                return Err(SchemaViolation::KeyChanged {
                    entity: self.entity,
                    field: spec.name,
                });
            }
            if spec.required && value.is_null() {
                return Err(SchemaViolation::MissingRequired {
                    entity: self.entity,
                    field: spec.name,
                });
            }
            merged.insert(spec.name, value);
        }
        Ok(merged)
    }

    /// Rebuild a row read back from a backend into declaration order.
    ///
    /// Legacy column names are honoured, missing columns read as null and
    /// values that no longer coerce are kept verbatim.
    #[must_use]
    pub fn read_stored(&self, raw: &Record) -> Record {
        let mut row = Record::new();
        for spec in self.fields {
            let found = std::iter::once(spec.name)
                .chain(spec.legacy_names.iter().copied())
                .find_map(|name| raw.get(name));
            let value = match found {
                Some(value) => self.coerce(spec, value).unwrap_or_else(|_| value.clone()),
                None => Value::Null,
            };
            row.insert(spec.name, value);
        }
        row
    }

    /// Whether a stored row holds `value` in `field`, comparing the textual
    /// form so numeric and string representations agree across backends.
    #[must_use]
    pub fn matches(&self, row: &Record, field: &str, value: &str) -> bool {
        row.key_text(field).as_deref() == Some(value)
    }

    fn reject_unknown(&self, record: &Record) -> Result<(), SchemaViolation> {
        match record.iter().find(|(name, _)| self.field(name).is_none()) {
            Some((name, _)) => Err(SchemaViolation::UnknownField {
                entity: self.entity,
                field: name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn coerce(&self, spec: &'static FieldSpec, raw: &Value) -> Result<Value, SchemaViolation> {
        coerce_value(spec.kind, raw).ok_or(SchemaViolation::InvalidValue {
            entity: self.entity,
            field: spec.name,
            expected: spec.kind,
        })
    }
}

/// Coerce a raw value to `kind`. Empty strings become null.
fn coerce_value(kind: FieldKind, raw: &Value) -> Option<Value> {
    match (kind, raw) {
        (_, Value::Null) => Some(Value::Null),
        (_, Value::String(text)) if text.trim().is_empty() => Some(Value::Null),
        (FieldKind::Text, Value::String(text)) => Some(Value::String(text.clone())),
        (FieldKind::Text, Value::Number(number)) => Some(Value::String(number.to_string())),
        (FieldKind::Number, Value::Number(number)) => number.as_f64().and_then(finite_number),
        (FieldKind::Number, Value::String(text)) => {
            text.trim().parse::<f64>().ok().and_then(finite_number)
        }
        (FieldKind::Timestamp, Value::String(text)) => {
            parse_timestamp(text).map(|ts| Value::String(format_timestamp(ts)))
        }
        _ => None,
    }
}

fn finite_number(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}

/// Parse an RFC 3339 timestamp, accepting naive ISO 8601 values as UTC.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Canonical storage form of a timestamp.
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
