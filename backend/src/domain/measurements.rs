//! Measurement kinds and the typed views returned by the ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::schema::parse_timestamp;
use super::{EntityKind, Record};

/// The two measurement families sharing one `product_id` space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    Shaft,
    Housing,
}

impl MeasurementKind {
    pub const ALL: [Self; 2] = [Self::Shaft, Self::Housing];

    /// Record Store entity backing this kind.
    #[must_use]
    pub const fn entity(self) -> EntityKind {
        match self {
            Self::Shaft => EntityKind::MeasuredShafts,
            Self::Housing => EntityKind::MeasuredHousings,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shaft => "shaft",
            Self::Housing => "housing",
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shaft" => Ok(Self::Shaft),
            "housing" => Ok(Self::Housing),
            other => Err(format!("unknown measurement type: {other}")),
        }
    }
}

/// Stored shaft measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShaftMeasurement {
    #[schema(example = "P1")]
    pub product_id: String,
    #[schema(example = "R1")]
    pub roll_number: String,
    #[schema(example = 25.4)]
    pub shaft_height: Option<f64>,
    #[schema(example = 12.7)]
    pub shaft_radius: Option<f64>,
    pub measurement_timestamp: Option<DateTime<Utc>>,
}

impl ShaftMeasurement {
    pub(crate) fn from_record(record: &Record) -> Self {
        Self {
            product_id: owned_text(record, "product_id"),
            roll_number: owned_text(record, "roll_number"),
            shaft_height: record.number("shaft_height"),
            shaft_radius: record.number("shaft_radius"),
            measurement_timestamp: timestamp(record, "measurement_timestamp"),
        }
    }
}

/// Stored housing measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HousingMeasurement {
    #[schema(example = "H1")]
    pub product_id: String,
    #[schema(example = "R1")]
    pub roll_number: String,
    #[schema(example = "standard")]
    pub housing_type: String,
    pub housing_height: Option<f64>,
    pub housing_radius: Option<f64>,
    pub housing_depth: Option<f64>,
    pub measurement_timestamp: Option<DateTime<Utc>>,
}

impl HousingMeasurement {
    /// Build the view, substituting `housing_type` when the row carries none.
    pub(crate) fn from_record(record: &Record, housing_type: String) -> Self {
        Self {
            product_id: owned_text(record, "product_id"),
            roll_number: owned_text(record, "roll_number"),
            housing_type,
            housing_height: record.number("housing_height"),
            housing_radius: record.number("housing_radius"),
            housing_depth: record.number("housing_depth"),
            measurement_timestamp: timestamp(record, "measurement_timestamp"),
        }
    }
}

/// Every measurement recorded by one operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MeasuredUnits {
    pub roll_number: String,
    pub shafts: Vec<ShaftMeasurement>,
    pub housings: Vec<HousingMeasurement>,
}

impl MeasuredUnits {
    #[must_use]
    /// Number of shaft and housing measurements together.
    pub fn total(&self) -> usize {
        self.shafts.len() + self.housings.len()
    }
}

fn owned_text(record: &Record, field: &str) -> String {
    record.text(field).map(str::to_owned).unwrap_or_default()
}

fn timestamp(record: &Record, field: &str) -> Option<DateTime<Utc>> {
    record.text(field).and_then(parse_timestamp)
}
