//! OpenAPI schemas for free-form request bodies.
//!
//! Measurement and user-entry payloads arrive as JSON objects so a missing
//! field stays distinguishable from a null one. These wrappers document the
//! expected shape without constraining deserialisation.

use utoipa::ToSchema;

/// Body of `POST /api/v1/shaft_measurement`.
#[derive(ToSchema)]
#[schema(as = ShaftMeasurementInput)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ShaftMeasurementInputSchema {
    #[schema(example = "P-1001")]
    product_id: String,
    #[schema(example = "R1")]
    roll_number: String,
    #[schema(example = 12.5)]
    shaft_height: f64,
    #[schema(example = 3.2)]
    shaft_radius: f64,
}

/// Body of `POST /api/v1/housing_measurement`.
#[derive(ToSchema)]
#[schema(as = HousingMeasurementInput)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct HousingMeasurementInputSchema {
    #[schema(example = "H-2001")]
    product_id: String,
    #[schema(example = "R1")]
    roll_number: String,
    /// Registry id or alias; the default type applies when omitted.
    #[schema(example = "oval")]
    housing_type: Option<String>,
    #[schema(example = 40.0)]
    housing_height: f64,
    #[schema(example = 15.5)]
    housing_radius: f64,
    housing_depth: Option<f64>,
}

/// Body of the measurement `PUT` endpoints: `product_id` selects the row,
/// every other present field is replaced.
#[derive(ToSchema)]
#[schema(as = MeasurementPatch)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct MeasurementPatchSchema {
    #[schema(example = "P-1001")]
    product_id: String,
    roll_number: Option<String>,
    shaft_height: Option<f64>,
    shaft_radius: Option<f64>,
    housing_type: Option<String>,
    housing_height: Option<f64>,
    housing_radius: Option<f64>,
    housing_depth: Option<f64>,
}

/// Body of `PUT /api/v1/user_entry`.
#[derive(ToSchema)]
#[schema(as = UserEntryPatch)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct UserEntryPatchSchema {
    #[schema(example = "R1")]
    roll_number: String,
    name: Option<String>,
    #[schema(example = "2024-05-01")]
    date: Option<String>,
    #[schema(example = "10:00:00")]
    time: Option<String>,
    last_login: Option<String>,
}
