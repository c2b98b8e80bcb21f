//! Shaft and housing measurement handlers.
//!
//! ```text
//! GET|POST|PUT|DELETE /api/v1/shaft_measurement
//! GET|POST|PUT|DELETE /api/v1/housing_measurement
//! GET /api/v1/product_exists?product_id=P1&measurement_type=shaft
//! GET /api/v1/measured_units/{roll_number}
//! ```
//!
//! Bodies are taken as raw JSON objects: the ledger tells a missing field
//! from a null one.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Error, HousingMeasurement, MeasuredUnits, MeasurementKind, Record, ShaftMeasurement,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    HousingMeasurementInputSchema, MeasurementPatchSchema, ShaftMeasurementInputSchema,
};
use crate::inbound::http::state::HttpState;

/// Query of `GET /api/v1/product_exists`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductExistsQuery {
    pub product_id: Option<String>,
    /// `shaft` or `housing`; both kinds are checked when omitted.
    pub measurement_type: Option<String>,
}

/// Answer of `GET /api/v1/product_exists`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ProductExistsResponse {
    pub product_id: String,
    pub exists: bool,
}

fn product_id_of(patch: &Record) -> String {
    patch.key_text("product_id").unwrap_or_default()
}

#[utoipa::path(
    get,
    path = "/api/v1/shaft_measurement",
    responses(
        (status = 200, description = "Shaft measurements", body = [ShaftMeasurement]),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "listShaftMeasurements"
)]
#[get("/shaft_measurement")]
pub async fn list_shaft(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<ShaftMeasurement>>> {
    Ok(web::Json(state.ledger.list_shaft().await?))
}

/// Record a shaft measurement.
#[utoipa::path(
    post,
    path = "/api/v1/shaft_measurement",
    request_body = ShaftMeasurementInputSchema,
    responses(
        (status = 201, description = "Measurement recorded", body = ShaftMeasurement),
        (status = 400, description = "Missing or invalid field", body = Error),
        (status = 409, description = "product_id already used", body = Error),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "recordShaftMeasurement"
)]
#[post("/shaft_measurement")]
pub async fn record_shaft(
    state: web::Data<HttpState>,
    payload: web::Json<Record>,
) -> ApiResult<HttpResponse> {
    let stored = state.ledger.record_shaft(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(stored))
}

#[utoipa::path(
    put,
    path = "/api/v1/shaft_measurement",
    request_body = MeasurementPatchSchema,
    responses(
        (status = 200, description = "Measurement updated", body = ShaftMeasurement),
        (status = 400, description = "Invalid patch", body = Error),
        (status = 404, description = "No shaft measurement for product_id", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "updateShaftMeasurement"
)]
#[put("/shaft_measurement")]
pub async fn update_shaft(
    state: web::Data<HttpState>,
    payload: web::Json<Record>,
) -> ApiResult<web::Json<ShaftMeasurement>> {
    let patch = payload.into_inner();
    let product_id = product_id_of(&patch);
    Ok(web::Json(state.ledger.update_shaft(&product_id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/shaft_measurement",
    responses(
        (status = 204, description = "Shaft measurements cleared"),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "clearShaftMeasurements"
)]
#[delete("/shaft_measurement")]
pub async fn clear_shaft(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    state.ledger.clear_shaft().await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/housing_measurement",
    responses(
        (status = 200, description = "Housing measurements", body = [HousingMeasurement]),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "listHousingMeasurements"
)]
#[get("/housing_measurement")]
pub async fn list_housing(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<HousingMeasurement>>> {
    Ok(web::Json(state.ledger.list_housing().await?))
}

/// Record a housing measurement. `housing_type` defaults to the registry
/// default and is stored in canonical form.
#[utoipa::path(
    post,
    path = "/api/v1/housing_measurement",
    request_body = HousingMeasurementInputSchema,
    responses(
        (status = 201, description = "Measurement recorded", body = HousingMeasurement),
        (status = 400, description = "Missing field or invalid housing type", body = Error),
        (status = 409, description = "product_id already used", body = Error),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "recordHousingMeasurement"
)]
#[post("/housing_measurement")]
pub async fn record_housing(
    state: web::Data<HttpState>,
    payload: web::Json<Record>,
) -> ApiResult<HttpResponse> {
    let stored = state.ledger.record_housing(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(stored))
}

#[utoipa::path(
    put,
    path = "/api/v1/housing_measurement",
    request_body = MeasurementPatchSchema,
    responses(
        (status = 200, description = "Measurement updated", body = HousingMeasurement),
        (status = 400, description = "Invalid patch or housing type", body = Error),
        (status = 404, description = "No housing measurement for product_id", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "updateHousingMeasurement"
)]
#[put("/housing_measurement")]
pub async fn update_housing(
    state: web::Data<HttpState>,
    payload: web::Json<Record>,
) -> ApiResult<web::Json<HousingMeasurement>> {
    let patch = payload.into_inner();
    let product_id = product_id_of(&patch);
    Ok(web::Json(state.ledger.update_housing(&product_id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/housing_measurement",
    responses(
        (status = 204, description = "Housing measurements cleared"),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "clearHousingMeasurements"
)]
#[delete("/housing_measurement")]
pub async fn clear_housing(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    state.ledger.clear_housing().await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Whether a `product_id` is already used.
#[utoipa::path(
    get,
    path = "/api/v1/product_exists",
    params(ProductExistsQuery),
    responses(
        (status = 200, description = "Existence flag", body = ProductExistsResponse),
        (status = 400, description = "Unknown measurement type", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "productExists"
)]
#[get("/product_exists")]
pub async fn product_exists(
    state: web::Data<HttpState>,
    query: web::Query<ProductExistsQuery>,
) -> ApiResult<web::Json<ProductExistsResponse>> {
    let ProductExistsQuery {
        product_id,
        measurement_type,
    } = query.into_inner();
    let product_id = product_id.unwrap_or_default().trim().to_owned();
    let exists = match measurement_type.as_deref().map(str::trim) {
        None | Some("") => state.ledger.product_exists(&product_id).await?,
        Some(raw) => {
            let kind: MeasurementKind = raw.parse().map_err(|message: String| {
                Error::invalid_request(message)
                    .with_details(json!({ "reason": "validation", "field": "measurement_type" }))
            })?;
            state.ledger.product_exists_for(kind, &product_id).await?
        }
    };
    Ok(web::Json(ProductExistsResponse { product_id, exists }))
}

/// Every measurement recorded by one operator.
#[utoipa::path(
    get,
    path = "/api/v1/measured_units/{roll_number}",
    params(("roll_number" = String, Path, description = "Operator roll number")),
    responses(
        (status = 200, description = "Measurements by roll number", body = MeasuredUnits),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["measurements"],
    operation_id = "measuredUnits"
)]
#[get("/measured_units/{roll_number}")]
pub async fn measured_units(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<MeasuredUnits>> {
    Ok(web::Json(state.ledger.measured_units(&path.into_inner()).await?))
}

#[cfg(test)]
#[path = "measurements_tests.rs"]
mod tests;
