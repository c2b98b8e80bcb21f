//! OpenAPI documentation for the inspection API.
//!
//! Served by Swagger UI in debug builds and exported with
//! `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::domain::{
    BeginSession, CalibrationCompleted, Error, ErrorCode, HousingMeasurement, HousingType,
    LoginStatus, MeasuredUnits, MeasurementKind, PendingSession, SessionStarted, SessionStatus,
    ShaftMeasurement, UserEntry,
};
use crate::inbound::http::housing_types::HousingTypesResponse;
use crate::inbound::http::measurements::ProductExistsResponse;
use crate::inbound::http::schemas::{
    HousingMeasurementInputSchema, MeasurementPatchSchema, ShaftMeasurementInputSchema,
    UserEntryPatchSchema,
};
use crate::inbound::http::user_entry::{CompleteCalibrationRequest, ShouldCalibrateResponse};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inspection backend API",
        description = "Calibration-gated operator sessions and shaft/housing measurement records."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::user_entry::begin_session,
        crate::inbound::http::user_entry::complete_calibration,
        crate::inbound::http::user_entry::get_session_status,
        crate::inbound::http::user_entry::cancel_session,
        crate::inbound::http::user_entry::should_calibrate,
        crate::inbound::http::user_entry::list_user_entries,
        crate::inbound::http::user_entry::update_user_entry,
        crate::inbound::http::user_entry::clear_user_entries,
        crate::inbound::http::measurements::list_shaft,
        crate::inbound::http::measurements::record_shaft,
        crate::inbound::http::measurements::update_shaft,
        crate::inbound::http::measurements::clear_shaft,
        crate::inbound::http::measurements::list_housing,
        crate::inbound::http::measurements::record_housing,
        crate::inbound::http::measurements::update_housing,
        crate::inbound::http::measurements::clear_housing,
        crate::inbound::http::measurements::product_exists,
        crate::inbound::http::measurements::measured_units,
        crate::inbound::http::housing_types::list_housing_types,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        BeginSession,
        SessionStarted,
        LoginStatus,
        CompleteCalibrationRequest,
        CalibrationCompleted,
        PendingSession,
        SessionStatus,
        ShouldCalibrateResponse,
        UserEntry,
        UserEntryPatchSchema,
        ShaftMeasurementInputSchema,
        HousingMeasurementInputSchema,
        MeasurementPatchSchema,
        ShaftMeasurement,
        HousingMeasurement,
        MeasuredUnits,
        MeasurementKind,
        ProductExistsResponse,
        HousingType,
        HousingTypesResponse,
    )),
    tags(
        (name = "user_entry", description = "Operator login sessions and user entries"),
        (name = "measurements", description = "Shaft and housing measurement records"),
        (name = "housing_types", description = "Registered housing types"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
