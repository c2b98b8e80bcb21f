//! Login session and user entry handlers.
//!
//! ```text
//! POST   /api/v1/user_entry {"roll_number":"R1","name":"Alice"}
//! POST   /api/v1/user_entry/complete_calibration {"session_id":"..."}
//! GET    /api/v1/user_entry/session/{session_id}
//! DELETE /api/v1/user_entry/session/{session_id}
//! GET    /api/v1/user_entry/should_calibrate?roll_number=R1
//! GET    /api/v1/user_entry
//! PUT    /api/v1/user_entry {"roll_number":"R1","name":"Alicia"}
//! DELETE /api/v1/user_entry
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    BeginSession, CalibrationCompleted, Error, PendingSession, Record, SessionError,
    SessionStarted, UserEntry,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::UserEntryPatchSchema;
use crate::inbound::http::state::HttpState;

/// Body of `POST /api/v1/user_entry/complete_calibration`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct CompleteCalibrationRequest {
    pub session_id: String,
}

/// Query of `GET /api/v1/user_entry/should_calibrate`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ShouldCalibrateQuery {
    pub roll_number: Option<String>,
}

/// Answer of `GET /api/v1/user_entry/should_calibrate`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ShouldCalibrateResponse {
    pub roll_number: String,
    pub should_calibrate: bool,
}

/// Start a pending login session.
#[utoipa::path(
    post,
    path = "/api/v1/user_entry",
    request_body = BeginSession,
    responses(
        (status = 200, description = "Pending session created", body = SessionStarted),
        (status = 400, description = "Missing roll number or name", body = Error),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["user_entry"],
    operation_id = "beginSession"
)]
#[post("/user_entry")]
pub async fn begin_session(
    state: web::Data<HttpState>,
    payload: web::Json<BeginSession>,
) -> ApiResult<web::Json<SessionStarted>> {
    let started = state.sessions.begin_session(payload.into_inner()).await?;
    Ok(web::Json(started))
}

/// Finalise a pending session into a user entry.
#[utoipa::path(
    post,
    path = "/api/v1/user_entry/complete_calibration",
    request_body = CompleteCalibrationRequest,
    responses(
        (status = 200, description = "User entry written", body = CalibrationCompleted),
        (status = 400, description = "Missing session id", body = Error),
        (status = 404, description = "Session not found or expired", body = Error),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["user_entry"],
    operation_id = "completeCalibration"
)]
#[post("/user_entry/complete_calibration")]
pub async fn complete_calibration(
    state: web::Data<HttpState>,
    payload: web::Json<CompleteCalibrationRequest>,
) -> ApiResult<web::Json<CalibrationCompleted>> {
    let session_id = payload.into_inner().session_id;
    if session_id.trim().is_empty() {
        return Err(SessionError::MissingField {
            field: "session_id".to_owned(),
        }
        .into());
    }
    let completed = state.sessions.complete_calibration(session_id.trim()).await?;
    Ok(web::Json(completed))
}

/// Inspect a pending session.
#[utoipa::path(
    get,
    path = "/api/v1/user_entry/session/{session_id}",
    params(("session_id" = String, Path, description = "Pending session id")),
    responses(
        (status = 200, description = "Pending session", body = PendingSession),
        (status = 404, description = "Session not found or expired", body = Error)
    ),
    tags = ["user_entry"],
    operation_id = "getSessionStatus"
)]
#[get("/user_entry/session/{session_id}")]
pub async fn get_session_status(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<PendingSession>> {
    let session = state.sessions.get_session_status(&path.into_inner()).await?;
    Ok(web::Json(session))
}

/// Discard a pending session without writing anything.
#[utoipa::path(
    delete,
    path = "/api/v1/user_entry/session/{session_id}",
    params(("session_id" = String, Path, description = "Pending session id")),
    responses(
        (status = 204, description = "Session cancelled"),
        (status = 404, description = "Session not found or expired", body = Error)
    ),
    tags = ["user_entry"],
    operation_id = "cancelSession"
)]
#[delete("/user_entry/session/{session_id}")]
pub async fn cancel_session(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.sessions.cancel_session(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Whether an operator must calibrate on the next login.
#[utoipa::path(
    get,
    path = "/api/v1/user_entry/should_calibrate",
    params(ShouldCalibrateQuery),
    responses(
        (status = 200, description = "Calibration requirement", body = ShouldCalibrateResponse),
        (status = 400, description = "Missing roll number", body = Error)
    ),
    tags = ["user_entry"],
    operation_id = "shouldCalibrate"
)]
#[get("/user_entry/should_calibrate")]
pub async fn should_calibrate(
    state: web::Data<HttpState>,
    query: web::Query<ShouldCalibrateQuery>,
) -> ApiResult<web::Json<ShouldCalibrateResponse>> {
    let roll_number = query.into_inner().roll_number.unwrap_or_default();
    let should_calibrate = state.sessions.should_calibrate(&roll_number).await?;
    Ok(web::Json(ShouldCalibrateResponse {
        roll_number: roll_number.trim().to_owned(),
        should_calibrate,
    }))
}

/// List finalised user entries.
#[utoipa::path(
    get,
    path = "/api/v1/user_entry",
    responses(
        (status = 200, description = "User entries", body = [UserEntry]),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["user_entry"],
    operation_id = "listUserEntries"
)]
#[get("/user_entry")]
pub async fn list_user_entries(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<UserEntry>>> {
    Ok(web::Json(state.user_entries.list_user_entries().await?))
}

/// Patch a user entry selected by `roll_number`.
#[utoipa::path(
    put,
    path = "/api/v1/user_entry",
    request_body = UserEntryPatchSchema,
    responses(
        (status = 200, description = "Updated user entry", body = UserEntry),
        (status = 400, description = "Invalid patch", body = Error),
        (status = 404, description = "No entry for the roll number", body = Error)
    ),
    tags = ["user_entry"],
    operation_id = "updateUserEntry"
)]
#[put("/user_entry")]
pub async fn update_user_entry(
    state: web::Data<HttpState>,
    payload: web::Json<Record>,
) -> ApiResult<web::Json<UserEntry>> {
    let patch = payload.into_inner();
    let roll_number = patch.key_text("roll_number").unwrap_or_default();
    let updated = state
        .user_entries
        .update_user_entry(&roll_number, patch)
        .await?;
    Ok(web::Json(updated))
}

/// Remove every user entry.
#[utoipa::path(
    delete,
    path = "/api/v1/user_entry",
    responses(
        (status = 204, description = "User entries cleared"),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["user_entry"],
    operation_id = "clearUserEntries"
)]
#[delete("/user_entry")]
pub async fn clear_user_entries(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    state.user_entries.clear_user_entries().await?;
    info!("user entries cleared over HTTP");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "user_entry_tests.rs"]
mod tests;
