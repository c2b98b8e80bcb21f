//! HTTP adapter mapping for domain errors.
//!
//! Service errors stay transport-agnostic; this module turns them into the
//! shared [`Error`] payload and picks the status code.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::{error, warn};

use crate::domain::ports::RecordStoreError;
use crate::domain::{Error, ErrorCode, LedgerError, SessionError, TRACE_ID_HEADER, UserEntryError};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal("Internal server error");
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

fn missing_field(field: &str) -> Error {
    Error::invalid_request(format!("missing required field: {field}"))
        .with_details(json!({ "reason": "missing_field", "field": field }))
}

fn validation(message: &str) -> Error {
    Error::invalid_request(message).with_details(json!({ "reason": "validation" }))
}

impl From<RecordStoreError> for Error {
    fn from(err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::Validation { message } => validation(&message),
            RecordStoreError::NotFound { entity, key } => {
                Error::not_found(format!("no {entity} record matches {key}"))
                    .with_details(json!({ "reason": "not_found", "entity": entity, "key": key }))
            }
            RecordStoreError::DuplicateKey { entity, key } => {
                Error::conflict(format!("{entity} record {key} already exists"))
                    .with_details(json!({ "reason": "duplicate_key", "entity": entity, "key": key }))
            }
            RecordStoreError::Connection { message } => {
                warn!(%message, "record store unavailable");
                Error::service_unavailable("record store unavailable")
                    .with_details(json!({ "reason": "store_unavailable" }))
            }
            RecordStoreError::Query { message } => {
                error!(%message, "record store query failed");
                Error::internal(format!("record store query failed: {message}"))
            }
        }
    }
}

impl From<LedgerError> for Error {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::MissingField { field } => missing_field(&field),
            LedgerError::InvalidHousingType { value } => {
                Error::invalid_request(format!("invalid housing type: {value}"))
                    .with_details(json!({ "reason": "invalid_housing_type", "value": value }))
            }
            LedgerError::DuplicateKey { product_id } => {
                Error::conflict(format!("product_id {product_id} already exists")).with_details(
                    json!({ "reason": "duplicate_key", "product_id": product_id }),
                )
            }
            LedgerError::NotFound { kind, product_id } => {
                Error::not_found(format!("no {kind} measurement with product_id {product_id}"))
                    .with_details(json!({
                        "reason": "not_found",
                        "measurement_type": kind,
                        "product_id": product_id,
                    }))
            }
            LedgerError::Validation { message } => validation(&message),
            LedgerError::Store(err) => err.into(),
        }
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingField { field } => missing_field(&field),
            SessionError::SessionNotFound { session_id } => {
                Error::not_found(format!("session {session_id} not found or expired")).with_details(
                    json!({ "reason": "session_not_found", "session_id": session_id }),
                )
            }
            SessionError::Validation { message } => validation(&message),
            SessionError::Store(err) => err.into(),
        }
    }
}

impl From<UserEntryError> for Error {
    fn from(err: UserEntryError) -> Self {
        match err {
            UserEntryError::MissingField { field } => missing_field(&field),
            UserEntryError::NotFound { roll_number } => {
                Error::not_found(format!("no user entry for roll_number {roll_number}"))
                    .with_details(json!({ "reason": "not_found", "roll_number": roll_number }))
            }
            UserEntryError::Validation { message } => validation(&message),
            UserEntryError::Store(err) => err.into(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
