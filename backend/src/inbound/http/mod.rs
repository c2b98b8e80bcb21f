//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod housing_types;
pub mod measurements;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod user_entry;

use actix_web::{Scope, web};
use tracing::debug;

use crate::domain::Error;

pub use error::ApiResult;

/// Every `/api/v1` endpoint, with JSON extraction failures reported in the
/// shared error envelope.
pub fn api_scope() -> Scope {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "rejected request body");
        Error::invalid_request(format!("invalid JSON body: {err}")).into()
    });
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid query string: {err}")).into()
    });

    web::scope("/api/v1")
        .app_data(json_config)
        .app_data(query_config)
        .service(user_entry::begin_session)
        .service(user_entry::complete_calibration)
        .service(user_entry::get_session_status)
        .service(user_entry::cancel_session)
        .service(user_entry::should_calibrate)
        .service(user_entry::list_user_entries)
        .service(user_entry::update_user_entry)
        .service(user_entry::clear_user_entries)
        .service(measurements::list_shaft)
        .service(measurements::record_shaft)
        .service(measurements::update_shaft)
        .service(measurements::clear_shaft)
        .service(measurements::list_housing)
        .service(measurements::record_housing)
        .service(measurements::update_housing)
        .service(measurements::clear_housing)
        .service(measurements::product_exists)
        .service(measurements::measured_units)
        .service(housing_types::list_housing_types)
}
