//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{DateTime, TimeZone, Utc};

use crate::Trace;
use crate::domain::{HousingTypeRegistry, SessionConfig};
use crate::test_support::{InMemoryRecordStore, MutableClock};

use super::api_scope;
use super::state::HttpState;

/// Handles tests keep alongside the app under test.
pub struct TestHarness {
    pub state: web::Data<HttpState>,
    pub store: Arc<InMemoryRecordStore>,
    pub clock: Arc<MutableClock>,
}

pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Services over an empty in-memory store, the built-in registry and
/// default session windows.
pub fn harness() -> TestHarness {
    let store = Arc::new(InMemoryRecordStore::new());
    let clock = Arc::new(MutableClock::new(test_now()));
    let state = HttpState::new(
        store.clone(),
        clock.clone(),
        Arc::new(HousingTypeRegistry::builtin()),
        SessionConfig::default(),
    );
    TestHarness {
        state: web::Data::new(state),
        store,
        clock,
    }
}

/// The `/api/v1` scope wrapped in tracing, as the server mounts it.
pub fn test_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(state).wrap(Trace).service(api_scope())
}
