//! End-to-end login and measurement workflow over the CSV store.
//!
//! Drives the services the HTTP layer uses, with a manually advanced clock,
//! and checks what lands on disk.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use inspection_backend::domain::ports::RecordStore;
use inspection_backend::domain::{
    BeginSession, EntityKind, HousingTypeRegistry, LoginStatus, MeasurementKind, SessionConfig,
    SessionError,
};
use inspection_backend::inbound::http::state::HttpState;
use inspection_backend::outbound::flat_file::CsvRecordStore;
use inspection_backend::test_support::MutableClock;
use mockable::Clock;
use rstest::{fixture, rstest};
use serde_json::json;
use tempfile::TempDir;

mod support;

use support::{record, shaft_row};

struct World {
    state: HttpState,
    store: Arc<CsvRecordStore>,
    clock: Arc<MutableClock>,
    dir: TempDir,
}

#[fixture]
fn world() -> World {
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(CsvRecordStore::open(dir.path()).expect("open csv store"));
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp"),
    ));
    let state = HttpState::new(
        store.clone(),
        clock.clone(),
        Arc::new(HousingTypeRegistry::builtin()),
        SessionConfig::default(),
    );
    World {
        state,
        store,
        clock,
        dir,
    }
}

fn login(roll_number: &str, name: &str) -> BeginSession {
    BeginSession {
        roll_number: roll_number.to_owned(),
        name: name.to_owned(),
        date: Some("2024-05-01".to_owned()),
        time: Some("10:00:00".to_owned()),
    }
}

#[rstest]
#[tokio::test]
async fn returning_operator_recalibrates_after_the_window(world: World) {
    let sessions = &world.state.sessions;

    let first = sessions.begin_session(login("R1", "Alice")).await.expect("first login");
    assert_eq!(first.status, LoginStatus::NewUser);
    assert!(first.should_calibrate);
    sessions
        .complete_calibration(&first.session_id.to_string())
        .await
        .expect("calibrate");

    world.clock.advance_seconds(60 * 60);
    let second = sessions.begin_session(login("R1", "Alice")).await.expect("second login");
    assert_eq!(second.status, LoginStatus::WelcomeBack);
    assert!(!second.should_calibrate);
    sessions
        .complete_calibration(&second.session_id.to_string())
        .await
        .expect("finalise");

    world.clock.advance_seconds(25 * 60 * 60);
    assert!(sessions.should_calibrate("R1").await.expect("freshness check"));

    let entries = world
        .store
        .get_all(EntityKind::UserEntry)
        .await
        .expect("user entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text("last_login"), Some("2024-05-01T11:00:00.000000Z"));
}

#[rstest]
#[tokio::test]
async fn expired_sessions_leave_nothing_on_disk(world: World) {
    let sessions = &world.state.sessions;
    let started = sessions.begin_session(login("R2", "Bob")).await.expect("login");

    world.clock.advance_seconds(60 * 60 + 1);
    let err = sessions
        .complete_calibration(&started.session_id.to_string())
        .await
        .expect_err("expired session");
    assert!(matches!(err, SessionError::SessionNotFound { .. }), "{err:?}");
    assert_eq!(sessions.active_sessions().await, 0);

    let reopened = CsvRecordStore::open(world.dir.path()).expect("reopen");
    assert!(
        reopened
            .get_all(EntityKind::UserEntry)
            .await
            .expect("user entries")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn measurements_are_grouped_per_operator(world: World) {
    let ledger = &world.state.ledger;
    ledger.record_shaft(shaft_row("P1", "R1")).await.expect("shaft");
    ledger
        .record_housing(record(json!({
            "product_id": "P2",
            "roll_number": "R1",
            "housing_type": "Oval",
            "housing_height": 4.0,
            "housing_radius": 1.5,
        })))
        .await
        .expect("housing");

    assert!(ledger.product_exists("P2").await.expect("exists"));
    assert!(
        !ledger
            .product_exists_for(MeasurementKind::Shaft, "P2")
            .await
            .expect("kind-scoped lookup")
    );

    let units = ledger.measured_units("R1").await.expect("units");
    assert_eq!(units.total(), 2);
    assert_eq!(units.housings[0].housing_type, "oval");
    assert_eq!(
        units.housings[0].measurement_timestamp,
        Some(world.clock.utc())
    );
}
