//! Regression coverage for this module.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use super::*;
use crate::domain::ports::MockRecordStore;
use crate::test_support::{InMemoryRecordStore, MutableClock};

struct Harness {
    store: Arc<InMemoryRecordStore>,
    clock: Arc<MutableClock>,
    manager: SessionManager<InMemoryRecordStore>,
}

#[fixture]
fn harness() -> Harness {
    let store = Arc::new(InMemoryRecordStore::new());
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
            .single()
            .expect("valid instant"),
    ));
    let manager = SessionManager::new(
        Arc::clone(&store),
        Arc::clone(&clock) as Arc<dyn Clock>,
        SessionConfig::default(),
    );
    Harness {
        store,
        clock,
        manager,
    }
}

fn login(roll_number: &str, name: &str) -> BeginSession {
    BeginSession {
        roll_number: roll_number.to_owned(),
        name: name.to_owned(),
        ..BeginSession::default()
    }
}

async fn user_entries(store: &InMemoryRecordStore) -> Vec<Record> {
    store
        .get_all(EntityKind::UserEntry)
        .await
        .expect("user entries readable")
}

#[rstest]
#[tokio::test]
async fn first_login_calibrates_and_creates_one_entry(harness: Harness) {
    let started = harness
        .manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    assert_eq!(started.status, LoginStatus::NewUser);
    assert!(started.should_calibrate);
    assert!(user_entries(&harness.store).await.is_empty());

    let session_id = started.session_id.to_string();
    let completed = harness
        .manager
        .complete_calibration(&session_id)
        .await
        .expect("calibration completes");
    assert_eq!(completed.status, "calibration_completed");
    assert_eq!(completed.roll_number, "R1");

    let entries = user_entries(&harness.store).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text("roll_number"), Some("R1"));
    assert_eq!(entries[0].text("name"), Some("Alice"));
    assert!(entries[0].text("created_at").is_some());

    let err = harness
        .manager
        .get_session_status(&session_id)
        .await
        .expect_err("finalised sessions are gone");
    assert!(matches!(err, SessionError::SessionNotFound { .. }));
    assert_eq!(harness.manager.active_sessions().await, 0);
}

#[rstest]
#[tokio::test]
async fn second_calibration_of_one_session_is_not_found(harness: Harness) {
    let started = harness
        .manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    let session_id = started.session_id.to_string();
    harness
        .manager
        .complete_calibration(&session_id)
        .await
        .expect("first completion");
    let err = harness
        .manager
        .complete_calibration(&session_id)
        .await
        .expect_err("terminal session");
    assert!(matches!(err, SessionError::SessionNotFound { .. }));
}

#[rstest]
#[tokio::test]
async fn returning_operator_within_window_skips_calibration(harness: Harness) {
    let first = harness
        .manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    harness
        .manager
        .complete_calibration(&first.session_id.to_string())
        .await
        .expect("calibrated");

    harness.clock.advance(Duration::from_secs(2 * 60 * 60));
    let second = harness
        .manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    assert_eq!(second.status, LoginStatus::WelcomeBack);
    assert!(!second.should_calibrate);

    harness
        .manager
        .complete_calibration(&second.session_id.to_string())
        .await
        .expect("re-login finalises");
    let entries = user_entries(&harness.store).await;
    assert_eq!(entries.len(), 1, "re-login must not duplicate the entry");

    harness.clock.advance(Duration::from_secs(25 * 60 * 60));
    assert!(
        harness
            .manager
            .should_calibrate("R1")
            .await
            .expect("query succeeds")
    );
}

#[rstest]
#[tokio::test]
async fn unparsable_last_login_forces_calibration(harness: Harness) {
    harness
        .store
        .append(
            EntityKind::UserEntry,
            serde_json::from_value(json!({ "roll_number": "R1", "name": "Alice" }))
                .expect("object literal"),
        )
        .await
        .expect("seed entry");
    assert!(harness.manager.should_calibrate("R1").await.expect("query"));
}

#[rstest]
#[tokio::test]
async fn abandoned_sessions_expire_without_trace(harness: Harness) {
    let started = harness
        .manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    let session_id = started.session_id.to_string();

    harness.clock.advance(Duration::from_secs(60 * 60 + 1));
    let status_err = harness
        .manager
        .get_session_status(&session_id)
        .await
        .expect_err("expired");
    assert!(matches!(status_err, SessionError::SessionNotFound { .. }));
    let complete_err = harness
        .manager
        .complete_calibration(&session_id)
        .await
        .expect_err("expired");
    assert!(matches!(complete_err, SessionError::SessionNotFound { .. }));
    assert!(user_entries(&harness.store).await.is_empty());
}

#[rstest]
#[tokio::test]
async fn sweep_evicts_only_expired_sessions(harness: Harness) {
    harness
        .manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("old session");
    harness.clock.advance(Duration::from_secs(30 * 60));
    let fresh = harness
        .manager
        .begin_session(login("R2", "Bob"))
        .await
        .expect("fresh session");
    harness.clock.advance(Duration::from_secs(31 * 60));

    assert_eq!(harness.manager.sweep_expired().await, 1);
    assert_eq!(harness.manager.active_sessions().await, 1);
    let status = harness
        .manager
        .get_session_status(&fresh.session_id.to_string())
        .await
        .expect("fresh session survives");
    assert_eq!(status.status, SessionStatus::PendingCalibration);
    assert_eq!(status.roll_number, "R2");
}

#[rstest]
#[tokio::test]
async fn cancelled_sessions_leave_no_entry(harness: Harness) {
    let started = harness
        .manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    let session_id = started.session_id.to_string();
    harness
        .manager
        .cancel_session(&session_id)
        .await
        .expect("cancel succeeds");

    let err = harness
        .manager
        .complete_calibration(&session_id)
        .await
        .expect_err("cancelled");
    assert!(matches!(err, SessionError::SessionNotFound { .. }));
    assert!(harness.manager.cancel_session(&session_id).await.is_err());
    assert!(user_entries(&harness.store).await.is_empty());
}

#[rstest]
#[case("", "Alice", "roll_number")]
#[case("R1", "   ", "name")]
#[tokio::test]
async fn blank_identity_fields_are_missing(
    harness: Harness,
    #[case] roll_number: &str,
    #[case] name: &str,
    #[case] field: &str,
) {
    let err = harness
        .manager
        .begin_session(login(roll_number, name))
        .await
        .expect_err("blank field rejected");
    assert_eq!(
        err,
        SessionError::MissingField {
            field: field.to_owned()
        }
    );
    assert_eq!(harness.manager.active_sessions().await, 0);
}

#[rstest]
#[case("not-a-uuid")]
#[case("00000000-0000-0000-0000-000000000000")]
#[tokio::test]
async fn unknown_session_ids_are_not_found(harness: Harness, #[case] session_id: &str) {
    let err = harness
        .manager
        .get_session_status(session_id)
        .await
        .expect_err("unknown id");
    assert!(matches!(err, SessionError::SessionNotFound { .. }));
}

#[rstest]
#[tokio::test]
async fn failed_entry_write_keeps_session_pending(harness: Harness) {
    let started = harness
        .manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    let session_id = started.session_id.to_string();

    harness.store.set_unavailable(true);
    let err = harness
        .manager
        .complete_calibration(&session_id)
        .await
        .expect_err("store outage");
    assert!(matches!(
        err,
        SessionError::Store(RecordStoreError::Connection { .. })
    ));

    harness.store.set_unavailable(false);
    harness
        .manager
        .complete_calibration(&session_id)
        .await
        .expect("retry succeeds");
    assert_eq!(user_entries(&harness.store).await.len(), 1);
}

#[rstest]
#[tokio::test]
async fn lost_insert_race_falls_back_to_update() {
    let mut store = MockRecordStore::new();
    store
        .expect_find_by_key()
        .returning(|entity, _, _| Err(RecordStoreError::not_found(entity, "R1")));
    store
        .expect_append()
        .times(1)
        .returning(|entity, _| Err(RecordStoreError::duplicate_key(entity, "R1")));
    store
        .expect_update()
        .times(1)
        .withf(|entity, _, _, patch| {
            *entity == EntityKind::UserEntry
                && patch.contains("last_login")
                && !patch.contains("name")
        })
        .returning(|_, _, _, patch| Ok(patch));
    let manager = SessionManager::new(
        Arc::new(store),
        Arc::new(mockable::DefaultClock),
        SessionConfig::default(),
    );

    let started = manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    manager
        .complete_calibration(&started.session_id.to_string())
        .await
        .expect("falls back to refresh");
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_finalise_once() {
    let store = Arc::new(InMemoryRecordStore::yielding());
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&store),
        Arc::new(mockable::DefaultClock),
        SessionConfig::default(),
    ));
    let started = manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    let session_id = started.session_id.to_string();

    let attempts: Vec<_> = (0..6)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let session_id = session_id.clone();
            tokio::spawn(async move { manager.complete_calibration(&session_id).await.is_ok() })
        })
        .collect();
    let mut successes = 0;
    for attempt in attempts {
        if attempt.await.expect("attempt completes") {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(store.count(EntityKind::UserEntry), 1);
}

/// Delegates to an in-memory store but parks user-entry appends until the
/// test releases them.
#[derive(Default)]
struct GatedStore {
    inner: InMemoryRecordStore,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn get_all(&self, entity: EntityKind) -> Result<Vec<Record>, RecordStoreError> {
        self.inner.get_all(entity).await
    }

    async fn append(&self, entity: EntityKind, row: Record) -> Result<Record, RecordStoreError> {
        if entity == EntityKind::UserEntry {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.append(entity, row).await
    }

    async fn find_by_key(
        &self,
        entity: EntityKind,
        key_field: &str,
        value: &str,
    ) -> Result<Record, RecordStoreError> {
        self.inner.find_by_key(entity, key_field, value).await
    }

    async fn update(
        &self,
        entity: EntityKind,
        key_field: &str,
        value: &str,
        patch: Record,
    ) -> Result<Record, RecordStoreError> {
        self.inner.update(entity, key_field, value, patch).await
    }

    async fn delete_all(&self, entity: EntityKind) -> Result<(), RecordStoreError> {
        self.inner.delete_all(entity).await
    }
}

#[rstest]
#[tokio::test]
async fn sweep_leaves_in_flight_completion_alone() {
    let store = Arc::new(GatedStore::default());
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
            .single()
            .expect("valid instant"),
    ));
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&store),
        Arc::clone(&clock) as Arc<dyn Clock>,
        SessionConfig::default(),
    ));
    let started = manager
        .begin_session(login("R1", "Alice"))
        .await
        .expect("session starts");
    let session_id = started.session_id.to_string();

    let completion = {
        let manager = Arc::clone(&manager);
        let session_id = session_id.clone();
        tokio::spawn(async move { manager.complete_calibration(&session_id).await })
    };
    store.entered.notified().await;

    clock.advance(SessionConfig::DEFAULT_EXPIRY + Duration::from_secs(1));
    assert_eq!(manager.sweep_expired().await, 0);

    store.release.notify_one();
    let completed = completion
        .await
        .expect("completion task joins")
        .expect("in-flight completion succeeds");
    assert_eq!(completed.roll_number, "R1");
    assert_eq!(store.inner.count(EntityKind::UserEntry), 1);
    assert_eq!(manager.active_sessions().await, 0);

    let err = manager
        .complete_calibration(&session_id)
        .await
        .expect_err("session already finalised");
    assert!(matches!(err, SessionError::SessionNotFound { .. }));
}
