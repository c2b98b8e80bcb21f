//! Session manager: owns pending sessions and finalises user entries.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use super::session_store::SessionStore;
use super::{PendingSession, SessionConfig, SessionStatus};
use crate::domain::ports::{RecordStore, RecordStoreError};
use crate::domain::schema::{format_timestamp, parse_timestamp};
use crate::domain::{EntityKind, Record};

const ROLL_NUMBER: &str = "roll_number";
const SESSION_CREATED: &str = "Session created. Complete calibration to finalize entry.";
const ENTRY_FINALISED: &str = "User entry finalized successfully";

/// Failures surfaced by session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `roll_number`, `name` or `session_id` is absent or blank.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },
    /// The session is unknown, expired or already terminal.
    #[error("session {session_id} not found or expired")]
    SessionNotFound {
        /// Session id as supplied by the caller.
        session_id: String,
    },
    /// The user entry written on completion does not fit its schema.
    #[error("invalid user entry: {message}")]
    Validation {
        /// Schema violation description.
        message: String,
    },
    /// Record Store failure while reading or writing the user entry.
    #[error(transparent)]
    Store(RecordStoreError),
}

impl SessionError {
    fn not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }
}

impl From<RecordStoreError> for SessionError {
    fn from(value: RecordStoreError) -> Self {
        match value {
            RecordStoreError::Validation { message } => Self::Validation { message },
            other => Self::Store(other),
        }
    }
}

/// Login request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(default)]
pub struct BeginSession {
    /// Operator identity; also the user entry key.
    #[schema(example = "R1")]
    pub roll_number: String,
    /// Operator display name.
    #[schema(example = "Alice")]
    pub name: String,
    /// Client-side login date, kept on the user entry.
    pub date: Option<String>,
    /// Client-side login time, kept on the user entry.
    pub time: Option<String>,
}

/// Whether the roll number was seen before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    /// No user entry exists for the roll number.
    NewUser,
    /// The roll number already has a user entry.
    WelcomeBack,
}

/// Outcome of [`SessionManager::begin_session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionStarted {
    /// Token for the completion, status and cancel calls.
    pub session_id: Uuid,
    /// Whether the operator was seen before.
    pub status: LoginStatus,
    /// Whether the client must run calibration before completing.
    pub should_calibrate: bool,
    /// Human-readable summary for the client.
    pub message: String,
}

/// Outcome of [`SessionManager::complete_calibration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CalibrationCompleted {
    /// Always `calibration_completed`.
    #[schema(example = "calibration_completed")]
    pub status: String,
    /// Roll number of the finalised entry.
    pub roll_number: String,
    /// Name of the finalised entry.
    pub name: String,
    /// Human-readable summary for the client.
    pub message: String,
}

/// Owner of the pending-session table.
pub struct SessionManager<R: RecordStore + ?Sized> {
    store: Arc<R>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    sessions: SessionStore,
}

impl<R: RecordStore + ?Sized> SessionManager<R> {
    /// Build a manager with an empty session table.
    pub fn new(store: Arc<R>, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        Self {
            store,
            clock,
            config,
            sessions: SessionStore::default(),
        }
    }

    /// Windows this manager applies.
    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Start a pending session for an operator.
    ///
    /// Always creates a session, even when calibration is not required:
    /// every login is finalised through [`Self::complete_calibration`].
    ///
    /// # Errors
    /// `MissingField` for a blank roll number or name; store failures while
    /// looking up the prior entry.
    pub async fn begin_session(&self, request: BeginSession) -> Result<SessionStarted, SessionError> {
        let roll_number = required(&request.roll_number, ROLL_NUMBER)?;
        let name = required(&request.name, "name")?;
        let existing = self.find_user_entry(&roll_number).await?;
        let now = self.clock.utc();
        let should_calibrate = self.is_calibration_due(existing.as_ref(), now);

        let session_id = Uuid::new_v4();
        self.sessions
            .insert(PendingSession {
                session_id,
                roll_number,
                name,
                date: optional(request.date),
                time: optional(request.time),
                created_at: now,
                status: SessionStatus::PendingCalibration,
                calibration_required: should_calibrate,
            })
            .await;
        info!(%session_id, should_calibrate, "pending session created");

        Ok(SessionStarted {
            session_id,
            status: if existing.is_some() {
                LoginStatus::WelcomeBack
            } else {
                LoginStatus::NewUser
            },
            should_calibrate,
            message: SESSION_CREATED.to_owned(),
        })
    }

    /// Finalise a pending session into a durable user entry.
    ///
    /// The session lock is held across the store write, so the expiry sweep
    /// and concurrent completions observe either the pending or the final
    /// state. A failed write leaves the session pending.
    ///
    /// # Errors
    /// `SessionNotFound` when the session is absent, expired or already
    /// terminal; store failures while writing the entry.
    pub async fn complete_calibration(
        &self,
        session_id: &str,
    ) -> Result<CalibrationCompleted, SessionError> {
        let id = parse_session_id(session_id)?;
        let slot = self
            .sessions
            .get(&id)
            .await
            .ok_or_else(|| SessionError::not_found(session_id))?;
        let mut session = slot.lock().await;
        if !self.claim_live(&mut session).await {
            return Err(SessionError::not_found(session_id));
        }

        self.write_user_entry(&session).await?;
        session.status = SessionStatus::Calibrated;
        self.sessions.remove(&id).await;
        info!(session_id = %id, roll_number = %session.roll_number, "calibration completed");

        Ok(CalibrationCompleted {
            status: "calibration_completed".to_owned(),
            roll_number: session.roll_number.clone(),
            name: session.name.clone(),
            message: ENTRY_FINALISED.to_owned(),
        })
    }

    /// Snapshot of a live pending session.
    ///
    /// # Errors
    /// `SessionNotFound` when absent, expired or terminal.
    pub async fn get_session_status(&self, session_id: &str) -> Result<PendingSession, SessionError> {
        let id = parse_session_id(session_id)?;
        let slot = self
            .sessions
            .get(&id)
            .await
            .ok_or_else(|| SessionError::not_found(session_id))?;
        let mut session = slot.lock().await;
        if self.claim_live(&mut session).await {
            Ok(session.clone())
        } else {
            Err(SessionError::not_found(session_id))
        }
    }

    /// Discard a pending session without writing anything.
    ///
    /// # Errors
    /// `SessionNotFound` when absent, expired or terminal.
    pub async fn cancel_session(&self, session_id: &str) -> Result<(), SessionError> {
        let id = parse_session_id(session_id)?;
        let slot = self
            .sessions
            .get(&id)
            .await
            .ok_or_else(|| SessionError::not_found(session_id))?;
        let mut session = slot.lock().await;
        if !self.claim_live(&mut session).await {
            return Err(SessionError::not_found(session_id));
        }
        // Tasks already holding the slot must not be able to calibrate it.
        session.status = SessionStatus::Expired;
        self.sessions.remove(&id).await;
        info!(session_id = %id, "pending session cancelled");
        Ok(())
    }

    /// Whether `roll_number` must calibrate on its next login.
    ///
    /// # Errors
    /// `MissingField` for a blank roll number; store failures.
    pub async fn should_calibrate(&self, roll_number: &str) -> Result<bool, SessionError> {
        let roll_number = required(roll_number, ROLL_NUMBER)?;
        let existing = self.find_user_entry(&roll_number).await?;
        Ok(self.is_calibration_due(existing.as_ref(), self.clock.utc()))
    }

    /// Expire and evict every pending session older than the expiry window.
    ///
    /// Sessions whose lock is held are skipped; an in-flight completion
    /// decides their fate and the next pass revisits them otherwise.
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.utc();
        let expiry = self.expiry();
        let mut evicted = 0;
        for (id, slot) in self.sessions.snapshot().await {
            let Ok(mut session) = slot.try_lock() else {
                continue;
            };
            if !session.is_pending() {
                self.sessions.remove(&id).await;
            } else if session.is_expired_at(now, expiry) {
                session.status = SessionStatus::Expired;
                self.sessions.remove(&id).await;
                evicted += 1;
            }
        }
        if evicted > 0 {
            info!(evicted, "expired pending sessions evicted");
        }
        evicted
    }

    /// Number of sessions currently held in memory.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.len().await
    }

    /// Lazily expire `session`; true when it may still transition.
    async fn claim_live(&self, session: &mut PendingSession) -> bool {
        if !session.is_pending() {
            return false;
        }
        if session.is_expired_at(self.clock.utc(), self.expiry()) {
            session.status = SessionStatus::Expired;
            self.sessions.remove(&session.session_id).await;
            debug!(session_id = %session.session_id, "pending session expired on access");
            return false;
        }
        true
    }

    async fn find_user_entry(&self, roll_number: &str) -> Result<Option<Record>, SessionError> {
        match self
            .store
            .find_by_key(EntityKind::UserEntry, ROLL_NUMBER, roll_number)
            .await
        {
            Ok(entry) => Ok(Some(entry)),
            Err(RecordStoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Insert the entry for an unseen roll number, otherwise refresh its
    /// last-login fields. An insert that loses a race falls back to the
    /// refresh.
    async fn write_user_entry(&self, session: &PendingSession) -> Result<(), SessionError> {
        let local = self.clock.local();
        let stamp = Value::String(format_timestamp(self.clock.utc()));
        let date = session
            .date
            .clone()
            .unwrap_or_else(|| local.format("%Y-%m-%d").to_string());
        let time = session
            .time
            .clone()
            .unwrap_or_else(|| local.format("%H:%M:%S").to_string());
        let refresh = Record::new()
            .with("date", Value::String(date))
            .with("time", Value::String(time))
            .with("last_login", stamp.clone());

        let roll_number = session.roll_number.as_str();
        if self.find_user_entry(roll_number).await?.is_none() {
            let row = refresh
                .clone()
                .with(ROLL_NUMBER, Value::String(session.roll_number.clone()))
                .with("name", Value::String(session.name.clone()))
                .with("created_at", stamp);
            match self.store.append(EntityKind::UserEntry, row).await {
                Ok(_) => return Ok(()),
                Err(RecordStoreError::DuplicateKey { .. }) => {
                    debug!(roll_number, "user entry created concurrently; refreshing instead");
                }
                Err(err) => return Err(err.into()),
            }
        }
        self.store
            .update(EntityKind::UserEntry, ROLL_NUMBER, roll_number, refresh)
            .await?;
        Ok(())
    }

    fn is_calibration_due(&self, entry: Option<&Record>, now: DateTime<Utc>) -> bool {
        let last_seen = entry.and_then(|entry| {
            entry
                .text("last_login")
                .or_else(|| entry.text("created_at"))
                .and_then(parse_timestamp)
        });
        match last_seen {
            Some(seen) => now.signed_duration_since(seen) > to_delta(self.config.calibration_freshness),
            None => true,
        }
    }

    fn expiry(&self) -> TimeDelta {
        to_delta(self.config.expiry)
    }
}

fn to_delta(duration: std::time::Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

fn required(value: &str, field: &str) -> Result<String, SessionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(SessionError::MissingField {
            field: field.to_owned(),
        })
    } else {
        Ok(trimmed.to_owned())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Malformed identifiers cannot name a session, so they read as not found.
fn parse_session_id(session_id: &str) -> Result<Uuid, SessionError> {
    Uuid::parse_str(session_id.trim()).map_err(|_| SessionError::not_found(session_id))
}

#[cfg(test)]
#[path = "session_manager_tests.rs"]
mod tests;
