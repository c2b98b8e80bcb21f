//! Pending session entity.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of a pending session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Waiting for `complete_calibration`.
    PendingCalibration,
    /// Finalised into a user entry. Terminal.
    Calibrated,
    /// Aged out or cancelled. Terminal.
    Expired,
}

/// Ephemeral login awaiting calibration. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PendingSession {
    /// Opaque session token.
    pub session_id: Uuid,
    #[schema(example = "R1")]
    pub roll_number: String,
    #[schema(example = "Alice")]
    pub name: String,
    /// Operator-supplied date, used when the entry is first created.
    pub date: Option<String>,
    /// Operator-supplied time, used when the entry is first created.
    pub time: Option<String>,
    /// Login instant; expiry is measured from here.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Whether the login was judged to need a fresh calibration.
    pub calibration_required: bool,
}

impl PendingSession {
    pub(crate) fn is_pending(&self) -> bool {
        self.status == SessionStatus::PendingCalibration
    }

    /// Whether the session has outlived `expiry` at `now`.
    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>, expiry: TimeDelta) -> bool {
        now.signed_duration_since(self.created_at) > expiry
    }
}
