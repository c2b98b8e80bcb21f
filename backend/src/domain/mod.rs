//! Domain model and services.
//!
//! Purpose: hold the inspection workflow rules independent of any transport
//! or storage technology. Services depend only on the ports in [`ports`].
//!
//! Public surface:
//! - `SessionManager`: pending login sessions and calibration finalisation.
//! - `MeasurementLedger`: validated shaft and housing measurement writes.
//! - `UserEntryDirectory`: administration of finalised user entries.
//! - `HousingTypeRegistry`: valid housing types and their video categories.
//! - `Error` / `ErrorCode`: transport-facing error payload.

pub mod error;
pub mod housing_types;
mod key_lock;
pub mod ledger;
pub mod measurements;
pub mod ports;
pub mod record;
pub mod schema;
pub mod sessions;
pub mod trace_id;
pub mod user_entries;

pub use self::error::{Error, ErrorCode};
pub use self::housing_types::{
    HousingType, HousingTypeDocument, HousingTypeRegistry, HousingTypeRegistryError,
};
pub use self::ledger::{LedgerError, MeasurementLedger};
pub use self::measurements::{
    HousingMeasurement, MeasuredUnits, MeasurementKind, ShaftMeasurement,
};
pub use self::record::Record;
pub use self::schema::{EntityKind, EntitySchema, FieldKind, FieldSpec, SchemaViolation};
pub use self::sessions::{
    BeginSession, CalibrationCompleted, LoginStatus, PendingSession, SessionConfig, SessionError,
    SessionManager, SessionStarted, SessionStatus, SessionSweeper,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user_entries::{UserEntry, UserEntryDirectory, UserEntryError};
