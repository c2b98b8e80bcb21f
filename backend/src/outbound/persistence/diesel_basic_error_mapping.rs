//! Diesel and pool error mapping onto [`RecordStoreError`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::EntityKind;
use crate::domain::ports::RecordStoreError;

use super::pool::PoolError;

pub(crate) fn map_pool_error(error: PoolError) -> RecordStoreError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    RecordStoreError::connection(message)
}

/// Map a Diesel failure raised while writing `key` of `entity`.
///
/// Unique-index violations become `DuplicateKey`; closed or unreachable
/// connections become `Connection`; everything else is a `Query` failure.
pub(crate) fn map_diesel_error(
    error: DieselError,
    entity: EntityKind,
    key: &str,
) -> RecordStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %entity, "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            %entity,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            RecordStoreError::duplicate_key(entity, key)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RecordStoreError::connection("database connection error")
        }
        DieselError::NotFound => RecordStoreError::not_found(entity, key),
        DieselError::QueryBuilderError(_) => RecordStoreError::query("database query error"),
        DieselError::DeserializationError(err) | DieselError::SerializationError(err) => {
            RecordStoreError::query(format!("record encoding failed: {err}"))
        }
        _ => RecordStoreError::query("database error"),
    }
}
