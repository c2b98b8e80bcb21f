//! Port for the entity-agnostic Record Store.
//!
//! Two adapters implement it: the PostgreSQL store in
//! `outbound::persistence` and the CSV store in `outbound::flat_file`. The
//! services above never learn which one is active, so both must produce the
//! same outcome for the same input. Shared normalisation lives on
//! [`crate::domain::EntitySchema`].

use async_trait::async_trait;

use crate::domain::{EntityKind, Record, SchemaViolation};

use super::define_port_error;

define_port_error! {
    /// Errors raised by Record Store adapters.
    pub enum RecordStoreError {
        /// The row or patch does not fit the entity schema.
        Validation { message: String } => "record validation failed: {message}",
        /// No row matched the lookup.
        NotFound { entity: EntityKind, key: String } =>
            "no {entity} record matches {key}",
        /// A row with the same key already exists.
        DuplicateKey { entity: EntityKind, key: String } =>
            "{entity} record {key} already exists",
        /// The backing store could not be reached.
        Connection { message: String } => "record store connection failed: {message}",
        /// Query, IO or encoding failed during execution.
        Query { message: String } => "record store query failed: {message}",
    }
}

impl From<SchemaViolation> for RecordStoreError {
    fn from(value: SchemaViolation) -> Self {
        Self::validation(value.to_string())
    }
}

/// Uniform persistence over declared entity schemas.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every row of `entity` in insertion order.
    async fn get_all(&self, entity: EntityKind) -> Result<Vec<Record>, RecordStoreError>;

    /// Append a row, writing exactly the declared fields.
    ///
    /// Fails with `Validation` when the row does not fit the schema and with
    /// `DuplicateKey` when the key is already present.
    async fn append(&self, entity: EntityKind, row: Record) -> Result<Record, RecordStoreError>;

    /// First row whose `key_field` equals `value`, or `NotFound`.
    async fn find_by_key(
        &self,
        entity: EntityKind,
        key_field: &str,
        value: &str,
    ) -> Result<Record, RecordStoreError>;

    /// Replace the patched fields of the first row whose `key_field` equals
    /// `value`, returning the updated row.
    async fn update(
        &self,
        entity: EntityKind,
        key_field: &str,
        value: &str,
        patch: Record,
    ) -> Result<Record, RecordStoreError>;

    /// Remove every row of `entity`. Succeeds on an empty store.
    async fn delete_all(&self, entity: EntityKind) -> Result<(), RecordStoreError>;
}
