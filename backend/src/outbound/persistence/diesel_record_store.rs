//! PostgreSQL-backed `RecordStore` implementation using Diesel ORM.
//!
//! Every entity shares the `records` table. The row body is a JSONB object
//! normalised through the entity schema; `record_key` mirrors the schema key
//! so the unique index enforces key uniqueness inside the database.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;
use tracing::debug;

use crate::domain::ports::{RecordStore, RecordStoreError};
use crate::domain::{EntityKind, EntitySchema, Record};

use super::diesel_basic_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewRecordRow, RecordRow};
use super::pool::DbPool;
use super::schema::records;

/// Diesel-backed Record Store.
#[derive(Clone)]
pub struct DieselRecordStore {
    pool: DbPool,
}

impl DieselRecordStore {
    /// Store backed by `pool`. Migrations must already be applied.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside an update transaction.
enum TxError {
    Diesel(diesel::result::Error),
    Store(RecordStoreError),
}

impl From<diesel::result::Error> for TxError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

fn record_from_data(entity: EntityKind, data: Value) -> Result<Record, RecordStoreError> {
    match data {
        Value::Object(map) => Ok(entity.schema().read_stored(&Record::from(map))),
        other => Err(RecordStoreError::query(format!(
            "{entity} row holds non-object data of type {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// First row in `rows` whose `key_field` holds `value`, with its sequence.
fn find_matching(
    entity: EntityKind,
    schema: &EntitySchema,
    rows: Vec<RecordRow>,
    key_field: &str,
    value: &str,
) -> Result<Option<(i64, Record)>, RecordStoreError> {
    for row in rows {
        let record = record_from_data(entity, row.data)?;
        if schema.matches(&record, key_field, value) {
            return Ok(Some((row.seq, record)));
        }
    }
    Ok(None)
}

#[async_trait]
impl RecordStore for DieselRecordStore {
    async fn get_all(&self, entity: EntityKind) -> Result<Vec<Record>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RecordRow> = records::table
            .filter(records::entity.eq(entity.as_str()))
            .order(records::seq.asc())
            .select(RecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, entity, ""))?;

        rows.into_iter()
            .map(|row| record_from_data(entity, row.data))
            .collect()
    }

    async fn append(&self, entity: EntityKind, row: Record) -> Result<Record, RecordStoreError> {
        let schema = entity.schema();
        let row = schema.normalize_row(&row)?;
        let key = schema.key_of(&row).unwrap_or_default();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewRecordRow {
            entity: entity.as_str(),
            record_key: &key,
            data: Value::Object(row.as_map().clone()),
        };
        diesel::insert_into(records::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, entity, &key))?;

        debug!(%entity, key = %key, "record appended");
        Ok(row)
    }

    async fn find_by_key(
        &self,
        entity: EntityKind,
        key_field: &str,
        value: &str,
    ) -> Result<Record, RecordStoreError> {
        let schema = entity.schema();
        schema.check_field(key_field)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = records::table
            .filter(records::entity.eq(entity.as_str()))
            .order(records::seq.asc())
            .select(RecordRow::as_select())
            .into_boxed();
        if key_field == schema.key {
            query = query.filter(records::record_key.eq(value));
        }
        let rows: Vec<RecordRow> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, entity, value))?;

        find_matching(entity, schema, rows, key_field, value)?
            .map(|(_, record)| record)
            .ok_or_else(|| RecordStoreError::not_found(entity, value))
    }

    async fn update(
        &self,
        entity: EntityKind,
        key_field: &str,
        value: &str,
        patch: Record,
    ) -> Result<Record, RecordStoreError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let schema = entity.schema();
        schema.check_field(key_field)?;
        let by_key = key_field == schema.key;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let scope = records::table.filter(records::entity.eq(entity.as_str()));
                let rows: Vec<RecordRow> = if by_key {
                    scope
                        .filter(records::record_key.eq(value))
                        .order(records::seq.asc())
                        .select(RecordRow::as_select())
                        .for_update()
                        .load(conn)
                        .await?
                } else {
                    scope
                        .order(records::seq.asc())
                        .select(RecordRow::as_select())
                        .for_update()
                        .load(conn)
                        .await?
                };

                let (seq, existing) = find_matching(entity, schema, rows, key_field, value)
                    .map_err(TxError::Store)?
                    .ok_or_else(|| TxError::Store(RecordStoreError::not_found(entity, value)))?;
                let merged = schema
                    .merge_patch(&existing, &patch)
                    .map_err(|err| TxError::Store(err.into()))?;

                diesel::update(records::table.find(seq))
                    .set(records::data.eq(Value::Object(merged.as_map().clone())))
                    .execute(conn)
                    .await?;
                Ok(merged)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| match err {
            TxError::Diesel(err) => map_diesel_error(err, entity, value),
            TxError::Store(err) => err,
        })
    }

    async fn delete_all(&self, entity: EntityKind) -> Result<(), RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(records::table.filter(records::entity.eq(entity.as_str())))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, entity, ""))?;
        debug!(%entity, removed, "records cleared");
        Ok(())
    }
}
