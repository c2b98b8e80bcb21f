//! In-memory Record Store used by service tests.
//!
//! Applies the same schema normalisation as the real adapters so services
//! observe identical outcomes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{RecordStore, RecordStoreError};
use crate::domain::{EntityKind, Record};

/// Process-local store keeping rows per entity in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    rows: Mutex<HashMap<EntityKind, Vec<Record>>>,
    unavailable: AtomicBool,
    yield_on_access: AtomicBool,
}

impl InMemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose calls yield to the scheduler before touching rows, so
    /// concurrent callers interleave the way they do over real IO.
    #[must_use]
    pub fn yielding() -> Self {
        let store = Self::default();
        store.yield_on_access.store(true, Ordering::SeqCst);
        store
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored rows for `entity`.
    pub fn count(&self, entity: EntityKind) -> usize {
        self.rows().get(&entity).map_or(0, Vec::len)
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<EntityKind, Vec<Record>>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pause(&self) {
        if self.yield_on_access.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }

    fn ensure_available(&self) -> Result<(), RecordStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RecordStoreError::connection("in-memory store marked unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_all(&self, entity: EntityKind) -> Result<Vec<Record>, RecordStoreError> {
        self.pause().await;
        self.ensure_available()?;
        Ok(self.rows().get(&entity).cloned().unwrap_or_default())
    }

    async fn append(&self, entity: EntityKind, row: Record) -> Result<Record, RecordStoreError> {
        self.pause().await;
        self.ensure_available()?;
        let schema = entity.schema();
        let row = schema.normalize_row(&row)?;
        let key = schema.key_of(&row).unwrap_or_default();
        let mut rows = self.rows();
        let table = rows.entry(entity).or_default();
        if table.iter().any(|existing| schema.matches(existing, schema.key, &key)) {
            return Err(RecordStoreError::duplicate_key(entity, key));
        }
        table.push(row.clone());
        Ok(row)
    }

    async fn find_by_key(
        &self,
        entity: EntityKind,
        key_field: &str,
        value: &str,
    ) -> Result<Record, RecordStoreError> {
        self.pause().await;
        self.ensure_available()?;
        let schema = entity.schema();
        schema.check_field(key_field)?;
        self.rows()
            .get(&entity)
            .and_then(|table| {
                table
                    .iter()
                    .find(|row| schema.matches(row, key_field, value))
                    .cloned()
            })
            .ok_or_else(|| RecordStoreError::not_found(entity, value))
    }

    async fn update(
        &self,
        entity: EntityKind,
        key_field: &str,
        value: &str,
        patch: Record,
    ) -> Result<Record, RecordStoreError> {
        self.pause().await;
        self.ensure_available()?;
        let schema = entity.schema();
        schema.check_field(key_field)?;
        let mut rows = self.rows();
        let slot = rows
            .get_mut(&entity)
            .and_then(|table| table.iter_mut().find(|row| schema.matches(row, key_field, value)))
            .ok_or_else(|| RecordStoreError::not_found(entity, value))?;
        let merged = schema.merge_patch(slot, &patch)?;
        *slot = merged.clone();
        Ok(merged)
    }

    async fn delete_all(&self, entity: EntityKind) -> Result<(), RecordStoreError> {
        self.pause().await;
        self.ensure_available()?;
        self.rows().remove(&entity);
        Ok(())
    }
}
