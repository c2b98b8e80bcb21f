//! CSV-backed `RecordStore`.
//!
//! Each entity lives in `<entity>.csv` under a capability directory, with a
//! header row in schema order. Every read-modify-write of a file runs behind
//! that entity's mutex, and files are replaced atomically by writing a
//! temporary sibling and renaming it over the original.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{RecordStore, RecordStoreError};
use crate::domain::{EntityKind, Record};

/// One async mutex per entity file.
#[derive(Debug, Default)]
struct EntityLocks {
    user_entry: Mutex<()>,
    measured_shafts: Mutex<()>,
    measured_housings: Mutex<()>,
}

impl EntityLocks {
    fn for_entity(&self, entity: EntityKind) -> &Mutex<()> {
        match entity {
            EntityKind::UserEntry => &self.user_entry,
            EntityKind::MeasuredShafts => &self.measured_shafts,
            EntityKind::MeasuredHousings => &self.measured_housings,
        }
    }
}

/// Record Store persisting rows as CSV files.
#[derive(Debug)]
pub struct CsvRecordStore {
    dir: Arc<Dir>,
    root: PathBuf,
    locks: EntityLocks,
}

impl CsvRecordStore {
    /// Open (creating if needed) the data directory at `root`.
    ///
    /// # Errors
    /// `Connection` when the directory cannot be created or opened.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, RecordStoreError> {
        let root = root.as_ref().to_path_buf();
        Dir::create_ambient_dir_all(&root, ambient_authority())
            .map_err(|err| unavailable(&root, &err))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|err| unavailable(&root, &err))?;
        Ok(Self {
            dir: Arc::new(dir),
            root,
            locks: EntityLocks::default(),
        })
    }

    /// Directory holding the entity files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn load(&self, entity: EntityKind) -> Result<Vec<Record>, RecordStoreError> {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || read_rows(&dir, entity))
            .await
            .map_err(|err| RecordStoreError::query(format!("csv read task failed: {err}")))?
    }

    async fn store(&self, entity: EntityKind, rows: Vec<Record>) -> Result<(), RecordStoreError> {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || write_rows(&dir, entity, &rows))
            .await
            .map_err(|err| RecordStoreError::query(format!("csv write task failed: {err}")))?
    }
}

fn unavailable(root: &Path, err: &io::Error) -> RecordStoreError {
    RecordStoreError::connection(format!("data directory {}: {err}", root.display()))
}

fn file_name(entity: EntityKind) -> String {
    format!("{}.csv", entity.as_str())
}

fn io_failure(entity: EntityKind, err: impl std::fmt::Display) -> RecordStoreError {
    RecordStoreError::query(format!("{}: {err}", file_name(entity)))
}

fn read_rows(dir: &Dir, entity: EntityKind) -> Result<Vec<Record>, RecordStoreError> {
    let bytes = match dir.read(file_name(entity)) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_failure(entity, err)),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes.as_slice());
    let headers = reader
        .headers()
        .map_err(|err| io_failure(entity, err))?
        .clone();
    let schema = entity.schema();

    reader
        .records()
        .map(|line| {
            let line = line.map_err(|err| io_failure(entity, err))?;
            let raw: Record = headers
                .iter()
                .zip(line.iter())
                .map(|(name, cell)| (name.to_owned(), cell_value(cell)))
                .collect();
            Ok(schema.read_stored(&raw))
        })
        .collect()
}

fn cell_value(cell: &str) -> Value {
    if cell.is_empty() {
        Value::Null
    } else {
        Value::String(cell.to_owned())
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn encode_rows(entity: EntityKind, rows: &[Record]) -> Result<Vec<u8>, RecordStoreError> {
    let schema = entity.schema();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(schema.field_names())
        .map_err(|err| io_failure(entity, err))?;
    for row in rows {
        writer
            .write_record(schema.field_names().map(|name| cell_text(row.get(name))))
            .map_err(|err| io_failure(entity, err))?;
    }
    writer
        .into_inner()
        .map_err(|err| io_failure(entity, err.error()))
}

fn write_rows(dir: &Dir, entity: EntityKind, rows: &[Record]) -> Result<(), RecordStoreError> {
    let bytes = encode_rows(entity, rows)?;
    let target = file_name(entity);
    let staged = format!(".{target}.tmp-{}", Uuid::new_v4().simple());

    let result = dir
        .write(&staged, &bytes)
        .and_then(|()| dir.rename(&staged, dir, &target));
    if result.is_err() {
        let _cleanup_result = dir.remove_file(&staged);
    }
    result.map_err(|err| io_failure(entity, err))
}

#[async_trait]
impl RecordStore for CsvRecordStore {
    async fn get_all(&self, entity: EntityKind) -> Result<Vec<Record>, RecordStoreError> {
        let _guard = self.locks.for_entity(entity).lock().await;
        self.load(entity).await
    }

    async fn append(&self, entity: EntityKind, row: Record) -> Result<Record, RecordStoreError> {
        let schema = entity.schema();
        let row = schema.normalize_row(&row)?;
        let key = schema.key_of(&row).unwrap_or_default();

        let _guard = self.locks.for_entity(entity).lock().await;
        let mut rows = self.load(entity).await?;
        if rows.iter().any(|existing| schema.matches(existing, schema.key, &key)) {
            return Err(RecordStoreError::duplicate_key(entity, key));
        }
        rows.push(row.clone());
        self.store(entity, rows).await?;
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
        let _guard = self.locks.for_entity(entity).lock().await;
        self.load(entity)
            .await?
            .into_iter()
            .find(|row| schema.matches(row, key_field, value))
            .ok_or_else(|| RecordStoreError::not_found(entity, value))
    }

    async fn update(
        &self,
        entity: EntityKind,
        key_field: &str,
        value: &str,
        patch: Record,
    ) -> Result<Record, RecordStoreError> {
        let schema = entity.schema();
        schema.check_field(key_field)?;
        let _guard = self.locks.for_entity(entity).lock().await;
        let mut rows = self.load(entity).await?;
        let slot = rows
            .iter_mut()
            .find(|row| schema.matches(row, key_field, value))
            .ok_or_else(|| RecordStoreError::not_found(entity, value))?;
        let merged = schema.merge_patch(slot, &patch)?;
        *slot = merged.clone();
        self.store(entity, rows).await?;
        Ok(merged)
    }

    async fn delete_all(&self, entity: EntityKind) -> Result<(), RecordStoreError> {
        let _guard = self.locks.for_entity(entity).lock().await;
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || match dir.remove_file(file_name(entity)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_failure(entity, err)),
        })
        .await
        .map_err(|err| RecordStoreError::query(format!("csv delete task failed: {err}")))??;
        debug!(%entity, "records cleared");
        Ok(())
    }
}
