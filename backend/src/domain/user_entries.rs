//! Administrative access to finalised user entries.
//!
//! Nothing here creates an entry: that stays exclusive to
//! [`crate::domain::sessions::SessionManager::complete_calibration`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::ports::{RecordStore, RecordStoreError};
use super::schema::parse_timestamp;
use super::{EntityKind, Record};

const ROLL_NUMBER: &str = "roll_number";
const PATCHABLE: [&str; 4] = ["name", "date", "time", "last_login"];

/// Stored user entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserEntry {
    #[schema(example = "R1")]
    pub roll_number: String,
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = "2024-05-01")]
    pub date: Option<String>,
    #[schema(example = "09:30:00")]
    pub time: Option<String>,
    /// First successful calibration.
    pub created_at: Option<DateTime<Utc>>,
    /// Most recent successful calibration.
    pub last_login: Option<DateTime<Utc>>,
}

impl UserEntry {
    fn from_record(record: &Record) -> Self {
        let text = |field: &str| record.text(field).map(str::to_owned);
        Self {
            roll_number: text(ROLL_NUMBER).unwrap_or_default(),
            name: text("name").unwrap_or_default(),
            date: text("date"),
            time: text("time"),
            created_at: record.text("created_at").and_then(parse_timestamp),
            last_login: record.text("last_login").and_then(parse_timestamp),
        }
    }
}

/// Failures surfaced by user entry administration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserEntryError {
    #[error("missing required field: {field}")]
    MissingField { field: String },
    #[error("no user entry for roll_number {roll_number}")]
    NotFound { roll_number: String },
    #[error("invalid user entry: {message}")]
    Validation { message: String },
    #[error(transparent)]
    Store(RecordStoreError),
}

impl From<RecordStoreError> for UserEntryError {
    fn from(value: RecordStoreError) -> Self {
        match value {
            RecordStoreError::Validation { message } => Self::Validation { message },
            RecordStoreError::NotFound { key, .. } => Self::NotFound { roll_number: key },
            other => Self::Store(other),
        }
    }
}

/// List, patch and clear user entries.
pub struct UserEntryDirectory<R: RecordStore + ?Sized> {
    store: Arc<R>,
}

impl<R: RecordStore + ?Sized> UserEntryDirectory<R> {
    /// Build a directory over `store`.
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// Every user entry in insertion order.
    ///
    /// # Errors
    /// Propagates Record Store failures.
    pub async fn list_user_entries(&self) -> Result<Vec<UserEntry>, UserEntryError> {
        let rows = self.store.get_all(EntityKind::UserEntry).await?;
        Ok(rows.iter().map(UserEntry::from_record).collect())
    }

    /// Patch `name`, `date`, `time` or `last_login` of an existing entry.
    ///
    /// # Errors
    /// `NotFound` when the roll number has no entry; `Validation` when the
    /// patch names other fields or carries malformed values.
    pub async fn update_user_entry(
        &self,
        roll_number: &str,
        mut patch: Record,
    ) -> Result<UserEntry, UserEntryError> {
        let roll_number = roll_number.trim();
        if roll_number.is_empty() {
            return Err(UserEntryError::MissingField {
                field: ROLL_NUMBER.to_owned(),
            });
        }
        patch.remove(ROLL_NUMBER);
        if let Some((field, _)) = patch.iter().find(|(field, _)| !PATCHABLE.contains(&field.as_str())) {
            return Err(UserEntryError::Validation {
                message: format!("user entry field {field} cannot be updated"),
            });
        }
        let updated = self
            .store
            .update(EntityKind::UserEntry, ROLL_NUMBER, roll_number, patch)
            .await?;
        info!(roll_number, "user entry updated");
        Ok(UserEntry::from_record(&updated))
    }

    /// Remove every user entry. Idempotent.
    ///
    /// # Errors
    /// Propagates Record Store failures.
    pub async fn clear_user_entries(&self) -> Result<(), UserEntryError> {
        self.store.delete_all(EntityKind::UserEntry).await?;
        info!("user entries cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    use super::*;
    use crate::test_support::InMemoryRecordStore;

    fn record(fields: Value) -> Record {
        serde_json::from_value(fields).expect("object literal")
    }

    #[fixture]
    async fn seeded() -> (Arc<InMemoryRecordStore>, UserEntryDirectory<InMemoryRecordStore>) {
        let store = Arc::new(InMemoryRecordStore::new());
        store
            .append(
                EntityKind::UserEntry,
                record(json!({
                    "roll_number": "R1",
                    "name": "Alice",
                    "last_login": "2024-05-01T08:00:00Z",
                })),
            )
            .await
            .expect("seed entry");
        let directory = UserEntryDirectory::new(Arc::clone(&store));
        (store, directory)
    }

    #[rstest]
    #[tokio::test]
    async fn update_patches_allowed_fields(
        #[future] seeded: (Arc<InMemoryRecordStore>, UserEntryDirectory<InMemoryRecordStore>),
    ) {
        let (_, directory) = seeded.await;
        let updated = directory
            .update_user_entry("R1", record(json!({ "name": "Alicia", "date": "2024-05-02" })))
            .await
            .expect("update succeeds");
        assert_eq!(updated.name, "Alicia");
        assert_eq!(updated.date.as_deref(), Some("2024-05-02"));
        assert!(updated.last_login.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn update_never_creates_entries(
        #[future] seeded: (Arc<InMemoryRecordStore>, UserEntryDirectory<InMemoryRecordStore>),
    ) {
        let (store, directory) = seeded.await;
        let err = directory
            .update_user_entry("R2", record(json!({ "name": "Bob" })))
            .await
            .expect_err("unknown roll number");
        assert_eq!(
            err,
            UserEntryError::NotFound {
                roll_number: "R2".to_owned()
            }
        );
        assert_eq!(store.count(EntityKind::UserEntry), 1);
    }

    #[rstest]
    #[case(json!({ "created_at": "2024-01-01T00:00:00Z" }))]
    #[case(json!({ "last_login": "yesterday" }))]
    #[tokio::test]
    async fn update_rejects_invalid_patches(
        #[future] seeded: (Arc<InMemoryRecordStore>, UserEntryDirectory<InMemoryRecordStore>),
        #[case] patch: Value,
    ) {
        let (_, directory) = seeded.await;
        let err = directory
            .update_user_entry("R1", record(patch))
            .await
            .expect_err("invalid patch");
        assert!(matches!(err, UserEntryError::Validation { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn clear_removes_everything(
        #[future] seeded: (Arc<InMemoryRecordStore>, UserEntryDirectory<InMemoryRecordStore>),
    ) {
        let (_, directory) = seeded.await;
        directory.clear_user_entries().await.expect("clear");
        directory.clear_user_entries().await.expect("clear again");
        assert!(directory.list_user_entries().await.expect("list").is_empty());
    }
}
