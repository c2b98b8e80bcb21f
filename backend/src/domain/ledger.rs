//! Measurement ledger: validated writes of shaft and housing measurements.
//!
//! `product_id` is one identifier space shared by both measurement kinds. A
//! per-`product_id` lock spans the cross-kind existence check and the append,
//! so two concurrent writers of the same id cannot both pass the check. The
//! Record Store's own key uniqueness remains the backstop within one kind.

use std::sync::Arc;

use mockable::Clock;
use serde_json::Value;
use tracing::{debug, info};

use super::key_lock::KeyedLocks;
use super::ports::{RecordStore, RecordStoreError};
use super::schema::format_timestamp;
use super::{
    HousingMeasurement, HousingTypeRegistry, MeasuredUnits, MeasurementKind, Record,
    ShaftMeasurement,
};

const PRODUCT_ID: &str = "product_id";
const ROLL_NUMBER: &str = "roll_number";
const HOUSING_TYPE: &str = "housing_type";
const MEASUREMENT_TIMESTAMP: &str = "measurement_timestamp";

const SHAFT_REQUIRED: [&str; 4] = [PRODUCT_ID, ROLL_NUMBER, "shaft_height", "shaft_radius"];
const HOUSING_REQUIRED: [&str; 4] = [PRODUCT_ID, ROLL_NUMBER, "housing_height", "housing_radius"];

/// Failures surfaced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A required field is absent, null or blank.
    #[error("missing required field: {field}")]
    MissingField {
        /// First missing field in declaration order.
        field: String,
    },
    /// `housing_type` is present but not in the registry.
    #[error("invalid housing type: {value}")]
    InvalidHousingType {
        /// Rejected value as received.
        value: String,
    },
    /// The `product_id` is already used by a shaft or housing measurement.
    #[error("product_id {product_id} already exists")]
    DuplicateKey {
        /// Colliding product id.
        product_id: String,
    },
    /// No measurement of `kind` carries `product_id`.
    #[error("no {kind} measurement with product_id {product_id}")]
    NotFound {
        /// Measurement kind that was searched.
        kind: MeasurementKind,
        /// Product id that was looked up.
        product_id: String,
    },
    /// A value does not fit the entity schema.
    #[error("invalid measurement: {message}")]
    Validation {
        /// Schema violation description.
        message: String,
    },
    /// Record Store failure outside the cases above.
    #[error(transparent)]
    Store(RecordStoreError),
}

impl LedgerError {
    fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_owned(),
        }
    }

    fn from_store(kind: MeasurementKind, product_id: &str, err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::Validation { message } => Self::Validation { message },
            RecordStoreError::DuplicateKey { .. } => Self::DuplicateKey {
                product_id: product_id.to_owned(),
            },
            RecordStoreError::NotFound { .. } => Self::NotFound {
                kind,
                product_id: product_id.to_owned(),
            },
            other => Self::Store(other),
        }
    }
}

impl From<RecordStoreError> for LedgerError {
    fn from(value: RecordStoreError) -> Self {
        match value {
            RecordStoreError::Validation { message } => Self::Validation { message },
            other => Self::Store(other),
        }
    }
}

/// Shaft and housing measurement service.
pub struct MeasurementLedger<R: RecordStore + ?Sized> {
    store: Arc<R>,
    clock: Arc<dyn Clock>,
    registry: Arc<HousingTypeRegistry>,
    locks: KeyedLocks,
}

impl<R: RecordStore + ?Sized> MeasurementLedger<R> {
    /// Build a ledger over `store`, stamping writes with `clock` and
    /// validating housing types against `registry`.
    pub fn new(store: Arc<R>, clock: Arc<dyn Clock>, registry: Arc<HousingTypeRegistry>) -> Self {
        Self {
            store,
            clock,
            registry,
            locks: KeyedLocks::new(),
        }
    }

    /// Record a new shaft measurement.
    ///
    /// # Errors
    /// `MissingField` names the first absent required field; `DuplicateKey`
    /// reports a `product_id` already used by either kind.
    pub async fn record_shaft(&self, entry: Record) -> Result<ShaftMeasurement, LedgerError> {
        let (product_id, row) = prepare_entry(entry, &SHAFT_REQUIRED)?;
        let stored = self.append(MeasurementKind::Shaft, &product_id, row).await?;
        Ok(ShaftMeasurement::from_record(&stored))
    }

    /// Record a new housing measurement.
    ///
    /// An absent `housing_type` takes the registry default; any present
    /// value, null included, must resolve through the registry and is stored
    /// in its canonical form.
    ///
    /// # Errors
    /// As [`Self::record_shaft`], plus `InvalidHousingType`.
    pub async fn record_housing(&self, entry: Record) -> Result<HousingMeasurement, LedgerError> {
        let (product_id, mut row) = prepare_entry(entry, &HOUSING_REQUIRED)?;
        let housing_type = match row.get(HOUSING_TYPE) {
            None => self.registry.default_type().to_owned(),
            Some(value) => self.canonical_housing_type(value)?,
        };
        row.insert(HOUSING_TYPE, Value::String(housing_type));
        let stored = self
            .append(MeasurementKind::Housing, &product_id, row)
            .await?;
        Ok(self.housing_view(&stored))
    }

    /// Patch an existing shaft measurement.
    ///
    /// # Errors
    /// `NotFound` when no shaft measurement carries `product_id`.
    pub async fn update_shaft(
        &self,
        product_id: &str,
        patch: Record,
    ) -> Result<ShaftMeasurement, LedgerError> {
        let stored = self
            .update(MeasurementKind::Shaft, product_id, strip_immutable(patch))
            .await?;
        Ok(ShaftMeasurement::from_record(&stored))
    }

    /// Patch an existing housing measurement, validating `housing_type`.
    ///
    /// # Errors
    /// `NotFound` when absent, `InvalidHousingType` for unknown types.
    pub async fn update_housing(
        &self,
        product_id: &str,
        patch: Record,
    ) -> Result<HousingMeasurement, LedgerError> {
        let mut patch = strip_immutable(patch);
        if let Some(value) = patch.get(HOUSING_TYPE) {
            let canonical = self.canonical_housing_type(value)?;
            patch.insert(HOUSING_TYPE, Value::String(canonical));
        }
        let stored = self
            .update(MeasurementKind::Housing, product_id, patch)
            .await?;
        Ok(self.housing_view(&stored))
    }

    /// Every shaft measurement in insertion order.
    ///
    /// # Errors
    /// Propagates Record Store failures.
    pub async fn list_shaft(&self) -> Result<Vec<ShaftMeasurement>, LedgerError> {
        let rows = self.store.get_all(MeasurementKind::Shaft.entity()).await?;
        Ok(rows.iter().map(ShaftMeasurement::from_record).collect())
    }

    /// Every housing measurement in insertion order.
    ///
    /// # Errors
    /// Propagates Record Store failures.
    pub async fn list_housing(&self) -> Result<Vec<HousingMeasurement>, LedgerError> {
        let rows = self.store.get_all(MeasurementKind::Housing.entity()).await?;
        Ok(rows.iter().map(|row| self.housing_view(row)).collect())
    }

    /// Remove every shaft measurement. Idempotent.
    ///
    /// # Errors
    /// Propagates Record Store failures.
    pub async fn clear_shaft(&self) -> Result<(), LedgerError> {
        self.clear(MeasurementKind::Shaft).await
    }

    /// Remove every housing measurement. Idempotent.
    ///
    /// # Errors
    /// Propagates Record Store failures.
    pub async fn clear_housing(&self) -> Result<(), LedgerError> {
        self.clear(MeasurementKind::Housing).await
    }

    /// Whether `product_id` is used by any measurement kind.
    ///
    /// # Errors
    /// Propagates Record Store failures.
    pub async fn product_exists(&self, product_id: &str) -> Result<bool, LedgerError> {
        for kind in MeasurementKind::ALL {
            if self.product_exists_for(kind, product_id).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `product_id` is used by measurements of `kind`.
    ///
    /// # Errors
    /// Propagates Record Store failures.
    pub async fn product_exists_for(
        &self,
        kind: MeasurementKind,
        product_id: &str,
    ) -> Result<bool, LedgerError> {
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Ok(false);
        }
        match self
            .store
            .find_by_key(kind.entity(), PRODUCT_ID, product_id)
            .await
        {
            Ok(_) => Ok(true),
            Err(RecordStoreError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// All measurements recorded under `roll_number`.
    ///
    /// # Errors
    /// `MissingField` for a blank roll number; otherwise store failures.
    pub async fn measured_units(&self, roll_number: &str) -> Result<MeasuredUnits, LedgerError> {
        let roll_number = roll_number.trim();
        if roll_number.is_empty() {
            return Err(LedgerError::missing(ROLL_NUMBER));
        }
        let shafts = self
            .list_shaft()
            .await?
            .into_iter()
            .filter(|shaft| shaft.roll_number == roll_number)
            .collect();
        let housings = self
            .list_housing()
            .await?
            .into_iter()
            .filter(|housing| housing.roll_number == roll_number)
            .collect();
        Ok(MeasuredUnits {
            roll_number: roll_number.to_owned(),
            shafts,
            housings,
        })
    }

    async fn append(
        &self,
        kind: MeasurementKind,
        product_id: &str,
        mut row: Record,
    ) -> Result<Record, LedgerError> {
        let _guard = self.locks.lock(product_id).await;
        if self.product_exists(product_id).await? {
            debug!(%kind, product_id, "rejected duplicate product_id");
            return Err(LedgerError::DuplicateKey {
                product_id: product_id.to_owned(),
            });
        }
        row.insert(
            MEASUREMENT_TIMESTAMP,
            Value::String(format_timestamp(self.clock.utc())),
        );
        let stored = self
            .store
            .append(kind.entity(), row)
            .await
            .map_err(|err| LedgerError::from_store(kind, product_id, err))?;
        info!(%kind, product_id, "measurement recorded");
        Ok(stored)
    }

    async fn update(
        &self,
        kind: MeasurementKind,
        product_id: &str,
        patch: Record,
    ) -> Result<Record, LedgerError> {
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Err(LedgerError::missing(PRODUCT_ID));
        }
        let _guard = self.locks.lock(product_id).await;
        let stored = self
            .store
            .update(kind.entity(), PRODUCT_ID, product_id, patch)
            .await
            .map_err(|err| LedgerError::from_store(kind, product_id, err))?;
        info!(%kind, product_id, "measurement updated");
        Ok(stored)
    }

    async fn clear(&self, kind: MeasurementKind) -> Result<(), LedgerError> {
        self.store.delete_all(kind.entity()).await?;
        info!(%kind, "measurements cleared");
        Ok(())
    }

    fn canonical_housing_type(&self, value: &Value) -> Result<String, LedgerError> {
        let text = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        self.registry
            .canonical(&text)
            .map(str::to_owned)
            .ok_or(LedgerError::InvalidHousingType { value: text })
    }

    fn housing_view(&self, row: &Record) -> HousingMeasurement {
        let housing_type = row
            .text(HOUSING_TYPE)
            .filter(|text| !text.trim().is_empty())
            .map_or_else(
                || self.registry.default_type().to_owned(),
                |text| self.registry.canonical(text).unwrap_or(text).to_owned(),
            );
        HousingMeasurement::from_record(row, housing_type)
    }
}

/// Check required fields in declaration order, trim identifiers and return
/// the trimmed `product_id` with the prepared row.
fn prepare_entry(mut entry: Record, required: &[&str]) -> Result<(String, Record), LedgerError> {
    for field in required {
        if !has_value(entry.get(field)) {
            return Err(LedgerError::missing(field));
        }
    }
    for field in [PRODUCT_ID, ROLL_NUMBER] {
        if let Some(Value::String(text)) = entry.get(field) {
            let trimmed = Value::String(text.trim().to_owned());
            entry.insert(field, trimmed);
        }
    }
    entry.remove(MEASUREMENT_TIMESTAMP);
    let product_id = match entry.get(PRODUCT_ID) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => {
            return Err(LedgerError::Validation {
                message: "product_id must be text".to_owned(),
            });
        }
    };
    Ok((product_id, entry))
}

fn has_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(_) => true,
    }
}

fn strip_immutable(mut patch: Record) -> Record {
    patch.remove(PRODUCT_ID);
    patch.remove(MEASUREMENT_TIMESTAMP);
    patch
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
