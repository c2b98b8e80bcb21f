//! Startup wiring for the Record Store backend and the housing type
//! registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use tracing::info;

use crate::domain::HousingTypeRegistry;
use crate::domain::ports::{RecordStore, RecordStoreError};
use crate::outbound::flat_file::CsvRecordStore;
use crate::outbound::persistence::{DbPool, DieselRecordStore, PoolConfig, run_migrations};

use super::settings::{InspectionSettings, SettingsError, StorageBackend};

/// Failures while preparing service dependencies.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("record store initialisation failed: {0}")]
    Store(#[from] RecordStoreError),
    #[error("failed to read housing types at {path}: {source}")]
    RegistryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid housing types at {path}: {message}")]
    Registry { path: PathBuf, message: String },
}

/// Build the configured Record Store. PostgreSQL stores have pending
/// migrations applied first.
///
/// # Errors
/// Settings problems, unreachable databases, failed migrations and
/// unusable CSV directories.
pub async fn build_record_store(
    settings: &InspectionSettings,
) -> Result<Arc<dyn RecordStore>, StartupError> {
    match settings.storage_backend()? {
        StorageBackend::Postgres => {
            let url = settings
                .database_url()
                .ok_or(SettingsError::MissingDatabaseUrl)?;
            run_migrations(url).await?;
            let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.db_pool_size()))
                .await
                .map_err(|err| RecordStoreError::connection(err.to_string()))?;
            info!(backend = "postgres", "record store ready");
            Ok(Arc::new(DieselRecordStore::new(pool)))
        }
        StorageBackend::Csv => {
            let store = CsvRecordStore::open(settings.csv_data_dir())?;
            info!(backend = "csv", data_dir = %store.root().display(), "record store ready");
            Ok(Arc::new(store))
        }
    }
}

/// Load the housing type registry named in settings, or the built-in table.
///
/// # Errors
/// Unreadable or invalid registry documents.
pub fn load_housing_types(
    settings: &InspectionSettings,
) -> Result<HousingTypeRegistry, StartupError> {
    let Some(path) = settings.housing_types_path.as_deref() else {
        return Ok(HousingTypeRegistry::builtin());
    };
    let text = read_text(path).map_err(|source| StartupError::RegistryRead {
        path: path.to_path_buf(),
        source,
    })?;
    let registry =
        HousingTypeRegistry::from_json(&text).map_err(|message| StartupError::Registry {
            path: path.to_path_buf(),
            message,
        })?;
    info!(path = %path.display(), types = registry.entries().len(), "housing types loaded");
    Ok(registry)
}

fn read_text(path: &Path) -> std::io::Result<String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other("path has no file name"))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read_to_string(name)
}
