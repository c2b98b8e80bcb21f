//! Service configuration loaded via OrthoConfig.
//!
//! Values layer defaults, an optional config file, `INSPECTION_*`
//! environment variables and command-line flags.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::SessionConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CSV_DATA_DIR: &str = "data";
const DEFAULT_DB_POOL_SIZE: u32 = 10;

/// Configuration problems detected after loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("unknown storage backend {0}; expected \"postgres\" or \"csv\"")]
    StorageBackend(String),
    #[error("storage backend \"postgres\" requires a database URL")]
    MissingDatabaseUrl,
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// Physical Record Store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Csv,
}

impl FromStr for StorageBackend {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "csv" => Ok(Self::Csv),
            _ => Err(SettingsError::StorageBackend(value.to_owned())),
        }
    }
}

/// Settings for the inspection service and its admin tooling.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "INSPECTION")]
pub struct InspectionSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// `postgres` or `csv`.
    pub storage_backend: Option<String>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
    /// Directory holding one CSV file per entity.
    pub csv_data_dir: Option<PathBuf>,
    /// JSON housing type registry replacing the built-in table.
    pub housing_types_path: Option<PathBuf>,
    /// Age in seconds after which a pending session expires.
    pub session_expiry_secs: Option<u64>,
    /// Age in seconds after which a login requires recalibration.
    pub calibration_freshness_secs: Option<u64>,
    /// Seconds between scheduled expiry sweeps.
    pub sweep_interval_secs: Option<u64>,
}

impl InspectionSettings {
    /// Parsed bind address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    /// [`SettingsError::BindAddr`] when the value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    /// Selected backend. Without an explicit choice PostgreSQL is used when
    /// a database URL is configured and CSV otherwise.
    ///
    /// # Errors
    /// [`SettingsError::StorageBackend`] for unknown names.
    pub fn storage_backend(&self) -> Result<StorageBackend, SettingsError> {
        match self.storage_backend.as_deref() {
            Some(name) => name.parse(),
            None if self.database_url().is_some() => Ok(StorageBackend::Postgres),
            None => Ok(StorageBackend::Csv),
        }
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_DB_POOL_SIZE)
    }

    pub fn csv_data_dir(&self) -> PathBuf {
        self.csv_data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_DATA_DIR))
    }

    /// Session windows, each falling back to its default.
    ///
    /// # Errors
    /// [`SettingsError::ZeroDuration`] when a window is configured as zero.
    pub fn session_config(&self) -> Result<SessionConfig, SettingsError> {
        let window = |value: Option<u64>, default: Duration, field: &'static str| match value {
            Some(0) => Err(SettingsError::ZeroDuration { field }),
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => Ok(default),
        };
        Ok(SessionConfig {
            expiry: window(
                self.session_expiry_secs,
                SessionConfig::DEFAULT_EXPIRY,
                "session_expiry_secs",
            )?,
            calibration_freshness: window(
                self.calibration_freshness_secs,
                SessionConfig::DEFAULT_CALIBRATION_FRESHNESS,
                "calibration_freshness_secs",
            )?,
            sweep_interval: window(
                self.sweep_interval_secs,
                SessionConfig::DEFAULT_SWEEP_INTERVAL,
                "sweep_interval_secs",
            )?,
        })
    }
}
