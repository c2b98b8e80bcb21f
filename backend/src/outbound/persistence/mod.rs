//! PostgreSQL Record Store adapter using Diesel ORM.
//!
//! Async access goes through `diesel-async` with `bb8` pooling. Row structs
//! (`models.rs`) and the table definition (`schema.rs`) stay internal; only
//! domain [`Record`](crate::domain::Record) values cross the port.
//!
//! ```ignore
//! use inspection_backend::outbound::persistence::{
//!     DbPool, DieselRecordStore, PoolConfig, run_migrations,
//! };
//!
//! run_migrations("postgres://localhost/inspection").await?;
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/inspection")).await?;
//! let store = DieselRecordStore::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_record_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_record_store::DieselRecordStore;
pub use migrations::{MIGRATIONS, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
