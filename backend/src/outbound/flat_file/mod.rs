//! Flat-file Record Store adapter: one CSV file per entity.

mod csv_record_store;

pub use csv_record_store::CsvRecordStore;
