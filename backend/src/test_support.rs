//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/` (through
//! the `test-support` feature).

mod clock;
mod memory_record_store;

pub use clock::MutableClock;
pub use memory_record_store::InMemoryRecordStore;
