//! Outbound adapters implementing the domain's Record Store port.

pub mod flat_file;
pub mod persistence;
