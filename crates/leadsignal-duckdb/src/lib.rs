pub mod alerts;
pub mod backend;
pub mod leads;
pub mod performance;
pub mod schema;
pub mod store_impl;
pub mod triggers;

pub use alerts::TransitionOutcome;
pub use backend::DuckDbBackend;

/// Re-export the `duckdb` crate so consumers (especially tests) can use
/// `leadsignal_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;
