pub mod alert;
pub mod campaign;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod lead;
pub mod matcher;
pub mod metrics;
pub mod performance;
pub mod store;
pub mod trigger;
