pub mod alerts;
pub mod dashboard;
pub mod evaluate;
pub mod health;
pub mod leads;
pub mod performance;
pub mod triggers;
