//! Persistence boundary used by the evaluator.

use chrono::{DateTime, NaiveDate, Utc};

use crate::alert::{NewAlert, OpenAlertKey};
use crate::lead::LeadRow;
use crate::performance::PerformanceRow;
use crate::trigger::DecisionTrigger;

/// Reads and writes the evaluator needs from the backing store.
///
/// Every read failure is fatal to an evaluation run. Implementations skip
/// (and log) individual trigger rows they cannot decode.
#[async_trait::async_trait]
pub trait DecisionStore: Send + Sync + 'static {
    async fn list_active_triggers(&self) -> anyhow::Result<Vec<DecisionTrigger>>;

    /// Performance rows dated on or after `start`.
    async fn performance_since(&self, start: NaiveDate) -> anyhow::Result<Vec<PerformanceRow>>;

    /// Lead rows created at or after `since`.
    async fn leads_since(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<LeadRow>>;

    async fn open_alert_keys(&self) -> anyhow::Result<Vec<OpenAlertKey>>;

    /// Insert all `alerts` atomically: either every row is written or none is.
    async fn insert_alerts(&self, alerts: &[NewAlert]) -> anyhow::Result<usize>;
}
