use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use leadsignal_core::alert::{NewAlert, OpenAlertKey};
use leadsignal_core::lead::LeadRow;
use leadsignal_core::performance::PerformanceRow;
use leadsignal_core::store::DecisionStore;
use leadsignal_core::trigger::DecisionTrigger;

use crate::DuckDbBackend;

#[async_trait]
impl DecisionStore for DuckDbBackend {
    async fn list_active_triggers(&self) -> Result<Vec<DecisionTrigger>> {
        DuckDbBackend::list_active_triggers(self).await
    }

    async fn performance_since(&self, start: NaiveDate) -> Result<Vec<PerformanceRow>> {
        DuckDbBackend::performance_since(self, start).await
    }

    async fn leads_since(&self, since: DateTime<Utc>) -> Result<Vec<LeadRow>> {
        DuckDbBackend::leads_since(self, since).await
    }

    async fn open_alert_keys(&self) -> Result<Vec<OpenAlertKey>> {
        DuckDbBackend::open_alert_keys(self).await
    }

    async fn insert_alerts(&self, alerts: &[NewAlert]) -> Result<usize> {
        DuckDbBackend::insert_alerts(self, alerts).await
    }
}
