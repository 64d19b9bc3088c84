use anyhow::{Context, Result};
use leadsignal_core::alert::{
    AlertStatus, AlertTransition, NewAlert, OpenAlertKey, TriggeredAlert,
};
use leadsignal_core::trigger::{Metric, Operator, Severity};

use crate::backend::{conversion_error, generate_id};
use crate::DuckDbBackend;

const ALERT_COLUMNS: &str = r#"
    id,
    trigger_id,
    trigger_name,
    adset_name,
    metric,
    operator,
    metric_value,
    threshold_value,
    severity,
    campaign_week,
    message,
    status,
    CAST(created_at AS VARCHAR),
    CAST(acknowledged_at AS VARCHAR),
    CAST(resolved_at AS VARCHAR)
"#;

fn generate_alert_id() -> String {
    generate_id("alr", 21)
}

fn map_alert_row(row: &duckdb::Row<'_>) -> Result<TriggeredAlert, duckdb::Error> {
    let metric_raw: String = row.get(4)?;
    let operator_raw: String = row.get(5)?;
    let severity_raw: String = row.get(8)?;
    let campaign_week: i32 = row.get(9)?;
    let status_raw: String = row.get(11)?;
    Ok(TriggeredAlert {
        id: row.get(0)?,
        trigger_id: row.get(1)?,
        trigger_name: row.get(2)?,
        adset_name: row.get(3)?,
        metric: metric_raw
            .parse::<Metric>()
            .map_err(|e| conversion_error(4, e))?,
        operator: operator_raw
            .parse::<Operator>()
            .map_err(|e| conversion_error(5, e))?,
        metric_value: row.get(6)?,
        threshold_value: row.get(7)?,
        severity: severity_raw
            .parse::<Severity>()
            .map_err(|e| conversion_error(8, e))?,
        campaign_week: u32::try_from(campaign_week).map_err(|e| conversion_error(9, e))?,
        message: row.get(10)?,
        status: status_raw
            .parse::<AlertStatus>()
            .map_err(|e| conversion_error(11, e))?,
        created_at: row.get(12)?,
        acknowledged_at: row.get(13)?,
        resolved_at: row.get(14)?,
    })
}

/// Result of an acknowledge/resolve request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(TriggeredAlert),
    NotFound,
    /// The alert exists but its current status does not allow the transition.
    Rejected(AlertStatus),
}

impl DuckDbBackend {
    /// Alerts newest first, optionally filtered by status. `limit` is clamped
    /// to `1..=500`.
    pub async fn list_alerts(
        &self,
        status: Option<AlertStatus>,
        limit: i64,
    ) -> Result<Vec<TriggeredAlert>> {
        let bounded_limit = limit.clamp(1, 500);
        let conn = self.conn.lock().await;
        let mut out = Vec::new();
        match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    r#"
                    SELECT {ALERT_COLUMNS}
                    FROM triggered_alerts
                    WHERE status = ?1
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?2
                    "#
                ))?;
                for row in stmt.query_map(
                    duckdb::params![status.as_str(), bounded_limit],
                    map_alert_row,
                )? {
                    out.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    r#"
                    SELECT {ALERT_COLUMNS}
                    FROM triggered_alerts
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?1
                    "#
                ))?;
                for row in stmt.query_map(duckdb::params![bounded_limit], map_alert_row)? {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    pub async fn get_alert(&self, alert_id: &str) -> Result<Option<TriggeredAlert>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ALERT_COLUMNS} FROM triggered_alerts WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(duckdb::params![alert_id], map_alert_row)?;
        rows.next().transpose().map_err(Into::into)
    }

    /// `(trigger_id, adset_name)` of every alert that is still open.
    pub async fn open_alert_keys(&self) -> Result<Vec<OpenAlertKey>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT trigger_id, adset_name FROM triggered_alerts WHERE status = 'open'",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(OpenAlertKey {
                trigger_id: row.get(0)?,
                adset_name: row.get(1)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Insert all alerts as `open` in a single transaction.
    ///
    /// Any failure rolls the whole batch back, including a violation of the
    /// `open_key` uniqueness constraint when another run already opened an
    /// alert for the same trigger and ad set.
    pub async fn insert_alerts(&self, alerts: &[NewAlert]) -> Result<usize> {
        if alerts.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO triggered_alerts (
                    id, trigger_id, trigger_name, adset_name, metric, operator,
                    metric_value, threshold_value, severity, campaign_week, message,
                    status, open_key, created_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                    'open', ?12, CURRENT_TIMESTAMP
                )
                "#,
            )?;
            for alert in alerts {
                stmt.execute(duckdb::params![
                    generate_alert_id(),
                    alert.trigger_id,
                    alert.trigger_name,
                    alert.adset_name,
                    alert.metric.as_str(),
                    alert.operator.as_str(),
                    alert.metric_value,
                    alert.threshold_value,
                    alert.severity.as_str(),
                    alert.campaign_week,
                    alert.message,
                    alert.open_key(),
                ])
                .with_context(|| {
                    format!(
                        "failed to insert alert for trigger {} on {}",
                        alert.trigger_id, alert.adset_name
                    )
                })?;
            }
        }
        tx.commit()?;
        Ok(alerts.len())
    }

    /// Acknowledge or resolve an alert. Both release the open slot for the
    /// (trigger, ad set) pair so a later evaluation may open a new alert.
    pub async fn transition_alert(
        &self,
        alert_id: &str,
        transition: AlertTransition,
    ) -> Result<TransitionOutcome> {
        let Some(existing) = self.get_alert(alert_id).await? else {
            return Ok(TransitionOutcome::NotFound);
        };
        if !transition.allowed_from(existing.status) {
            return Ok(TransitionOutcome::Rejected(existing.status));
        }
        let sql = match transition {
            AlertTransition::Acknowledge => {
                r#"
                UPDATE triggered_alerts
                SET status = ?1,
                    open_key = NULL,
                    acknowledged_at = CURRENT_TIMESTAMP
                WHERE id = ?2 AND status = ?3
                "#
            }
            AlertTransition::Resolve => {
                r#"
                UPDATE triggered_alerts
                SET status = ?1,
                    open_key = NULL,
                    resolved_at = CURRENT_TIMESTAMP
                WHERE id = ?2 AND status = ?3
                "#
            }
        };
        let conn = self.conn.lock().await;
        let rows = conn.execute(
            sql,
            duckdb::params![
                transition.target().as_str(),
                alert_id,
                existing.status.as_str()
            ],
        )?;
        drop(conn);
        if rows == 0 {
            // Status changed between the read and the update.
            return match self.get_alert(alert_id).await? {
                Some(current) => Ok(TransitionOutcome::Rejected(current.status)),
                None => Ok(TransitionOutcome::NotFound),
            };
        }
        match self.get_alert(alert_id).await? {
            Some(alert) => Ok(TransitionOutcome::Applied(alert)),
            None => Ok(TransitionOutcome::NotFound),
        }
    }
}
