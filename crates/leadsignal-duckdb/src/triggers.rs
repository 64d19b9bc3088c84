use anyhow::{anyhow, Result};
use leadsignal_core::trigger::{
    CreateTriggerRequest, DecisionTrigger, Metric, Operator, Severity, UpdateTriggerRequest,
};
use tracing::warn;

use crate::backend::{conversion_error, generate_id};
use crate::DuckDbBackend;

const TRIGGER_COLUMNS: &str = r#"
    id,
    trigger_name,
    adset_pattern,
    market,
    metric,
    operator,
    threshold_value,
    severity,
    evaluation_week,
    is_active,
    description,
    CAST(created_at AS VARCHAR),
    CAST(updated_at AS VARCHAR)
"#;

fn generate_trigger_id() -> String {
    generate_id("trg", 21)
}

fn map_trigger_row(row: &duckdb::Row<'_>) -> Result<DecisionTrigger, duckdb::Error> {
    let metric_raw: String = row.get(4)?;
    let operator_raw: String = row.get(5)?;
    let severity_raw: String = row.get(7)?;
    let metric = metric_raw
        .parse::<Metric>()
        .map_err(|e| conversion_error(4, e))?;
    let operator = operator_raw
        .parse::<Operator>()
        .map_err(|e| conversion_error(5, e))?;
    let severity = severity_raw
        .parse::<Severity>()
        .map_err(|e| conversion_error(7, e))?;
    let evaluation_week: Option<i32> = row.get(8)?;
    let evaluation_week = evaluation_week
        .map(u32::try_from)
        .transpose()
        .map_err(|e| conversion_error(8, e))?;
    Ok(DecisionTrigger {
        id: row.get(0)?,
        trigger_name: row.get(1)?,
        adset_pattern: row.get(2)?,
        market: row.get(3)?,
        metric,
        operator,
        threshold_value: row.get(6)?,
        severity,
        evaluation_week,
        is_active: row.get(9)?,
        description: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl DuckDbBackend {
    /// All triggers, newest first. Rows that no longer decode are an error
    /// here: the operator listing should surface them.
    pub async fn list_triggers(&self) -> Result<Vec<DecisionTrigger>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRIGGER_COLUMNS} FROM decision_triggers ORDER BY created_at DESC, id DESC"
        ))?;
        let mut out = Vec::new();
        for row in stmt.query_map([], map_trigger_row)? {
            out.push(row?);
        }
        Ok(out)
    }

    /// Active triggers for the evaluator. A row with an unknown metric,
    /// operator or severity is skipped with a warning instead of failing the
    /// whole evaluation.
    pub async fn list_active_triggers(&self) -> Result<Vec<DecisionTrigger>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRIGGER_COLUMNS} FROM decision_triggers WHERE is_active = TRUE ORDER BY id"
        ))?;
        let mut out = Vec::new();
        for row in stmt.query_map([], map_trigger_row)? {
            match row {
                Ok(trigger) => out.push(trigger),
                Err(err @ duckdb::Error::FromSqlConversionFailure(..)) => {
                    warn!(error = %err, "Skipping undecodable decision trigger");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(out)
    }

    pub async fn get_trigger(&self, trigger_id: &str) -> Result<Option<DecisionTrigger>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRIGGER_COLUMNS} FROM decision_triggers WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(duckdb::params![trigger_id], map_trigger_row)?;
        rows.next().transpose().map_err(Into::into)
    }

    pub async fn create_trigger(&self, req: CreateTriggerRequest) -> Result<DecisionTrigger> {
        let id = generate_trigger_id();
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO decision_triggers (
                id, trigger_name, adset_pattern, market, metric, operator,
                threshold_value, severity, evaluation_week, is_active, description,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                CURRENT_TIMESTAMP, CURRENT_TIMESTAMP
            )
            "#,
            duckdb::params![
                id,
                req.trigger_name.trim(),
                req.adset_pattern.trim(),
                req.market,
                req.metric.as_str(),
                req.operator.as_str(),
                req.threshold_value,
                req.severity.as_str(),
                req.evaluation_week,
                req.is_active.unwrap_or(true),
                req.description,
            ],
        )?;
        drop(conn);
        self.get_trigger(&id)
            .await?
            .ok_or_else(|| anyhow!("trigger not found after create"))
    }

    pub async fn update_trigger(
        &self,
        trigger_id: &str,
        req: UpdateTriggerRequest,
    ) -> Result<Option<DecisionTrigger>> {
        let Some(existing) = self.get_trigger(trigger_id).await? else {
            return Ok(None);
        };
        let trigger_name = req
            .trigger_name
            .map(|name| name.trim().to_string())
            .unwrap_or(existing.trigger_name);
        let adset_pattern = req
            .adset_pattern
            .map(|pattern| pattern.trim().to_string())
            .unwrap_or(existing.adset_pattern);
        let market = req.market.unwrap_or(existing.market);
        let metric = req.metric.unwrap_or(existing.metric);
        let operator = req.operator.unwrap_or(existing.operator);
        let threshold_value = req.threshold_value.unwrap_or(existing.threshold_value);
        let severity = req.severity.unwrap_or(existing.severity);
        let evaluation_week = req.evaluation_week.unwrap_or(existing.evaluation_week);
        let is_active = req.is_active.unwrap_or(existing.is_active);
        let description = req.description.unwrap_or(existing.description);

        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            UPDATE decision_triggers
            SET trigger_name = ?1,
                adset_pattern = ?2,
                market = ?3,
                metric = ?4,
                operator = ?5,
                threshold_value = ?6,
                severity = ?7,
                evaluation_week = ?8,
                is_active = ?9,
                description = ?10,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?11
            "#,
            duckdb::params![
                trigger_name,
                adset_pattern,
                market,
                metric.as_str(),
                operator.as_str(),
                threshold_value,
                severity.as_str(),
                evaluation_week,
                is_active,
                description,
                trigger_id,
            ],
        )?;
        drop(conn);
        self.get_trigger(trigger_id).await
    }

    /// Alerts raised by the trigger are kept; they carry the trigger name.
    pub async fn delete_trigger(&self, trigger_id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let rows = conn.execute(
            "DELETE FROM decision_triggers WHERE id = ?1",
            duckdb::params![trigger_id],
        )?;
        Ok(rows > 0)
    }
}
