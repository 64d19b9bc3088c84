use anyhow::{Context, Result};
use chrono::NaiveDate;
use leadsignal_core::performance::{PerformanceInput, PerformanceRow};

use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Upsert daily performance rows in one transaction.
    ///
    /// A re-import of the same `(date, campaign_name, adset_name)` replaces the
    /// earlier numbers. Returns the number of rows written.
    pub async fn insert_performance(&self, rows: &[PerformanceInput]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO ad_performance_daily (
                    date, campaign_name, adset_name, spent, frequency, clicks, imported_at
                ) VALUES (
                    CAST(?1 AS DATE), ?2, ?3, ?4, ?5, ?6, CURRENT_TIMESTAMP
                )
                "#,
            )?;
            for row in rows {
                stmt.execute(duckdb::params![
                    row.date.format("%Y-%m-%d").to_string(),
                    row.campaign_name.as_deref().unwrap_or(""),
                    row.adset_name.trim(),
                    row.spent.to_string(),
                    row.frequency.to_string(),
                    row.clicks.to_string(),
                ])
                .with_context(|| format!("failed to store performance row for {}", row.adset_name))?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Raw performance rows dated on or after `start`.
    pub async fn performance_since(&self, start: NaiveDate) -> Result<Vec<PerformanceRow>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                CAST(date AS VARCHAR),
                NULLIF(campaign_name, ''),
                adset_name,
                spent,
                frequency,
                clicks
            FROM ad_performance_daily
            WHERE date >= CAST(?1 AS DATE)
            ORDER BY date ASC, adset_name ASC
            "#,
        )?;
        let rows = stmt.query_map(
            duckdb::params![start.format("%Y-%m-%d").to_string()],
            |row| {
                Ok(PerformanceRow {
                    date: row.get(0)?,
                    campaign_name: row.get(1)?,
                    adset_name: row.get(2)?,
                    spent: row.get(3)?,
                    frequency: row.get(4)?,
                    clicks: row.get(5)?,
                })
            },
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
