use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use leadsignal_core::lead::{Lead, LeadQuality, LeadRow, LeadSubmission};

use crate::DuckDbBackend;

fn map_lead_row(row: &duckdb::Row<'_>) -> Result<Lead, duckdb::Error> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        postal_code: row.get(4)?,
        market: row.get(5)?,
        language: row.get(6)?,
        landing_page: row.get(7)?,
        message: row.get(8)?,
        utm_source: row.get(9)?,
        utm_medium: row.get(10)?,
        utm_campaign: row.get(11)?,
        utm_content: row.get(12)?,
        utm_term: row.get(13)?,
        kwaliteit: row.get(14)?,
        created_at: row.get(15)?,
    })
}

/// Trim optional form fields and drop the ones left empty.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl DuckDbBackend {
    pub async fn insert_lead(
        &self,
        submission: LeadSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<Lead> {
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO lead_submissions (
                id, name, email, phone, postal_code, market, language, landing_page,
                message, utm_source, utm_medium, utm_campaign, utm_content, utm_term,
                kwaliteit, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                NULL, CAST(?15 AS TIMESTAMP), CURRENT_TIMESTAMP
            )
            "#,
            duckdb::params![
                id,
                submission.name.trim(),
                submission.email.trim(),
                clean(submission.phone),
                clean(submission.postal_code),
                clean(submission.market).map(|m| m.to_ascii_lowercase()),
                clean(submission.language),
                clean(submission.landing_page),
                clean(submission.message),
                clean(submission.utm_source),
                clean(submission.utm_medium),
                clean(submission.utm_campaign),
                clean(submission.utm_content),
                clean(submission.utm_term),
                created_at.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            ],
        )?;
        drop(conn);
        self.get_lead(&id)
            .await?
            .ok_or_else(|| anyhow!("lead not found after insert"))
    }

    pub async fn get_lead(&self, lead_id: &str) -> Result<Option<Lead>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                id, name, email, phone, postal_code, market, language, landing_page,
                message, utm_source, utm_medium, utm_campaign, utm_content, utm_term,
                kwaliteit, CAST(created_at AS VARCHAR)
            FROM lead_submissions
            WHERE id = ?1
            "#,
        )?;
        let mut rows = stmt.query_map(duckdb::params![lead_id], map_lead_row)?;
        rows.next().transpose().map_err(Into::into)
    }

    /// Set or clear (`None`) the quality label. `None` when the lead does not exist.
    pub async fn set_lead_quality(
        &self,
        lead_id: &str,
        quality: Option<LeadQuality>,
    ) -> Result<Option<Lead>> {
        let conn = self.conn.lock().await;
        let rows = conn.execute(
            r#"
            UPDATE lead_submissions
            SET kwaliteit = ?1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?2
            "#,
            duckdb::params![quality.map(|q| q.as_str()), lead_id],
        )?;
        drop(conn);
        if rows == 0 {
            return Ok(None);
        }
        self.get_lead(lead_id).await
    }

    /// Leads created at or after `since`, as read by the aggregator.
    pub async fn leads_since(&self, since: DateTime<Utc>) -> Result<Vec<LeadRow>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"
            SELECT CAST(created_at AS VARCHAR), utm_content, kwaliteit
            FROM lead_submissions
            WHERE created_at >= CAST(?1 AS TIMESTAMP)
            ORDER BY created_at ASC
            "#,
        )?;
        let rows = stmt.query_map(
            duckdb::params![since.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()],
            |row| {
                Ok(LeadRow {
                    created_at: row.get(0)?,
                    utm_content: row.get(1)?,
                    kwaliteit: row.get(2)?,
                })
            },
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// `(kwaliteit, count)` for leads created between `start` and `end`
    /// (inclusive calendar dates, UTC).
    pub async fn lead_quality_counts(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(Option<String>, i64)>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"
            SELECT LOWER(TRIM(kwaliteit)) AS label, COUNT(*)
            FROM lead_submissions
            WHERE CAST(created_at AS DATE) BETWEEN CAST(?1 AS DATE) AND CAST(?2 AS DATE)
            GROUP BY label
            ORDER BY label
            "#,
        )?;
        let rows = stmt.query_map(
            duckdb::params![
                start.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string()
            ],
            |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?)),
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
