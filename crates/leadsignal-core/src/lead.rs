//! Landing-page lead submissions and their quality labels.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Manually assigned lead quality (`kwaliteit` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadQuality {
    Sql,
    Deal,
    Mql,
    Unqualified,
    Spam,
}

impl LeadQuality {
    pub const ALL: [LeadQuality; 5] = [
        LeadQuality::Sql,
        LeadQuality::Deal,
        LeadQuality::Mql,
        LeadQuality::Unqualified,
        LeadQuality::Spam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadQuality::Sql => "sql",
            LeadQuality::Deal => "deal",
            LeadQuality::Mql => "mql",
            LeadQuality::Unqualified => "unqualified",
            LeadQuality::Spam => "spam",
        }
    }

    /// Labels that count towards the SQL total.
    pub fn is_sql_qualifying(&self) -> bool {
        matches!(self, LeadQuality::Sql | LeadQuality::Deal)
    }
}

impl fmt::Display for LeadQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadQuality {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        LeadQuality::ALL
            .into_iter()
            .find(|q| q.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "lead quality",
                raw: raw.to_string(),
            })
    }
}

/// A lead row as read for aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadRow {
    pub created_at: Option<String>,
    pub utm_content: Option<String>,
    pub kwaliteit: Option<String>,
}

/// A lead joined into the metric aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRecord {
    pub created_at: DateTime<Utc>,
    /// Ad-set attribution key (`utm_content`), if the visitor arrived via an ad.
    pub adset_key: Option<String>,
    /// `None` while the lead has not been rated, or carries an unknown label.
    pub quality: Option<LeadQuality>,
}

impl LeadRecord {
    pub fn parse(row: &LeadRow) -> Result<Self, CoreError> {
        let raw = row
            .created_at
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CoreError::MissingField("created_at"))?;
        Ok(Self {
            created_at: parse_timestamp("created_at", raw)?,
            adset_key: row
                .utm_content
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            quality: row
                .kwaliteit
                .as_deref()
                .and_then(|label| label.parse::<LeadQuality>().ok()),
        })
    }

    pub fn is_sql(&self) -> bool {
        self.quality.is_some_and(|q| q.is_sql_qualifying())
    }
}

/// Accepts RFC 3339 and DuckDB's `CAST(ts AS VARCHAR)` rendering (UTC).
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::InvalidTimestamp {
            field,
            raw: raw.to_string(),
        })
}

/// Body of the landing-page form webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    /// Market of the landing page the form was submitted on, e.g. `nl` or `be`.
    pub market: Option<String>,
    pub language: Option<String>,
    pub landing_page: Option<String>,
    pub message: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    pub market: Option<String>,
    pub language: Option<String>,
    pub landing_page: Option<String>,
    pub message: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
    pub kwaliteit: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLeadQualityRequest {
    /// `null` clears the label.
    pub kwaliteit: Option<LeadQuality>,
}

/// Lead-qualification breakdown shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadQualitySummary {
    pub total_leads: i64,
    pub sql_leads: i64,
    pub mql_leads: i64,
    pub unrated_leads: i64,
    pub by_quality: BTreeMap<LeadQuality, i64>,
    /// SQL leads as a percentage of all leads; 0 when there are none.
    pub sql_rate: f64,
}

impl LeadQualitySummary {
    /// Build the summary from `(kwaliteit, count)` pairs as grouped by the store.
    /// Unknown labels are counted as unrated.
    pub fn from_label_counts(counts: &[(Option<String>, i64)]) -> Self {
        let mut by_quality: BTreeMap<LeadQuality, i64> =
            LeadQuality::ALL.into_iter().map(|q| (q, 0)).collect();
        let mut total_leads = 0;
        let mut unrated_leads = 0;
        for (label, count) in counts {
            total_leads += count;
            match label.as_deref().and_then(|l| l.parse::<LeadQuality>().ok()) {
                Some(quality) => *by_quality.entry(quality).or_default() += count,
                None => unrated_leads += count,
            }
        }
        let sql_leads: i64 = by_quality
            .iter()
            .filter(|(q, _)| q.is_sql_qualifying())
            .map(|(_, c)| c)
            .sum();
        let mql_leads = by_quality.get(&LeadQuality::Mql).copied().unwrap_or(0);
        let sql_rate = if total_leads > 0 {
            sql_leads as f64 / total_leads as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total_leads,
            sql_leads,
            mql_leads,
            unrated_leads,
            by_quality,
            sql_rate,
        }
    }
}
