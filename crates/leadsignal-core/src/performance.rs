//! Daily ad-set performance rows from the ads-manager feed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A performance row exactly as the feed stored it.
///
/// Numeric columns are text: the feed writes whatever the ads manager
/// exported, so parsing happens per row in [`PerformanceRecord::parse`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceRow {
    pub date: Option<String>,
    pub campaign_name: Option<String>,
    pub adset_name: Option<String>,
    pub spent: Option<String>,
    pub frequency: Option<String>,
    pub clicks: Option<String>,
}

/// A validated performance row for one (campaign, ad set, day).
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub date: NaiveDate,
    pub campaign_name: Option<String>,
    pub adset_name: String,
    pub spent: f64,
    pub frequency: f64,
    pub clicks: u64,
}

/// Ingestion payload for `POST /api/performance` and the CSV importer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceInput {
    pub date: NaiveDate,
    #[serde(default)]
    pub campaign_name: Option<String>,
    pub adset_name: String,
    pub spent: f64,
    pub frequency: f64,
    pub clicks: u64,
}

impl PerformanceInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.adset_name.trim().is_empty() {
            return Err("adset_name must not be empty".to_string());
        }
        if !self.spent.is_finite() || self.spent < 0.0 {
            return Err("spent must be a non-negative number".to_string());
        }
        if !self.frequency.is_finite() || self.frequency < 0.0 {
            return Err("frequency must be a non-negative number".to_string());
        }
        Ok(())
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a feed number. An absent value counts as zero; a present value that
/// does not parse to a finite, non-negative number is an error.
pub(crate) fn parse_amount(field: &'static str, raw: Option<&str>) -> Result<f64, CoreError> {
    let Some(raw) = non_empty(raw) else {
        return Ok(0.0);
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(CoreError::InvalidNumber {
            field,
            raw: raw.to_string(),
        }),
    }
}

fn parse_count(field: &'static str, raw: Option<&str>) -> Result<u64, CoreError> {
    let value = parse_amount(field, raw)?;
    if value.fract() != 0.0 {
        return Err(CoreError::InvalidNumber {
            field,
            raw: raw.unwrap_or_default().to_string(),
        });
    }
    Ok(value as u64)
}

impl PerformanceRecord {
    pub fn parse(row: &PerformanceRow) -> Result<Self, CoreError> {
        let adset_name = non_empty(row.adset_name.as_deref())
            .ok_or(CoreError::MissingField("adset_name"))?
            .to_string();
        let raw_date = non_empty(row.date.as_deref()).ok_or(CoreError::MissingField("date"))?;
        // The feed sometimes writes full timestamps; only the day matters.
        let date = NaiveDate::parse_from_str(raw_date.get(..10).unwrap_or(raw_date), "%Y-%m-%d")
            .map_err(|_| CoreError::InvalidTimestamp {
                field: "date",
                raw: raw_date.to_string(),
            })?;
        Ok(Self {
            date,
            campaign_name: non_empty(row.campaign_name.as_deref()).map(str::to_string),
            adset_name,
            spent: parse_amount("spent", row.spent.as_deref())?,
            frequency: parse_amount("frequency", row.frequency.as_deref())?,
            clicks: parse_count("clicks", row.clicks.as_deref())?,
        })
    }
}

impl From<PerformanceRecord> for PerformanceInput {
    fn from(record: PerformanceRecord) -> Self {
        Self {
            date: record.date,
            campaign_name: record.campaign_name,
            adset_name: record.adset_name,
            spent: record.spent,
            frequency: record.frequency,
            clicks: record.clicks,
        }
    }
}
