use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::campaign::CampaignCalendar;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    pub cors_origins: Vec<String>,
    pub campaign_start: NaiveDate,
    pub campaign_timezone: Tz,
    pub campaign_weeks: u32,
    pub performance_window_days: i64,
    pub lead_window_days: i64,
    /// `0` disables the in-process scheduler; evaluations then only run on request.
    pub evaluate_interval_seconds: u64,
}

/// Everything the evaluator needs that used to come from ambient state.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub calendar: CampaignCalendar,
    pub performance_window_days: i64,
    pub lead_window_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("LEADSIGNAL_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("LEADSIGNAL_DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("LEADSIGNAL_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            cors_origins: std::env::var("LEADSIGNAL_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            campaign_start: {
                let raw = std::env::var("LEADSIGNAL_CAMPAIGN_START")
                    .map_err(|_| "LEADSIGNAL_CAMPAIGN_START is required (YYYY-MM-DD)".to_string())?;
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| format!("invalid LEADSIGNAL_CAMPAIGN_START: {e}"))?
            },
            campaign_timezone: std::env::var("LEADSIGNAL_CAMPAIGN_TIMEZONE")
                .unwrap_or_else(|_| "UTC".to_string())
                .trim()
                .parse::<Tz>()
                .map_err(|e| format!("invalid LEADSIGNAL_CAMPAIGN_TIMEZONE: {e}"))?,
            campaign_weeks: std::env::var("LEADSIGNAL_CAMPAIGN_WEEKS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .map(|v| v.max(1))
                .unwrap_or(13),
            performance_window_days: std::env::var("LEADSIGNAL_PERFORMANCE_WINDOW_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .map(|v| v.clamp(1, 90))
                .unwrap_or(7),
            lead_window_days: std::env::var("LEADSIGNAL_LEAD_WINDOW_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .map(|v| v.clamp(1, 365))
                .unwrap_or(28),
            evaluate_interval_seconds: std::env::var("LEADSIGNAL_EVALUATE_INTERVAL_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(|v| if v == 0 { 0 } else { v.clamp(60, 86_400) })
                .unwrap_or(0),
        })
    }

    pub fn evaluator(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            calendar: CampaignCalendar {
                start: self.campaign_start,
                timezone: self.campaign_timezone,
                total_weeks: self.campaign_weeks,
            },
            performance_window_days: self.performance_window_days,
            lead_window_days: self.lead_window_days,
        }
    }

    pub fn evaluate_interval(&self) -> Option<Duration> {
        (self.evaluate_interval_seconds > 0)
            .then(|| Duration::from_secs(self.evaluate_interval_seconds))
    }
}
