//! Per-ad-set rolling metrics built from the performance and lead windows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::lead::{LeadRecord, LeadRow};
use crate::performance::{PerformanceRecord, PerformanceRow};
use crate::trigger::Metric;

/// Reported when an ad set has never had an attributed lead in the window.
pub const NO_LEAD_SENTINEL_DAYS: i64 = 999;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdsetMetrics {
    pub adset_name: String,
    pub spent: f64,
    /// Running average of daily frequencies; see [`aggregate`].
    pub frequency: f64,
    pub clicks: u64,
    pub leads: u64,
    pub sqls: u64,
    pub cpl: f64,
    pub cpc: f64,
    pub cpsql: f64,
    pub conversion_rate: f64,
    pub days_without_lead: i64,
    pub last_lead_at: Option<DateTime<Utc>>,
}

impl AdsetMetrics {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cpl => self.cpl,
            Metric::Frequency => self.frequency,
            Metric::Cpc => self.cpc,
            Metric::DaysWithoutLead => self.days_without_lead as f64,
            Metric::ConversionRate => self.conversion_rate,
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    spent: f64,
    frequency: Option<f64>,
    clicks: u64,
    leads: u64,
    sqls: u64,
    last_lead_at: Option<DateTime<Utc>>,
}

fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Aggregate raw rows into one [`AdsetMetrics`] per ad set seen in `performance`.
///
/// Frequency is averaged incrementally: each day's value is averaged with the
/// running value, so row order affects the result. Rows that fail to parse
/// are logged and skipped. Leads whose attribution key matches no ad set in
/// the performance window are ignored.
pub fn aggregate(
    performance: &[PerformanceRow],
    leads: &[LeadRow],
    now: DateTime<Utc>,
) -> Vec<AdsetMetrics> {
    let mut by_adset: BTreeMap<String, Accumulator> = BTreeMap::new();

    for row in performance {
        let record = match PerformanceRecord::parse(row) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, adset_name = ?row.adset_name, "Skipping malformed performance row");
                continue;
            }
        };
        let acc = by_adset.entry(record.adset_name).or_default();
        acc.spent += record.spent;
        acc.clicks += record.clicks;
        acc.frequency = Some(match acc.frequency {
            None => record.frequency,
            Some(running) => (running + record.frequency) / 2.0,
        });
    }

    for row in leads {
        let lead = match LeadRecord::parse(row) {
            Ok(lead) => lead,
            Err(e) => {
                warn!(error = %e, utm_content = ?row.utm_content, "Skipping malformed lead row");
                continue;
            }
        };
        let Some(acc) = lead
            .adset_key
            .as_deref()
            .and_then(|key| by_adset.get_mut(key))
        else {
            continue;
        };
        acc.leads += 1;
        if lead.is_sql() {
            acc.sqls += 1;
        }
        if acc.last_lead_at.is_none_or(|last| lead.created_at > last) {
            acc.last_lead_at = Some(lead.created_at);
        }
    }

    by_adset
        .into_iter()
        .map(|(adset_name, acc)| AdsetMetrics {
            adset_name,
            spent: acc.spent,
            frequency: acc.frequency.unwrap_or(0.0),
            clicks: acc.clicks,
            leads: acc.leads,
            sqls: acc.sqls,
            cpl: ratio(acc.spent, acc.leads),
            cpc: ratio(acc.spent, acc.clicks),
            cpsql: ratio(acc.spent, acc.sqls),
            conversion_rate: ratio(acc.sqls as f64 * 100.0, acc.leads),
            days_without_lead: acc
                .last_lead_at
                .map(|last| (now - last).num_days().max(0))
                .unwrap_or(NO_LEAD_SENTINEL_DAYS),
            last_lead_at: acc.last_lead_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn perf(adset: &str, spent: &str, frequency: &str, clicks: &str) -> PerformanceRow {
        PerformanceRow {
            date: Some("2026-03-02".to_string()),
            campaign_name: Some("spring_launch".to_string()),
            adset_name: Some(adset.to_string()),
            spent: Some(spent.to_string()),
            frequency: Some(frequency.to_string()),
            clicks: Some(clicks.to_string()),
        }
    }

    fn lead(adset: Option<&str>, quality: Option<&str>, at: DateTime<Utc>) -> LeadRow {
        LeadRow {
            created_at: Some(at.to_rfc3339()),
            utm_content: adset.map(str::to_string),
            kwaliteit: quality.map(str::to_string),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-09T10:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    fn by_name<'a>(metrics: &'a [AdsetMetrics], name: &str) -> &'a AdsetMetrics {
        metrics
            .iter()
            .find(|m| m.adset_name == name)
            .expect("adset present")
    }

    #[test]
    fn cpl_and_conversion_rate_for_scenario_adset() {
        let performance = vec![perf("A", "60", "1.0", "30"), perf("A", "40", "2.0", "20")];
        let leads = vec![
            lead(Some("A"), Some("sql"), now() - Duration::days(1)),
            lead(Some("A"), Some("mql"), now() - Duration::days(2)),
            lead(Some("A"), None, now() - Duration::days(3)),
            lead(Some("A"), Some("spam"), now() - Duration::days(4)),
        ];
        let metrics = aggregate(&performance, &leads, now());
        let a = by_name(&metrics, "A");
        assert_eq!(a.spent, 100.0);
        assert_eq!(a.clicks, 50);
        assert_eq!(a.leads, 4);
        assert_eq!(a.sqls, 1);
        assert_eq!(a.cpl, 25.0);
        assert_eq!(a.cpc, 2.0);
        assert_eq!(a.cpsql, 100.0);
        assert_eq!(a.conversion_rate, 25.0);
        assert_eq!(a.days_without_lead, 1);
        assert_eq!(a.value(Metric::ConversionRate), 25.0);
    }

    #[test]
    fn zero_leads_and_zero_clicks_give_zero_ratios() {
        let metrics = aggregate(&[perf("quiet", "80", "1.2", "0")], &[], now());
        let quiet = by_name(&metrics, "quiet");
        assert_eq!(quiet.cpl, 0.0);
        assert_eq!(quiet.cpc, 0.0);
        assert_eq!(quiet.conversion_rate, 0.0);
        assert!(quiet.cpl.is_finite() && quiet.cpc.is_finite());
    }

    #[test]
    fn days_without_lead_defaults_to_sentinel() {
        let leads = vec![lead(Some("other"), Some("sql"), now())];
        let metrics = aggregate(&[perf("quiet", "10", "1", "3")], &leads, now());
        assert_eq!(by_name(&metrics, "quiet").days_without_lead, 999);
        assert_eq!(by_name(&metrics, "quiet").last_lead_at, None);
    }

    #[test]
    fn frequency_is_a_running_average() {
        // ((1 + 2) / 2 + 4) / 2 = 2.75, not the mean 2.333...
        let performance = vec![
            perf("A", "1", "1", "1"),
            perf("A", "1", "2", "1"),
            perf("A", "1", "4", "1"),
        ];
        let metrics = aggregate(&performance, &[], now());
        assert_eq!(by_name(&metrics, "A").frequency, 2.75);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let performance = vec![
            perf("A", "10", "1", "5"),
            perf("A", "ten", "1", "5"),
            PerformanceRow::default(),
        ];
        let leads = vec![
            lead(Some("A"), Some("sql"), now()),
            LeadRow {
                created_at: Some("not a date".to_string()),
                utm_content: Some("A".to_string()),
                kwaliteit: None,
            },
        ];
        let metrics = aggregate(&performance, &leads, now());
        assert_eq!(metrics.len(), 1);
        let a = by_name(&metrics, "A");
        assert_eq!(a.spent, 10.0);
        assert_eq!(a.leads, 1);
    }

    #[test]
    fn one_entry_per_performance_adset_only() {
        let performance = vec![perf("A", "1", "1", "1"), perf("B", "1", "1", "1")];
        let leads = vec![
            lead(Some("C"), None, now()),
            lead(None, Some("sql"), now()),
        ];
        let metrics = aggregate(&performance, &leads, now());
        let names: Vec<_> = metrics.iter().map(|m| m.adset_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(metrics.iter().all(|m| m.leads == 0));
    }

    #[test]
    fn most_recent_lead_wins_regardless_of_order() {
        let leads = vec![
            lead(Some("A"), None, now() - Duration::days(5)),
            lead(Some("A"), None, now() - Duration::hours(50)),
            lead(Some("A"), None, now() - Duration::days(9)),
        ];
        let metrics = aggregate(&[perf("A", "1", "1", "1")], &leads, now());
        assert_eq!(by_name(&metrics, "A").days_without_lead, 2);
    }
}
