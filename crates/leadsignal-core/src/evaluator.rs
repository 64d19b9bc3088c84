//! Decision-trigger evaluation run: read, aggregate, match, de-duplicate, insert.

use std::collections::HashSet;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::alert::{NewAlert, OpenAlertKey};
use crate::config::EvaluatorConfig;
use crate::matcher::{applicable_triggers, match_triggers};
use crate::metrics::aggregate;
use crate::store::DecisionStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub current_week: u32,
    pub triggers_checked: usize,
    pub adsets_analyzed: usize,
    pub new_alerts_created: usize,
}

/// Drop candidates whose (trigger, ad set) pair already has an open alert.
/// Also collapses duplicate candidates within one run.
pub fn filter_new_alerts(candidates: Vec<NewAlert>, open: &[OpenAlertKey]) -> Vec<NewAlert> {
    let mut seen: HashSet<(&str, &str)> = open
        .iter()
        .map(|k| (k.trigger_id.as_str(), k.adset_name.as_str()))
        .collect();
    let mut fresh = Vec::new();
    for candidate in &candidates {
        if seen.insert((candidate.trigger_id.as_str(), candidate.adset_name.as_str())) {
            fresh.push(candidate.clone());
        }
    }
    fresh
}

/// Run one evaluation pass against `store` as of `now`.
///
/// Reads happen in a fixed order and any read error aborts the run. At most
/// one write is issued: a single batched insert of all new alerts.
pub async fn evaluate<S>(
    store: &S,
    config: &EvaluatorConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<EvaluationSummary>
where
    S: DecisionStore + ?Sized,
{
    let current_week = config.calendar.current_week(now);

    let triggers = store
        .list_active_triggers()
        .await
        .context("failed to load decision triggers")?;
    let applicable = applicable_triggers(&triggers, current_week);

    let performance_start = config
        .calendar
        .window_start(now, config.performance_window_days);
    let performance = store
        .performance_since(performance_start)
        .await
        .context("failed to load performance data")?;

    let leads = store
        .leads_since(now - Duration::days(config.lead_window_days))
        .await
        .context("failed to load leads")?;

    let open = store
        .open_alert_keys()
        .await
        .context("failed to load open alerts")?;

    let metrics = aggregate(&performance, &leads, now);
    let candidates = match_triggers(&applicable, &metrics, current_week);
    let candidate_count = candidates.len();
    let new_alerts = filter_new_alerts(candidates, &open);

    let new_alerts_created = if new_alerts.is_empty() {
        0
    } else {
        store
            .insert_alerts(&new_alerts)
            .await
            .context("failed to insert alerts")?
    };

    info!(
        current_week,
        triggers_checked = applicable.len(),
        adsets_analyzed = metrics.len(),
        candidates = candidate_count,
        new_alerts_created,
        "Decision trigger evaluation finished"
    );

    Ok(EvaluationSummary {
        current_week,
        triggers_checked: applicable.len(),
        adsets_analyzed: metrics.len(),
        new_alerts_created,
    })
}
