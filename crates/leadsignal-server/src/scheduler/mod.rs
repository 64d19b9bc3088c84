use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use leadsignal_core::evaluator::{evaluate, EvaluationSummary};
use tracing::{error, info};

use crate::state::AppState;

pub async fn process_once(state: &Arc<AppState>) -> anyhow::Result<EvaluationSummary> {
    evaluate(state.db.as_ref(), &state.config.evaluator(), Utc::now()).await
}

/// Run the evaluator every `period` until the task is dropped.
///
/// Runs are sequential: a slow evaluation delays the next tick instead of
/// overlapping it.
pub async fn run_scheduler_loop(state: Arc<AppState>, period: Duration) {
    info!(
        interval_seconds = period.as_secs(),
        "Decision trigger scheduler started"
    );
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match process_once(&state).await {
            Ok(summary) => info!(
                current_week = summary.current_week,
                new_alerts_created = summary.new_alerts_created,
                "Scheduled evaluation finished"
            ),
            Err(err) => error!(error = %format!("{err:#}"), "scheduled evaluation failed"),
        }
    }
}
