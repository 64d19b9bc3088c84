use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use leadsignal_core::lead::LeadQualitySummary;
use leadsignal_core::metrics::aggregate;
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, state::AppState};

const MAX_RANGE_DAYS: i64 = 366;

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid {field} format, expected YYYY-MM-DD")))
}

/// `GET /api/dashboard/adsets`: per-ad-set metrics over the evaluator's
/// current windows, as the triggers see them.
#[tracing::instrument(skip(state))]
pub async fn adset_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let evaluator = state.config.evaluator();
    let performance = state
        .db
        .performance_since(
            evaluator
                .calendar
                .window_start(now, evaluator.performance_window_days),
        )
        .await
        .map_err(AppError::Internal)?;
    let leads = state
        .db
        .leads_since(now - Duration::days(evaluator.lead_window_days))
        .await
        .map_err(AppError::Internal)?;
    let adsets = aggregate(&performance, &leads, now);
    Ok(Json(json!({
        "data": {
            "current_week": evaluator.calendar.current_week(now),
            "adsets": adsets,
        }
    })))
}

/// `GET /api/dashboard/lead-quality`: label breakdown for leads created in
/// the range. Defaults to the lead window ending today.
#[tracing::instrument(skip(state))]
pub async fn lead_quality(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let end = match q.end_date.as_deref() {
        Some(raw) => parse_date("end_date", raw)?,
        None => today,
    };
    let start = match q.start_date.as_deref() {
        Some(raw) => parse_date("start_date", raw)?,
        None => end - Duration::days(state.config.lead_window_days),
    };
    if end < start {
        return Err(AppError::BadRequest(
            "end_date must be on or after start_date".to_string(),
        ));
    }
    let range_days = (end - start).num_days() + 1;
    if range_days > MAX_RANGE_DAYS {
        return Err(AppError::BadRequest(format!(
            "date range too large: {range_days} days (max {MAX_RANGE_DAYS})"
        )));
    }

    let counts = state
        .db
        .lead_quality_counts(start, end)
        .await
        .map_err(AppError::Internal)?;
    let summary = LeadQualitySummary::from_label_counts(&counts);
    Ok(Json(json!({
        "data": {
            "start_date": start,
            "end_date": end,
            "summary": summary,
        }
    })))
}
