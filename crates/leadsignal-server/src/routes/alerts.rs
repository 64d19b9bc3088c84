use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use leadsignal_core::alert::{AlertStatus, AlertTransition};
use leadsignal_duckdb::TransitionOutcome;
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AlertListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[tracing::instrument(skip(state))]
pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AlertListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = q
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<AlertStatus>())
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let data = state
        .db
        .list_alerts(status, q.limit.unwrap_or(100))
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(json!({ "data": data })))
}

async fn transition(
    state: &AppState,
    alert_id: &str,
    transition: AlertTransition,
) -> Result<Json<serde_json::Value>, AppError> {
    match state
        .db
        .transition_alert(alert_id, transition)
        .await
        .map_err(AppError::Internal)?
    {
        TransitionOutcome::Applied(data) => {
            tracing::info!(alert_id, status = data.status.as_str(), "Alert updated");
            Ok(Json(json!({ "data": data })))
        }
        TransitionOutcome::NotFound => Err(AppError::NotFound("Alert not found".to_string())),
        TransitionOutcome::Rejected(current) => Err(AppError::Conflict(format!(
            "alert is {} and cannot move to {}",
            current.as_str(),
            transition.target().as_str()
        ))),
    }
}

/// `POST /api/alerts/{id}/acknowledge`: open → acknowledged.
#[tracing::instrument(skip(state))]
pub async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    transition(&state, &alert_id, AlertTransition::Acknowledge).await
}

/// `POST /api/alerts/{id}/resolve`: open or acknowledged → resolved.
#[tracing::instrument(skip(state))]
pub async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    transition(&state, &alert_id, AlertTransition::Resolve).await
}
