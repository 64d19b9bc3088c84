use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use leadsignal_core::evaluator::{evaluate, EvaluationSummary};
use serde::Serialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: EvaluationSummary,
}

/// `GET|POST /api/decision-triggers/evaluate`: run one evaluation pass.
///
/// The request body is ignored. On success:
/// ```json
/// { "success": true, "currentWeek": 3, "triggersChecked": 4,
///   "adsetsAnalyzed": 12, "newAlertsCreated": 1 }
/// ```
/// Any read or write failure returns `500 { "error": "<message>" }`.
/// `OPTIONS` is answered by the permissive CORS layer in [`crate::app`].
#[tracing::instrument(skip(state))]
pub async fn evaluate_triggers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let summary = evaluate(state.db.as_ref(), &state.config.evaluator(), Utc::now())
        .await
        .map_err(AppError::Evaluation)?;
    Ok(Json(EvaluateResponse {
        success: true,
        summary,
    }))
}
