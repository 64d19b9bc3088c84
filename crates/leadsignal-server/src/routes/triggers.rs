use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use leadsignal_core::trigger::{CreateTriggerRequest, UpdateTriggerRequest};
use serde_json::json;

use crate::{error::AppError, state::AppState};

const MAX_TRIGGER_NAME_LEN: usize = 100;

fn validate_name(name: &str) -> Result<(), AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("trigger_name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_TRIGGER_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "trigger_name must be at most {MAX_TRIGGER_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_pattern(pattern: &str) -> Result<(), AppError> {
    if pattern.trim().is_empty() {
        return Err(AppError::BadRequest("adset_pattern is required".to_string()));
    }
    Ok(())
}

fn validate_threshold(threshold: Option<f64>) -> Result<(), AppError> {
    match threshold {
        Some(value) if !value.is_finite() => Err(AppError::BadRequest(
            "threshold_value must be a finite number".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_week(week: Option<u32>, total_weeks: u32) -> Result<(), AppError> {
    match week {
        Some(w) if w < 1 || w > total_weeks => Err(AppError::BadRequest(format!(
            "evaluation_week must be between 1 and {total_weeks}"
        ))),
        _ => Ok(()),
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_triggers(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.db.list_triggers().await.map_err(AppError::Internal)?;
    Ok(Json(json!({ "data": data })))
}

#[tracing::instrument(skip(state))]
pub async fn get_trigger(
    State(state): State<Arc<AppState>>,
    Path(trigger_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match state
        .db
        .get_trigger(&trigger_id)
        .await
        .map_err(AppError::Internal)?
    {
        Some(data) => Ok(Json(json!({ "data": data }))),
        None => Err(AppError::NotFound("Trigger not found".to_string())),
    }
}

#[tracing::instrument(skip(state, req))]
pub async fn create_trigger(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTriggerRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_name(&req.trigger_name)?;
    validate_pattern(&req.adset_pattern)?;
    validate_threshold(req.threshold_value)?;
    validate_week(req.evaluation_week, state.config.campaign_weeks)?;
    let data = state
        .db
        .create_trigger(req)
        .await
        .map_err(AppError::Internal)?;
    tracing::info!(trigger_id = %data.id, "Decision trigger created");
    Ok((StatusCode::CREATED, Json(json!({ "data": data }))))
}

#[tracing::instrument(skip(state, req))]
pub async fn update_trigger(
    State(state): State<Arc<AppState>>,
    Path(trigger_id): Path<String>,
    Json(req): Json<UpdateTriggerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(ref name) = req.trigger_name {
        validate_name(name)?;
    }
    if let Some(ref pattern) = req.adset_pattern {
        validate_pattern(pattern)?;
    }
    if let Some(threshold) = req.threshold_value {
        validate_threshold(threshold)?;
    }
    if let Some(week) = req.evaluation_week {
        validate_week(week, state.config.campaign_weeks)?;
    }
    match state
        .db
        .update_trigger(&trigger_id, req)
        .await
        .map_err(AppError::Internal)?
    {
        Some(data) => Ok(Json(json!({ "data": data }))),
        None => Err(AppError::NotFound("Trigger not found".to_string())),
    }
}

#[tracing::instrument(skip(state))]
pub async fn delete_trigger(
    State(state): State<Arc<AppState>>,
    Path(trigger_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state
        .db
        .delete_trigger(&trigger_id)
        .await
        .map_err(AppError::Internal)?;
    if !deleted {
        return Err(AppError::NotFound("Trigger not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
