use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use leadsignal_core::lead::{LeadSubmission, UpdateLeadQualityRequest};
use serde_json::json;

use crate::{error::AppError, state::AppState};

fn validate_submission(submission: &LeadSubmission) -> Result<(), AppError> {
    if submission.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    let email = submission.email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::BadRequest("invalid email".to_string()));
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') {
        return Err(AppError::BadRequest("invalid email".to_string()));
    }
    Ok(())
}

/// `POST /api/leads`: landing-page form webhook.
#[tracing::instrument(skip(state, submission))]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<LeadSubmission>,
) -> Result<impl IntoResponse, AppError> {
    validate_submission(&submission)?;
    let data = state
        .db
        .insert_lead(submission, Utc::now())
        .await
        .map_err(AppError::Internal)?;
    tracing::info!(
        lead_id = %data.id,
        utm_content = data.utm_content.as_deref().unwrap_or(""),
        "Lead stored"
    );
    Ok((StatusCode::CREATED, Json(json!({ "data": data }))))
}

/// `PUT /api/leads/{id}/quality`: set or clear the `kwaliteit` label.
#[tracing::instrument(skip(state))]
pub async fn update_lead_quality(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<String>,
    Json(req): Json<UpdateLeadQualityRequest>,
) -> Result<impl IntoResponse, AppError> {
    match state
        .db
        .set_lead_quality(&lead_id, req.kwaliteit)
        .await
        .map_err(AppError::Internal)?
    {
        Some(data) => Ok(Json(json!({ "data": data }))),
        None => Err(AppError::NotFound("Lead not found".to_string())),
    }
}
