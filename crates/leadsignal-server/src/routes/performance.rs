use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use leadsignal_core::performance::{PerformanceInput, PerformanceRecord, PerformanceRow};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{error::AppError, state::AppState};

/// Maximum rows accepted in one JSON batch or CSV upload.
const MAX_IMPORT_ROWS: usize = 10_000;

/// One line of the ads-manager export:
/// `date,campaign_name,adset_name,spent,frequency,clicks`.
#[derive(Debug, Deserialize)]
struct CsvPerformanceRow {
    date: Option<String>,
    campaign_name: Option<String>,
    adset_name: Option<String>,
    spent: Option<String>,
    frequency: Option<String>,
    clicks: Option<String>,
}

impl From<CsvPerformanceRow> for PerformanceRow {
    fn from(row: CsvPerformanceRow) -> Self {
        Self {
            date: row.date,
            campaign_name: row.campaign_name,
            adset_name: row.adset_name,
            spent: row.spent,
            frequency: row.frequency,
            clicks: row.clicks,
        }
    }
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse a CSV export into ingestible rows. Lines that do not parse are
/// counted as skipped and logged.
fn parse_csv(body: &str) -> Result<(Vec<PerformanceInput>, usize), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("invalid CSV header: {e}")))?;
    if !headers.iter().any(|h| h == "adset_name") {
        return Err(AppError::BadRequest(
            "CSV header must include adset_name".to_string(),
        ));
    }

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (idx, result) in reader.deserialize::<CsvPerformanceRow>().enumerate() {
        let line = idx + 2;
        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                PerformanceRecord::parse(&PerformanceRow::from(raw)).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(record) => rows.push(PerformanceInput::from(record)),
            Err(reason) => {
                warn!(line, %reason, "Skipping performance CSV line");
                skipped += 1;
            }
        }
        if rows.len() > MAX_IMPORT_ROWS {
            return Err(AppError::BadRequest(format!(
                "import exceeds maximum of {MAX_IMPORT_ROWS} rows"
            )));
        }
    }
    Ok((rows, skipped))
}

/// `POST /api/performance`: JSON array of daily ad-set rows.
#[tracing::instrument(skip(state, rows))]
pub async fn ingest_performance(
    State(state): State<Arc<AppState>>,
    Json(rows): Json<Vec<PerformanceInput>>,
) -> Result<impl IntoResponse, AppError> {
    if rows.len() > MAX_IMPORT_ROWS {
        return Err(AppError::BadRequest(format!(
            "batch exceeds maximum of {MAX_IMPORT_ROWS} rows"
        )));
    }
    for (idx, row) in rows.iter().enumerate() {
        row.validate()
            .map_err(|msg| AppError::BadRequest(format!("row {idx}: {msg}")))?;
    }
    let inserted = state
        .db
        .insert_performance(&rows)
        .await
        .map_err(AppError::Internal)?;
    info!(inserted, "Performance rows ingested");
    Ok(Json(json!({
        "data": ImportSummary { inserted, skipped: 0 }
    })))
}

/// `POST /api/performance/import`: CSV export from the ads manager.
#[tracing::instrument(skip(state, body))]
pub async fn import_performance_csv(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let (rows, skipped) = parse_csv(&body)?;
    let inserted = state
        .db
        .insert_performance(&rows)
        .await
        .map_err(AppError::Internal)?;
    info!(inserted, skipped, "Performance CSV imported");
    Ok(Json(json!({
        "data": ImportSummary { inserted, skipped }
    })))
}
