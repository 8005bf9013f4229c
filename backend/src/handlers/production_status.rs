//! HTTP handlers for monthly production status

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{Period, ProductionStatusSubmission, ProductionStatusView};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::production_status::ProductionStatusOutcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductionStatusQuery {
    pub year: i32,
    pub month: u32,
    /// Omit for all processes
    pub process_id: Option<Uuid>,
    pub search: Option<String>,
}

/// Reconciled production status for a period
pub async fn get_production_status(
    State(state): State<AppState>,
    Query(query): Query<ProductionStatusQuery>,
) -> AppResult<Json<Vec<ProductionStatusView>>> {
    let period = Period::new(query.year, query.month)?;
    let rows = state
        .production_status_service()
        .load(period, query.process_id, query.search.as_deref())
        .await?;
    Ok(Json(rows))
}

/// Submit adjustments and activity. Responds 207 when some records failed.
pub async fn submit_production_status(
    State(state): State<AppState>,
    Json(submission): Json<ProductionStatusSubmission>,
) -> AppResult<(StatusCode, Json<ProductionStatusOutcome>)> {
    let outcome = state
        .production_status_service()
        .submit(submission.period, submission.edits)
        .await?;

    let status = if outcome.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(outcome)))
}
