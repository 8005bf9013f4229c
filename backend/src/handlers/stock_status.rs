//! HTTP handlers for monthly stock status

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{Period, StockStatusSubmission, StockStatusView};

use crate::error::AppResult;
use crate::services::stock_status::StockStatusOutcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StockStatusQuery {
    pub year: i32,
    pub month: u32,
    pub search: Option<String>,
}

/// Reconciled stock status for a period
pub async fn get_stock_status(
    State(state): State<AppState>,
    Query(query): Query<StockStatusQuery>,
) -> AppResult<Json<Vec<StockStatusView>>> {
    let period = Period::new(query.year, query.month)?;
    let rows = state
        .stock_status_service()
        .load(period, query.search.as_deref())
        .await?;
    Ok(Json(rows))
}

/// Submit adjustments. Responds 207 when some records failed to save.
pub async fn submit_stock_status(
    State(state): State<AppState>,
    Json(submission): Json<StockStatusSubmission>,
) -> AppResult<(StatusCode, Json<StockStatusOutcome>)> {
    let outcome = state
        .stock_status_service()
        .submit(submission.period, submission.edits)
        .await?;

    let status = if outcome.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(outcome)))
}
