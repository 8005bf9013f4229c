//! Period helpers

use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};
use shared::Period;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodResponse {
    pub period: Period,
    pub label: String,
}

/// The period whose closing balances open the requested one
pub async fn get_previous_period(
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PeriodResponse>> {
    let previous = Period::new(query.year, query.month)?
        .previous()
        .ok_or_else(|| AppError::validation("period", "The period has no previous period"))?;
    Ok(Json(PeriodResponse {
        period: previous,
        label: previous.label(),
    }))
}
