//! HTTP handlers for stock purchases

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{NewStockPurchase, PurchaseFilter, StockPurchase};
use uuid::Uuid;

use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PurchaseQuery {
    pub raw_material_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Matches the vendor name
    pub search: Option<String>,
}

/// List purchases ordered by date
pub async fn list_purchases(
    State(state): State<AppState>,
    Query(query): Query<PurchaseQuery>,
) -> AppResult<Json<Vec<StockPurchase>>> {
    let filter = PurchaseFilter {
        raw_material_id: query.raw_material_id,
        from: query.from,
        to: query.to,
    };
    let purchases = state
        .purchase_service()
        .list(filter, query.search.as_deref())
        .await?;
    Ok(Json(purchases))
}

/// Record a new purchase
pub async fn record_purchase(
    State(state): State<AppState>,
    Json(input): Json<NewStockPurchase>,
) -> AppResult<(StatusCode, Json<StockPurchase>)> {
    let purchase = state.purchase_service().record(input).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}
