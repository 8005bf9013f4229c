//! HTTP handlers for raw materials and processes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{Process, RawMaterial};

use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MaterialQuery {
    pub search: Option<String>,
}

/// List raw materials ordered by name
pub async fn list_raw_materials(
    State(state): State<AppState>,
    Query(query): Query<MaterialQuery>,
) -> AppResult<Json<Vec<RawMaterial>>> {
    let materials = state
        .catalog_service()
        .raw_materials(query.search.as_deref())
        .await?;
    Ok(Json(materials))
}

/// List processes ordered by name
pub async fn list_processes(State(state): State<AppState>) -> AppResult<Json<Vec<Process>>> {
    let processes = state.catalog_service().processes().await?;
    Ok(Json(processes))
}
