//! Route definitions for the Inventory Reconciliation platform

use axum::{routing::get, Router};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Read-only catalog
        .route("/materials", get(handlers::list_raw_materials))
        .route("/processes", get(handlers::list_processes))
        // Stock purchases
        .route(
            "/purchases",
            get(handlers::list_purchases).post(handlers::record_purchase),
        )
        // Monthly reconciliation
        .route(
            "/stock-status",
            get(handlers::get_stock_status).post(handlers::submit_stock_status),
        )
        .route(
            "/production-status",
            get(handlers::get_production_status).post(handlers::submit_production_status),
        )
        .route("/periods/previous", get(handlers::get_previous_period))
}
