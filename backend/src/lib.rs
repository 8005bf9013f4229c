//! Inventory Reconciliation Platform - Backend
//!
//! Tracks raw material purchases and reconciles monthly stock and production
//! balances against a hosted Postgres database.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use shared::LevelPolicy;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use services::{
    CatalogService, NoUtilization, ProductionStatusService, PurchaseService, StockStatusService,
    UtilizationSource,
};
use store::{DynLedgerStore, TimeoutStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: DynLedgerStore,
    pub utilization: Arc<dyn UtilizationSource>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wrap the store with the configured per-call timeout
    pub fn new(store: DynLedgerStore, config: Config) -> Self {
        let timeout = Duration::from_secs(config.store.request_timeout_secs);
        Self {
            store: Arc::new(TimeoutStore::new(store, timeout)),
            utilization: Arc::new(NoUtilization),
            config: Arc::new(config),
        }
    }

    pub fn with_utilization(mut self, utilization: Arc<dyn UtilizationSource>) -> Self {
        self.utilization = utilization;
        self
    }

    pub fn level_policy(&self) -> LevelPolicy {
        LevelPolicy::from_enabled(self.config.reconciliation.classify_stock_levels)
    }

    pub fn catalog_service(&self) -> CatalogService {
        CatalogService::new(self.store.clone())
    }

    pub fn purchase_service(&self) -> PurchaseService {
        PurchaseService::new(self.store.clone())
    }

    pub fn stock_status_service(&self) -> StockStatusService {
        StockStatusService::new(
            self.store.clone(),
            self.utilization.clone(),
            self.level_policy(),
        )
    }

    pub fn production_status_service(&self) -> ProductionStatusService {
        ProductionStatusService::new(self.store.clone(), self.level_policy())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Inventory Reconciliation API v1.0"
}

/// Liveness endpoint
async fn health_check() -> &'static str {
    "OK"
}
