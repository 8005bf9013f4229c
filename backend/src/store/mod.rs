//! Persistence port for the external ledger store
//!
//! Services only talk to [`LedgerStore`]; the Postgres adapter backs the
//! hosted database and the memory adapter backs demos and tests.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    Period, Process, ProductionStatusRecord, ProductionStatusWrite, PurchaseFilter, RawMaterial,
    StockPurchase, StockStatusRecord, StockStatusWrite, ValidPurchase,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Read/filter/insert/upsert access to the ledger tables
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Raw materials ordered by name
    async fn list_raw_materials(&self) -> AppResult<Vec<RawMaterial>>;

    async fn get_raw_material(&self, id: Uuid) -> AppResult<Option<RawMaterial>>;

    /// Processes ordered by name
    async fn list_processes(&self) -> AppResult<Vec<Process>>;

    /// Purchases matching the filter, ordered by date ascending
    async fn list_purchases(&self, filter: &PurchaseFilter) -> AppResult<Vec<StockPurchase>>;

    async fn insert_purchase(&self, purchase: &ValidPurchase) -> AppResult<StockPurchase>;

    async fn list_stock_status(&self, period: Period) -> AppResult<Vec<StockStatusRecord>>;

    /// Insert or update the row keyed by (material, period)
    async fn upsert_stock_status(&self, write: &StockStatusWrite) -> AppResult<StockStatusRecord>;

    async fn list_production_status(&self, period: Period)
        -> AppResult<Vec<ProductionStatusRecord>>;

    /// Insert or update the row keyed by (material, process, period)
    async fn upsert_production_status(
        &self,
        write: &ProductionStatusWrite,
    ) -> AppResult<ProductionStatusRecord>;

    /// Connectivity check
    async fn ping(&self) -> AppResult<()>;
}

/// Shared handle used by services
pub type DynLedgerStore = Arc<dyn LedgerStore>;

/// Bounds every call on the wrapped store with a timeout
pub struct TimeoutStore {
    inner: DynLedgerStore,
    timeout: Duration,
}

impl TimeoutStore {
    pub fn new(inner: DynLedgerStore, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, F>(&self, call: F) -> AppResult<T>
    where
        F: std::future::Future<Output = AppResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Store call exceeded {:?}", self.timeout);
                Err(AppError::StoreTimeout(self.timeout.as_secs()))
            }
        }
    }
}

#[async_trait]
impl LedgerStore for TimeoutStore {
    async fn list_raw_materials(&self) -> AppResult<Vec<RawMaterial>> {
        self.bounded(self.inner.list_raw_materials()).await
    }

    async fn get_raw_material(&self, id: Uuid) -> AppResult<Option<RawMaterial>> {
        self.bounded(self.inner.get_raw_material(id)).await
    }

    async fn list_processes(&self) -> AppResult<Vec<Process>> {
        self.bounded(self.inner.list_processes()).await
    }

    async fn list_purchases(&self, filter: &PurchaseFilter) -> AppResult<Vec<StockPurchase>> {
        self.bounded(self.inner.list_purchases(filter)).await
    }

    async fn insert_purchase(&self, purchase: &ValidPurchase) -> AppResult<StockPurchase> {
        self.bounded(self.inner.insert_purchase(purchase)).await
    }

    async fn list_stock_status(&self, period: Period) -> AppResult<Vec<StockStatusRecord>> {
        self.bounded(self.inner.list_stock_status(period)).await
    }

    async fn upsert_stock_status(&self, write: &StockStatusWrite) -> AppResult<StockStatusRecord> {
        self.bounded(self.inner.upsert_stock_status(write)).await
    }

    async fn list_production_status(
        &self,
        period: Period,
    ) -> AppResult<Vec<ProductionStatusRecord>> {
        self.bounded(self.inner.list_production_status(period)).await
    }

    async fn upsert_production_status(
        &self,
        write: &ProductionStatusWrite,
    ) -> AppResult<ProductionStatusRecord> {
        self.bounded(self.inner.upsert_production_status(write)).await
    }

    async fn ping(&self) -> AppResult<()> {
        self.bounded(self.inner.ping()).await
    }
}
