//! In-process ledger store
//!
//! Keeps every table in memory behind a mutex. Writes for chosen keys can be
//! made to fail, which exercises partial-batch handling end to end.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    Period, Process, ProductionStatusRecord, ProductionStatusWrite, PurchaseFilter, RawMaterial,
    StockPurchase, StockStatusRecord, StockStatusWrite, ValidPurchase,
};
use uuid::Uuid;

use super::LedgerStore;
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    raw_materials: Vec<RawMaterial>,
    processes: Vec<Process>,
    purchases: Vec<StockPurchase>,
    stock_status: HashMap<(Uuid, Period), StockStatusRecord>,
    production_status: HashMap<(Uuid, Uuid, Period), ProductionStatusRecord>,
    failing_stock_writes: HashSet<Uuid>,
    failing_production_writes: HashSet<(Uuid, Uuid)>,
    unavailable: bool,
}

/// Ledger store held entirely in memory
#[derive(Default)]
pub struct MemoryLedgerStore {
    tables: Mutex<Tables>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))?;
        if tables.unavailable {
            return Err(AppError::StorageError("store unavailable".to_string()));
        }
        Ok(tables)
    }

    fn tables_unchecked(&self) -> MutexGuard<'_, Tables> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn add_raw_material(&self, material: RawMaterial) {
        self.tables_unchecked().raw_materials.push(material);
    }

    pub fn add_process(&self, process: Process) {
        self.tables_unchecked().processes.push(process);
    }

    /// Make every stock status write for this material fail
    pub fn fail_stock_status_writes_for(&self, raw_material_id: Uuid) {
        self.tables_unchecked()
            .failing_stock_writes
            .insert(raw_material_id);
    }

    /// Make every production status write for this key fail
    pub fn fail_production_status_writes_for(&self, raw_material_id: Uuid, process_id: Uuid) {
        self.tables_unchecked()
            .failing_production_writes
            .insert((raw_material_id, process_id));
    }

    /// Simulate the whole store going away
    pub fn set_unavailable(&self, unavailable: bool) {
        self.tables_unchecked().unavailable = unavailable;
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn list_raw_materials(&self) -> AppResult<Vec<RawMaterial>> {
        let mut materials = self.tables()?.raw_materials.clone();
        materials.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(materials)
    }

    async fn get_raw_material(&self, id: Uuid) -> AppResult<Option<RawMaterial>> {
        Ok(self
            .tables()?
            .raw_materials
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn list_processes(&self) -> AppResult<Vec<Process>> {
        let mut processes = self.tables()?.processes.clone();
        processes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(processes)
    }

    async fn list_purchases(&self, filter: &PurchaseFilter) -> AppResult<Vec<StockPurchase>> {
        let mut purchases: Vec<StockPurchase> = self
            .tables()?
            .purchases
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        // Stable sort keeps insertion order within a day
        purchases.sort_by_key(|p| p.purchase_date);
        Ok(purchases)
    }

    async fn insert_purchase(&self, purchase: &ValidPurchase) -> AppResult<StockPurchase> {
        let record = StockPurchase {
            id: Uuid::new_v4(),
            vendor: purchase.vendor.clone(),
            raw_material_id: purchase.raw_material_id,
            quantity: purchase.quantity,
            purchase_date: purchase.purchase_date,
        };
        self.tables()?.purchases.push(record.clone());
        Ok(record)
    }

    async fn list_stock_status(&self, period: Period) -> AppResult<Vec<StockStatusRecord>> {
        Ok(self
            .tables()?
            .stock_status
            .values()
            .filter(|r| r.period == period)
            .cloned()
            .collect())
    }

    async fn upsert_stock_status(&self, write: &StockStatusWrite) -> AppResult<StockStatusRecord> {
        let mut tables = self.tables()?;
        if tables.failing_stock_writes.contains(&write.raw_material_id) {
            return Err(AppError::StorageError(format!(
                "write rejected for material {}",
                write.raw_material_id
            )));
        }

        let key = (write.raw_material_id, write.period);
        let id = tables
            .stock_status
            .get(&key)
            .map(|r| r.id)
            .unwrap_or_else(Uuid::new_v4);
        let record = StockStatusRecord {
            id,
            raw_material_id: write.raw_material_id,
            period: write.period,
            opening_balance: write.opening_balance,
            opening_overridden: write.opening_overridden,
            purchases: write.purchases,
            utilized: write.utilized,
            adjustment: write.adjustment,
            closing_balance: write.closing_balance,
            min_level: write.min_level,
            updated_at: Utc::now(),
        };
        tables.stock_status.insert(key, record.clone());
        Ok(record)
    }

    async fn list_production_status(
        &self,
        period: Period,
    ) -> AppResult<Vec<ProductionStatusRecord>> {
        Ok(self
            .tables()?
            .production_status
            .values()
            .filter(|r| r.period == period)
            .cloned()
            .collect())
    }

    async fn upsert_production_status(
        &self,
        write: &ProductionStatusWrite,
    ) -> AppResult<ProductionStatusRecord> {
        let mut tables = self.tables()?;
        if tables
            .failing_production_writes
            .contains(&(write.raw_material_id, write.process_id))
        {
            return Err(AppError::StorageError(format!(
                "write rejected for material {} in process {}",
                write.raw_material_id, write.process_id
            )));
        }

        let key = (write.raw_material_id, write.process_id, write.period);
        let id = tables
            .production_status
            .get(&key)
            .map(|r| r.id)
            .unwrap_or_else(Uuid::new_v4);
        let record = ProductionStatusRecord {
            id,
            raw_material_id: write.raw_material_id,
            process_id: write.process_id,
            period: write.period,
            opening_balance: write.opening_balance,
            activity: write.activity,
            adjustment: write.adjustment,
            closing_balance: write.closing_balance,
            min_level: write.min_level,
            updated_at: Utc::now(),
        };
        tables.production_status.insert(key, record.clone());
        Ok(record)
    }

    async fn ping(&self) -> AppResult<()> {
        self.tables().map(|_| ())
    }
}
