//! Stock purchase service

use std::collections::HashMap;

use shared::{normalize_search, NewStockPurchase, PurchaseFilter, StockPurchase};

use crate::error::{AppError, AppResult};
use crate::store::DynLedgerStore;

/// Records and lists stock purchases
#[derive(Clone)]
pub struct PurchaseService {
    store: DynLedgerStore,
}

impl PurchaseService {
    pub fn new(store: DynLedgerStore) -> Self {
        Self { store }
    }

    /// Record a purchase. Incomplete input is rejected before the store is
    /// touched.
    pub async fn record(&self, input: NewStockPurchase) -> AppResult<StockPurchase> {
        let purchase = input.into_valid()?;

        if purchase.vendor.is_empty() {
            return Err(AppError::validation("vendor", "Vendor is required"));
        }

        if self
            .store
            .get_raw_material(purchase.raw_material_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "Raw material {}",
                purchase.raw_material_id
            )));
        }

        let recorded = self.store.insert_purchase(&purchase).await?;
        tracing::info!(
            "Recorded purchase {} of {} for material {}",
            recorded.id,
            recorded.quantity,
            recorded.raw_material_id
        );
        Ok(recorded)
    }

    /// Purchases ordered by date, optionally narrowed by a search over vendor
    /// and material name
    pub async fn list(
        &self,
        filter: PurchaseFilter,
        search: Option<&str>,
    ) -> AppResult<Vec<StockPurchase>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(AppError::validation("from", "Start date is after end date"));
            }
        }

        let purchases = self.store.list_purchases(&filter).await?;
        let query = match normalize_search(search) {
            Some(query) => query,
            None => return Ok(purchases),
        };

        let material_names: HashMap<_, _> = self
            .store
            .list_raw_materials()
            .await?
            .into_iter()
            .map(|m| (m.id, m.name.to_lowercase()))
            .collect();

        Ok(purchases
            .into_iter()
            .filter(|p| {
                p.vendor.to_lowercase().contains(&query)
                    || material_names
                        .get(&p.raw_material_id)
                        .is_some_and(|name| name.contains(&query))
            })
            .collect())
    }
}
