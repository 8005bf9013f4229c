//! Read-only access to raw materials and processes

use shared::{normalize_search, Process, RawMaterial};

use crate::error::AppResult;
use crate::store::DynLedgerStore;

#[derive(Clone)]
pub struct CatalogService {
    store: DynLedgerStore,
}

impl CatalogService {
    pub fn new(store: DynLedgerStore) -> Self {
        Self { store }
    }

    /// Raw materials ordered by name
    pub async fn raw_materials(&self, search: Option<&str>) -> AppResult<Vec<RawMaterial>> {
        let materials = self.store.list_raw_materials().await?;
        Ok(match normalize_search(search) {
            Some(query) => materials
                .into_iter()
                .filter(|m| m.matches_search(&query))
                .collect(),
            None => materials,
        })
    }

    pub async fn processes(&self) -> AppResult<Vec<Process>> {
        self.store.list_processes().await
    }
}
