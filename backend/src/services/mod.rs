//! Business logic services for the Inventory Reconciliation platform

pub mod batch;
pub mod catalog;
pub mod production_status;
pub mod purchase;
pub mod stock_status;
pub mod utilization;

pub use batch::{BatchOutcome, FailedWrite, ProductionStatusKey, StockStatusKey};
pub use catalog::CatalogService;
pub use production_status::ProductionStatusService;
pub use purchase::PurchaseService;
pub use stock_status::StockStatusService;
pub use utilization::{NoUtilization, UtilizationSource};
