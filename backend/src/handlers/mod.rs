//! HTTP handlers

pub mod health;
pub mod materials;
pub mod periods;
pub mod production_status;
pub mod purchases;
pub mod stock_status;

pub use health::health_check;
pub use materials::{list_processes, list_raw_materials};
pub use periods::get_previous_period;
pub use production_status::{get_production_status, submit_production_status};
pub use purchases::{list_purchases, record_purchase};
pub use stock_status::{get_stock_status, submit_stock_status};
