//! Domain models for inventory reconciliation

mod balance;
mod material;
mod production_status;
mod purchase;
mod stock_status;

pub use balance::*;
pub use material::*;
pub use production_status::*;
pub use purchase::*;
pub use stock_status::*;
