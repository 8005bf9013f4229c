//! Shared types and models for the Inventory Reconciliation platform
//!
//! This crate contains the balance calculator and the types shared between
//! the backend and the browser (via WASM).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
