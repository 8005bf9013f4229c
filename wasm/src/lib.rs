//! WebAssembly module for the Inventory Reconciliation platform
//!
//! Provides client-side computation for:
//! - Live closing balance recompute while an adjustment is typed
//! - Stock level classification
//! - Period rollover and labels
//!
//! Every balance here comes from the same `shared` calculator the server uses
//! on submit, so the displayed and persisted values cannot drift.

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

fn to_decimal(value: f64, name: &str) -> Result<Decimal, JsValue> {
    Decimal::try_from(value).map_err(|_| JsValue::from_str(&format!("{} is not a finite number", name)))
}

fn to_f64(value: Decimal) -> f64 {
    value.to_string().parse().unwrap_or(0.0)
}

/// Closing balance from its four inputs
#[wasm_bindgen]
pub fn calculate_closing_balance(
    opening_balance: f64,
    inflow: f64,
    outflow: f64,
    adjustment: f64,
) -> Result<f64, JsValue> {
    let inputs = BalanceInputs {
        opening_balance: to_decimal(opening_balance, "opening_balance")?,
        inflow: to_decimal(inflow, "inflow")?,
        outflow: to_decimal(outflow, "outflow")?,
        adjustment: to_decimal(adjustment, "adjustment")?,
    };
    closing_balance(&inputs)
        .map(to_f64)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Classify a closing balance as "out", "low" or "normal"
#[wasm_bindgen]
pub fn classify_level(closing_balance: f64, min_level: f64) -> Result<String, JsValue> {
    let level = classify_stock_level(
        to_decimal(closing_balance, "closing_balance")?,
        to_decimal(min_level, "min_level")?,
    );
    Ok(level.to_string())
}

/// Recompute a stock status row (JSON, as served by the API) for a new
/// adjustment and return the updated row as JSON
#[wasm_bindgen]
pub fn recompute_stock_status_row(row_json: &str, adjustment: f64) -> Result<String, JsValue> {
    let row: StockStatusView = serde_json::from_str(row_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid stock status JSON: {}", e)))?;
    let updated = row
        .with_adjustment(to_decimal(adjustment, "adjustment")?)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&updated).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Recompute a production status row (JSON) for a new adjustment
#[wasm_bindgen]
pub fn recompute_production_status_row(row_json: &str, adjustment: f64) -> Result<String, JsValue> {
    let row: ProductionStatusView = serde_json::from_str(row_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid production status JSON: {}", e)))?;
    let updated = row
        .with_adjustment(to_decimal(adjustment, "adjustment")?)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&updated).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Previous period as `{"year":..,"month":..}` JSON
#[wasm_bindgen]
pub fn previous_period(year: i32, month: u32) -> Result<String, JsValue> {
    let previous = Period::new(year, month)
        .map_err(|e| JsValue::from_str(&e.to_string()))?
        .previous()
        .ok_or_else(|| JsValue::from_str("The period has no previous period"))?;
    serde_json::to_string(&previous).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Display label such as "Jan 2024"
#[wasm_bindgen]
pub fn period_label(year: i32, month: u32) -> Result<String, JsValue> {
    Period::new(year, month)
        .map(|p| p.label())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
