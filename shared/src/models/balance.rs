//! Balance reconciliation
//!
//! Every closing balance in the platform, whether rendered live in the
//! browser or persisted on submit, goes through [`closing_balance`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::StockPurchase;
use crate::types::Period;

/// Raised when a balance does not fit in a `Decimal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("{0} is out of range")]
    Overflow(&'static str),
}

/// Everything needed to close one (material, period) record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceInputs {
    /// Carried from the previous period's closing balance
    pub opening_balance: Decimal,
    /// Purchases received during the period
    pub inflow: Decimal,
    /// Quantity consumed during the period
    pub outflow: Decimal,
    /// Manual signed correction
    pub adjustment: Decimal,
}

impl BalanceInputs {
    pub fn closing_balance(&self) -> Result<Decimal, BalanceError> {
        closing_balance(self)
    }

    pub fn with_adjustment(self, adjustment: Decimal) -> Self {
        Self { adjustment, ..self }
    }
}

/// closing = opening + inflow - outflow + adjustment
pub fn closing_balance(inputs: &BalanceInputs) -> Result<Decimal, BalanceError> {
    inputs
        .opening_balance
        .checked_add(inputs.inflow)
        .and_then(|v| v.checked_sub(inputs.outflow))
        .and_then(|v| v.checked_add(inputs.adjustment))
        .ok_or(BalanceError::Overflow("closing_balance"))
}

/// Opening balance for a period given the previous period's stored closing
/// balance. A key with no prior record starts at zero.
pub fn carried_opening_balance(previous_closing: Option<Decimal>) -> Decimal {
    previous_closing.unwrap_or(Decimal::ZERO)
}

/// Sum of purchase quantities for one material dated within the period
pub fn total_inflow<'a, I>(
    purchases: I,
    raw_material_id: Uuid,
    period: Period,
) -> Result<Decimal, BalanceError>
where
    I: IntoIterator<Item = &'a StockPurchase>,
{
    purchases
        .into_iter()
        .filter(|p| p.raw_material_id == raw_material_id && period.contains(p.purchase_date))
        .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.quantity))
        .ok_or(BalanceError::Overflow("purchases"))
}

/// Stock level relative to the material's minimum threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// Closing balance at or below zero
    Out,
    /// Above zero but under the minimum level
    Low,
    Normal,
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockLevel::Out => write!(f, "out"),
            StockLevel::Low => write!(f, "low"),
            StockLevel::Normal => write!(f, "normal"),
        }
    }
}

/// Classify a closing balance against the minimum level
pub fn classify_stock_level(closing_balance: Decimal, min_level: Decimal) -> StockLevel {
    if closing_balance <= Decimal::ZERO {
        StockLevel::Out
    } else if closing_balance < min_level {
        StockLevel::Low
    } else {
        StockLevel::Normal
    }
}

/// Whether status views carry a stock level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelPolicy {
    #[default]
    Disabled,
    Thresholds,
}

impl LevelPolicy {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            LevelPolicy::Thresholds
        } else {
            LevelPolicy::Disabled
        }
    }

    pub fn classify(&self, closing_balance: Decimal, min_level: Decimal) -> Option<StockLevel> {
        match self {
            LevelPolicy::Disabled => None,
            LevelPolicy::Thresholds => Some(classify_stock_level(closing_balance, min_level)),
        }
    }
}
