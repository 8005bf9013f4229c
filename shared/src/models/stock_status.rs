//! Monthly stock status models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BalanceError, BalanceInputs, LevelPolicy, RawMaterial, StockLevel};
use crate::types::Period;

/// Persisted stock status for one material and period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockStatusRecord {
    pub id: Uuid,
    pub raw_material_id: Uuid,
    pub period: Period,
    pub opening_balance: Decimal,
    /// Opening balance was entered by a user instead of carried forward
    pub opening_overridden: bool,
    pub purchases: Decimal,
    pub utilized: Decimal,
    pub adjustment: Decimal,
    pub closing_balance: Decimal,
    pub min_level: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Values written for one stock status row, keyed by (material, period)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockStatusWrite {
    pub raw_material_id: Uuid,
    pub period: Period,
    pub opening_balance: Decimal,
    pub opening_overridden: bool,
    pub purchases: Decimal,
    pub utilized: Decimal,
    pub adjustment: Decimal,
    pub closing_balance: Decimal,
    pub min_level: Decimal,
}

/// A reconciled stock status row as shown to users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockStatusView {
    /// Stored record id, absent until the row is first submitted
    pub id: Option<Uuid>,
    pub raw_material_id: Uuid,
    pub raw_material_name: String,
    pub raw_material_category: String,
    pub raw_material_unit: String,
    pub period: Period,
    pub period_label: String,
    pub opening_balance: Decimal,
    pub opening_overridden: bool,
    pub purchases: Decimal,
    pub utilized: Decimal,
    pub adjustment: Decimal,
    pub closing_balance: Decimal,
    pub min_level: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<StockLevel>,
}

impl StockStatusView {
    /// Build a row from a material and its reconciled balance inputs
    pub fn reconcile(
        material: &RawMaterial,
        period: Period,
        inputs: BalanceInputs,
        opening_overridden: bool,
        policy: LevelPolicy,
        id: Option<Uuid>,
    ) -> Result<Self, BalanceError> {
        let closing_balance = inputs.closing_balance()?;
        Ok(Self {
            id,
            raw_material_id: material.id,
            raw_material_name: material.name.clone(),
            raw_material_category: material.category.clone(),
            raw_material_unit: material.unit.clone(),
            period,
            period_label: period.label(),
            opening_balance: inputs.opening_balance,
            opening_overridden,
            purchases: inputs.inflow,
            utilized: inputs.outflow,
            adjustment: inputs.adjustment,
            closing_balance,
            min_level: material.min_stock,
            level: policy.classify(closing_balance, material.min_stock),
        })
    }

    pub fn balance_inputs(&self) -> BalanceInputs {
        BalanceInputs {
            opening_balance: self.opening_balance,
            inflow: self.purchases,
            outflow: self.utilized,
            adjustment: self.adjustment,
        }
    }

    fn level_policy(&self) -> LevelPolicy {
        LevelPolicy::from_enabled(self.level.is_some())
    }

    /// Recompute the row for a new adjustment, as on every keystroke
    pub fn with_adjustment(&self, adjustment: Decimal) -> Result<Self, BalanceError> {
        let inputs = self.balance_inputs().with_adjustment(adjustment);
        let closing_balance = inputs.closing_balance()?;
        Ok(Self {
            adjustment,
            closing_balance,
            level: self.level_policy().classify(closing_balance, self.min_level),
            ..self.clone()
        })
    }

    /// The row as persisted, with balances taken from the stored record
    pub fn with_stored(self, record: &StockStatusRecord) -> Self {
        let level = self
            .level_policy()
            .classify(record.closing_balance, record.min_level);
        Self {
            id: Some(record.id),
            opening_balance: record.opening_balance,
            opening_overridden: record.opening_overridden,
            purchases: record.purchases,
            utilized: record.utilized,
            adjustment: record.adjustment,
            closing_balance: record.closing_balance,
            min_level: record.min_level,
            level,
            ..self
        }
    }

    pub fn to_write(&self) -> StockStatusWrite {
        StockStatusWrite {
            raw_material_id: self.raw_material_id,
            period: self.period,
            opening_balance: self.opening_balance,
            opening_overridden: self.opening_overridden,
            purchases: self.purchases,
            utilized: self.utilized,
            adjustment: self.adjustment,
            closing_balance: self.closing_balance,
            min_level: self.min_level,
        }
    }
}

/// A user edit to one stock status row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockStatusEdit {
    pub raw_material_id: Uuid,
    #[serde(default)]
    pub adjustment: Decimal,
    /// Replaces the carried-forward opening balance when present
    #[serde(default)]
    pub opening_balance: Option<Decimal>,
}

/// Bulk submission of stock status edits for one period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockStatusSubmission {
    pub period: Period,
    pub edits: Vec<StockStatusEdit>,
}
