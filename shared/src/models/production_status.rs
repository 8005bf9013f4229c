//! Monthly production status models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BalanceError, BalanceInputs, LevelPolicy, Process, RawMaterial, StockLevel};
use crate::types::Period;

/// Production activity for one material in one process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionActivity {
    pub assigned: Decimal,
    pub completed: Decimal,
    pub wastage: Decimal,
    /// Informational only, not part of the outflow
    pub pending: Decimal,
}

impl ProductionActivity {
    /// assigned + completed + wastage
    pub fn outflow(&self) -> Result<Decimal, BalanceError> {
        self.assigned
            .checked_add(self.completed)
            .and_then(|v| v.checked_add(self.wastage))
            .ok_or(BalanceError::Overflow("outflow"))
    }
}

/// Persisted production status for one (material, process, period)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionStatusRecord {
    pub id: Uuid,
    pub raw_material_id: Uuid,
    pub process_id: Uuid,
    pub period: Period,
    pub opening_balance: Decimal,
    pub activity: ProductionActivity,
    pub adjustment: Decimal,
    pub closing_balance: Decimal,
    pub min_level: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionStatusWrite {
    pub raw_material_id: Uuid,
    pub process_id: Uuid,
    pub period: Period,
    pub opening_balance: Decimal,
    pub activity: ProductionActivity,
    pub adjustment: Decimal,
    pub closing_balance: Decimal,
    pub min_level: Decimal,
}

/// A reconciled production status row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionStatusView {
    pub id: Option<Uuid>,
    pub process_id: Uuid,
    pub process_name: String,
    pub raw_material_id: Uuid,
    pub raw_material_name: String,
    pub raw_material_category: String,
    pub raw_material_unit: String,
    pub period: Period,
    pub period_label: String,
    pub opening_balance: Decimal,
    pub purchases: Decimal,
    pub assigned: Decimal,
    pub completed: Decimal,
    pub wastage: Decimal,
    pub pending: Decimal,
    pub adjustment: Decimal,
    pub closing_balance: Decimal,
    pub min_level: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<StockLevel>,
}

impl ProductionStatusView {
    #[allow(clippy::too_many_arguments)]
    pub fn reconcile(
        material: &RawMaterial,
        process: &Process,
        period: Period,
        opening_balance: Decimal,
        purchases: Decimal,
        activity: ProductionActivity,
        adjustment: Decimal,
        policy: LevelPolicy,
        id: Option<Uuid>,
    ) -> Result<Self, BalanceError> {
        let inputs = BalanceInputs {
            opening_balance,
            inflow: purchases,
            outflow: activity.outflow()?,
            adjustment,
        };
        let closing_balance = inputs.closing_balance()?;
        Ok(Self {
            id,
            process_id: process.id,
            process_name: process.name.clone(),
            raw_material_id: material.id,
            raw_material_name: material.name.clone(),
            raw_material_category: material.category.clone(),
            raw_material_unit: material.unit.clone(),
            period,
            period_label: period.label(),
            opening_balance,
            purchases,
            assigned: activity.assigned,
            completed: activity.completed,
            wastage: activity.wastage,
            pending: activity.pending,
            adjustment,
            closing_balance,
            min_level: material.min_stock,
            level: policy.classify(closing_balance, material.min_stock),
        })
    }

    pub fn activity(&self) -> ProductionActivity {
        ProductionActivity {
            assigned: self.assigned,
            completed: self.completed,
            wastage: self.wastage,
            pending: self.pending,
        }
    }

    pub fn balance_inputs(&self) -> Result<BalanceInputs, BalanceError> {
        Ok(BalanceInputs {
            opening_balance: self.opening_balance,
            inflow: self.purchases,
            outflow: self.activity().outflow()?,
            adjustment: self.adjustment,
        })
    }

    fn level_policy(&self) -> LevelPolicy {
        LevelPolicy::from_enabled(self.level.is_some())
    }

    pub fn with_adjustment(&self, adjustment: Decimal) -> Result<Self, BalanceError> {
        let closing_balance = self
            .balance_inputs()?
            .with_adjustment(adjustment)
            .closing_balance()?;
        Ok(Self {
            adjustment,
            closing_balance,
            level: self.level_policy().classify(closing_balance, self.min_level),
            ..self.clone()
        })
    }

    /// The row as persisted, with balances taken from the stored record
    pub fn with_stored(self, record: &ProductionStatusRecord) -> Self {
        let level = self
            .level_policy()
            .classify(record.closing_balance, record.min_level);
        Self {
            id: Some(record.id),
            opening_balance: record.opening_balance,
            assigned: record.activity.assigned,
            completed: record.activity.completed,
            wastage: record.activity.wastage,
            pending: record.activity.pending,
            adjustment: record.adjustment,
            closing_balance: record.closing_balance,
            min_level: record.min_level,
            level,
            ..self
        }
    }

    /// Case-insensitive match on material name, category or process name
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.raw_material_name.to_lowercase().contains(&query)
            || self.raw_material_category.to_lowercase().contains(&query)
            || self.process_name.to_lowercase().contains(&query)
    }

    pub fn to_write(&self) -> ProductionStatusWrite {
        ProductionStatusWrite {
            raw_material_id: self.raw_material_id,
            process_id: self.process_id,
            period: self.period,
            opening_balance: self.opening_balance,
            activity: self.activity(),
            adjustment: self.adjustment,
            closing_balance: self.closing_balance,
            min_level: self.min_level,
        }
    }
}

/// A user edit to one production status row. Activity fields that are
/// absent keep their stored values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionStatusEdit {
    pub raw_material_id: Uuid,
    pub process_id: Uuid,
    #[serde(default)]
    pub adjustment: Decimal,
    #[serde(default)]
    pub assigned: Option<Decimal>,
    #[serde(default)]
    pub completed: Option<Decimal>,
    #[serde(default)]
    pub wastage: Option<Decimal>,
    #[serde(default)]
    pub pending: Option<Decimal>,
}

impl ProductionStatusEdit {
    /// Overlay the edited activity fields on the stored activity
    pub fn apply_to(&self, stored: ProductionActivity) -> ProductionActivity {
        ProductionActivity {
            assigned: self.assigned.unwrap_or(stored.assigned),
            completed: self.completed.unwrap_or(stored.completed),
            wastage: self.wastage.unwrap_or(stored.wastage),
            pending: self.pending.unwrap_or(stored.pending),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionStatusSubmission {
    pub period: Period,
    pub edits: Vec<ProductionStatusEdit>,
}
