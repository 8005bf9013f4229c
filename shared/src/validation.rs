//! Validation utilities for inventory reconciliation
//!
//! All checks here run before any store call is made.

use std::collections::HashSet;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationError;

use crate::models::{ProductionStatusEdit, StockStatusEdit};

// ============================================================================
// Quantity Validations
// ============================================================================

/// Largest magnitude a stored amount may have: 999,999,999,999.99, the
/// range of a `NUMERIC(14, 2)` column
pub const MAX_LEDGER_AMOUNT: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2);

/// Stored amounts carry at most two decimal places
pub const LEDGER_AMOUNT_SCALE: u32 = 2;

/// Every amount written to the ledger must be storable without rounding
pub fn validate_ledger_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount.normalize().scale() > LEDGER_AMOUNT_SCALE {
        return Err("Amounts can have at most two decimal places");
    }
    if amount.abs() > MAX_LEDGER_AMOUNT {
        return Err("Amount is out of range");
    }
    Ok(())
}

/// Validator hook: purchase quantities must be positive and storable
pub fn validate_positive_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity <= Decimal::ZERO {
        let mut error = ValidationError::new("positive");
        error.message = Some("Quantity must be positive".into());
        return Err(error);
    }
    if let Err(message) = validate_ledger_amount(*quantity) {
        let mut error = ValidationError::new("range");
        error.message = Some(message.into());
        return Err(error);
    }
    Ok(())
}

/// Activity amounts (assigned, completed, wastage, pending) cannot be negative
pub fn validate_activity_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Activity amounts cannot be negative");
    }
    validate_ledger_amount(amount)
}

// ============================================================================
// Batch Edit Validations
// ============================================================================

/// A rejected edit within a batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("edit {index} ({field}): {message}")]
pub struct EditError {
    /// Position of the offending edit in the submission
    pub index: usize,
    pub field: &'static str,
    pub message: &'static str,
}

/// Reject empty batches, edits that target the same material twice and
/// amounts that cannot be stored as given
pub fn validate_stock_edits(edits: &[StockStatusEdit]) -> Result<(), EditError> {
    if edits.is_empty() {
        return Err(EditError {
            index: 0,
            field: "edits",
            message: "At least one edit is required",
        });
    }

    let mut seen: HashSet<Uuid> = HashSet::with_capacity(edits.len());
    for (index, edit) in edits.iter().enumerate() {
        if !seen.insert(edit.raw_material_id) {
            return Err(EditError {
                index,
                field: "raw_material_id",
                message: "Material appears more than once in the submission",
            });
        }

        validate_ledger_amount(edit.adjustment).map_err(|message| EditError {
            index,
            field: "adjustment",
            message,
        })?;
        if let Some(opening) = edit.opening_balance {
            validate_ledger_amount(opening).map_err(|message| EditError {
                index,
                field: "opening_balance",
                message,
            })?;
        }
    }
    Ok(())
}

/// Reject empty batches, duplicate (material, process) keys, negative
/// activity amounts and amounts that cannot be stored as given
pub fn validate_production_edits(edits: &[ProductionStatusEdit]) -> Result<(), EditError> {
    if edits.is_empty() {
        return Err(EditError {
            index: 0,
            field: "edits",
            message: "At least one edit is required",
        });
    }

    let mut seen: HashSet<(Uuid, Uuid)> = HashSet::with_capacity(edits.len());
    for (index, edit) in edits.iter().enumerate() {
        if !seen.insert((edit.raw_material_id, edit.process_id)) {
            return Err(EditError {
                index,
                field: "process_id",
                message: "Material and process appear more than once in the submission",
            });
        }

        validate_ledger_amount(edit.adjustment).map_err(|message| EditError {
            index,
            field: "adjustment",
            message,
        })?;

        let amounts = [
            ("assigned", edit.assigned),
            ("completed", edit.completed),
            ("wastage", edit.wastage),
            ("pending", edit.pending),
        ];
        for (field, amount) in amounts {
            if let Some(amount) = amount {
                validate_activity_amount(amount).map_err(|message| EditError {
                    index,
                    field,
                    message,
                })?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// Search
// ============================================================================

/// Normalise a free-text search query; blank queries match everything
pub fn normalize_search(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}
