//! Stock purchase models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_positive_quantity;

/// A recorded stock purchase. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockPurchase {
    pub id: Uuid,
    pub vendor: String,
    /// Stable material identity, never the display name
    pub raw_material_id: Uuid,
    pub quantity: Decimal,
    pub purchase_date: NaiveDate,
}

/// Input for recording a purchase. Every field is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewStockPurchase {
    #[validate(required, length(min = 1, message = "Vendor is required"))]
    pub vendor: Option<String>,

    #[validate(required)]
    pub raw_material_id: Option<Uuid>,

    #[validate(required, custom = "validate_positive_quantity")]
    pub quantity: Option<Decimal>,

    #[validate(required)]
    pub purchase_date: Option<NaiveDate>,
}

/// A purchase whose fields have passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPurchase {
    pub vendor: String,
    pub raw_material_id: Uuid,
    pub quantity: Decimal,
    pub purchase_date: NaiveDate,
}

impl NewStockPurchase {
    /// Validate and unwrap into a [`ValidPurchase`]
    pub fn into_valid(self) -> Result<ValidPurchase, validator::ValidationErrors> {
        self.validate()?;
        match (self.vendor, self.raw_material_id, self.quantity, self.purchase_date) {
            (Some(vendor), Some(raw_material_id), Some(quantity), Some(purchase_date)) => {
                Ok(ValidPurchase {
                    vendor: vendor.trim().to_string(),
                    raw_material_id,
                    quantity,
                    purchase_date,
                })
            }
            // validate() already rejects missing fields
            _ => Err(validator::ValidationErrors::new()),
        }
    }
}

/// Filter for listing purchases
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseFilter {
    pub raw_material_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl PurchaseFilter {
    pub fn matches(&self, purchase: &StockPurchase) -> bool {
        self.raw_material_id
            .map_or(true, |id| purchase.raw_material_id == id)
            && self.from.map_or(true, |from| purchase.purchase_date >= from)
            && self.to.map_or(true, |to| purchase.purchase_date <= to)
    }
}
