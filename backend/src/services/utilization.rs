//! Source of the "utilized" quantity on stock status rows
//!
//! No consumption feed exists yet, so the default source reports zero.
//! A real feed plugs in by implementing [`UtilizationSource`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::Period;
use uuid::Uuid;

use crate::error::AppResult;

#[async_trait]
pub trait UtilizationSource: Send + Sync {
    /// Quantity of the material consumed during the period
    async fn utilized(&self, raw_material_id: Uuid, period: Period) -> AppResult<Decimal>;
}

/// Reports zero utilization for every material
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUtilization;

#[async_trait]
impl UtilizationSource for NoUtilization {
    async fn utilized(&self, _raw_material_id: Uuid, _period: Period) -> AppResult<Decimal> {
        Ok(Decimal::ZERO)
    }
}
