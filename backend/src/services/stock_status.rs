//! Stock status reconciliation service
//!
//! Loads a period's rows (carrying opening balances forward from the previous
//! period) and writes user adjustments back, one record at a time.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{
    carried_opening_balance, normalize_search, total_inflow, validate_ledger_amount,
    validate_stock_edits, BalanceInputs, LevelPolicy, Period, PurchaseFilter, RawMaterial,
    StockPurchase, StockStatusEdit, StockStatusRecord, StockStatusView,
};
use uuid::Uuid;

use super::batch::{BatchOutcome, FailedWrite, StockStatusKey};
use super::utilization::UtilizationSource;
use crate::error::{AppError, AppResult};
use crate::store::DynLedgerStore;

pub type StockStatusOutcome = BatchOutcome<StockStatusKey, StockStatusView>;

/// Stock status service
#[derive(Clone)]
pub struct StockStatusService {
    store: DynLedgerStore,
    utilization: Arc<dyn UtilizationSource>,
    policy: LevelPolicy,
}

/// Everything a period's rows are derived from
struct PeriodContext {
    period: Period,
    materials: Vec<RawMaterial>,
    purchases: Vec<StockPurchase>,
    current: HashMap<Uuid, StockStatusRecord>,
    previous: HashMap<Uuid, StockStatusRecord>,
}

impl StockStatusService {
    pub fn new(
        store: DynLedgerStore,
        utilization: Arc<dyn UtilizationSource>,
        policy: LevelPolicy,
    ) -> Self {
        Self {
            store,
            utilization,
            policy,
        }
    }

    /// Fetch every dependency of the period. Rows are only derived once all
    /// loads have completed.
    async fn load_context(&self, period: Period) -> AppResult<PeriodContext> {
        let range = period.date_range();
        let purchase_filter = PurchaseFilter {
            raw_material_id: None,
            from: Some(range.start),
            to: Some(range.end),
        };

        // The earliest representable period has nothing to carry forward
        let previous_rows = async {
            match period.previous() {
                Some(previous) => self.store.list_stock_status(previous).await,
                None => Ok(Vec::new()),
            }
        };

        let (materials, purchases, current, previous) = tokio::try_join!(
            self.store.list_raw_materials(),
            self.store.list_purchases(&purchase_filter),
            self.store.list_stock_status(period),
            previous_rows,
        )?;

        Ok(PeriodContext {
            period,
            materials,
            purchases,
            current: current
                .into_iter()
                .map(|r| (r.raw_material_id, r))
                .collect(),
            previous: previous
                .into_iter()
                .map(|r| (r.raw_material_id, r))
                .collect(),
        })
    }

    /// Derive one row. Shared by the read and the submit path.
    async fn reconcile_row(
        &self,
        ctx: &PeriodContext,
        material: &RawMaterial,
        adjustment: Decimal,
        opening_override: Option<Decimal>,
    ) -> AppResult<StockStatusView> {
        let (opening_balance, opening_overridden) = match opening_override {
            Some(opening) => (opening, true),
            None => {
                let previous_closing = ctx
                    .previous
                    .get(&material.id)
                    .map(|r| r.closing_balance);
                (carried_opening_balance(previous_closing), false)
            }
        };

        let inputs = BalanceInputs {
            opening_balance,
            inflow: total_inflow(&ctx.purchases, material.id, ctx.period)?,
            outflow: self.utilization.utilized(material.id, ctx.period).await?,
            adjustment,
        };

        Ok(StockStatusView::reconcile(
            material,
            ctx.period,
            inputs,
            opening_overridden,
            self.policy,
            ctx.current.get(&material.id).map(|r| r.id),
        )?)
    }

    /// Reject a row whose derived amounts the store cannot hold exactly
    fn check_storable(row: &StockStatusView) -> AppResult<()> {
        let amounts = [
            ("opening_balance", row.opening_balance),
            ("purchases", row.purchases),
            ("utilized", row.utilized),
            ("closing_balance", row.closing_balance),
        ];
        for (field, amount) in amounts {
            validate_ledger_amount(amount).map_err(|message| AppError::validation(field, message))?;
        }
        Ok(())
    }

    /// Reconciled rows for every material in the period, optionally filtered
    /// by material name or category
    pub async fn load(&self, period: Period, search: Option<&str>) -> AppResult<Vec<StockStatusView>> {
        let ctx = self.load_context(period).await?;
        let search = normalize_search(search);

        let mut rows = Vec::with_capacity(ctx.materials.len());
        for material in &ctx.materials {
            if let Some(query) = search.as_deref() {
                if !material.matches_search(query) {
                    continue;
                }
            }

            let stored = ctx.current.get(&material.id);
            let adjustment = stored.map(|r| r.adjustment).unwrap_or(Decimal::ZERO);
            let opening_override = stored
                .filter(|r| r.opening_overridden)
                .map(|r| r.opening_balance);

            rows.push(
                self.reconcile_row(&ctx, material, adjustment, opening_override)
                    .await?,
            );
        }

        Ok(rows)
    }

    /// Apply user edits. Each record is written on its own; a failed write is
    /// reported in the outcome and does not undo or stop the others.
    pub async fn submit(
        &self,
        period: Period,
        edits: Vec<StockStatusEdit>,
    ) -> AppResult<StockStatusOutcome> {
        validate_stock_edits(&edits)?;

        let ctx = self.load_context(period).await?;
        let materials: HashMap<Uuid, &RawMaterial> =
            ctx.materials.iter().map(|m| (m.id, m)).collect();

        // Unknown materials reject the whole batch before anything is written
        if let Some(edit) = edits
            .iter()
            .find(|e| !materials.contains_key(&e.raw_material_id))
        {
            return Err(AppError::NotFound(format!(
                "Raw material {}",
                edit.raw_material_id
            )));
        }

        let mut outcome = StockStatusOutcome::new(period);
        for edit in edits {
            let key = StockStatusKey {
                raw_material_id: edit.raw_material_id,
            };
            let material = materials[&edit.raw_material_id];

            // An opening balance entered earlier stays until replaced
            let opening_override = edit.opening_balance.or_else(|| {
                ctx.current
                    .get(&material.id)
                    .filter(|r| r.opening_overridden)
                    .map(|r| r.opening_balance)
            });

            let written = match self
                .reconcile_row(&ctx, material, edit.adjustment, opening_override)
                .await
                .and_then(|row| Self::check_storable(&row).map(|_| row))
            {
                Ok(row) => self
                    .store
                    .upsert_stock_status(&row.to_write())
                    .await
                    .map(|record| row.with_stored(&record)),
                Err(e) => Err(e),
            };

            match written {
                Ok(row) => outcome.updated.push(row),
                Err(e) => {
                    tracing::warn!(
                        "Stock status write failed for material {} in {}: {}",
                        key.raw_material_id,
                        period,
                        e
                    );
                    outcome.failed.push(FailedWrite::new(key, &e));
                }
            }
        }

        tracing::info!(
            "Stock status for {}: {} updated, {} failed",
            period,
            outcome.updated.len(),
            outcome.failed.len()
        );

        Ok(outcome)
    }
}
