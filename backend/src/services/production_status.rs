//! Production status reconciliation service

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::{
    carried_opening_balance, normalize_search, total_inflow, validate_ledger_amount,
    validate_production_edits, LevelPolicy, Period, Process, ProductionActivity, ProductionStatusEdit,
    ProductionStatusRecord, ProductionStatusView, PurchaseFilter, RawMaterial, StockPurchase,
};
use uuid::Uuid;

use super::batch::{BatchOutcome, FailedWrite, ProductionStatusKey};
use crate::error::{AppError, AppResult};
use crate::store::DynLedgerStore;

pub type ProductionStatusOutcome = BatchOutcome<ProductionStatusKey, ProductionStatusView>;

/// Production status service
#[derive(Clone)]
pub struct ProductionStatusService {
    store: DynLedgerStore,
    policy: LevelPolicy,
}

struct PeriodContext {
    period: Period,
    materials: Vec<RawMaterial>,
    processes: Vec<Process>,
    purchases: Vec<StockPurchase>,
    current: HashMap<(Uuid, Uuid), ProductionStatusRecord>,
    previous: HashMap<(Uuid, Uuid), ProductionStatusRecord>,
}

fn keyed(records: Vec<ProductionStatusRecord>) -> HashMap<(Uuid, Uuid), ProductionStatusRecord> {
    records
        .into_iter()
        .map(|r| ((r.raw_material_id, r.process_id), r))
        .collect()
}

impl ProductionStatusService {
    pub fn new(store: DynLedgerStore, policy: LevelPolicy) -> Self {
        Self { store, policy }
    }

    async fn load_context(&self, period: Period) -> AppResult<PeriodContext> {
        let range = period.date_range();
        let purchase_filter = PurchaseFilter {
            raw_material_id: None,
            from: Some(range.start),
            to: Some(range.end),
        };

        let previous_rows = async {
            match period.previous() {
                Some(previous) => self.store.list_production_status(previous).await,
                None => Ok(Vec::new()),
            }
        };

        let (materials, processes, purchases, current, previous) = tokio::try_join!(
            self.store.list_raw_materials(),
            self.store.list_processes(),
            self.store.list_purchases(&purchase_filter),
            self.store.list_production_status(period),
            previous_rows,
        )?;

        Ok(PeriodContext {
            period,
            materials,
            processes,
            purchases,
            current: keyed(current),
            previous: keyed(previous),
        })
    }

    /// Derive one row. Shared by the read and the submit path.
    fn reconcile_row(
        &self,
        ctx: &PeriodContext,
        material: &RawMaterial,
        process: &Process,
        activity: ProductionActivity,
        adjustment: Decimal,
    ) -> AppResult<ProductionStatusView> {
        let key = (material.id, process.id);
        let opening_balance =
            carried_opening_balance(ctx.previous.get(&key).map(|r| r.closing_balance));

        Ok(ProductionStatusView::reconcile(
            material,
            process,
            ctx.period,
            opening_balance,
            total_inflow(&ctx.purchases, material.id, ctx.period)?,
            activity,
            adjustment,
            self.policy,
            ctx.current.get(&key).map(|r| r.id),
        )?)
    }

    /// Reject a row whose derived amounts the store cannot hold exactly
    fn check_storable(row: &ProductionStatusView) -> AppResult<()> {
        let amounts = [
            ("opening_balance", row.opening_balance),
            ("closing_balance", row.closing_balance),
        ];
        for (field, amount) in amounts {
            validate_ledger_amount(amount).map_err(|message| AppError::validation(field, message))?;
        }
        Ok(())
    }

    /// Reconciled rows for every (material, process) pair in the period.
    /// `process_id` narrows to one process; `search` matches material name,
    /// category or process name.
    pub async fn load(
        &self,
        period: Period,
        process_id: Option<Uuid>,
        search: Option<&str>,
    ) -> AppResult<Vec<ProductionStatusView>> {
        let ctx = self.load_context(period).await?;

        if let Some(id) = process_id {
            if !ctx.processes.iter().any(|p| p.id == id) {
                return Err(AppError::NotFound(format!("Process {}", id)));
            }
        }

        let search = normalize_search(search);
        let mut rows = Vec::new();
        for material in &ctx.materials {
            for process in ctx
                .processes
                .iter()
                .filter(|p| process_id.map_or(true, |id| p.id == id))
            {
                let stored = ctx.current.get(&(material.id, process.id));
                let row = self.reconcile_row(
                    &ctx,
                    material,
                    process,
                    stored.map(|r| r.activity).unwrap_or_default(),
                    stored.map(|r| r.adjustment).unwrap_or(Decimal::ZERO),
                )?;

                if search.as_deref().map_or(true, |q| row.matches_search(q)) {
                    rows.push(row);
                }
            }
        }

        Ok(rows)
    }

    /// Apply user edits, writing each record independently
    pub async fn submit(
        &self,
        period: Period,
        edits: Vec<ProductionStatusEdit>,
    ) -> AppResult<ProductionStatusOutcome> {
        validate_production_edits(&edits)?;

        let ctx = self.load_context(period).await?;
        let materials: HashMap<Uuid, &RawMaterial> =
            ctx.materials.iter().map(|m| (m.id, m)).collect();
        let processes: HashMap<Uuid, &Process> =
            ctx.processes.iter().map(|p| (p.id, p)).collect();

        for edit in &edits {
            if !materials.contains_key(&edit.raw_material_id) {
                return Err(AppError::NotFound(format!(
                    "Raw material {}",
                    edit.raw_material_id
                )));
            }
            if !processes.contains_key(&edit.process_id) {
                return Err(AppError::NotFound(format!("Process {}", edit.process_id)));
            }
        }

        let mut outcome = ProductionStatusOutcome::new(period);
        for edit in edits {
            let key = ProductionStatusKey {
                raw_material_id: edit.raw_material_id,
                process_id: edit.process_id,
            };
            let material = materials[&edit.raw_material_id];
            let process = processes[&edit.process_id];

            let stored_activity = ctx
                .current
                .get(&(material.id, process.id))
                .map(|r| r.activity)
                .unwrap_or_default();
            let written = match self
                .reconcile_row(
                    &ctx,
                    material,
                    process,
                    edit.apply_to(stored_activity),
                    edit.adjustment,
                )
                .and_then(|row| Self::check_storable(&row).map(|_| row))
            {
                Ok(row) => self
                    .store
                    .upsert_production_status(&row.to_write())
                    .await
                    .map(|record| row.with_stored(&record)),
                Err(e) => Err(e),
            };

            match written {
                Ok(row) => outcome.updated.push(row),
                Err(e) => {
                    tracing::warn!(
                        "Production status write failed for material {} / process {} in {}: {}",
                        key.raw_material_id,
                        key.process_id,
                        period,
                        e
                    );
                    outcome.failed.push(FailedWrite::new(key, &e));
                }
            }
        }

        tracing::info!(
            "Production status for {}: {} updated, {} failed",
            period,
            outcome.updated.len(),
            outcome.failed.len()
        );

        Ok(outcome)
    }
}
