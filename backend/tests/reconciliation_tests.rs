//! Monthly reconciliation tests
//!
//! Tests for stock and production status including:
//! - Carry-forward of closing balances into the next period
//! - Independent per-record writes in a bulk submission
//! - Stock level classification at the thresholds

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use inventory_reconciliation_backend::{
    error::AppError,
    services::{NoUtilization, ProductionStatusService, StockStatusService, UtilizationSource},
    store::{DynLedgerStore, LedgerStore, MemoryLedgerStore},
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    closing_balance, BalanceInputs, LevelPolicy, NewStockPurchase, Period, Process, ProcessType,
    ProductionStatusEdit, RawMaterial, StockLevel, StockStatusEdit,
};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn period(year: i32, month: u32) -> Period {
    Period::new(year, month).unwrap()
}

fn material(name: &str, min_stock: &str) -> RawMaterial {
    RawMaterial {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: "Dry goods".to_string(),
        unit: "kg".to_string(),
        current_stock: Decimal::ZERO,
        min_stock: dec(min_stock),
    }
}

fn process(name: &str) -> Process {
    Process {
        id: Uuid::new_v4(),
        name: name.to_string(),
        process_type: ProcessType::Production,
    }
}

fn stock_edit(raw_material_id: Uuid, adjustment: &str) -> StockStatusEdit {
    StockStatusEdit {
        raw_material_id,
        adjustment: dec(adjustment),
        opening_balance: None,
    }
}

fn production_edit(raw_material_id: Uuid, process_id: Uuid) -> ProductionStatusEdit {
    ProductionStatusEdit {
        raw_material_id,
        process_id,
        adjustment: Decimal::ZERO,
        assigned: None,
        completed: None,
        wastage: None,
        pending: None,
    }
}

async fn record_purchase(store: &MemoryLedgerStore, raw_material_id: Uuid, quantity: &str, date: NaiveDate) {
    let purchase = NewStockPurchase {
        vendor: Some("Acme Mills".to_string()),
        raw_material_id: Some(raw_material_id),
        quantity: Some(dec(quantity)),
        purchase_date: Some(date),
    }
    .into_valid()
    .unwrap();
    store.insert_purchase(&purchase).await.unwrap();
}

/// Fixed monthly consumption for every material
struct FixedUtilization(Decimal);

#[async_trait::async_trait]
impl UtilizationSource for FixedUtilization {
    async fn utilized(
        &self,
        _raw_material_id: Uuid,
        _period: Period,
    ) -> inventory_reconciliation_backend::error::AppResult<Decimal> {
        Ok(self.0)
    }
}

fn stock_service(store: &Arc<MemoryLedgerStore>) -> StockStatusService {
    let dyn_store: DynLedgerStore = store.clone();
    StockStatusService::new(dyn_store, Arc::new(NoUtilization), LevelPolicy::Thresholds)
}

fn stock_service_with_utilization(
    store: &Arc<MemoryLedgerStore>,
    utilized: &str,
) -> StockStatusService {
    let dyn_store: DynLedgerStore = store.clone();
    StockStatusService::new(
        dyn_store,
        Arc::new(FixedUtilization(dec(utilized))),
        LevelPolicy::Thresholds,
    )
}

fn production_service(store: &Arc<MemoryLedgerStore>) -> ProductionStatusService {
    let dyn_store: DynLedgerStore = store.clone();
    ProductionStatusService::new(dyn_store, LevelPolicy::Thresholds)
}

// ============================================================================
// Stock Status
// ============================================================================

#[cfg(test)]
mod stock_status_tests {
    use super::*;

    /// Jan: 100 purchased, 20 used, closes at 80; Feb opens at 80
    #[tokio::test]
    async fn test_closing_balance_carries_into_next_period() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "50");
        store.add_raw_material(flour.clone());
        record_purchase(&store, flour.id, "100", NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()).await;

        let service = stock_service_with_utilization(&store, "20");
        let outcome = assert_ok!(
            service
                .submit(period(2024, 1), vec![stock_edit(flour.id, "0")])
                .await
        );
        assert!(outcome.is_complete());
        assert_eq!(outcome.updated[0].closing_balance, dec("80"));

        let feb = assert_ok!(service.load(period(2024, 2), None).await);
        assert_eq!(feb.len(), 1);
        assert_eq!(feb[0].opening_balance, dec("80"));
        assert!(!feb[0].opening_overridden);
    }

    /// A material with no prior record opens at zero
    #[tokio::test]
    async fn test_first_period_opens_at_zero() {
        let store = Arc::new(MemoryLedgerStore::new());
        let sugar = material("Sugar", "10");
        store.add_raw_material(sugar.clone());
        record_purchase(&store, sugar.id, "25.5", NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()).await;

        let rows = assert_ok!(stock_service(&store).load(period(2024, 3), None).await);
        assert_eq!(rows[0].opening_balance, Decimal::ZERO);
        assert_eq!(rows[0].purchases, dec("25.5"));
        assert_eq!(rows[0].utilized, Decimal::ZERO);
        assert_eq!(rows[0].closing_balance, dec("25.5"));
        assert_eq!(rows[0].id, None);
    }

    /// Purchases outside the period's date range are not counted
    #[tokio::test]
    async fn test_purchases_outside_period_excluded() {
        let store = Arc::new(MemoryLedgerStore::new());
        let salt = material("Salt", "1");
        store.add_raw_material(salt.clone());
        record_purchase(&store, salt.id, "5", NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()).await;
        record_purchase(&store, salt.id, "7", NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()).await;
        record_purchase(&store, salt.id, "9", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).await;

        let rows = assert_ok!(stock_service(&store).load(period(2024, 2), None).await);
        assert_eq!(rows[0].purchases, dec("7"));
    }

    /// January reads its opening balance from December of the prior year
    #[tokio::test]
    async fn test_year_rollover() {
        let store = Arc::new(MemoryLedgerStore::new());
        let yeast = material("Yeast", "1");
        store.add_raw_material(yeast.clone());
        record_purchase(&store, yeast.id, "12", NaiveDate::from_ymd_opt(2023, 12, 5).unwrap()).await;

        let service = stock_service(&store);
        assert_ok!(
            service
                .submit(period(2023, 12), vec![stock_edit(yeast.id, "0")])
                .await
        );

        let rows = assert_ok!(service.load(period(2024, 1), None).await);
        assert_eq!(rows[0].opening_balance, dec("12"));
    }

    /// Submitting the same adjustments twice leaves the same records
    #[tokio::test]
    async fn test_resubmit_is_idempotent() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "5");
        store.add_raw_material(flour.clone());
        record_purchase(&store, flour.id, "40", NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()).await;

        let service = stock_service(&store);
        let first = assert_ok!(
            service
                .submit(period(2024, 5), vec![stock_edit(flour.id, "-3.5")])
                .await
        );
        let second = assert_ok!(
            service
                .submit(period(2024, 5), vec![stock_edit(flour.id, "-3.5")])
                .await
        );

        assert_eq!(first.updated[0], second.updated[0]);
        let stored = store.list_stock_status(period(2024, 5)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].closing_balance, dec("36.5"));
    }

    /// Record 2 of 3 fails: 1 and 3 are persisted, only 2 is reported
    #[tokio::test]
    async fn test_partial_batch_failure() {
        let store = Arc::new(MemoryLedgerStore::new());
        let a = material("Butter", "1");
        let b = material("Cocoa", "1");
        let c = material("Eggs", "1");
        for m in [&a, &b, &c] {
            store.add_raw_material(m.clone());
        }
        store.fail_stock_status_writes_for(b.id);

        let outcome = assert_ok!(
            stock_service(&store)
                .submit(
                    period(2024, 6),
                    vec![
                        stock_edit(a.id, "1"),
                        stock_edit(b.id, "2"),
                        stock_edit(c.id, "3"),
                    ],
                )
                .await
        );

        assert!(!outcome.is_complete());
        assert_eq!(outcome.updated.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].key.raw_material_id, b.id);
        assert_eq!(outcome.failed[0].code, "STORAGE_ERROR");

        let stored = store.list_stock_status(period(2024, 6)).await.unwrap();
        let mut stored_ids: Vec<Uuid> = stored.iter().map(|r| r.raw_material_id).collect();
        stored_ids.sort();
        let mut expected = vec![a.id, c.id];
        expected.sort();
        assert_eq!(stored_ids, expected);
    }

    /// An entered opening balance wins over carry-forward and survives later
    /// submissions that do not replace it
    #[tokio::test]
    async fn test_opening_override_is_sticky() {
        let store = Arc::new(MemoryLedgerStore::new());
        let oil = material("Oil", "1");
        store.add_raw_material(oil.clone());

        let service = stock_service(&store);
        assert_ok!(
            service
                .submit(
                    period(2024, 4),
                    vec![StockStatusEdit {
                        raw_material_id: oil.id,
                        adjustment: Decimal::ZERO,
                        opening_balance: Some(dec("30")),
                    }],
                )
                .await
        );

        let outcome = assert_ok!(
            service
                .submit(period(2024, 4), vec![stock_edit(oil.id, "2")])
                .await
        );
        assert_eq!(outcome.updated[0].opening_balance, dec("30"));
        assert!(outcome.updated[0].opening_overridden);
        assert_eq!(outcome.updated[0].closing_balance, dec("32"));

        let rows = assert_ok!(service.load(period(2024, 4), None).await);
        assert_eq!(rows[0].opening_balance, dec("30"));
        assert_eq!(rows[0].adjustment, dec("2"));
    }

    /// Unknown materials reject the batch before anything is written
    #[tokio::test]
    async fn test_unknown_material_rejects_batch() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "1");
        store.add_raw_material(flour.clone());

        let result = stock_service(&store)
            .submit(
                period(2024, 1),
                vec![stock_edit(flour.id, "1"), stock_edit(Uuid::new_v4(), "1")],
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(store.list_stock_status(period(2024, 1)).await.unwrap().is_empty());
    }

    /// Empty and duplicate batches are validation errors
    #[tokio::test]
    async fn test_invalid_batches() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "1");
        store.add_raw_material(flour.clone());
        let service = stock_service(&store);

        let empty = service.submit(period(2024, 1), vec![]).await;
        assert!(matches!(empty, Err(AppError::Validation { .. })));

        let duplicate = service
            .submit(
                period(2024, 1),
                vec![stock_edit(flour.id, "1"), stock_edit(flour.id, "2")],
            )
            .await;
        assert!(matches!(duplicate, Err(AppError::Validation { .. })));
    }

    /// A failed load surfaces as an error, never as a table of zeros
    #[tokio::test]
    async fn test_store_unavailable() {
        let store = Arc::new(MemoryLedgerStore::new());
        store.add_raw_material(material("Flour", "1"));
        store.set_unavailable(true);

        let result = stock_service(&store).load(period(2024, 1), None).await;
        assert_err!(&result);
        assert!(matches!(result, Err(AppError::StorageError(_))));
    }

    /// Search narrows by material name or category, case-insensitively
    #[tokio::test]
    async fn test_search_filters_materials() {
        let store = Arc::new(MemoryLedgerStore::new());
        store.add_raw_material(material("Flour", "1"));
        let mut milk = material("Milk", "1");
        milk.category = "Dairy".to_string();
        store.add_raw_material(milk);

        let service = stock_service(&store);
        let rows = assert_ok!(service.load(period(2024, 1), Some("  dAIRY ")).await);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].raw_material_name, "Milk");

        let rows = assert_ok!(service.load(period(2024, 1), Some("   ")).await);
        assert_eq!(rows.len(), 2);
    }

    /// Amounts the ledger cannot hold exactly are rejected before the store
    /// is touched
    #[tokio::test]
    async fn test_unstorable_adjustment_rejected() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "1");
        store.add_raw_material(flour.clone());
        store.set_unavailable(true);
        let service = stock_service(&store);

        for adjustment in ["79228162514264337593543950335", "1000000000000", "0.005"] {
            let result = service
                .submit(period(2024, 1), vec![stock_edit(flour.id, adjustment)])
                .await;
            match result {
                Err(AppError::Validation { field, .. }) => {
                    assert_eq!(field, "edits[0].adjustment")
                }
                other => panic!("expected adjustment validation error, got {:?}", other),
            }
        }

        store.set_unavailable(false);
        assert!(store.list_stock_status(period(2024, 1)).await.unwrap().is_empty());
    }

    /// A closing balance past the ledger range fails that record only
    #[tokio::test]
    async fn test_closing_beyond_ledger_range_is_reported() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "1");
        let sugar = material("Sugar", "1");
        store.add_raw_material(flour.clone());
        store.add_raw_material(sugar.clone());
        record_purchase(&store, flour.id, "1", NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()).await;

        let outcome = assert_ok!(
            stock_service(&store)
                .submit(
                    period(2024, 2),
                    vec![
                        stock_edit(flour.id, "999999999999.99"),
                        stock_edit(sugar.id, "4"),
                    ],
                )
                .await
        );

        assert_eq!(outcome.updated.len(), 1);
        assert_eq!(outcome.updated[0].raw_material_id, sugar.id);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].key.raw_material_id, flour.id);
        assert_eq!(outcome.failed[0].code, "VALIDATION_ERROR");

        let stored = store.list_stock_status(period(2024, 2)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].raw_material_id, sugar.id);
    }

    /// The returned row is the one the store holds
    #[tokio::test]
    async fn test_submitted_row_matches_stored_record() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "10");
        store.add_raw_material(flour.clone());
        record_purchase(&store, flour.id, "12.25", NaiveDate::from_ymd_opt(2024, 9, 9).unwrap()).await;

        let service = stock_service(&store);
        let outcome = assert_ok!(
            service
                .submit(period(2024, 9), vec![stock_edit(flour.id, "-0.75")])
                .await
        );
        let stored = store.list_stock_status(period(2024, 9)).await.unwrap();
        let row = &outcome.updated[0];

        assert_eq!(row.id, Some(stored[0].id));
        assert_eq!(row.closing_balance, stored[0].closing_balance);
        assert_eq!(row.closing_balance, dec("11.5"));

        let next = assert_ok!(service.load(period(2024, 10), None).await);
        assert_eq!(next[0].opening_balance, row.closing_balance);
    }

    /// Level follows the closing balance against the material minimum
    #[tokio::test]
    async fn test_levels_at_thresholds() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "10");
        store.add_raw_material(flour.clone());
        let service = stock_service(&store);

        for (adjustment, level) in [
            ("-1", StockLevel::Out),
            ("0", StockLevel::Out),
            ("9.99", StockLevel::Low),
            ("10", StockLevel::Normal),
        ] {
            let outcome = assert_ok!(
                service
                    .submit(period(2024, 7), vec![stock_edit(flour.id, adjustment)])
                    .await
            );
            assert_eq!(outcome.updated[0].level, Some(level));
        }
    }
}

// ============================================================================
// Production Status
// ============================================================================

#[cfg(test)]
mod production_status_tests {
    use super::*;

    /// assigned, completed and wastage are outflow; pending is not
    #[tokio::test]
    async fn test_production_outflow() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "5");
        let mixing = process("Mixing");
        store.add_raw_material(flour.clone());
        store.add_process(mixing.clone());
        record_purchase(&store, flour.id, "100", NaiveDate::from_ymd_opt(2024, 2, 14).unwrap()).await;

        let edit = ProductionStatusEdit {
            assigned: Some(dec("10")),
            completed: Some(dec("20")),
            wastage: Some(dec("5")),
            pending: Some(dec("50")),
            adjustment: dec("1"),
            ..production_edit(flour.id, mixing.id)
        };

        let service = production_service(&store);
        let outcome = assert_ok!(service.submit(period(2024, 2), vec![edit]).await);
        assert!(outcome.is_complete());
        assert_eq!(outcome.updated[0].closing_balance, dec("66"));

        let march = assert_ok!(service.load(period(2024, 3), None, None).await);
        assert_eq!(march[0].opening_balance, dec("66"));
    }

    /// Absent activity fields keep their stored values
    #[tokio::test]
    async fn test_activity_fields_preserved() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "5");
        let mixing = process("Mixing");
        store.add_raw_material(flour.clone());
        store.add_process(mixing.clone());
        let service = production_service(&store);

        let first = ProductionStatusEdit {
            assigned: Some(dec("4")),
            wastage: Some(dec("1")),
            ..production_edit(flour.id, mixing.id)
        };
        assert_ok!(service.submit(period(2024, 2), vec![first]).await);

        let second = ProductionStatusEdit {
            completed: Some(dec("2")),
            ..production_edit(flour.id, mixing.id)
        };
        let outcome = assert_ok!(service.submit(period(2024, 2), vec![second]).await);
        let row = &outcome.updated[0];
        assert_eq!(row.assigned, dec("4"));
        assert_eq!(row.completed, dec("2"));
        assert_eq!(row.wastage, dec("1"));
        assert_eq!(row.closing_balance, dec("-7"));
        assert_eq!(row.level, Some(StockLevel::Out));
    }

    /// One row per (material, process), narrowed by process
    #[tokio::test]
    async fn test_rows_per_process() {
        let store = Arc::new(MemoryLedgerStore::new());
        let mixing = process("Mixing");
        let baking = process("Baking");
        store.add_raw_material(material("Flour", "1"));
        store.add_raw_material(material("Sugar", "1"));
        store.add_process(mixing.clone());
        store.add_process(baking.clone());
        let service = production_service(&store);

        let all = assert_ok!(service.load(period(2024, 1), None, None).await);
        assert_eq!(all.len(), 4);

        let mixing_rows = assert_ok!(service.load(period(2024, 1), Some(mixing.id), None).await);
        assert_eq!(mixing_rows.len(), 2);
        assert!(mixing_rows.iter().all(|r| r.process_id == mixing.id));

        let by_process_name = assert_ok!(service.load(period(2024, 1), None, Some("bak")).await);
        assert_eq!(by_process_name.len(), 2);

        let unknown = service.load(period(2024, 1), Some(Uuid::new_v4()), None).await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    /// A failed production write is reported without undoing the others
    #[tokio::test]
    async fn test_partial_production_batch() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "1");
        let mixing = process("Mixing");
        let baking = process("Baking");
        store.add_raw_material(flour.clone());
        store.add_process(mixing.clone());
        store.add_process(baking.clone());
        store.fail_production_status_writes_for(flour.id, baking.id);

        let outcome = assert_ok!(
            production_service(&store)
                .submit(
                    period(2024, 1),
                    vec![
                        production_edit(flour.id, baking.id),
                        production_edit(flour.id, mixing.id),
                    ],
                )
                .await
        );
        assert_eq!(outcome.updated.len(), 1);
        assert_eq!(outcome.updated[0].process_id, mixing.id);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].key.process_id, baking.id);
    }

    /// Activity and adjustment amounts outside the ledger range or precision
    /// are rejected before anything is written
    #[tokio::test]
    async fn test_unstorable_production_amounts_rejected() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "1");
        let mixing = process("Mixing");
        store.add_raw_material(flour.clone());
        store.add_process(mixing.clone());
        let service = production_service(&store);

        let huge = ProductionStatusEdit {
            adjustment: dec("79228162514264337593543950335"),
            ..production_edit(flour.id, mixing.id)
        };
        let fine = ProductionStatusEdit {
            wastage: Some(dec("0.001")),
            ..production_edit(flour.id, mixing.id)
        };
        for edit in [huge, fine] {
            let result = service.submit(period(2024, 1), vec![edit]).await;
            assert!(matches!(result, Err(AppError::Validation { .. })));
        }

        assert!(store
            .list_production_status(period(2024, 1))
            .await
            .unwrap()
            .is_empty());
    }

    /// Negative activity amounts are rejected
    #[tokio::test]
    async fn test_negative_activity_rejected() {
        let store = Arc::new(MemoryLedgerStore::new());
        let flour = material("Flour", "1");
        let mixing = process("Mixing");
        store.add_raw_material(flour.clone());
        store.add_process(mixing.clone());

        let edit = ProductionStatusEdit {
            wastage: Some(dec("-1")),
            ..production_edit(flour.id, mixing.id)
        };
        let result = production_service(&store).submit(period(2024, 1), vec![edit]).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Submitted closing balances always equal the shared calculator's result
    #[test]
    fn prop_submitted_closing_matches_calculator(
        purchased in 1i64..100_000,
        adjustment in -100_000i64..100_000,
        utilized in 0i64..100_000,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = Arc::new(MemoryLedgerStore::new());
            let flour = material("Flour", "10");
            store.add_raw_material(flour.clone());
            record_purchase(
                &store,
                flour.id,
                &purchased.to_string(),
                NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
            )
            .await;

            let service = stock_service_with_utilization(&store, &utilized.to_string());
            let outcome = service
                .submit(period(2024, 8), vec![stock_edit(flour.id, &adjustment.to_string())])
                .await
                .unwrap();

            let expected = closing_balance(&BalanceInputs {
                opening_balance: Decimal::ZERO,
                inflow: Decimal::from(purchased),
                outflow: Decimal::from(utilized),
                adjustment: Decimal::from(adjustment),
            })
            .unwrap();
            assert_eq!(outcome.updated[0].closing_balance, expected);
        });
    }
}
