//! Postgres adapter for the ledger store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    Period, Process, ProcessType, ProductionActivity, ProductionStatusRecord,
    ProductionStatusWrite, PurchaseFilter, RawMaterial, StockPurchase, StockStatusRecord,
    StockStatusWrite, ValidPurchase,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::LedgerStore;
use crate::error::{AppError, AppResult};

/// Ledger store backed by the hosted Postgres database
#[derive(Clone)]
pub struct PgLedgerStore {
    db: PgPool,
}

impl PgLedgerStore {
    /// Create a new PgLedgerStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Row for raw material queries
#[derive(Debug, FromRow)]
struct RawMaterialRow {
    id: Uuid,
    name: String,
    category: String,
    unit: String,
    current_stock: Decimal,
    min_stock: Decimal,
}

impl From<RawMaterialRow> for RawMaterial {
    fn from(row: RawMaterialRow) -> Self {
        RawMaterial {
            id: row.id,
            name: row.name,
            category: row.category,
            unit: row.unit,
            current_stock: row.current_stock,
            min_stock: row.min_stock,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProcessRow {
    id: Uuid,
    name: String,
    process_type: String,
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: Uuid,
    vendor: String,
    raw_material_id: Uuid,
    quantity: Decimal,
    purchase_date: NaiveDate,
}

impl From<PurchaseRow> for StockPurchase {
    fn from(row: PurchaseRow) -> Self {
        StockPurchase {
            id: row.id,
            vendor: row.vendor,
            raw_material_id: row.raw_material_id,
            quantity: row.quantity,
            purchase_date: row.purchase_date,
        }
    }
}

#[derive(Debug, FromRow)]
struct StockStatusRow {
    id: Uuid,
    raw_material_id: Uuid,
    year: i32,
    month: i16,
    opening_balance: Decimal,
    opening_overridden: bool,
    purchases: Decimal,
    utilized: Decimal,
    adjustment: Decimal,
    closing_balance: Decimal,
    min_level: Decimal,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ProductionStatusRow {
    id: Uuid,
    raw_material_id: Uuid,
    process_id: Uuid,
    year: i32,
    month: i16,
    opening_balance: Decimal,
    assigned: Decimal,
    completed: Decimal,
    wastage: Decimal,
    pending: Decimal,
    adjustment: Decimal,
    closing_balance: Decimal,
    min_level: Decimal,
    updated_at: DateTime<Utc>,
}

fn stored_period(year: i32, month: i16) -> AppResult<Period> {
    let month = u32::try_from(month)
        .map_err(|_| AppError::Internal(format!("Stored month {} is negative", month)))?;
    Period::new(year, month).map_err(|e| AppError::Internal(format!("Stored period: {}", e)))
}

fn month_column(period: Period) -> i16 {
    // Period guarantees 1..=12
    period.month() as i16
}

impl TryFrom<StockStatusRow> for StockStatusRecord {
    type Error = AppError;

    fn try_from(row: StockStatusRow) -> AppResult<Self> {
        Ok(StockStatusRecord {
            id: row.id,
            raw_material_id: row.raw_material_id,
            period: stored_period(row.year, row.month)?,
            opening_balance: row.opening_balance,
            opening_overridden: row.opening_overridden,
            purchases: row.purchases,
            utilized: row.utilized,
            adjustment: row.adjustment,
            closing_balance: row.closing_balance,
            min_level: row.min_level,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ProductionStatusRow> for ProductionStatusRecord {
    type Error = AppError;

    fn try_from(row: ProductionStatusRow) -> AppResult<Self> {
        Ok(ProductionStatusRecord {
            id: row.id,
            raw_material_id: row.raw_material_id,
            process_id: row.process_id,
            period: stored_period(row.year, row.month)?,
            opening_balance: row.opening_balance,
            activity: ProductionActivity {
                assigned: row.assigned,
                completed: row.completed,
                wastage: row.wastage,
                pending: row.pending,
            },
            adjustment: row.adjustment,
            closing_balance: row.closing_balance,
            min_level: row.min_level,
            updated_at: row.updated_at,
        })
    }
}

const STOCK_STATUS_COLUMNS: &str = "id, raw_material_id, year, month, opening_balance, \
     opening_overridden, purchases, utilized, adjustment, closing_balance, min_level, updated_at";

const PRODUCTION_STATUS_COLUMNS: &str = "id, raw_material_id, process_id, year, month, \
     opening_balance, assigned, completed, wastage, pending, adjustment, closing_balance, \
     min_level, updated_at";

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn list_raw_materials(&self) -> AppResult<Vec<RawMaterial>> {
        let rows = sqlx::query_as::<_, RawMaterialRow>(
            r#"
            SELECT id, name, category, unit, current_stock, min_stock
            FROM raw_materials
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(RawMaterial::from).collect())
    }

    async fn get_raw_material(&self, id: Uuid) -> AppResult<Option<RawMaterial>> {
        let row = sqlx::query_as::<_, RawMaterialRow>(
            r#"
            SELECT id, name, category, unit, current_stock, min_stock
            FROM raw_materials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(RawMaterial::from))
    }

    async fn list_processes(&self) -> AppResult<Vec<Process>> {
        let rows = sqlx::query_as::<_, ProcessRow>(
            "SELECT id, name, process_type FROM processes ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let process_type = row
                    .process_type
                    .parse::<ProcessType>()
                    .map_err(AppError::Internal)?;
                Ok(Process {
                    id: row.id,
                    name: row.name,
                    process_type,
                })
            })
            .collect()
    }

    async fn list_purchases(&self, filter: &PurchaseFilter) -> AppResult<Vec<StockPurchase>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, vendor, raw_material_id, quantity, purchase_date
            FROM stock_purchases
            WHERE ($1::uuid IS NULL OR raw_material_id = $1)
              AND ($2::date IS NULL OR purchase_date >= $2)
              AND ($3::date IS NULL OR purchase_date <= $3)
            ORDER BY purchase_date ASC, created_at ASC
            "#,
        )
        .bind(filter.raw_material_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StockPurchase::from).collect())
    }

    async fn insert_purchase(&self, purchase: &ValidPurchase) -> AppResult<StockPurchase> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            INSERT INTO stock_purchases (vendor, raw_material_id, quantity, purchase_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, vendor, raw_material_id, quantity, purchase_date
            "#,
        )
        .bind(&purchase.vendor)
        .bind(purchase.raw_material_id)
        .bind(purchase.quantity)
        .bind(purchase.purchase_date)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn list_stock_status(&self, period: Period) -> AppResult<Vec<StockStatusRecord>> {
        let rows = sqlx::query_as::<_, StockStatusRow>(&format!(
            "SELECT {} FROM stock_status WHERE year = $1 AND month = $2",
            STOCK_STATUS_COLUMNS
        ))
        .bind(period.year())
        .bind(month_column(period))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(StockStatusRecord::try_from).collect()
    }

    async fn upsert_stock_status(&self, write: &StockStatusWrite) -> AppResult<StockStatusRecord> {
        let row = sqlx::query_as::<_, StockStatusRow>(&format!(
            r#"
            INSERT INTO stock_status (
                raw_material_id, year, month, opening_balance, opening_overridden,
                purchases, utilized, adjustment, closing_balance, min_level
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (raw_material_id, year, month) DO UPDATE
            SET opening_balance = EXCLUDED.opening_balance,
                opening_overridden = EXCLUDED.opening_overridden,
                purchases = EXCLUDED.purchases,
                utilized = EXCLUDED.utilized,
                adjustment = EXCLUDED.adjustment,
                closing_balance = EXCLUDED.closing_balance,
                min_level = EXCLUDED.min_level,
                updated_at = NOW()
            RETURNING {}
            "#,
            STOCK_STATUS_COLUMNS
        ))
        .bind(write.raw_material_id)
        .bind(write.period.year())
        .bind(month_column(write.period))
        .bind(write.opening_balance)
        .bind(write.opening_overridden)
        .bind(write.purchases)
        .bind(write.utilized)
        .bind(write.adjustment)
        .bind(write.closing_balance)
        .bind(write.min_level)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn list_production_status(
        &self,
        period: Period,
    ) -> AppResult<Vec<ProductionStatusRecord>> {
        let rows = sqlx::query_as::<_, ProductionStatusRow>(&format!(
            "SELECT {} FROM production_status WHERE year = $1 AND month = $2",
            PRODUCTION_STATUS_COLUMNS
        ))
        .bind(period.year())
        .bind(month_column(period))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ProductionStatusRecord::try_from).collect()
    }

    async fn upsert_production_status(
        &self,
        write: &ProductionStatusWrite,
    ) -> AppResult<ProductionStatusRecord> {
        let row = sqlx::query_as::<_, ProductionStatusRow>(&format!(
            r#"
            INSERT INTO production_status (
                raw_material_id, process_id, year, month, opening_balance,
                assigned, completed, wastage, pending, adjustment, closing_balance, min_level
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (raw_material_id, process_id, year, month) DO UPDATE
            SET opening_balance = EXCLUDED.opening_balance,
                assigned = EXCLUDED.assigned,
                completed = EXCLUDED.completed,
                wastage = EXCLUDED.wastage,
                pending = EXCLUDED.pending,
                adjustment = EXCLUDED.adjustment,
                closing_balance = EXCLUDED.closing_balance,
                min_level = EXCLUDED.min_level,
                updated_at = NOW()
            RETURNING {}
            "#,
            PRODUCTION_STATUS_COLUMNS
        ))
        .bind(write.raw_material_id)
        .bind(write.process_id)
        .bind(write.period.year())
        .bind(month_column(write.period))
        .bind(write.opening_balance)
        .bind(write.activity.assigned)
        .bind(write.activity.completed)
        .bind(write.activity.wastage)
        .bind(write.activity.pending)
        .bind(write.adjustment)
        .bind(write.closing_balance)
        .bind(write.min_level)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
