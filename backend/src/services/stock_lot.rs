//! Stock lot service: stock-in receipts, bulk upserts and manual adjustments
//!
//! A lot is the unit of inventory truth: `qty_in` is everything ever
//! received into it and `qty_remaining` is what is still on the shelf.
//! `qty_in - qty_remaining` is frozen sales history and never shrinks.
//! All decrements go through a conditional UPDATE so concurrent sales can
//! never drive a lot negative.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogService;
use shared::ledger::{plan_quantity_adjustment, AdjustmentError, LotQuantities};
use shared::validation::{validate_price, validate_qty};

/// Stock lot service handling receipts and quantity adjustments
#[derive(Clone)]
pub struct StockLotService {
    db: PgPool,
    catalog: CatalogService,
}

/// A stock lot row as returned to clients
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockLot {
    pub lot_id: Uuid,
    pub owner_id: Uuid,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
    pub cp: Decimal,
    pub sp: Decimal,
    pub qty_in: i32,
    pub qty_remaining: i32,
    /// Cumulative sold history, derived as qty_in - qty_remaining
    pub sold: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const LOT_COLUMNS: &str = "lot_id, owner_id, product_id, supplier_id, color_id, size_id, \
     cp, sp, qty_in, qty_remaining, (qty_in - qty_remaining) AS sold, notes, created_at, updated_at";

#[derive(Debug, Deserialize)]
pub struct StockInInput {
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
    pub cp: Decimal,
    pub sp: Decimal,
    pub qty: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VariantSizeEntry {
    pub size_id: Uuid,
    pub qty_in: i32,
}

#[derive(Debug, Deserialize)]
pub struct VariantEntry {
    pub color_id: Uuid,
    pub sizes: Vec<VariantSizeEntry>,
}

/// One product/supplier restock across a color x size matrix,
/// with shared prices and notes
#[derive(Debug, Deserialize)]
pub struct BulkUpsertInput {
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub cp: Decimal,
    pub sp: Decimal,
    pub notes: Option<String>,
    pub variants: Vec<VariantEntry>,
}

#[derive(Debug, Serialize)]
pub struct BulkUpsertResult {
    pub created: Vec<StockLot>,
    pub updated: Vec<StockLot>,
}

/// All fields optional; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct AdjustLotInput {
    pub qty_in: Option<i32>,
    pub qty_remaining: Option<i32>,
    pub cp: Option<Decimal>,
    pub sp: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LotFilter {
    pub product_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    /// Only lots with qty_remaining > 0
    pub in_stock: Option<bool>,
}

impl StockLotService {
    /// Create a new StockLotService instance
    pub fn new(db: PgPool) -> Self {
        let catalog = CatalogService::new(db.clone());
        Self { db, catalog }
    }

    /// Receive a new lot of stock.
    ///
    /// For fully-variant lots (both color and size set) the variant key is
    /// unique per product/supplier and a duplicate receipt is rejected;
    /// variant-less receipts always open a fresh lot.
    pub async fn stock_in(&self, owner_id: Uuid, input: StockInInput) -> AppResult<StockLot> {
        validate_qty(input.qty).map_err(|m| AppError::validation("qty", m))?;
        validate_price(input.cp).map_err(|m| AppError::validation("price", m))?;
        validate_price(input.sp).map_err(|m| AppError::validation("price", m))?;

        self.catalog.ensure_product(owner_id, input.product_id).await?;
        self.catalog.ensure_supplier(owner_id, input.supplier_id).await?;
        if let Some(color_id) = input.color_id {
            self.catalog.ensure_colors(owner_id, &[color_id]).await?;
        }
        if let Some(size_id) = input.size_id {
            self.catalog.ensure_sizes(owner_id, &[size_id]).await?;
        }

        let result = sqlx::query_as::<_, StockLot>(&format!(
            r#"
            INSERT INTO stock_lots
                (owner_id, product_id, supplier_id, color_id, size_id, cp, sp, qty_in, qty_remaining, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9)
            RETURNING {LOT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(input.product_id)
        .bind(input.supplier_id)
        .bind(input.color_id)
        .bind(input.size_id)
        .bind(input.cp)
        .bind(input.sp)
        .bind(input.qty)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(lot) => {
                tracing::info!(lot_id = %lot.lot_id, qty = lot.qty_in, "stock received");
                Ok(lot)
            }
            Err(e) if is_unique_violation(&e) => Err(AppError::LotAlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Bulk receipt of fully-variant lots in one transaction.
    ///
    /// Existing variant keys accumulate quantity and take the latest prices;
    /// unseen keys create new lots. The whole batch is validated before any
    /// row is written so a bad entry leaves the ledger untouched.
    pub async fn bulk_upsert(
        &self,
        owner_id: Uuid,
        input: BulkUpsertInput,
    ) -> AppResult<BulkUpsertResult> {
        validate_price(input.cp).map_err(|m| AppError::validation("price", m))?;
        validate_price(input.sp).map_err(|m| AppError::validation("price", m))?;

        let entries = flatten_variant_matrix(&input.variants)?;

        self.catalog.ensure_product(owner_id, input.product_id).await?;
        self.catalog.ensure_supplier(owner_id, input.supplier_id).await?;

        let mut color_ids: Vec<Uuid> = entries.iter().map(|(c, _, _)| *c).collect();
        let mut size_ids: Vec<Uuid> = entries.iter().map(|(_, s, _)| *s).collect();
        color_ids.sort();
        color_ids.dedup();
        size_ids.sort();
        size_ids.dedup();
        self.catalog.ensure_colors(owner_id, &color_ids).await?;
        self.catalog.ensure_sizes(owner_id, &size_ids).await?;

        let mut tx = self.db.begin().await?;

        let mut created = Vec::new();
        let mut updated = Vec::new();

        for (color_id, size_id, qty_in) in &entries {
            // xmax = 0 only on freshly inserted rows, so it tells insert
            // apart from conflict-update.
            let (lot, inserted) = sqlx::query_as::<_, LotWithInserted>(&format!(
                r#"
                INSERT INTO stock_lots
                    (owner_id, product_id, supplier_id, color_id, size_id, cp, sp, qty_in, qty_remaining, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9)
                ON CONFLICT (product_id, supplier_id, color_id, size_id)
                    WHERE color_id IS NOT NULL AND size_id IS NOT NULL
                DO UPDATE SET
                    qty_in        = stock_lots.qty_in + EXCLUDED.qty_in,
                    qty_remaining = stock_lots.qty_remaining + EXCLUDED.qty_remaining,
                    cp            = EXCLUDED.cp,
                    sp            = EXCLUDED.sp,
                    notes         = COALESCE(EXCLUDED.notes, stock_lots.notes),
                    updated_at    = now()
                RETURNING {LOT_COLUMNS}, (xmax = 0) AS inserted
                "#
            ))
            .bind(owner_id)
            .bind(input.product_id)
            .bind(input.supplier_id)
            .bind(color_id)
            .bind(size_id)
            .bind(input.cp)
            .bind(input.sp)
            .bind(qty_in)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await
            .map(|row| (row.lot, row.inserted))?;

            if inserted {
                created.push(lot);
            } else {
                updated.push(lot);
            }
        }

        tx.commit().await?;

        tracing::info!(
            created = created.len(),
            updated = updated.len(),
            "bulk stock upsert applied"
        );

        Ok(BulkUpsertResult { created, updated })
    }

    /// Manually adjust a lot's quantities, prices or notes.
    ///
    /// Quantity changes go through the shared adjustment planner so the
    /// sold history can grow (recording shrinkage) but never shrink.
    pub async fn adjust_lot(
        &self,
        owner_id: Uuid,
        lot_id: Uuid,
        input: AdjustLotInput,
    ) -> AppResult<StockLot> {
        if let Some(cp) = input.cp {
            validate_price(cp).map_err(|m| AppError::validation("price", m))?;
        }
        if let Some(sp) = input.sp {
            validate_price(sp).map_err(|m| AppError::validation("price", m))?;
        }

        let mut tx = self.db.begin().await?;

        let current = sqlx::query_as::<_, LotQuantityRow>(
            "SELECT qty_in, qty_remaining FROM stock_lots
             WHERE lot_id = $1 AND owner_id = $2
             FOR UPDATE",
        )
        .bind(lot_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Lot"))?;

        let planned = plan_quantity_adjustment(
            LotQuantities {
                qty_in: current.qty_in,
                qty_remaining: current.qty_remaining,
            },
            input.qty_in,
            input.qty_remaining,
        )
        .map_err(adjustment_error)?;

        let lot = sqlx::query_as::<_, StockLot>(&format!(
            r#"
            UPDATE stock_lots SET
                qty_in        = $3,
                qty_remaining = $4,
                cp            = COALESCE($5, cp),
                sp            = COALESCE($6, sp),
                notes         = COALESCE($7, notes),
                updated_at    = now()
            WHERE lot_id = $1 AND owner_id = $2
            RETURNING {LOT_COLUMNS}
            "#
        ))
        .bind(lot_id)
        .bind(owner_id)
        .bind(planned.qty_in)
        .bind(planned.qty_remaining)
        .bind(input.cp)
        .bind(input.sp)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(lot_id = %lot_id, qty_in = lot.qty_in, qty_remaining = lot.qty_remaining, "lot adjusted");

        Ok(lot)
    }

    pub async fn get_lot(&self, owner_id: Uuid, lot_id: Uuid) -> AppResult<StockLot> {
        sqlx::query_as::<_, StockLot>(&format!(
            "SELECT {LOT_COLUMNS} FROM stock_lots WHERE lot_id = $1 AND owner_id = $2"
        ))
        .bind(lot_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Lot"))
    }

    pub async fn list_lots(&self, owner_id: Uuid, filter: LotFilter) -> AppResult<Vec<StockLot>> {
        let lots = sqlx::query_as::<_, StockLot>(&format!(
            r#"
            SELECT {LOT_COLUMNS} FROM stock_lots
            WHERE owner_id = $1
              AND ($2::uuid IS NULL OR product_id = $2)
              AND ($3::uuid IS NULL OR supplier_id = $3)
              AND (NOT $4 OR qty_remaining > 0)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(filter.product_id)
        .bind(filter.supplier_id)
        .bind(filter.in_stock.unwrap_or(false))
        .fetch_all(&self.db)
        .await?;

        Ok(lots)
    }

    /// Per-product totals across all lots
    pub async fn stock_summary(&self, owner_id: Uuid) -> AppResult<Vec<ProductStockSummary>> {
        let summary = sqlx::query_as::<_, ProductStockSummary>(
            r#"
            SELECT l.product_id, p.product_name,
                   COUNT(*) AS lots,
                   COALESCE(SUM(l.qty_in), 0) AS qty_in,
                   COALESCE(SUM(l.qty_remaining), 0) AS qty_remaining,
                   COALESCE(SUM(l.qty_in - l.qty_remaining), 0) AS sold
            FROM stock_lots l
            JOIN products p ON p.product_id = l.product_id
            WHERE l.owner_id = $1
            GROUP BY l.product_id, p.product_name
            ORDER BY p.product_name
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(summary)
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct ProductStockSummary {
    pub product_id: Uuid,
    pub product_name: String,
    pub lots: i64,
    pub qty_in: i64,
    pub qty_remaining: i64,
    pub sold: i64,
}

/// Atomically take `qty` units out of a lot inside a caller-owned transaction.
///
/// The guard `qty_remaining >= qty` rides on the UPDATE itself, so two
/// concurrent sales can never jointly oversell a lot: the loser of the race
/// matches zero rows and the sale aborts with STOCK_NOT_ENOUGH.
pub(crate) async fn try_decrement(
    conn: &mut PgConnection,
    owner_id: Uuid,
    lot_id: Uuid,
    qty: i32,
) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE stock_lots
         SET qty_remaining = qty_remaining - $3, updated_at = now()
         WHERE lot_id = $1 AND owner_id = $2 AND qty_remaining >= $3",
    )
    .bind(lot_id)
    .bind(owner_id)
    .bind(qty)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available = sqlx::query_scalar::<_, i32>(
            "SELECT qty_remaining FROM stock_lots WHERE lot_id = $1 AND owner_id = $2",
        )
        .bind(lot_id)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?;

        return match available {
            Some(available) => Err(AppError::StockNotEnough {
                requested: qty,
                available,
            }),
            None => Err(AppError::not_found("Lot")),
        };
    }

    Ok(())
}

/// Put `qty` units back into a lot (good-condition customer return).
///
/// The qty_remaining <= qty_in bound holds because a return can never exceed
/// what was sold out of the lot; the CHECK constraint backstops it anyway.
pub(crate) async fn restock(
    conn: &mut PgConnection,
    owner_id: Uuid,
    lot_id: Uuid,
    qty: i32,
) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE stock_lots
         SET qty_remaining = qty_remaining + $3, updated_at = now()
         WHERE lot_id = $1 AND owner_id = $2",
    )
    .bind(lot_id)
    .bind(owner_id)
    .bind(qty)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Lot"));
    }

    Ok(())
}

#[derive(FromRow)]
struct LotQuantityRow {
    qty_in: i32,
    qty_remaining: i32,
}

#[derive(FromRow)]
struct LotWithInserted {
    #[sqlx(flatten)]
    lot: StockLot,
    inserted: bool,
}

fn adjustment_error(e: AdjustmentError) -> AppError {
    match e {
        AdjustmentError::QtyInBelowSold { sold } => AppError::QtyInBelowSold { sold },
        AdjustmentError::RemainingExceedsIn => AppError::QtyRemainingExceedsQtyIn,
        AdjustmentError::SoldHistoryShrunk { sold, new_sold } => {
            AppError::SoldHistoryInvalid { sold, new_sold }
        }
        AdjustmentError::NegativeQuantity => {
            AppError::validation("qty", "quantity must be an integer >= 0")
        }
    }
}

/// Detect PostgreSQL unique constraint violations (SQLSTATE 23505)
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Flatten a color x size matrix into (color_id, size_id, qty_in) rows.
///
/// Rejects non-positive quantities and in-request duplicate keys, and sorts
/// by key so concurrent batches touching the same variants take their row
/// locks in the same order.
fn flatten_variant_matrix(variants: &[VariantEntry]) -> AppResult<Vec<(Uuid, Uuid, i32)>> {
    let mut entries: Vec<(Uuid, Uuid, i32)> = Vec::new();
    for variant in variants {
        for size in &variant.sizes {
            validate_qty(size.qty_in).map_err(|m| AppError::validation("qty_in", m))?;
            let key = (variant.color_id, size.size_id);
            if entries.iter().any(|(c, s, _)| (*c, *s) == key) {
                return Err(AppError::validation(
                    "variants",
                    "duplicate color/size key within batch",
                ));
            }
            entries.push((variant.color_id, size.size_id, size.qty_in));
        }
    }
    if entries.is_empty() {
        return Err(AppError::validation("variants", "at least one variant is required"));
    }

    entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    Ok(entries)
}
