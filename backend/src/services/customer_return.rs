//! Customer return service
//!
//! Returns unwind part of a sale: the sale total drops by the value of the
//! returned units (priced at the sale-time sp snapshot), overpayment becomes
//! a refund, and good-condition units go back into their lot. The per-item
//! `returned_qty` counter is the source of truth for how much of a line has
//! already come back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock_lot::restock;
use shared::ledger::settle_return;
use shared::types::ReturnCondition;
use shared::validation::validate_qty;

/// Customer return service
#[derive(Clone)]
pub struct CustomerReturnService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerReturn {
    pub return_id: Uuid,
    pub owner_id: Uuid,
    pub sales_id: Uuid,
    pub refund_amount: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerReturnItem {
    pub return_item_id: Uuid,
    pub return_id: Uuid,
    pub sales_item_id: Uuid,
    pub lot_id: Uuid,
    pub qty: i32,
    pub condition: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CustomerReturnWithItems {
    #[serde(flatten)]
    pub r#return: CustomerReturn,
    pub items: Vec<CustomerReturnItem>,
    /// Sale amounts after settlement
    pub sale_total_amount: Decimal,
    pub sale_paid_amount: Decimal,
    pub sale_payment_status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReturnItemInput {
    pub sales_item_id: Uuid,
    pub qty: i32,
    pub condition: ReturnCondition,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReturnInput {
    pub sales_id: Uuid,
    pub items: Vec<ReturnItemInput>,
    pub note: Option<String>,
}

impl CustomerReturnService {
    /// Create a new CustomerReturnService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a customer return against a sale, atomically.
    ///
    /// Each line is capped at `qty - returned_qty` of its sale item. The
    /// guard rides on the UPDATE of `returned_qty`, so two overlapping
    /// returns of the same line cannot jointly exceed what was sold.
    pub async fn create_return(
        &self,
        owner_id: Uuid,
        input: CreateReturnInput,
    ) -> AppResult<CustomerReturnWithItems> {
        if input.items.is_empty() {
            return Err(AppError::validation("items", "at least one item is required"));
        }
        for item in &input.items {
            validate_qty(item.qty).map_err(|m| AppError::validation("qty", m))?;
        }

        let mut tx = self.db.begin().await?;

        // Lock the sale so settlement serializes with payments and other returns
        let sale = sqlx::query_as::<_, SaleAmountsRow>(
            "SELECT total_amount, paid_amount FROM sales
             WHERE sales_id = $1 AND owner_id = $2
             FOR UPDATE",
        )
        .bind(input.sales_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Sale"))?;

        let return_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO customer_returns (owner_id, sales_id, note)
             VALUES ($1, $2, $3) RETURNING return_id",
        )
        .bind(owner_id)
        .bind(input.sales_id)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await?;

        let mut return_value = Decimal::ZERO;
        let mut items = Vec::with_capacity(input.items.len());

        for item in &input.items {
            let line = sqlx::query_as::<_, SaleItemRow>(
                "SELECT lot_id, qty, returned_qty, sp FROM sales_items
                 WHERE sales_item_id = $1 AND sales_id = $2
                 FOR UPDATE",
            )
            .bind(item.sales_item_id)
            .bind(input.sales_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Sale item"))?;

            let available = line.qty - line.returned_qty;
            if item.qty > available {
                return Err(AppError::ReturnExceedsSold {
                    sold: line.qty,
                    returned: line.returned_qty,
                    available,
                });
            }

            sqlx::query(
                "UPDATE sales_items SET returned_qty = returned_qty + $2
                 WHERE sales_item_id = $1",
            )
            .bind(item.sales_item_id)
            .bind(item.qty)
            .execute(&mut *tx)
            .await?;

            // Damaged units are written off, not resold
            if item.condition == ReturnCondition::Good {
                restock(&mut tx, owner_id, line.lot_id, item.qty).await?;
            }

            return_value += line.sp * Decimal::from(item.qty);

            let row = sqlx::query_as::<_, CustomerReturnItem>(
                r#"
                INSERT INTO customer_return_items (return_id, sales_item_id, lot_id, qty, condition, note)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING return_item_id, return_id, sales_item_id, lot_id, qty, condition, note, created_at
                "#,
            )
            .bind(return_id)
            .bind(item.sales_item_id)
            .bind(line.lot_id)
            .bind(item.qty)
            .bind(item.condition.as_str())
            .bind(&item.note)
            .fetch_one(&mut *tx)
            .await?;

            items.push(row);
        }

        let settlement = settle_return(sale.total_amount, sale.paid_amount, return_value);

        sqlx::query(
            "UPDATE sales SET total_amount = $2, paid_amount = $3, payment_status = $4
             WHERE sales_id = $1",
        )
        .bind(input.sales_id)
        .bind(settlement.new_total)
        .bind(settlement.new_paid)
        .bind(settlement.status.as_str())
        .execute(&mut *tx)
        .await?;

        let r#return = sqlx::query_as::<_, CustomerReturn>(
            "UPDATE customer_returns SET refund_amount = $2
             WHERE return_id = $1
             RETURNING return_id, owner_id, sales_id, refund_amount, note, created_at",
        )
        .bind(return_id)
        .bind(settlement.refund)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            return_id = %return_id,
            sales_id = %input.sales_id,
            refund = %settlement.refund,
            "customer return settled"
        );

        Ok(CustomerReturnWithItems {
            r#return,
            items,
            sale_total_amount: settlement.new_total,
            sale_paid_amount: settlement.new_paid,
            sale_payment_status: settlement.status.as_str().to_string(),
        })
    }

    pub async fn get_return(&self, owner_id: Uuid, return_id: Uuid) -> AppResult<CustomerReturnWithItems> {
        let r#return = sqlx::query_as::<_, CustomerReturn>(
            "SELECT return_id, owner_id, sales_id, refund_amount, note, created_at
             FROM customer_returns WHERE return_id = $1 AND owner_id = $2",
        )
        .bind(return_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Return"))?;

        let items = sqlx::query_as::<_, CustomerReturnItem>(
            "SELECT return_item_id, return_id, sales_item_id, lot_id, qty, condition, note, created_at
             FROM customer_return_items WHERE return_id = $1 ORDER BY created_at",
        )
        .bind(return_id)
        .fetch_all(&self.db)
        .await?;

        let sale = sqlx::query_as::<_, SaleStatusRow>(
            "SELECT total_amount, paid_amount, payment_status FROM sales WHERE sales_id = $1",
        )
        .bind(r#return.sales_id)
        .fetch_one(&self.db)
        .await?;

        Ok(CustomerReturnWithItems {
            r#return,
            items,
            sale_total_amount: sale.total_amount,
            sale_paid_amount: sale.paid_amount,
            sale_payment_status: sale.payment_status,
        })
    }

    pub async fn list_returns(&self, owner_id: Uuid) -> AppResult<Vec<CustomerReturn>> {
        let returns = sqlx::query_as::<_, CustomerReturn>(
            "SELECT return_id, owner_id, sales_id, refund_amount, note, created_at
             FROM customer_returns WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(returns)
    }
}

#[derive(FromRow)]
struct SaleAmountsRow {
    total_amount: Decimal,
    paid_amount: Decimal,
}

#[derive(FromRow)]
struct SaleItemRow {
    lot_id: Uuid,
    qty: i32,
    returned_qty: i32,
    sp: Decimal,
}

#[derive(FromRow)]
struct SaleStatusRow {
    total_amount: Decimal,
    paid_amount: Decimal,
    payment_status: String,
}
