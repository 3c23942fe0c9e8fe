//! Sales service: stock-out, payments and billing
//!
//! A sale is the only path that takes stock out of lots in the normal flow.
//! Everything inside `create_sale` happens in one transaction: either every
//! line decrements its lot and the sale header is written, or nothing is.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock_lot::try_decrement;
use shared::ledger::{apply_payment, derive_payment_status, credit_remaining, PaymentError};
use shared::types::PaymentStatus;
use shared::validation::{
    validate_name, validate_paid_amount, validate_phone, validate_price, validate_qty,
};

/// Sales service handling stock-out, payments and bill generation
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub sales_id: Uuid,
    pub owner_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleItem {
    pub sales_item_id: Uuid,
    pub sales_id: Uuid,
    pub product_id: Uuid,
    pub lot_id: Uuid,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
    pub qty: i32,
    pub cp: Decimal,
    pub sp: Decimal,
    pub line_total: Decimal,
    pub returned_qty: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub customer_id: Uuid,
    pub owner_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerInput {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaleItemInput {
    pub product_id: Uuid,
    pub lot_id: Uuid,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
    pub qty: i32,
    /// Negotiated unit price; defaults to the lot's current sp
    pub sp: Option<Decimal>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    /// Existing customer, or none for a walk-in cash sale
    pub customer_id: Option<Uuid>,
    /// Inline customer details; matched by phone or created on the fly
    pub customer: Option<CustomerInput>,
    pub items: Vec<SaleItemInput>,
    #[serde(default)]
    pub paid_amount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddPaymentInput {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Bill {
    pub sales_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub customer: Option<Customer>,
    pub items: Vec<BillLine>,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub credit_amount: Decimal,
    pub payment_status: String,
}

#[derive(Debug, Serialize)]
pub struct BillLine {
    pub product_name: String,
    pub color_name: Option<String>,
    pub size_name: Option<String>,
    pub qty: i32,
    pub returned_qty: i32,
    /// Units the customer keeps after returns
    pub effective_qty: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a sale: decrement each lot, snapshot prices, derive status.
    ///
    /// Lot decrements use the guarded UPDATE, so losing a concurrent race
    /// over the last units aborts the whole sale with STOCK_NOT_ENOUGH.
    pub async fn create_sale(&self, owner_id: Uuid, input: CreateSaleInput) -> AppResult<SaleWithItems> {
        if input.items.is_empty() {
            return Err(AppError::validation("items", "at least one item is required"));
        }
        for item in &input.items {
            validate_qty(item.qty).map_err(|m| AppError::validation("qty", m))?;
            if let Some(sp) = item.sp {
                validate_price(sp).map_err(|m| AppError::validation("sp", m))?;
            }
        }
        validate_paid_amount(input.paid_amount)
            .map_err(|m| AppError::validation("paid_amount", m))?;

        let mut tx = self.db.begin().await?;

        let customer_id = self
            .resolve_customer(&mut tx, owner_id, input.customer_id, input.customer)
            .await?;

        // Header first so item rows have a parent; totals patched at the end.
        let sales_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO sales (owner_id, customer_id, note) VALUES ($1, $2, $3) RETURNING sales_id",
        )
        .bind(owner_id)
        .bind(customer_id)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await?;

        let mut total = Decimal::ZERO;
        let mut items = Vec::with_capacity(input.items.len());

        for item in &input.items {
            let lot = sqlx::query_as::<_, SaleLotRow>(
                "SELECT product_id, color_id, size_id, cp, sp
                 FROM stock_lots WHERE lot_id = $1 AND owner_id = $2",
            )
            .bind(item.lot_id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Lot"))?;

            // The requested product/variant must be the lot's own
            if lot.product_id != item.product_id
                || lot.color_id != item.color_id
                || lot.size_id != item.size_id
            {
                return Err(AppError::validation(
                    "lot_id",
                    "lot does not match the requested product/variant",
                ));
            }

            try_decrement(&mut tx, owner_id, item.lot_id, item.qty).await?;

            let sp = item.sp.unwrap_or(lot.sp);
            let line_total = sp * Decimal::from(item.qty);
            total += line_total;

            let row = sqlx::query_as::<_, SaleItem>(
                r#"
                INSERT INTO sales_items
                    (sales_id, product_id, lot_id, color_id, size_id, qty, cp, sp, line_total, note)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING sales_item_id, sales_id, product_id, lot_id, color_id, size_id,
                          qty, cp, sp, line_total, returned_qty, note, created_at
                "#,
            )
            .bind(sales_id)
            .bind(lot.product_id)
            .bind(item.lot_id)
            .bind(lot.color_id)
            .bind(lot.size_id)
            .bind(item.qty)
            .bind(lot.cp)
            .bind(sp)
            .bind(line_total)
            .bind(&item.note)
            .fetch_one(&mut *tx)
            .await?;

            items.push(row);
        }

        if input.paid_amount > total {
            return Err(AppError::PaidExceedsTotal);
        }
        let status = derive_payment_status(input.paid_amount, total);

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET total_amount = $2, paid_amount = $3, payment_status = $4
            WHERE sales_id = $1
            RETURNING sales_id, owner_id, customer_id, total_amount, paid_amount,
                      payment_status, note, created_at
            "#,
        )
        .bind(sales_id)
        .bind(total)
        .bind(input.paid_amount)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            sales_id = %sale.sales_id,
            total = %sale.total_amount,
            status = %sale.payment_status,
            "sale recorded"
        );

        Ok(SaleWithItems { sale, items })
    }

    /// Record an additional payment against an open sale
    pub async fn add_payment(
        &self,
        owner_id: Uuid,
        sales_id: Uuid,
        input: AddPaymentInput,
    ) -> AppResult<Sale> {
        let mut tx = self.db.begin().await?;

        // Lock the row so two concurrent payments serialize
        let current = sqlx::query_as::<_, SaleAmountsRow>(
            "SELECT total_amount, paid_amount FROM sales
             WHERE sales_id = $1 AND owner_id = $2
             FOR UPDATE",
        )
        .bind(sales_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Sale"))?;

        let (new_paid, status) =
            apply_payment(current.total_amount, current.paid_amount, input.amount)
                .map_err(|e| match e {
                    PaymentError::AmountNotPositive => {
                        AppError::validation("amount", "must be a positive number")
                    }
                    PaymentError::ExceedsTotal => AppError::PaymentExceedsTotal,
                })?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales SET paid_amount = $3, payment_status = $4
            WHERE sales_id = $1 AND owner_id = $2
            RETURNING sales_id, owner_id, customer_id, total_amount, paid_amount,
                      payment_status, note, created_at
            "#,
        )
        .bind(sales_id)
        .bind(owner_id)
        .bind(new_paid)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(sales_id = %sales_id, paid = %sale.paid_amount, "payment recorded");

        Ok(sale)
    }

    pub async fn get_sale(&self, owner_id: Uuid, sales_id: Uuid) -> AppResult<SaleWithItems> {
        let sale = sqlx::query_as::<_, Sale>(
            "SELECT sales_id, owner_id, customer_id, total_amount, paid_amount,
                    payment_status, note, created_at
             FROM sales WHERE sales_id = $1 AND owner_id = $2",
        )
        .bind(sales_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Sale"))?;

        let items = self.sale_items(sales_id).await?;

        Ok(SaleWithItems { sale, items })
    }

    pub async fn list_sales(&self, owner_id: Uuid) -> AppResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT sales_id, owner_id, customer_id, total_amount, paid_amount,
                    payment_status, note, created_at
             FROM sales WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(sales)
    }

    /// Sales that still carry credit (pending or partial)
    pub async fn list_credit_sales(&self, owner_id: Uuid) -> AppResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT sales_id, owner_id, customer_id, total_amount, paid_amount,
                    payment_status, note, created_at
             FROM sales
             WHERE owner_id = $1 AND payment_status <> $2
             ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .bind(PaymentStatus::Paid.as_str())
        .fetch_all(&self.db)
        .await?;

        Ok(sales)
    }

    /// Printable bill for a sale, with names resolved
    pub async fn get_bill(&self, owner_id: Uuid, sales_id: Uuid) -> AppResult<Bill> {
        let sale = sqlx::query_as::<_, Sale>(
            "SELECT sales_id, owner_id, customer_id, total_amount, paid_amount,
                    payment_status, note, created_at
             FROM sales WHERE sales_id = $1 AND owner_id = $2",
        )
        .bind(sales_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Sale"))?;

        let customer = match sale.customer_id {
            Some(customer_id) => sqlx::query_as::<_, Customer>(
                "SELECT customer_id, owner_id, full_name, phone, email, address, created_at
                 FROM customers WHERE customer_id = $1",
            )
            .bind(customer_id)
            .fetch_optional(&self.db)
            .await?,
            None => None,
        };

        let items = sqlx::query_as::<_, BillLineRow>(
            r#"
            SELECT p.product_name, c.color_name, s.size_name,
                   i.qty, i.returned_qty, i.sp AS unit_price, i.line_total
            FROM sales_items i
            JOIN products p ON p.product_id = i.product_id
            LEFT JOIN colors c ON c.color_id = i.color_id
            LEFT JOIN sizes s ON s.size_id = i.size_id
            WHERE i.sales_id = $1
            ORDER BY i.created_at
            "#,
        )
        .bind(sales_id)
        .fetch_all(&self.db)
        .await?;

        Ok(Bill {
            sales_id: sale.sales_id,
            created_at: sale.created_at,
            customer,
            items: items
                .into_iter()
                .map(|r| BillLine {
                    product_name: r.product_name,
                    color_name: r.color_name,
                    size_name: r.size_name,
                    qty: r.qty,
                    returned_qty: r.returned_qty,
                    effective_qty: r.qty - r.returned_qty,
                    unit_price: r.unit_price,
                    line_total: r.line_total,
                })
                .collect(),
            credit_amount: credit_remaining(sale.total_amount, sale.paid_amount),
            total_amount: sale.total_amount,
            paid_amount: sale.paid_amount,
            payment_status: sale.payment_status,
        })
    }

    async fn sale_items(&self, sales_id: Uuid) -> AppResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT sales_item_id, sales_id, product_id, lot_id, color_id, size_id,
                    qty, cp, sp, line_total, returned_qty, note, created_at
             FROM sales_items WHERE sales_id = $1 ORDER BY created_at",
        )
        .bind(sales_id)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    /// Find or create the customer for this sale.
    ///
    /// Inline customer details match on (owner, phone); a known phone reuses
    /// the existing record instead of duplicating it.
    async fn resolve_customer(
        &self,
        tx: &mut PgConnection,
        owner_id: Uuid,
        customer_id: Option<Uuid>,
        customer: Option<CustomerInput>,
    ) -> AppResult<Option<Uuid>> {
        if let Some(customer_id) = customer_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE customer_id = $1 AND owner_id = $2)",
            )
            .bind(customer_id)
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;
            if !exists {
                return Err(AppError::not_found("Customer"));
            }
            return Ok(Some(customer_id));
        }

        let Some(customer) = customer else {
            return Ok(None);
        };

        validate_name(&customer.full_name).map_err(|m| AppError::validation("full_name", m))?;
        validate_phone(&customer.phone).map_err(|m| AppError::validation("phone", m))?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO customers (owner_id, full_name, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (owner_id, phone) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                email     = COALESCE(EXCLUDED.email, customers.email),
                address   = COALESCE(EXCLUDED.address, customers.address)
            RETURNING customer_id
            "#,
        )
        .bind(owner_id)
        .bind(customer.full_name.trim())
        .bind(customer.phone.trim())
        .bind(&customer.email)
        .bind(&customer.address)
        .fetch_one(&mut *tx)
        .await?;

        Ok(Some(id))
    }
}

#[derive(FromRow)]
struct SaleLotRow {
    product_id: Uuid,
    color_id: Option<Uuid>,
    size_id: Option<Uuid>,
    cp: Decimal,
    sp: Decimal,
}

#[derive(FromRow)]
struct SaleAmountsRow {
    total_amount: Decimal,
    paid_amount: Decimal,
}

#[derive(FromRow)]
struct BillLineRow {
    product_name: String,
    color_name: Option<String>,
    size_name: Option<String>,
    qty: i32,
    returned_qty: i32,
    unit_price: Decimal,
    line_total: Decimal,
}
