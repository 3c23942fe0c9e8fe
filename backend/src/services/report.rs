//! Reporting service: read-only aggregates over the ledger
//!
//! Profit counts only the units that stayed sold: returned units are
//! excluded via `qty - returned_qty`, which mirrors how settlement reduced
//! the sale totals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use shared::types::PaymentStatus;

/// Reporting service for dashboards
#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
}

/// Outstanding credit grouped by customer
#[derive(Debug, Serialize, FromRow)]
pub struct CreditEntry {
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub open_sales: i64,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub credit_amount: Decimal,
}

/// Per-product remaining quantity at or below the threshold; this is the
/// aggregate the external low-stock notification scan consumes
#[derive(Debug, Serialize, FromRow)]
pub struct LowStockEntry {
    pub product_id: Uuid,
    pub product_name: String,
    pub qty_remaining: i64,
    pub lots: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ProfitSummary {
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub units_sold: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfitQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    /// Lots at or below this remaining quantity; defaults to 5
    pub threshold: Option<i32>,
}

impl ReportService {
    /// Create a new ReportService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open credit per customer, walk-in credit sales grouped under NULL
    pub async fn credit_overview(&self, owner_id: Uuid) -> AppResult<Vec<CreditEntry>> {
        let entries = sqlx::query_as::<_, CreditEntry>(
            r#"
            SELECT s.customer_id,
                   c.full_name AS customer_name,
                   c.phone,
                   COUNT(*) AS open_sales,
                   COALESCE(SUM(s.total_amount), 0) AS total_amount,
                   COALESCE(SUM(s.paid_amount), 0) AS paid_amount,
                   COALESCE(SUM(s.total_amount - s.paid_amount), 0) AS credit_amount
            FROM sales s
            LEFT JOIN customers c ON c.customer_id = s.customer_id
            WHERE s.owner_id = $1 AND s.payment_status <> $2
            GROUP BY s.customer_id, c.full_name, c.phone
            ORDER BY credit_amount DESC
            "#,
        )
        .bind(owner_id)
        .bind(PaymentStatus::Paid.as_str())
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    pub async fn low_stock(&self, owner_id: Uuid, query: LowStockQuery) -> AppResult<Vec<LowStockEntry>> {
        let threshold = query.threshold.unwrap_or(5).max(0);

        let entries = sqlx::query_as::<_, LowStockEntry>(
            r#"
            SELECT l.product_id, p.product_name,
                   COALESCE(SUM(l.qty_remaining), 0) AS qty_remaining,
                   COUNT(*) AS lots
            FROM stock_lots l
            JOIN products p ON p.product_id = l.product_id
            WHERE l.owner_id = $1
            GROUP BY l.product_id, p.product_name
            HAVING COALESCE(SUM(l.qty_remaining), 0) <= $2
            ORDER BY qty_remaining ASC, p.product_name
            "#,
        )
        .bind(owner_id)
        .bind(threshold as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Revenue, cost and profit over sold-and-kept units in a date window
    pub async fn profit_summary(&self, owner_id: Uuid, query: ProfitQuery) -> AppResult<ProfitSummary> {
        let summary = sqlx::query_as::<_, ProfitSummary>(
            r#"
            SELECT COALESCE(SUM(i.sp * (i.qty - i.returned_qty)), 0) AS revenue,
                   COALESCE(SUM(i.cp * (i.qty - i.returned_qty)), 0) AS cost,
                   COALESCE(SUM((i.sp - i.cp) * (i.qty - i.returned_qty)), 0) AS profit,
                   COALESCE(SUM(i.qty - i.returned_qty), 0) AS units_sold
            FROM sales_items i
            JOIN sales s ON s.sales_id = i.sales_id
            WHERE s.owner_id = $1
              AND ($2::timestamptz IS NULL OR s.created_at >= $2)
              AND ($3::timestamptz IS NULL OR s.created_at < $3)
            "#,
        )
        .bind(owner_id)
        .bind(query.from)
        .bind(query.to)
        .fetch_one(&self.db)
        .await?;

        Ok(summary)
    }
}
