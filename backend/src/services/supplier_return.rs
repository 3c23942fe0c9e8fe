//! Supplier return service
//!
//! A return-to-supplier is a staged document: drafting it reserves nothing.
//! Stock leaves the lots only on the transition into `completed`, through
//! the same guarded decrement a sale uses, so completing a return can never
//! push a lot negative. Completed is terminal and immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogService;
use crate::services::stock_lot::try_decrement;
use shared::types::SupplierReturnStatus;
use shared::validation::validate_qty;

/// Supplier return service
#[derive(Clone)]
pub struct SupplierReturnService {
    db: PgPool,
    catalog: CatalogService,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierReturn {
    pub return_id: Uuid,
    pub owner_id: Uuid,
    pub supplier_id: Uuid,
    pub status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierReturnItem {
    pub return_item_id: Uuid,
    pub return_id: Uuid,
    pub lot_id: Uuid,
    pub qty: i32,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SupplierReturnWithItems {
    #[serde(flatten)]
    pub r#return: SupplierReturn,
    pub items: Vec<SupplierReturnItem>,
}

#[derive(Debug, Deserialize)]
pub struct SupplierReturnItemInput {
    pub lot_id: Uuid,
    pub qty: i32,
    pub reason: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplierReturnInput {
    pub supplier_id: Uuid,
    pub items: Vec<SupplierReturnItemInput>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: SupplierReturnStatus,
}

impl SupplierReturnService {
    /// Create a new SupplierReturnService instance
    pub fn new(db: PgPool) -> Self {
        let catalog = CatalogService::new(db.clone());
        Self { db, catalog }
    }

    /// Draft a return shipment back to a supplier.
    ///
    /// Drafting does not touch lot quantities; availability is enforced at
    /// completion time. Every lot must belong to the owner and the supplier
    /// of the return.
    pub async fn create_return(
        &self,
        owner_id: Uuid,
        input: CreateSupplierReturnInput,
    ) -> AppResult<SupplierReturnWithItems> {
        if input.items.is_empty() {
            return Err(AppError::validation("items", "at least one item is required"));
        }
        for item in &input.items {
            validate_qty(item.qty).map_err(|m| AppError::validation("qty", m))?;
        }

        self.catalog.ensure_supplier(owner_id, input.supplier_id).await?;

        for item in &input.items {
            let belongs = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM stock_lots
                  WHERE lot_id = $1 AND owner_id = $2 AND supplier_id = $3)",
            )
            .bind(item.lot_id)
            .bind(owner_id)
            .bind(input.supplier_id)
            .fetch_one(&self.db)
            .await?;
            if !belongs {
                return Err(AppError::not_found("Lot"));
            }
        }

        let mut tx = self.db.begin().await?;

        let r#return = sqlx::query_as::<_, SupplierReturn>(
            r#"
            INSERT INTO supplier_returns (owner_id, supplier_id, note)
            VALUES ($1, $2, $3)
            RETURNING return_id, owner_id, supplier_id, status, note, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(input.supplier_id)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, SupplierReturnItem>(
                r#"
                INSERT INTO supplier_return_items (return_id, lot_id, qty, reason, note)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING return_item_id, return_id, lot_id, qty, reason, note, created_at
                "#,
            )
            .bind(r#return.return_id)
            .bind(item.lot_id)
            .bind(item.qty)
            .bind(&item.reason)
            .bind(&item.note)
            .fetch_one(&mut *tx)
            .await?;
            items.push(row);
        }

        tx.commit().await?;

        tracing::info!(return_id = %r#return.return_id, items = items.len(), "supplier return drafted");

        Ok(SupplierReturnWithItems { r#return, items })
    }

    /// Move a return along its lifecycle.
    ///
    /// Open states may advance (approval is optional, pending can complete
    /// directly) or be cancelled; completed and cancelled are terminal. The
    /// transition into completed deducts every item's quantity from its lot
    /// inside the same transaction.
    pub async fn update_status(
        &self,
        owner_id: Uuid,
        return_id: Uuid,
        input: UpdateStatusInput,
    ) -> AppResult<SupplierReturnWithItems> {
        let mut tx = self.db.begin().await?;

        let current_row = sqlx::query_scalar::<_, String>(
            "SELECT status FROM supplier_returns
             WHERE return_id = $1 AND owner_id = $2
             FOR UPDATE",
        )
        .bind(return_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Return"))?;

        let current = SupplierReturnStatus::from_str(&current_row)
            .ok_or_else(|| AppError::Configuration(format!("unknown return status {current_row}")))?;

        if current == SupplierReturnStatus::Completed {
            return Err(AppError::ReturnAlreadyCompleted);
        }
        if !current.can_transition(input.status) {
            return Err(AppError::InvalidStatusTransition {
                from: current.as_str().to_string(),
                to: input.status.as_str().to_string(),
            });
        }

        if input.status == SupplierReturnStatus::Completed {
            let items = sqlx::query_as::<_, ItemQtyRow>(
                "SELECT lot_id, qty FROM supplier_return_items WHERE return_id = $1",
            )
            .bind(return_id)
            .fetch_all(&mut *tx)
            .await?;

            for item in &items {
                try_decrement(&mut tx, owner_id, item.lot_id, item.qty).await?;
            }
        }

        let r#return = sqlx::query_as::<_, SupplierReturn>(
            r#"
            UPDATE supplier_returns SET status = $3, updated_at = now()
            WHERE return_id = $1 AND owner_id = $2
            RETURNING return_id, owner_id, supplier_id, status, note, created_at, updated_at
            "#,
        )
        .bind(return_id)
        .bind(owner_id)
        .bind(input.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let items = self.items_in_tx(&mut tx, return_id).await?;

        tx.commit().await?;

        tracing::info!(return_id = %return_id, status = %r#return.status, "supplier return status updated");

        Ok(SupplierReturnWithItems { r#return, items })
    }

    /// Delete a return that never moved stock. Completed returns are
    /// immutable; anything else may be purged.
    pub async fn delete_return(&self, owner_id: Uuid, return_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM supplier_returns
             WHERE return_id = $1 AND owner_id = $2
             FOR UPDATE",
        )
        .bind(return_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Return"))?;

        if SupplierReturnStatus::from_str(&status) == Some(SupplierReturnStatus::Completed) {
            return Err(AppError::ReturnAlreadyCompleted);
        }

        sqlx::query("DELETE FROM supplier_returns WHERE return_id = $1")
            .bind(return_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(return_id = %return_id, "supplier return deleted");

        Ok(())
    }

    pub async fn get_return(
        &self,
        owner_id: Uuid,
        return_id: Uuid,
    ) -> AppResult<SupplierReturnWithItems> {
        let r#return = sqlx::query_as::<_, SupplierReturn>(
            "SELECT return_id, owner_id, supplier_id, status, note, created_at, updated_at
             FROM supplier_returns WHERE return_id = $1 AND owner_id = $2",
        )
        .bind(return_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Return"))?;

        let items = sqlx::query_as::<_, SupplierReturnItem>(
            "SELECT return_item_id, return_id, lot_id, qty, reason, note, created_at
             FROM supplier_return_items WHERE return_id = $1 ORDER BY created_at",
        )
        .bind(return_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SupplierReturnWithItems { r#return, items })
    }

    pub async fn list_returns(&self, owner_id: Uuid) -> AppResult<Vec<SupplierReturn>> {
        let returns = sqlx::query_as::<_, SupplierReturn>(
            "SELECT return_id, owner_id, supplier_id, status, note, created_at, updated_at
             FROM supplier_returns WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(returns)
    }

    async fn items_in_tx(
        &self,
        tx: &mut sqlx::PgConnection,
        return_id: Uuid,
    ) -> AppResult<Vec<SupplierReturnItem>> {
        let items = sqlx::query_as::<_, SupplierReturnItem>(
            "SELECT return_item_id, return_id, lot_id, qty, reason, note, created_at
             FROM supplier_return_items WHERE return_id = $1 ORDER BY created_at",
        )
        .bind(return_id)
        .fetch_all(&mut *tx)
        .await?;

        Ok(items)
    }
}

#[derive(FromRow)]
struct ItemQtyRow {
    lot_id: Uuid,
    qty: i32,
}
