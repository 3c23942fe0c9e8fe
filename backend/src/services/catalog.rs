//! Catalog master-data service: products, suppliers, categories, colors, sizes
//!
//! Thin CRUD plus the owner-scoped existence checks the ledger relies on.
//! The ledger treats these as read-only oracles and fails fast when a
//! referenced entity does not exist for the requesting owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::validation::validate_name;

/// Catalog service for master data lookups and maintenance
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub category_id: Uuid,
    pub owner_id: Uuid,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub owner_id: Uuid,
    pub product_name: String,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Supplier {
    pub supplier_id: Uuid,
    pub owner_id: Uuid,
    pub supplier_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Color {
    pub color_id: Uuid,
    pub owner_id: Uuid,
    pub color_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Size {
    pub size_id: Uuid,
    pub owner_id: Uuid,
    pub size_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub category_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub product_name: String,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplierInput {
    pub supplier_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateColorInput {
    pub color_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSizeInput {
    pub size_name: String,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // Existence oracles ------------------------------------------------------

    /// Fail with PRODUCT_NOT_FOUND unless the product belongs to the owner
    pub async fn ensure_product(&self, owner_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE product_id = $1 AND owner_id = $2)",
        )
        .bind(product_id)
        .bind(owner_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::not_found("Product"));
        }
        Ok(())
    }

    /// Fail with SUPPLIER_NOT_FOUND unless the supplier belongs to the owner
    pub async fn ensure_supplier(&self, owner_id: Uuid, supplier_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE supplier_id = $1 AND owner_id = $2)",
        )
        .bind(supplier_id)
        .bind(owner_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::not_found("Supplier"));
        }
        Ok(())
    }

    /// Verify every color id exists for this owner (batch, pre-transaction)
    pub async fn ensure_colors(&self, owner_id: Uuid, color_ids: &[Uuid]) -> AppResult<()> {
        if color_ids.is_empty() {
            return Ok(());
        }
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM colors WHERE owner_id = $1 AND color_id = ANY($2)",
        )
        .bind(owner_id)
        .bind(color_ids)
        .fetch_one(&self.db)
        .await?;

        if found as usize != color_ids.len() {
            return Err(AppError::not_found("Color"));
        }
        Ok(())
    }

    /// Verify every size id exists for this owner (batch, pre-transaction)
    pub async fn ensure_sizes(&self, owner_id: Uuid, size_ids: &[Uuid]) -> AppResult<()> {
        if size_ids.is_empty() {
            return Ok(());
        }
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sizes WHERE owner_id = $1 AND size_id = ANY($2)",
        )
        .bind(owner_id)
        .bind(size_ids)
        .fetch_one(&self.db)
        .await?;

        if found as usize != size_ids.len() {
            return Err(AppError::not_found("Size"));
        }
        Ok(())
    }

    // Master-data CRUD -------------------------------------------------------

    pub async fn create_category(
        &self,
        owner_id: Uuid,
        input: CreateCategoryInput,
    ) -> AppResult<Category> {
        validate_name(&input.category_name)
            .map_err(|m| AppError::validation("category_name", m))?;

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (owner_id, category_name)
            VALUES ($1, $2)
            RETURNING category_id, owner_id, category_name, created_at
            "#,
        )
        .bind(owner_id)
        .bind(input.category_name.trim())
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    pub async fn list_categories(&self, owner_id: Uuid) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT category_id, owner_id, category_name, created_at
             FROM categories WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    pub async fn create_product(
        &self,
        owner_id: Uuid,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        validate_name(&input.product_name).map_err(|m| AppError::validation("product_name", m))?;

        if let Some(category_id) = input.category_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE category_id = $1 AND owner_id = $2)",
            )
            .bind(category_id)
            .bind(owner_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::not_found("Category"));
            }
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (owner_id, product_name, category_id)
            VALUES ($1, $2, $3)
            RETURNING product_id, owner_id, product_name, category_id, created_at
            "#,
        )
        .bind(owner_id)
        .bind(input.product_name.trim())
        .bind(input.category_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    pub async fn list_products(&self, owner_id: Uuid) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT product_id, owner_id, product_name, category_id, created_at
             FROM products WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    pub async fn create_supplier(
        &self,
        owner_id: Uuid,
        input: CreateSupplierInput,
    ) -> AppResult<Supplier> {
        validate_name(&input.supplier_name)
            .map_err(|m| AppError::validation("supplier_name", m))?;

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (owner_id, supplier_name, phone, address)
            VALUES ($1, $2, $3, $4)
            RETURNING supplier_id, owner_id, supplier_name, phone, address, created_at
            "#,
        )
        .bind(owner_id)
        .bind(input.supplier_name.trim())
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(supplier)
    }

    pub async fn list_suppliers(&self, owner_id: Uuid) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT supplier_id, owner_id, supplier_name, phone, address, created_at
             FROM suppliers WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn create_color(&self, owner_id: Uuid, input: CreateColorInput) -> AppResult<Color> {
        validate_name(&input.color_name).map_err(|m| AppError::validation("color_name", m))?;

        let color = sqlx::query_as::<_, Color>(
            r#"
            INSERT INTO colors (owner_id, color_name)
            VALUES ($1, $2)
            RETURNING color_id, owner_id, color_name, created_at
            "#,
        )
        .bind(owner_id)
        .bind(input.color_name.trim())
        .fetch_one(&self.db)
        .await?;

        Ok(color)
    }

    pub async fn list_colors(&self, owner_id: Uuid) -> AppResult<Vec<Color>> {
        let colors = sqlx::query_as::<_, Color>(
            "SELECT color_id, owner_id, color_name, created_at
             FROM colors WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(colors)
    }

    pub async fn create_size(&self, owner_id: Uuid, input: CreateSizeInput) -> AppResult<Size> {
        validate_name(&input.size_name).map_err(|m| AppError::validation("size_name", m))?;

        let size = sqlx::query_as::<_, Size>(
            r#"
            INSERT INTO sizes (owner_id, size_name)
            VALUES ($1, $2)
            RETURNING size_id, owner_id, size_name, created_at
            "#,
        )
        .bind(owner_id)
        .bind(input.size_name.trim())
        .fetch_one(&self.db)
        .await?;

        Ok(size)
    }

    pub async fn list_sizes(&self, owner_id: Uuid) -> AppResult<Vec<Size>> {
        let sizes = sqlx::query_as::<_, Size>(
            "SELECT size_id, owner_id, size_name, created_at
             FROM sizes WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(sizes)
    }
}
