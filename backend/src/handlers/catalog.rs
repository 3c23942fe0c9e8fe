//! HTTP handlers for catalog master data endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentOwner;
use crate::services::catalog::{
    CatalogService, Category, Color, CreateCategoryInput, CreateColorInput, CreateProductInput,
    CreateSizeInput, CreateSupplierInput, Product, Size, Supplier,
};
use crate::AppState;

pub async fn create_category(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<Json<Category>> {
    let service = CatalogService::new(state.db);
    let category = service.create_category(current_owner.0.owner_id, input).await?;
    Ok(Json(category))
}

pub async fn list_categories(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<Category>>> {
    let service = CatalogService::new(state.db);
    let categories = service.list_categories(current_owner.0.owner_id).await?;
    Ok(Json(categories))
}

pub async fn create_product(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let service = CatalogService::new(state.db);
    let product = service.create_product(current_owner.0.owner_id, input).await?;
    Ok(Json(product))
}

pub async fn list_products(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<Product>>> {
    let service = CatalogService::new(state.db);
    let products = service.list_products(current_owner.0.owner_id).await?;
    Ok(Json(products))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = CatalogService::new(state.db);
    let supplier = service.create_supplier(current_owner.0.owner_id, input).await?;
    Ok(Json(supplier))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<Supplier>>> {
    let service = CatalogService::new(state.db);
    let suppliers = service.list_suppliers(current_owner.0.owner_id).await?;
    Ok(Json(suppliers))
}

pub async fn create_color(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<CreateColorInput>,
) -> AppResult<Json<Color>> {
    let service = CatalogService::new(state.db);
    let color = service.create_color(current_owner.0.owner_id, input).await?;
    Ok(Json(color))
}

pub async fn list_colors(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<Color>>> {
    let service = CatalogService::new(state.db);
    let colors = service.list_colors(current_owner.0.owner_id).await?;
    Ok(Json(colors))
}

pub async fn create_size(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<CreateSizeInput>,
) -> AppResult<Json<Size>> {
    let service = CatalogService::new(state.db);
    let size = service.create_size(current_owner.0.owner_id, input).await?;
    Ok(Json(size))
}

pub async fn list_sizes(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<Size>>> {
    let service = CatalogService::new(state.db);
    let sizes = service.list_sizes(current_owner.0.owner_id).await?;
    Ok(Json(sizes))
}
