//! HTTP handlers for sales endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentOwner;
use crate::services::sales::{
    AddPaymentInput, Bill, CreateSaleInput, Sale, SaleWithItems, SalesService,
};
use crate::AppState;

/// Record a sale (stock-out)
pub async fn create_sale(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SalesService::new(state.db);
    let sale = service.create_sale(current_owner.0.owner_id, input).await?;
    Ok(Json(sale))
}

/// Record an additional payment against a sale
pub async fn add_payment(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Path(sales_id): Path<Uuid>,
    Json(input): Json<AddPaymentInput>,
) -> AppResult<Json<Sale>> {
    let service = SalesService::new(state.db);
    let sale = service
        .add_payment(current_owner.0.owner_id, sales_id, input)
        .await?;
    Ok(Json(sale))
}

pub async fn get_sale(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Path(sales_id): Path<Uuid>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SalesService::new(state.db);
    let sale = service.get_sale(current_owner.0.owner_id, sales_id).await?;
    Ok(Json(sale))
}

pub async fn list_sales(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<Sale>>> {
    let service = SalesService::new(state.db);
    let sales = service.list_sales(current_owner.0.owner_id).await?;
    Ok(Json(sales))
}

/// Sales still carrying credit
pub async fn list_credit_sales(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<Sale>>> {
    let service = SalesService::new(state.db);
    let sales = service.list_credit_sales(current_owner.0.owner_id).await?;
    Ok(Json(sales))
}

/// Printable bill for a sale
pub async fn get_bill(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Path(sales_id): Path<Uuid>,
) -> AppResult<Json<Bill>> {
    let service = SalesService::new(state.db);
    let bill = service.get_bill(current_owner.0.owner_id, sales_id).await?;
    Ok(Json(bill))
}
