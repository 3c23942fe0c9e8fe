//! HTTP handlers for supplier return endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentOwner;
use crate::services::supplier_return::{
    CreateSupplierReturnInput, SupplierReturn, SupplierReturnService, SupplierReturnWithItems,
    UpdateStatusInput,
};
use crate::AppState;

/// Draft a return shipment back to a supplier
pub async fn create_return(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<CreateSupplierReturnInput>,
) -> AppResult<Json<SupplierReturnWithItems>> {
    let service = SupplierReturnService::new(state.db);
    let r#return = service.create_return(current_owner.0.owner_id, input).await?;
    Ok(Json(r#return))
}

/// Move a return along its lifecycle; completion deducts stock
pub async fn update_status(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Path(return_id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<SupplierReturnWithItems>> {
    let service = SupplierReturnService::new(state.db);
    let r#return = service
        .update_status(current_owner.0.owner_id, return_id, input)
        .await?;
    Ok(Json(r#return))
}

/// Delete a non-completed return
pub async fn delete_return(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Path(return_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = SupplierReturnService::new(state.db);
    service.delete_return(current_owner.0.owner_id, return_id).await?;
    Ok(Json(()))
}

pub async fn get_return(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Path(return_id): Path<Uuid>,
) -> AppResult<Json<SupplierReturnWithItems>> {
    let service = SupplierReturnService::new(state.db);
    let r#return = service.get_return(current_owner.0.owner_id, return_id).await?;
    Ok(Json(r#return))
}

pub async fn list_returns(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<SupplierReturn>>> {
    let service = SupplierReturnService::new(state.db);
    let returns = service.list_returns(current_owner.0.owner_id).await?;
    Ok(Json(returns))
}
