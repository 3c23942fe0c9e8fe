//! HTTP handlers for customer return endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentOwner;
use crate::services::customer_return::{
    CreateReturnInput, CustomerReturn, CustomerReturnService, CustomerReturnWithItems,
};
use crate::AppState;

/// Record a customer return against a sale
pub async fn create_return(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<CreateReturnInput>,
) -> AppResult<Json<CustomerReturnWithItems>> {
    let service = CustomerReturnService::new(state.db);
    let r#return = service.create_return(current_owner.0.owner_id, input).await?;
    Ok(Json(r#return))
}

pub async fn get_return(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Path(return_id): Path<Uuid>,
) -> AppResult<Json<CustomerReturnWithItems>> {
    let service = CustomerReturnService::new(state.db);
    let r#return = service.get_return(current_owner.0.owner_id, return_id).await?;
    Ok(Json(r#return))
}

pub async fn list_returns(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<CustomerReturn>>> {
    let service = CustomerReturnService::new(state.db);
    let returns = service.list_returns(current_owner.0.owner_id).await?;
    Ok(Json(returns))
}
