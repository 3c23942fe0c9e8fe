//! HTTP handlers for stock lot endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentOwner;
use crate::services::stock_lot::{
    AdjustLotInput, BulkUpsertInput, BulkUpsertResult, LotFilter, ProductStockSummary,
    StockInInput, StockLot, StockLotService,
};
use crate::AppState;

/// Receive a new lot of stock
pub async fn stock_in(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<StockInInput>,
) -> AppResult<Json<StockLot>> {
    let service = StockLotService::new(state.db);
    let lot = service.stock_in(current_owner.0.owner_id, input).await?;
    Ok(Json(lot))
}

/// Bulk receipt of fully-variant lots
pub async fn bulk_upsert(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Json(input): Json<BulkUpsertInput>,
) -> AppResult<Json<BulkUpsertResult>> {
    let service = StockLotService::new(state.db);
    let result = service.bulk_upsert(current_owner.0.owner_id, input).await?;
    Ok(Json(result))
}

/// Manually adjust a lot's quantities, prices or notes
pub async fn adjust_lot(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Path(lot_id): Path<Uuid>,
    Json(input): Json<AdjustLotInput>,
) -> AppResult<Json<StockLot>> {
    let service = StockLotService::new(state.db);
    let lot = service.adjust_lot(current_owner.0.owner_id, lot_id, input).await?;
    Ok(Json(lot))
}

pub async fn get_lot(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<StockLot>> {
    let service = StockLotService::new(state.db);
    let lot = service.get_lot(current_owner.0.owner_id, lot_id).await?;
    Ok(Json(lot))
}

/// Per-product totals across all lots
pub async fn stock_summary(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<ProductStockSummary>>> {
    let service = StockLotService::new(state.db);
    let summary = service.stock_summary(current_owner.0.owner_id).await?;
    Ok(Json(summary))
}

pub async fn list_lots(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Query(filter): Query<LotFilter>,
) -> AppResult<Json<Vec<StockLot>>> {
    let service = StockLotService::new(state.db);
    let lots = service.list_lots(current_owner.0.owner_id, filter).await?;
    Ok(Json(lots))
}
