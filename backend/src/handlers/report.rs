//! HTTP handlers for reporting endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentOwner;
use crate::services::report::{
    CreditEntry, LowStockEntry, LowStockQuery, ProfitQuery, ProfitSummary, ReportService,
};
use crate::AppState;

/// Outstanding credit grouped by customer
pub async fn credit_overview(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
) -> AppResult<Json<Vec<CreditEntry>>> {
    let service = ReportService::new(state.db);
    let entries = service.credit_overview(current_owner.0.owner_id).await?;
    Ok(Json(entries))
}

/// Lots at or below the low-stock threshold
pub async fn low_stock(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<LowStockEntry>>> {
    let service = ReportService::new(state.db);
    let entries = service.low_stock(current_owner.0.owner_id, query).await?;
    Ok(Json(entries))
}

/// Revenue, cost and profit over a date window
pub async fn profit_summary(
    State(state): State<AppState>,
    current_owner: CurrentOwner,
    Query(query): Query<ProfitQuery>,
) -> AppResult<Json<ProfitSummary>> {
    let service = ReportService::new(state.db);
    let summary = service.profit_summary(current_owner.0.owner_id, query).await?;
    Ok(Json(summary))
}
