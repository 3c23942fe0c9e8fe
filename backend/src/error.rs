//! Error handling for the Retail Back-Office Platform
//!
//! Every ledger operation returns a single structured error (code + message);
//! any error raised inside a multi-step transaction aborts it entirely.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Not-found class: missing or belonging to another owner
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    // Validation class: rejected before any mutation
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    // Conflict/invariant class: the whole transaction rolls back
    #[error("Not enough stock in selected lot: requested {requested}, available {available}")]
    StockNotEnough { requested: i32, available: i32 },

    #[error("Return qty exceeds remaining: sold {sold}, already returned {returned}, remaining {available}")]
    ReturnExceedsSold {
        sold: i32,
        returned: i32,
        available: i32,
    },

    #[error("paid_amount cannot be greater than total_amount")]
    PaidExceedsTotal,

    #[error("Payment exceeds total amount")]
    PaymentExceedsTotal,

    #[error("qty_in cannot be less than already sold qty ({sold})")]
    QtyInBelowSold { sold: i32 },

    #[error("qty_remaining cannot be greater than qty_in")]
    QtyRemainingExceedsQtyIn,

    #[error("Cannot reduce sold history: already sold {sold}, new sold would be {new_sold}")]
    SoldHistoryInvalid { sold: i32, new_sold: i32 },

    #[error("Stock lot already exists for this product/supplier/color/size")]
    LotAlreadyExists,

    #[error("Completed return is immutable")]
    ReturnAlreadyCompleted,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(resource: &'static str) -> Self {
        AppError::NotFound { resource }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> String {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED".into(),
            AppError::NotFound { resource } => {
                format!("{}_NOT_FOUND", resource.to_uppercase().replace(' ', "_"))
            }
            AppError::Validation { field, .. } => {
                format!("VALIDATION_{}_INVALID", field.to_uppercase().replace(' ', "_"))
            }
            AppError::StockNotEnough { .. } => "STOCK_NOT_ENOUGH".into(),
            AppError::ReturnExceedsSold { .. } => "RETURN_EXCEEDS_SOLD".into(),
            AppError::PaidExceedsTotal => "VALIDATION_PAID_GT_TOTAL".into(),
            AppError::PaymentExceedsTotal => "PAYMENT_EXCEEDS_TOTAL".into(),
            AppError::QtyInBelowSold { .. } => "QTY_IN_LT_SOLD".into(),
            AppError::QtyRemainingExceedsQtyIn => "QTY_REMAINING_GT_QTY_IN".into(),
            AppError::SoldHistoryInvalid { .. } => "SOLD_HISTORY_INVALID".into(),
            AppError::LotAlreadyExists => "LOT_ALREADY_EXISTS".into(),
            AppError::ReturnAlreadyCompleted => "RETURN_ALREADY_COMPLETED".into(),
            AppError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION".into(),
            AppError::Database(_) => "DATABASE_ERROR".into(),
            AppError::Configuration(_) => "CONFIGURATION_ERROR".into(),
            AppError::Internal(_) => "INTERNAL_ERROR".into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::StockNotEnough { .. }
            | AppError::ReturnExceedsSold { .. }
            | AppError::PaidExceedsTotal
            | AppError::PaymentExceedsTotal
            | AppError::QtyInBelowSold { .. }
            | AppError::QtyRemainingExceedsQtyIn
            | AppError::SoldHistoryInvalid { .. }
            | AppError::ReturnAlreadyCompleted
            | AppError::InvalidStatusTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LotAlreadyExists => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Never leak driver-level detail to clients
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        };
        let field = match &self {
            AppError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };

        let detail = ErrorDetail {
            code: self.code(),
            message,
            field,
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Rejected request: {:?}", self);
        }

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_401() {
        let err = AppError::Unauthorized("Authentication required".to_string());
        assert_eq!(err.code(), "UNAUTHORIZED");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_conflict_and_invariant_codes() {
        assert_eq!(AppError::LotAlreadyExists.code(), "LOT_ALREADY_EXISTS");
        assert_eq!(
            AppError::LotAlreadyExists.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::PaidExceedsTotal.code(), "VALIDATION_PAID_GT_TOTAL");
        assert_eq!(AppError::not_found("Lot").code(), "LOT_NOT_FOUND");
    }
}
