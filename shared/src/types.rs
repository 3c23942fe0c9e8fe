//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Payment state of a sale, derived from paid vs. total amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "partial" => Some(PaymentStatus::Partial),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }

    /// A sale with this status still carries outstanding credit
    pub fn has_credit(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Partial)
    }
}

/// Condition of goods coming back in a customer return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnCondition {
    /// Sellable again: the lot is restocked
    Good,
    /// Written off: quantity leaves circulation permanently
    Damaged,
}

impl ReturnCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnCondition::Good => "good",
            ReturnCondition::Damaged => "damaged",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "good" => Some(ReturnCondition::Good),
            "damaged" => Some(ReturnCondition::Damaged),
            _ => None,
        }
    }
}

/// Lifecycle of a return shipment back to a supplier
///
/// Stock is deducted only when the return transitions into `Completed`;
/// `Completed` is terminal and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplierReturnStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl SupplierReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierReturnStatus::Pending => "pending",
            SupplierReturnStatus::Approved => "approved",
            SupplierReturnStatus::Completed => "completed",
            SupplierReturnStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SupplierReturnStatus::Pending),
            "approved" => Some(SupplierReturnStatus::Approved),
            "completed" => Some(SupplierReturnStatus::Completed),
            "cancelled" => Some(SupplierReturnStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the status machine allows moving from `self` to `to`.
    ///
    /// Open states (pending, approved) may advance to any later state,
    /// including completing straight from pending. Completed and cancelled
    /// are terminal.
    pub fn can_transition(&self, to: SupplierReturnStatus) -> bool {
        use SupplierReturnStatus::*;
        matches!(
            (self, to),
            (Pending, Approved)
                | (Pending, Completed)
                | (Approved, Completed)
                | (Pending, Cancelled)
                | (Approved, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SupplierReturnStatus::Completed | SupplierReturnStatus::Cancelled
        )
    }
}
