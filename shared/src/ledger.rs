//! Pure ledger arithmetic: payment status, settlement and lot adjustments
//!
//! Every rule that the reporting side depends on lives here as a plain
//! function so services, dashboards and tests cannot drift apart.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::PaymentStatus;

/// Derive the payment status of a sale from its paid and total amounts.
///
/// Rule: paid when `paid >= total` and `total > 0`, or when `total == 0`
/// (a fully-returned sale owes nothing); partial when `0 < paid < total`;
/// pending when nothing has been paid against a positive total.
pub fn derive_payment_status(paid: Decimal, total: Decimal) -> PaymentStatus {
    if total == Decimal::ZERO || paid >= total {
        PaymentStatus::Paid
    } else if paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

/// Credit still owed on a sale
pub fn credit_remaining(total: Decimal, paid: Decimal) -> Decimal {
    total - paid
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("amount must be a positive number")]
    AmountNotPositive,
    #[error("payment exceeds total amount")]
    ExceedsTotal,
}

/// Apply an additional payment to a sale.
///
/// Payments only ever grow `paid_amount` and are capped at `total`.
pub fn apply_payment(
    total: Decimal,
    paid: Decimal,
    amount: Decimal,
) -> Result<(Decimal, PaymentStatus), PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::AmountNotPositive);
    }
    let new_paid = paid + amount;
    if new_paid > total {
        return Err(PaymentError::ExceedsTotal);
    }
    Ok((new_paid, derive_payment_status(new_paid, total)))
}

/// Outcome of settling a customer return against its sale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnSettlement {
    pub new_total: Decimal,
    pub new_paid: Decimal,
    /// Excess of what the customer had paid over the reduced total
    pub refund: Decimal,
    pub status: PaymentStatus,
}

/// Settle a return worth `return_value` against a sale.
///
/// The sale total drops by the return value (floored at zero). If the
/// customer had already paid more than the new total, the excess becomes a
/// refund and the paid amount is netted down to the new total.
pub fn settle_return(old_total: Decimal, old_paid: Decimal, return_value: Decimal) -> ReturnSettlement {
    let new_total = (old_total - return_value).max(Decimal::ZERO);

    let (new_paid, refund) = if old_paid > new_total {
        (new_total, old_paid - new_total)
    } else {
        (old_paid, Decimal::ZERO)
    };

    ReturnSettlement {
        new_total,
        new_paid,
        refund,
        status: derive_payment_status(new_paid, new_total),
    }
}

/// Quantity columns of a stock lot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotQuantities {
    pub qty_in: i32,
    pub qty_remaining: i32,
}

impl LotQuantities {
    /// Cumulative quantity ever sold or allocated out of this lot
    pub fn sold(&self) -> i32 {
        self.qty_in - self.qty_remaining
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdjustmentError {
    #[error("qty_in cannot be less than already sold qty ({sold})")]
    QtyInBelowSold { sold: i32 },
    #[error("qty_remaining cannot be greater than qty_in")]
    RemainingExceedsIn,
    #[error("cannot reduce sold history: already sold {sold}, new sold would be {new_sold}")]
    SoldHistoryShrunk { sold: i32, new_sold: i32 },
    #[error("quantity must be an integer >= 0")]
    NegativeQuantity,
}

/// Plan a manual lot quantity adjustment without erasing sales history.
///
/// `sold = qty_in - qty_remaining` is frozen history: if only `qty_in`
/// changes, `qty_remaining` is recomputed to keep `sold` constant; if only
/// `qty_remaining` changes it must stay within `qty_in`; if both change the
/// implied new sold figure may grow but never shrink.
pub fn plan_quantity_adjustment(
    current: LotQuantities,
    new_qty_in: Option<i32>,
    new_qty_remaining: Option<i32>,
) -> Result<LotQuantities, AdjustmentError> {
    let sold = current.sold();

    if new_qty_in.map_or(false, |q| q < 0) || new_qty_remaining.map_or(false, |q| q < 0) {
        return Err(AdjustmentError::NegativeQuantity);
    }

    match (new_qty_in, new_qty_remaining) {
        (None, None) => Ok(current),
        (Some(qty_in), None) => {
            if qty_in < sold {
                return Err(AdjustmentError::QtyInBelowSold { sold });
            }
            Ok(LotQuantities {
                qty_in,
                qty_remaining: qty_in - sold,
            })
        }
        (None, Some(qty_remaining)) => {
            if qty_remaining > current.qty_in {
                return Err(AdjustmentError::RemainingExceedsIn);
            }
            Ok(LotQuantities {
                qty_in: current.qty_in,
                qty_remaining,
            })
        }
        (Some(qty_in), Some(qty_remaining)) => {
            if qty_remaining > qty_in {
                return Err(AdjustmentError::RemainingExceedsIn);
            }
            let new_sold = qty_in - qty_remaining;
            if new_sold < sold {
                return Err(AdjustmentError::SoldHistoryShrunk { sold, new_sold });
            }
            Ok(LotQuantities {
                qty_in,
                qty_remaining,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_status_pending() {
        assert_eq!(derive_payment_status(dec(0), dec(100)), PaymentStatus::Pending);
    }

    #[test]
    fn test_status_partial() {
        assert_eq!(derive_payment_status(dec(40), dec(100)), PaymentStatus::Partial);
    }

    #[test]
    fn test_status_paid() {
        assert_eq!(derive_payment_status(dec(100), dec(100)), PaymentStatus::Paid);
        assert_eq!(derive_payment_status(dec(120), dec(100)), PaymentStatus::Paid);
    }

    #[test]
    fn test_status_zero_total_is_paid() {
        // A fully-returned sale owes nothing
        assert_eq!(derive_payment_status(dec(0), dec(0)), PaymentStatus::Paid);
    }

    #[test]
    fn test_apply_payment_progression() {
        let (paid, status) = apply_payment(dec(600), dec(0), dec(400)).unwrap();
        assert_eq!(paid, dec(400));
        assert_eq!(status, PaymentStatus::Partial);

        let (paid, status) = apply_payment(dec(600), paid, dec(200)).unwrap();
        assert_eq!(paid, dec(600));
        assert_eq!(status, PaymentStatus::Paid);

        assert_eq!(
            apply_payment(dec(600), paid, dec(1)),
            Err(PaymentError::ExceedsTotal)
        );
    }

    #[test]
    fn test_apply_payment_rejects_non_positive() {
        assert_eq!(
            apply_payment(dec(100), dec(0), dec(0)),
            Err(PaymentError::AmountNotPositive)
        );
        assert_eq!(
            apply_payment(dec(100), dec(0), dec(-5)),
            Err(PaymentError::AmountNotPositive)
        );
    }

    #[test]
    fn test_settle_return_with_refund() {
        // paid 600 on a 600 sale, return worth 200
        let s = settle_return(dec(600), dec(600), dec(200));
        assert_eq!(s.new_total, dec(400));
        assert_eq!(s.refund, dec(200));
        assert_eq!(s.new_paid, dec(400));
        assert_eq!(s.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_settle_return_without_refund() {
        // paid 100 on a 600 sale, return worth 200 -> still owes 300
        let s = settle_return(dec(600), dec(100), dec(200));
        assert_eq!(s.new_total, dec(400));
        assert_eq!(s.refund, dec(0));
        assert_eq!(s.new_paid, dec(100));
        assert_eq!(s.status, PaymentStatus::Partial);
    }

    #[test]
    fn test_settle_return_full() {
        let s = settle_return(dec(200), dec(150), dec(200));
        assert_eq!(s.new_total, dec(0));
        assert_eq!(s.refund, dec(150));
        assert_eq!(s.new_paid, dec(0));
        assert_eq!(s.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_adjust_grow_qty_in_keeps_sold() {
        let q = LotQuantities { qty_in: 100, qty_remaining: 70 };
        let adjusted = plan_quantity_adjustment(q, Some(120), None).unwrap();
        assert_eq!(adjusted.qty_in, 120);
        assert_eq!(adjusted.qty_remaining, 90);
        assert_eq!(adjusted.sold(), q.sold());
    }

    #[test]
    fn test_adjust_qty_in_below_sold_rejected() {
        let q = LotQuantities { qty_in: 100, qty_remaining: 70 };
        assert_eq!(
            plan_quantity_adjustment(q, Some(20), None),
            Err(AdjustmentError::QtyInBelowSold { sold: 30 })
        );
    }

    #[test]
    fn test_adjust_remaining_bounded_by_in() {
        let q = LotQuantities { qty_in: 100, qty_remaining: 70 };
        assert_eq!(
            plan_quantity_adjustment(q, None, Some(101)),
            Err(AdjustmentError::RemainingExceedsIn)
        );
        let adjusted = plan_quantity_adjustment(q, None, Some(50)).unwrap();
        assert_eq!(adjusted.qty_remaining, 50);
    }

    #[test]
    fn test_adjust_both_cannot_shrink_sold() {
        let q = LotQuantities { qty_in: 100, qty_remaining: 70 };
        // new sold would be 10 < 30
        assert_eq!(
            plan_quantity_adjustment(q, Some(100), Some(90)),
            Err(AdjustmentError::SoldHistoryShrunk { sold: 30, new_sold: 10 })
        );
        // growing sold is fine (e.g. recording shrinkage)
        let adjusted = plan_quantity_adjustment(q, Some(100), Some(60)).unwrap();
        assert_eq!(adjusted.sold(), 40);
    }

    #[test]
    fn test_adjust_rejects_negative() {
        let q = LotQuantities { qty_in: 10, qty_remaining: 10 };
        assert_eq!(
            plan_quantity_adjustment(q, Some(-1), None),
            Err(AdjustmentError::NegativeQuantity)
        );
    }
}
