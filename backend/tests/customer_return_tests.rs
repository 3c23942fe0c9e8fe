//! Customer return tests
//!
//! Tests for return settlement against a sale:
//! - return value is priced at the sale-time sp snapshot
//! - sale total drops by the return value, floored at zero
//! - overpaid amounts become refunds
//! - per-line returned_qty never exceeds the quantity sold
//! - only good-condition units go back on the shelf

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::ledger::{derive_payment_status, settle_return};
use shared::types::{PaymentStatus, ReturnCondition};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Fully paid sale, partial return: the excess payment is refunded
    #[test]
    fn test_return_on_settled_sale_refunds() {
        let s = settle_return(dec("600"), dec("600"), dec("200"));
        assert_eq!(s.new_total, dec("400"));
        assert_eq!(s.new_paid, dec("400"));
        assert_eq!(s.refund, dec("200"));
        assert_eq!(s.status, PaymentStatus::Paid);
    }

    /// Credit sale: the return just shrinks the debt, nothing is refunded
    #[test]
    fn test_return_on_credit_sale_reduces_debt() {
        let s = settle_return(dec("600"), dec("100"), dec("200"));
        assert_eq!(s.new_total, dec("400"));
        assert_eq!(s.new_paid, dec("100"));
        assert_eq!(s.refund, Decimal::ZERO);
        assert_eq!(s.status, PaymentStatus::Partial);
    }

    /// Returning everything on a deposit sale refunds the deposit
    #[test]
    fn test_full_return_refunds_deposit() {
        let s = settle_return(dec("200"), dec("150"), dec("200"));
        assert_eq!(s.new_total, Decimal::ZERO);
        assert_eq!(s.new_paid, Decimal::ZERO);
        assert_eq!(s.refund, dec("150"));
        // Zero total owes nothing
        assert_eq!(s.status, PaymentStatus::Paid);
    }

    /// Return value larger than the remaining total floors at zero
    #[test]
    fn test_return_value_floors_total_at_zero() {
        let s = settle_return(dec("100"), dec("100"), dec("250"));
        assert_eq!(s.new_total, Decimal::ZERO);
        assert_eq!(s.refund, dec("100"));
    }

    #[test]
    fn test_return_value_uses_sale_snapshot_price() {
        // 2 units sold at sp 250; the lot price may have changed since,
        // but the return is valued at the snapshot
        let snapshot_sp = dec("250");
        let return_value = snapshot_sp * Decimal::from(2);
        assert_eq!(return_value, dec("500"));
    }

    #[test]
    fn test_returned_qty_capped_by_line_qty() {
        // Sold 5, already returned 3 -> at most 2 more can come back
        let (qty, returned_qty) = (5, 3);
        let available = qty - returned_qty;
        assert_eq!(available, 2);
        assert!(super::simulate_line_return(qty, returned_qty, 3).is_err());
        assert_eq!(super::simulate_line_return(qty, returned_qty, 2), Ok(5));
    }

    #[test]
    fn test_only_good_units_restock() {
        assert!(super::restocks(ReturnCondition::Good));
        assert!(!super::restocks(ReturnCondition::Damaged));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000_000).prop_map(|n| Decimal::new(n, 2))
    }

    /// (total, paid) with paid <= total, as the sale invariant guarantees
    fn sale_amounts_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
        (0i64..=10_000_000).prop_flat_map(|total| {
            (0..=total).prop_map(move |paid| (Decimal::new(total, 2), Decimal::new(paid, 2)))
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Settlement preserves the sale invariant: 0 <= paid <= total
        #[test]
        fn prop_settlement_preserves_invariant(
            (total, paid) in sale_amounts_strategy(),
            return_value in amount_strategy(),
        ) {
            let s = settle_return(total, paid, return_value);
            prop_assert!(s.new_total >= Decimal::ZERO);
            prop_assert!(s.new_paid >= Decimal::ZERO);
            prop_assert!(s.new_paid <= s.new_total);
        }

        /// Money is conserved: old paid = new paid + refund
        #[test]
        fn prop_settlement_conserves_money(
            (total, paid) in sale_amounts_strategy(),
            return_value in amount_strategy(),
        ) {
            let s = settle_return(total, paid, return_value);
            prop_assert_eq!(s.new_paid + s.refund, paid);
        }

        /// The refund is exactly the overshoot of paid past the new total
        #[test]
        fn prop_refund_is_excess_paid(
            (total, paid) in sale_amounts_strategy(),
            return_value in amount_strategy(),
        ) {
            let s = settle_return(total, paid, return_value);
            let expected = (paid - s.new_total).max(Decimal::ZERO);
            prop_assert_eq!(s.refund, expected);
        }

        /// Settlement status matches a fresh derivation from the new amounts
        #[test]
        fn prop_settlement_status_is_derived(
            (total, paid) in sale_amounts_strategy(),
            return_value in amount_strategy(),
        ) {
            let s = settle_return(total, paid, return_value);
            prop_assert_eq!(s.status, derive_payment_status(s.new_paid, s.new_total));
        }

        /// Settling returns one after another never lets returned exceed sold
        #[test]
        fn prop_sequential_line_returns_capped(
            qty in 1i32..=100,
            requests in prop::collection::vec(1i32..=100, 0..10),
        ) {
            let mut returned = 0;
            for req in requests {
                if let Ok(new_returned) = simulate_line_return(qty, returned, req) {
                    returned = new_returned;
                }
                prop_assert!(returned <= qty);
            }
        }
    }
}

// ============================================================================
// Simulation Helpers
// ============================================================================

/// Mirror of the guarded returned_qty bump on a sale line
fn simulate_line_return(qty: i32, returned_qty: i32, request: i32) -> Result<i32, &'static str> {
    if request <= 0 {
        return Err("qty must be positive");
    }
    if request > qty - returned_qty {
        return Err("return exceeds remaining");
    }
    Ok(returned_qty + request)
}

/// Whether a return line in this condition goes back into its lot
fn restocks(condition: ReturnCondition) -> bool {
    condition == ReturnCondition::Good
}
