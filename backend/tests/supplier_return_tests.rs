//! Supplier return tests
//!
//! Tests for the return-to-supplier lifecycle:
//! - open states advance or cancel; completed and cancelled are terminal
//! - stock is deducted exactly once, on the transition into completed
//! - completion fails when a lot no longer has the quantity
//! - deletion is allowed for anything that never moved stock

use proptest::prelude::*;
use shared::ledger::LotQuantities;
use shared::types::SupplierReturnStatus;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use SupplierReturnStatus::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(Pending.can_transition(Approved));
        assert!(Approved.can_transition(Completed));
    }

    #[test]
    fn test_cancellation_from_open_states() {
        assert!(Pending.can_transition(Cancelled));
        assert!(Approved.can_transition(Cancelled));
    }

    /// Approval is optional: a pending return may complete directly,
    /// and doing so still deducts the stock
    #[test]
    fn test_direct_completion_from_pending() {
        assert!(Pending.can_transition(Completed));

        let lot = LotQuantities {
            qty_in: 50,
            qty_remaining: 50,
        };
        let mut doc = super::ReturnDoc::draft(lot, 20);
        doc.transition(Completed).unwrap();
        assert_eq!(doc.status, Completed);
        assert_eq!(doc.lot.qty_remaining, 30);
    }

    #[test]
    fn test_terminal_states_are_frozen() {
        for to in [Pending, Approved, Completed, Cancelled] {
            assert!(!Completed.can_transition(to));
            assert!(!Cancelled.can_transition(to));
        }
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Approved.is_terminal());
    }

    #[test]
    fn test_no_backward_moves() {
        assert!(!Approved.can_transition(Pending));
        assert!(!Pending.can_transition(Pending));
    }

    /// Drafting and approving touch no stock; completing deducts it
    #[test]
    fn test_stock_deducted_only_at_completion() {
        let lot = LotQuantities {
            qty_in: 50,
            qty_remaining: 50,
        };
        let mut doc = super::ReturnDoc::draft(lot, 20);

        assert_eq!(doc.lot.qty_remaining, 50);
        doc.transition(Approved).unwrap();
        assert_eq!(doc.lot.qty_remaining, 50);
        doc.transition(Completed).unwrap();
        assert_eq!(doc.lot.qty_remaining, 30);
    }

    /// Cancelling after approval leaves the lot untouched
    #[test]
    fn test_cancellation_leaves_stock_alone() {
        let lot = LotQuantities {
            qty_in: 50,
            qty_remaining: 50,
        };
        let mut doc = super::ReturnDoc::draft(lot, 20);
        doc.transition(Approved).unwrap();
        doc.transition(Cancelled).unwrap();
        assert_eq!(doc.lot.qty_remaining, 50);
    }

    /// Completion is rejected when the stock has been sold in the meantime
    #[test]
    fn test_completion_fails_without_stock() {
        let lot = LotQuantities {
            qty_in: 50,
            qty_remaining: 10,
        };
        let mut doc = super::ReturnDoc::draft(lot, 20);
        doc.transition(Approved).unwrap();
        assert!(doc.transition(Completed).is_err());
        // The failed transition changed nothing
        assert_eq!(doc.status, Approved);
        assert_eq!(doc.lot.qty_remaining, 10);
    }

    #[test]
    fn test_status_round_trip() {
        for s in ["pending", "approved", "completed", "cancelled"] {
            assert_eq!(SupplierReturnStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(SupplierReturnStatus::from_str("shipped").is_none());
    }

    /// Any return that never moved stock can be deleted, even after
    /// approval or cancellation; only a completed one is frozen
    #[test]
    fn test_delete_allowed_unless_completed() {
        let lot = LotQuantities {
            qty_in: 50,
            qty_remaining: 50,
        };

        let pending = super::ReturnDoc::draft(lot, 20);
        assert!(pending.can_delete());

        let mut approved = super::ReturnDoc::draft(lot, 20);
        approved.transition(Approved).unwrap();
        assert!(approved.can_delete());

        let mut cancelled = super::ReturnDoc::draft(lot, 20);
        cancelled.transition(Cancelled).unwrap();
        assert!(cancelled.can_delete());

        let mut completed = super::ReturnDoc::draft(lot, 20);
        completed.transition(Completed).unwrap();
        assert!(!completed.can_delete());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = SupplierReturnStatus> {
        prop_oneof![
            Just(SupplierReturnStatus::Pending),
            Just(SupplierReturnStatus::Approved),
            Just(SupplierReturnStatus::Completed),
            Just(SupplierReturnStatus::Cancelled),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Terminal states admit no outgoing transitions at all
        #[test]
        fn prop_terminal_means_frozen(from in status_strategy(), to in status_strategy()) {
            if from.is_terminal() {
                prop_assert!(!from.can_transition(to));
            }
        }

        /// Every allowed transition moves to a different state
        #[test]
        fn prop_no_self_transitions(from in status_strategy(), to in status_strategy()) {
            if from.can_transition(to) {
                prop_assert!(from != to);
            }
        }

        /// Under any sequence of attempted transitions, stock is deducted
        /// at most once and only by a document that ends completed
        #[test]
        fn prop_deduction_happens_once(
            initial in 0i32..=1_000,
            qty in 1i32..=1_000,
            attempts in prop::collection::vec(status_strategy(), 0..12),
        ) {
            let lot = LotQuantities { qty_in: initial, qty_remaining: initial };
            let mut doc = ReturnDoc::draft(lot, qty);

            for to in attempts {
                let _ = doc.transition(to);
                prop_assert!(doc.lot.qty_remaining >= 0);
                prop_assert!(doc.lot.qty_remaining <= doc.lot.qty_in);
            }

            if doc.status == SupplierReturnStatus::Completed {
                prop_assert_eq!(doc.lot.qty_remaining, initial - qty);
            } else {
                prop_assert_eq!(doc.lot.qty_remaining, initial);
            }
        }

        /// A completed document can never be reached without enough stock
        #[test]
        fn prop_completion_requires_stock(
            initial in 0i32..=100,
            qty in 1i32..=200,
        ) {
            let lot = LotQuantities { qty_in: initial, qty_remaining: initial };
            let mut doc = ReturnDoc::draft(lot, qty);
            let _ = doc.transition(SupplierReturnStatus::Approved);
            let completed = doc.transition(SupplierReturnStatus::Completed).is_ok();

            prop_assert_eq!(completed, qty <= initial);
        }
    }
}

// ============================================================================
// Simulation Helpers
// ============================================================================

/// One-lot return document mirroring the transactional transition rules
struct ReturnDoc {
    status: SupplierReturnStatus,
    lot: LotQuantities,
    qty: i32,
}

impl ReturnDoc {
    fn draft(lot: LotQuantities, qty: i32) -> Self {
        Self {
            status: SupplierReturnStatus::Pending,
            lot,
            qty,
        }
    }

    /// Mirrors update_status: reject bad moves, deduct on completion,
    /// and roll back entirely when the deduction fails
    fn transition(&mut self, to: SupplierReturnStatus) -> Result<(), &'static str> {
        if !self.status.can_transition(to) {
            return Err("invalid transition");
        }
        if to == SupplierReturnStatus::Completed {
            if self.qty > self.lot.qty_remaining {
                return Err("not enough stock");
            }
            self.lot.qty_remaining -= self.qty;
        }
        self.status = to;
        Ok(())
    }

    /// Mirrors delete_return: everything short of completed may be purged
    fn can_delete(&self) -> bool {
        self.status != SupplierReturnStatus::Completed
    }
}
