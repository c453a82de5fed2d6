//! Property-based tests for payment acceptance and status derivation.
//!
//! These tests validate the ledger invariants: the paid sum never leaves
//! `[0, total]` and the status always matches what the amounts imply.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::payment::PaymentService;
use super::status::StatusEngine;
use super::types::{ObligationSnapshot, ObligationStatus, PaymentInput, PaymentMethod};

/// Strategy for generating amounts in cents between 0.01 and 10,000.00.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for generating a due date offset from today in days.
fn arb_due_offset() -> impl Strategy<Value = i64> {
    -120i64..120i64
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn cash(amount: Decimal) -> PaymentInput {
    PaymentInput {
        amount,
        method: PaymentMethod::Cash,
        reference: None,
        payment_date: None,
    }
}

proptest! {
    /// Any sequence of attempted payments keeps `0 <= paid <= total`, and
    /// every accepted payment leaves the derived status in place.
    #[test]
    fn prop_paid_sum_stays_within_total(
        total in arb_amount(),
        attempts in prop::collection::vec(arb_amount(), 1..12),
        due_offset in arb_due_offset(),
    ) {
        let due_date = today() + Duration::days(due_offset);
        let mut ob = ObligationSnapshot {
            id: Uuid::new_v4(),
            total_amount: total,
            paid_amount: Decimal::ZERO,
            due_date,
            status: StatusEngine::derive_status(total, Decimal::ZERO, due_date, today()),
        };

        for amount in attempts {
            if let Ok(accepted) = PaymentService::validate_payment(&ob, &cash(amount), today()) {
                ob.paid_amount = accepted.paid_after;
                ob.status = accepted.status_after;
            }

            prop_assert!(ob.paid_amount >= Decimal::ZERO);
            prop_assert!(ob.paid_amount <= ob.total_amount);
            prop_assert_eq!(
                ob.status,
                StatusEngine::derive_status(ob.total_amount, ob.paid_amount, due_date, today())
            );
        }
    }

    /// A payment equal to the pending amount always settles the obligation.
    #[test]
    fn prop_exact_pending_settles(
        total in arb_amount(),
        paid_cents in 0i64..1_000_000i64,
    ) {
        let paid = Decimal::new(paid_cents, 2).min(total - Decimal::new(1, 2));
        prop_assume!(paid >= Decimal::ZERO);
        let ob = ObligationSnapshot {
            id: Uuid::new_v4(),
            total_amount: total,
            paid_amount: paid,
            due_date: today(),
            status: StatusEngine::derive_status(total, paid, today(), today()),
        };

        let accepted = PaymentService::validate_payment(&ob, &cash(total - paid), today()).unwrap();
        prop_assert_eq!(accepted.status_after, ObligationStatus::Paid);

        let over = PaymentService::validate_payment(
            &ob,
            &cash(total - paid + Decimal::new(1, 2)),
            today(),
        );
        prop_assert!(over.is_err());
    }

    /// Removing a payment and recomputing restores the prior status.
    #[test]
    fn prop_reversal_restores_prior_status(
        total in arb_amount(),
        first_cents in 1i64..1_000_000i64,
        due_offset in arb_due_offset(),
    ) {
        let due_date = today() + Duration::days(due_offset);
        let before_paid = Decimal::new(first_cents, 2).min(total);
        let before = StatusEngine::derive_status(total, Decimal::ZERO, due_date, today());

        let after_payment = StatusEngine::derive_status(total, before_paid, due_date, today());
        let after_reversal = StatusEngine::recompute(
            after_payment,
            total,
            Decimal::ZERO,
            due_date,
            today(),
        );
        prop_assert_eq!(after_reversal, before);
    }

    /// Derivation is deterministic and never yields `waived`.
    #[test]
    fn prop_derive_never_waives(
        total in arb_amount(),
        paid in arb_amount(),
        due_offset in arb_due_offset(),
    ) {
        let due_date = today() + Duration::days(due_offset);
        let a = StatusEngine::derive_status(total, paid, due_date, today());
        let b = StatusEngine::derive_status(total, paid, due_date, today());
        prop_assert_eq!(a, b);
        prop_assert_ne!(a, ObligationStatus::Waived);
    }
}
