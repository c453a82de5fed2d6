//! Obligation status derivation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::ObligationStatus;

/// Stateless status engine.
///
/// Status is never stored independently of the amounts it is derived from:
/// callers recompute it inside the same transaction as every mutation.
pub struct StatusEngine;

impl StatusEngine {
    /// Derives the status of an obligation from its amounts and due date.
    ///
    /// - `paid` once the paid sum reaches the total
    /// - `partial` while some but not all is paid, whatever the due date
    /// - `overdue` when nothing is paid and the due date has passed
    /// - `pending` otherwise
    #[must_use]
    pub fn derive_status(
        total_amount: Decimal,
        paid_amount: Decimal,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> ObligationStatus {
        if paid_amount >= total_amount {
            ObligationStatus::Paid
        } else if paid_amount > Decimal::ZERO {
            ObligationStatus::Partial
        } else if due_date < today {
            ObligationStatus::Overdue
        } else {
            ObligationStatus::Pending
        }
    }

    /// Recomputes a persisted status. `waived` is sticky.
    #[must_use]
    pub fn recompute(
        current: ObligationStatus,
        total_amount: Decimal,
        paid_amount: Decimal,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> ObligationStatus {
        if current == ObligationStatus::Waived {
            return ObligationStatus::Waived;
        }
        Self::derive_status(total_amount, paid_amount, due_date, today)
    }
}
