//! Payment validation and receipt numbering.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::error::FeeError;
use super::status::StatusEngine;
use super::types::{AcceptedPayment, ObligationSnapshot, PaymentInput};

/// Maximum number of decimal places a payment amount may carry.
pub const AMOUNT_SCALE: u32 = 2;

/// Longest transaction reference the ledger stores.
pub const MAX_REFERENCE_LEN: usize = 100;

/// Stateless service holding the payment acceptance rules.
pub struct PaymentService;

impl PaymentService {
    /// Validates a payment against an obligation read under lock.
    ///
    /// Checks, in order:
    /// 1. The obligation is not `paid` or `waived`
    /// 2. The amount is positive with at most two decimal places
    /// 3. The amount does not exceed the pending amount
    /// 4. Non-cash methods carry a reference of at most
    ///    [`MAX_REFERENCE_LEN`] characters
    /// 5. The payment date is not in the future
    ///
    /// # Errors
    ///
    /// Returns the first rule violated.
    pub fn validate_payment(
        obligation: &ObligationSnapshot,
        input: &PaymentInput,
        today: NaiveDate,
    ) -> Result<AcceptedPayment, FeeError> {
        if obligation.status.is_settled() {
            return Err(FeeError::ObligationSettled {
                id: obligation.id,
                status: obligation.status,
            });
        }

        if input.amount <= Decimal::ZERO {
            return Err(FeeError::NonPositiveAmount);
        }
        if input.amount.normalize().scale() > AMOUNT_SCALE {
            return Err(FeeError::TooManyDecimalPlaces(input.amount));
        }

        let pending = obligation.total_amount - obligation.paid_amount;
        if input.amount > pending {
            return Err(FeeError::Overpayment {
                amount: input.amount,
                pending,
            });
        }

        let reference = input
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(ToString::to_string);
        if input.method.requires_reference() && reference.is_none() {
            return Err(FeeError::ReferenceRequired(input.method));
        }
        if reference
            .as_deref()
            .is_some_and(|r| r.chars().count() > MAX_REFERENCE_LEN)
        {
            return Err(FeeError::ReferenceTooLong(MAX_REFERENCE_LEN));
        }

        let payment_date = input.payment_date.unwrap_or(today);
        if payment_date > today {
            return Err(FeeError::FuturePaymentDate(payment_date));
        }

        let paid_after = obligation.paid_amount + input.amount;
        let status_after = StatusEngine::recompute(
            obligation.status,
            obligation.total_amount,
            paid_after,
            obligation.due_date,
            today,
        );

        Ok(AcceptedPayment {
            amount: input.amount,
            payment_date,
            reference,
            paid_after,
            status_after,
        })
    }

    /// Formats a receipt number as `{prefix}-{YYYYMM}-{seq:06}`.
    ///
    /// The sequence comes from a database sequence, so numbers are unique
    /// across months and never reused.
    #[must_use]
    pub fn format_receipt_number(prefix: &str, issued_on: NaiveDate, sequence: i64) -> String {
        format!(
            "{prefix}-{:04}{:02}-{sequence:06}",
            issued_on.year(),
            issued_on.month()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::types::{ObligationStatus, PaymentMethod};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn obligation(total: Decimal, paid: Decimal, status: ObligationStatus) -> ObligationSnapshot {
        ObligationSnapshot {
            id: Uuid::new_v4(),
            total_amount: total,
            paid_amount: paid,
            due_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            status,
        }
    }

    fn cash(amount: Decimal) -> PaymentInput {
        PaymentInput {
            amount,
            method: PaymentMethod::Cash,
            reference: None,
            payment_date: None,
        }
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut ob = obligation(dec!(1000), dec!(0), ObligationStatus::Pending);

        let first = PaymentService::validate_payment(&ob, &cash(dec!(400)), today()).unwrap();
        assert_eq!(first.paid_after, dec!(400));
        assert_eq!(first.status_after, ObligationStatus::Partial);
        assert_eq!(first.payment_date, today());

        ob.paid_amount = first.paid_after;
        ob.status = first.status_after;
        let online = PaymentInput {
            amount: dec!(600),
            method: PaymentMethod::Online,
            reference: Some("TXN-77".into()),
            payment_date: None,
        };
        let second = PaymentService::validate_payment(&ob, &online, today()).unwrap();
        assert_eq!(second.paid_after, dec!(1000));
        assert_eq!(second.status_after, ObligationStatus::Paid);

        ob.paid_amount = second.paid_after;
        ob.status = second.status_after;
        let err = PaymentService::validate_payment(&ob, &cash(dec!(1)), today()).unwrap_err();
        assert!(matches!(err, FeeError::ObligationSettled { .. }));
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_exact_pending_pays_and_one_cent_over_rejected() {
        let ob = obligation(dec!(300), dec!(0), ObligationStatus::Pending);

        let exact = PaymentService::validate_payment(&ob, &cash(dec!(300.00)), today()).unwrap();
        assert_eq!(exact.status_after, ObligationStatus::Paid);

        let err = PaymentService::validate_payment(&ob, &cash(dec!(300.01)), today()).unwrap_err();
        assert!(matches!(err, FeeError::Overpayment { .. }));
    }

    #[test]
    fn test_overpayment_message_carries_values() {
        let ob = obligation(dec!(300), dec!(0), ObligationStatus::Pending);
        let err = PaymentService::validate_payment(&ob, &cash(dec!(500)), today()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Payment amount (500) cannot exceed pending amount (300)"
        );
    }

    #[test]
    fn test_reference_length_limit() {
        let ob = obligation(dec!(300), dec!(0), ObligationStatus::Pending);
        let card = |reference: String| PaymentInput {
            amount: dec!(100),
            method: PaymentMethod::Card,
            reference: Some(reference),
            payment_date: None,
        };

        let longest = "R".repeat(MAX_REFERENCE_LEN);
        let accepted =
            PaymentService::validate_payment(&ob, &card(longest.clone()), today()).unwrap();
        assert_eq!(accepted.reference.as_deref(), Some(longest.as_str()));

        // Surrounding whitespace is trimmed before the length check.
        let padded = format!("  {longest}  ");
        assert!(PaymentService::validate_payment(&ob, &card(padded), today()).is_ok());

        let too_long = card("R".repeat(MAX_REFERENCE_LEN + 1));
        let err = PaymentService::validate_payment(&ob, &too_long, today()).unwrap_err();
        assert!(matches!(err, FeeError::ReferenceTooLong(MAX_REFERENCE_LEN)));
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_waived_rejects_payment() {
        let ob = obligation(dec!(300), dec!(0), ObligationStatus::Waived);
        let err = PaymentService::validate_payment(&ob, &cash(dec!(10)), today()).unwrap_err();
        assert!(matches!(
            err,
            FeeError::ObligationSettled {
                status: ObligationStatus::Waived,
                ..
            }
        ));
    }

    #[test]
    fn test_amount_rules() {
        let ob = obligation(dec!(300), dec!(0), ObligationStatus::Pending);
        assert!(matches!(
            PaymentService::validate_payment(&ob, &cash(dec!(0)), today()),
            Err(FeeError::NonPositiveAmount)
        ));
        assert!(matches!(
            PaymentService::validate_payment(&ob, &cash(dec!(-5)), today()),
            Err(FeeError::NonPositiveAmount)
        ));
        assert!(matches!(
            PaymentService::validate_payment(&ob, &cash(dec!(10.005)), today()),
            Err(FeeError::TooManyDecimalPlaces(_))
        ));
        assert!(PaymentService::validate_payment(&ob, &cash(dec!(10.500)), today()).is_ok());
    }

    #[test]
    fn test_reference_required_for_non_cash() {
        let ob = obligation(dec!(300), dec!(0), ObligationStatus::Pending);
        for method in PaymentMethod::ALL {
            let input = PaymentInput {
                amount: dec!(10),
                method,
                reference: Some("   ".into()),
                payment_date: None,
            };
            let result = PaymentService::validate_payment(&ob, &input, today());
            if method == PaymentMethod::Cash {
                assert_eq!(result.unwrap().reference, None);
            } else {
                assert!(matches!(result, Err(FeeError::ReferenceRequired(m)) if m == method));
            }
        }
    }

    #[test]
    fn test_payment_date_rules() {
        let ob = obligation(dec!(300), dec!(0), ObligationStatus::Pending);
        let mut input = cash(dec!(10));

        input.payment_date = Some(today().succ_opt().unwrap());
        assert!(matches!(
            PaymentService::validate_payment(&ob, &input, today()),
            Err(FeeError::FuturePaymentDate(_))
        ));

        input.payment_date = Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        let accepted = PaymentService::validate_payment(&ob, &input, today()).unwrap();
        assert_eq!(accepted.payment_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn test_receipt_number_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(
            PaymentService::format_receipt_number("RCP", date, 42),
            "RCP-202503-000042"
        );
        assert_eq!(
            PaymentService::format_receipt_number("SCH", date, 1_234_567),
            "SCH-202503-1234567"
        );
    }
}
