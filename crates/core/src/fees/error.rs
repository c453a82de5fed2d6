//! Fee ledger error types for validation and state errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use bursar_shared::AppError;

use super::types::{ObligationStatus, PaymentMethod};

/// Errors that can occur during fee ledger operations.
#[derive(Debug, Error)]
pub enum FeeError {
    // ========== Lookup Errors ==========
    /// Fee category not found.
    #[error("Fee category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Obligation not found.
    #[error("Fee obligation not found: {0}")]
    ObligationNotFound(Uuid),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(Uuid),

    /// Student not found.
    #[error("Student not found: {0}")]
    StudentNotFound(Uuid),

    /// Class not found.
    #[error("Class not found: {0}")]
    ClassNotFound(Uuid),

    // ========== Validation Errors ==========
    /// A required text field was empty.
    #[error("{0} is required")]
    Required(&'static str),

    /// A field carried a value outside its domain.
    #[error("Invalid {field}: {value}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: String,
    },

    /// Category amount cannot be negative.
    #[error("Fee amount cannot be negative: {0}")]
    NegativeFeeAmount(Decimal),

    /// Discount outside `[0, base]`.
    #[error("Discount ({discount}) must be between 0 and the fee amount ({base})")]
    InvalidDiscount {
        /// Requested discount.
        discount: Decimal,
        /// Category base amount.
        base: Decimal,
    },

    /// Fee category is inactive and cannot be assigned.
    #[error("Fee category {0} is inactive")]
    CategoryInactive(Uuid),

    /// Assignment batch contained no students.
    #[error("At least one student is required")]
    EmptyStudentList,

    /// Class has no active students.
    #[error("Class {0} has no active students")]
    EmptyRoster(Uuid),

    /// Payment amount must be positive.
    #[error("Payment amount must be greater than zero")]
    NonPositiveAmount,

    /// Payment amount had sub-cent precision.
    #[error("Payment amount ({0}) cannot have more than 2 decimal places")]
    TooManyDecimalPlaces(Decimal),

    /// Payment exceeds what is still owed.
    #[error(
        "Payment amount ({}) cannot exceed pending amount ({})",
        .amount.normalize(),
        .pending.normalize()
    )]
    Overpayment {
        /// Requested amount.
        amount: Decimal,
        /// Amount still owed.
        pending: Decimal,
    },

    /// Method needs an external reference.
    #[error("Transaction reference is required for {0} payments")]
    ReferenceRequired(PaymentMethod),

    /// Reference longer than the stored column.
    #[error("Transaction reference cannot exceed {0} characters")]
    ReferenceTooLong(usize),

    /// Payment dated after today.
    #[error("Payment date {0} cannot be in the future")]
    FuturePaymentDate(NaiveDate),

    // ========== Conflict Errors ==========
    /// Obligation already exists for the (student, category, due date) triple.
    #[error("Student {student_id} already has fee category {fee_category_id} due on {due_date}")]
    DuplicateObligation {
        /// Student.
        student_id: Uuid,
        /// Fee category.
        fee_category_id: Uuid,
        /// Due date.
        due_date: NaiveDate,
    },

    /// Same student listed twice in one batch.
    #[error("Student {0} is listed more than once")]
    DuplicateStudentInBatch(Uuid),

    // ========== State Errors ==========
    /// No further payments accepted.
    #[error("Fee obligation {id} is already {status}")]
    ObligationSettled {
        /// Obligation.
        id: Uuid,
        /// Current status.
        status: ObligationStatus,
    },

    /// Paid obligations cannot be waived.
    #[error("Fee obligation {0} is fully paid and cannot be waived")]
    CannotWaivePaid(Uuid),

    /// Category fields are frozen once an obligation references it.
    #[error("Fee category {0} is referenced by obligations and can only be deactivated")]
    CategoryInUse(Uuid),

    /// Payment is too old to reverse.
    #[error(
        "Payment {payment_id} dated {payment_date} is outside the {window_days}-day reversal window"
    )]
    ReversalWindowExpired {
        /// Payment.
        payment_id: Uuid,
        /// Payment date.
        payment_date: NaiveDate,
        /// Configured window.
        window_days: i64,
    },

    // ========== Authorization Errors ==========
    /// Role lacks the permission.
    #[error("Role {role} cannot {action}")]
    Forbidden {
        /// Role name.
        role: &'static str,
        /// Attempted action.
        action: &'static str,
    },

    // ========== Infrastructure Errors ==========
    /// Timed out waiting for a lock or the unit of work.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FeeError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CategoryNotFound(_) => "FEE_CATEGORY_NOT_FOUND",
            Self::ObligationNotFound(_) => "OBLIGATION_NOT_FOUND",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::StudentNotFound(_) => "STUDENT_NOT_FOUND",
            Self::ClassNotFound(_) => "CLASS_NOT_FOUND",
            Self::Required(_) => "FIELD_REQUIRED",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::NegativeFeeAmount(_) => "NEGATIVE_FEE_AMOUNT",
            Self::InvalidDiscount { .. } => "INVALID_DISCOUNT",
            Self::CategoryInactive(_) => "FEE_CATEGORY_INACTIVE",
            Self::EmptyStudentList => "EMPTY_STUDENT_LIST",
            Self::EmptyRoster(_) => "EMPTY_ROSTER",
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::TooManyDecimalPlaces(_) => "TOO_MANY_DECIMAL_PLACES",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::ReferenceRequired(_) => "REFERENCE_REQUIRED",
            Self::ReferenceTooLong(_) => "REFERENCE_TOO_LONG",
            Self::FuturePaymentDate(_) => "FUTURE_PAYMENT_DATE",
            Self::DuplicateObligation { .. } => "DUPLICATE_OBLIGATION",
            Self::DuplicateStudentInBatch(_) => "DUPLICATE_STUDENT_IN_BATCH",
            Self::ObligationSettled { .. } => "OBLIGATION_SETTLED",
            Self::CannotWaivePaid(_) => "CANNOT_WAIVE_PAID",
            Self::CategoryInUse(_) => "FEE_CATEGORY_IN_USE",
            Self::ReversalWindowExpired { .. } => "REVERSAL_WINDOW_EXPIRED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Timeout(_) => "TIMEOUT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Required(_)
            | Self::InvalidValue { .. }
            | Self::NegativeFeeAmount(_)
            | Self::InvalidDiscount { .. }
            | Self::CategoryInactive(_)
            | Self::EmptyStudentList
            | Self::EmptyRoster(_)
            | Self::NonPositiveAmount
            | Self::TooManyDecimalPlaces(_)
            | Self::Overpayment { .. }
            | Self::ReferenceRequired(_)
            | Self::ReferenceTooLong(_)
            | Self::FuturePaymentDate(_) => 400,

            // 403 Forbidden - role checks
            Self::Forbidden { .. } => 403,

            // 404 Not Found
            Self::CategoryNotFound(_)
            | Self::ObligationNotFound(_)
            | Self::PaymentNotFound(_)
            | Self::StudentNotFound(_)
            | Self::ClassNotFound(_) => 404,

            // 409 Conflict - duplicate assignment
            Self::DuplicateObligation { .. } | Self::DuplicateStudentInBatch(_) => 409,

            // 422 Unprocessable - not allowed in the current state
            Self::ObligationSettled { .. }
            | Self::CannotWaivePaid(_)
            | Self::CategoryInUse(_)
            | Self::ReversalWindowExpired { .. } => 422,

            // 503 Service Unavailable - retry later
            Self::Timeout(_) => 503,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<FeeError> for AppError {
    fn from(err: FeeError) -> Self {
        let message = err.to_string();
        match err.http_status_code() {
            400 => Self::Validation(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            422 => Self::InvalidState(message),
            503 => Self::Transient(message),
            _ => match err {
                FeeError::Database(msg) => Self::Database(msg),
                _ => Self::Internal(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_overpayment_message() {
        let err = FeeError::Overpayment {
            amount: dec!(500),
            pending: dec!(300),
        };
        assert_eq!(
            err.to_string(),
            "Payment amount (500) cannot exceed pending amount (300)"
        );
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_overpayment_message_ignores_column_scale() {
        let err = FeeError::Overpayment {
            amount: dec!(500),
            pending: dec!(300.00),
        };
        assert_eq!(
            err.to_string(),
            "Payment amount (500) cannot exceed pending amount (300)"
        );

        let err = FeeError::Overpayment {
            amount: dec!(12.50),
            pending: dec!(12.40),
        };
        assert_eq!(
            err.to_string(),
            "Payment amount (12.5) cannot exceed pending amount (12.4)"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(FeeError::EmptyStudentList.http_status_code(), 400);
        assert_eq!(
            FeeError::ObligationNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(
            FeeError::DuplicateStudentInBatch(Uuid::nil()).http_status_code(),
            409
        );
        assert_eq!(
            FeeError::ObligationSettled {
                id: Uuid::nil(),
                status: ObligationStatus::Paid,
            }
            .http_status_code(),
            422
        );
        assert_eq!(FeeError::Timeout("lock".into()).http_status_code(), 503);
        assert_eq!(FeeError::Database("x".into()).http_status_code(), 500);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(FeeError::Timeout("lock".into()).is_retryable());
        assert!(!FeeError::NonPositiveAmount.is_retryable());
        assert!(!FeeError::Database("x".into()).is_retryable());
    }

    #[test]
    fn test_maps_into_app_error() {
        let app: AppError = FeeError::ReferenceRequired(PaymentMethod::Cheque).into();
        assert!(matches!(app, AppError::Validation(_)));
        assert_eq!(
            app.to_string(),
            "Validation error: Transaction reference is required for cheque payments"
        );

        let app: AppError = FeeError::ReversalWindowExpired {
            payment_id: Uuid::nil(),
            payment_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            window_days: 30,
        }
        .into();
        assert!(matches!(app, AppError::InvalidState(_)));

        let app: AppError = FeeError::Timeout("lock".into()).into();
        assert!(app.is_retryable());

        let app: AppError = FeeError::Database("gone".into()).into();
        assert!(matches!(app, AppError::Database(ref m) if m == "gone"));
    }
}
