//! Domain types for the fee ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::FeeError;

/// How often a fee category is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeFrequency {
    /// Charged every month.
    Monthly,
    /// Charged every quarter.
    Quarterly,
    /// Charged every semester.
    Semester,
    /// Charged once per academic year.
    Annual,
    /// Charged a single time.
    #[serde(rename = "one-time")]
    OneTime,
}

impl FeeFrequency {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Semester => "semester",
            Self::Annual => "annual",
            Self::OneTime => "one-time",
        }
    }
}

impl std::str::FromStr for FeeFrequency {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semester" => Ok(Self::Semester),
            "annual" => Ok(Self::Annual),
            "one-time" | "one_time" => Ok(Self::OneTime),
            other => Err(FeeError::InvalidValue {
                field: "frequency",
                value: other.to_string(),
            }),
        }
    }
}

/// Payment status of an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    /// Nothing paid, due date not passed.
    Pending,
    /// Some but not all of the total paid.
    Partial,
    /// Fully settled.
    Paid,
    /// Nothing paid and the due date has passed.
    Overdue,
    /// Administratively forgiven. Terminal.
    Waived,
}

impl ObligationStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Waived => "waived",
        }
    }

    /// Returns true if no further payments may be recorded.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Waived)
    }
}

impl std::fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObligationStatus {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            "waived" => Ok(Self::Waived),
            other => Err(FeeError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash at the counter.
    Cash,
    /// Debit or credit card.
    Card,
    /// Direct bank transfer.
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Online payment portal.
    Online,
    /// UPI transfer.
    Upi,
}

impl PaymentMethod {
    /// All methods, in display order.
    pub const ALL: [Self; 6] = [
        Self::Cash,
        Self::Card,
        Self::BankTransfer,
        Self::Cheque,
        Self::Online,
        Self::Upi,
    ];

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
            Self::Online => "online",
            Self::Upi => "upi",
        }
    }

    /// Every method except cash must carry an external transaction reference.
    #[must_use]
    pub const fn requires_reference(&self) -> bool {
        !matches!(self, Self::Cash)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| FeeError::InvalidValue {
                field: "method",
                value: s.to_string(),
            })
    }
}

/// Point-in-time balance of one obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Obligation ID.
    pub obligation_id: Uuid,
    /// `base_amount - discount_amount`.
    pub total_amount: Decimal,
    /// Sum of recorded payments.
    pub paid_amount: Decimal,
    /// `total_amount - paid_amount`.
    pub pending_amount: Decimal,
    /// Status derived from the amounts above.
    pub status: ObligationStatus,
}

impl Balance {
    /// Builds a balance from its total and paid sum.
    #[must_use]
    pub fn new(
        obligation_id: Uuid,
        total_amount: Decimal,
        paid_amount: Decimal,
        status: ObligationStatus,
    ) -> Self {
        Self {
            obligation_id,
            total_amount,
            paid_amount,
            pending_amount: total_amount - paid_amount,
            status,
        }
    }
}

/// Input for creating a fee category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFeeCategoryInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Base amount charged per obligation.
    pub amount: Decimal,
    /// Charging frequency.
    pub frequency: FeeFrequency,
    /// Whether every student must pay it.
    #[serde(default)]
    pub is_mandatory: bool,
    /// Academic year the category applies to, e.g. "2025-2026".
    pub academic_year: Option<String>,
}

/// Changes to an unreferenced fee category. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFeeCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New base amount.
    pub amount: Option<Decimal>,
    /// New frequency.
    pub frequency: Option<FeeFrequency>,
    /// New mandatory flag.
    pub is_mandatory: Option<bool>,
    /// New academic year.
    pub academic_year: Option<String>,
}

/// Fee category facts the assigner needs.
#[derive(Debug, Clone)]
pub struct CategoryInfo {
    /// Category ID.
    pub id: Uuid,
    /// Base amount.
    pub amount: Decimal,
    /// Whether the category accepts new obligations.
    pub is_active: bool,
}

/// Input for a bulk obligation assignment.
#[derive(Debug, Clone)]
pub struct AssignmentInput {
    /// Fee category to charge.
    pub fee_category_id: Uuid,
    /// Students to charge.
    pub student_ids: Vec<Uuid>,
    /// Due date of every created obligation.
    pub due_date: NaiveDate,
    /// Discount applied to every created obligation.
    pub discount_amount: Decimal,
}

/// A validated obligation ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedObligation {
    /// Student charged.
    pub student_id: Uuid,
    /// Fee category charged.
    pub fee_category_id: Uuid,
    /// Category amount at assignment time.
    pub base_amount: Decimal,
    /// Discount granted.
    pub discount_amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Initial status.
    pub status: ObligationStatus,
}

impl PlannedObligation {
    /// `base_amount - discount_amount`.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.base_amount - self.discount_amount
    }
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    /// Amount paid.
    pub amount: Decimal,
    /// Method used.
    pub method: PaymentMethod,
    /// External transaction reference.
    pub reference: Option<String>,
    /// Date the money was received. Defaults to today.
    pub payment_date: Option<NaiveDate>,
}

/// Obligation state read under lock before a payment is accepted.
#[derive(Debug, Clone)]
pub struct ObligationSnapshot {
    /// Obligation ID.
    pub id: Uuid,
    /// `base_amount - discount_amount`.
    pub total_amount: Decimal,
    /// Sum of payments already recorded.
    pub paid_amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Persisted status.
    pub status: ObligationStatus,
}

/// Outcome of a validated payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedPayment {
    /// Amount to insert.
    pub amount: Decimal,
    /// Payment date to persist.
    pub payment_date: NaiveDate,
    /// Trimmed reference, if any.
    pub reference: Option<String>,
    /// Paid sum after the payment.
    pub paid_after: Decimal,
    /// Status after the payment.
    pub status_after: ObligationStatus,
}

/// Before/after view of a reversed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalResult {
    /// Reversed payment ID.
    pub payment_id: Uuid,
    /// Audit record ID.
    pub reversal_id: Uuid,
    /// Balance before the reversal.
    pub before: Balance,
    /// Balance after the reversal.
    pub after: Balance,
}
