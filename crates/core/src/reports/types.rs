//! Report data types.

use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ReportError;
use crate::fees::{ObligationStatus, PaymentMethod};

// ============================================================================
// Inputs
// ============================================================================

/// One obligation joined with its student, class and category, plus its
/// paid sum. The aggregator works exclusively on these flattened lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationLine {
    /// Obligation ID.
    pub obligation_id: Uuid,
    /// Student ID.
    pub student_id: Uuid,
    /// Student display name.
    pub student_name: String,
    /// Admission number.
    pub admission_number: String,
    /// Class ID, if enrolled.
    pub class_id: Option<Uuid>,
    /// Class name, if enrolled.
    pub class_name: Option<String>,
    /// Fee category ID.
    pub fee_category_id: Uuid,
    /// Fee category name.
    pub fee_category_name: String,
    /// `base - discount`.
    pub total_amount: Decimal,
    /// Sum of payments.
    pub paid_amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Status as of the report date.
    pub status: ObligationStatus,
}

impl ObligationLine {
    /// `total - paid`.
    #[must_use]
    pub fn pending_amount(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }

    /// Days past the due date; negative while not yet due.
    #[must_use]
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days()
    }
}

/// One payment joined with its fee category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLine {
    /// Payment ID.
    pub payment_id: Uuid,
    /// Obligation ID.
    pub obligation_id: Uuid,
    /// Fee category ID.
    pub fee_category_id: Uuid,
    /// Fee category name.
    pub fee_category_name: String,
    /// Amount paid.
    pub amount: Decimal,
    /// Method used.
    pub method: PaymentMethod,
    /// Payment date.
    pub payment_date: NaiveDate,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a validated range.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns true if `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Grouping dimension of the collection report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// One row per student.
    Student,
    /// One row per class.
    Class,
    /// One row per fee category.
    Category,
    /// One row per due date.
    Date,
}

impl FromStr for GroupBy {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "class" => Ok(Self::Class),
            "category" => Ok(Self::Category),
            "date" => Ok(Self::Date),
            other => Err(ReportError::InvalidGroupBy(other.to_string())),
        }
    }
}

/// Look-back window of the payment analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPeriod {
    /// Today only.
    Today,
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    /// Last 90 days.
    Quarter,
    /// Last 365 days.
    Year,
}

impl AnalysisPeriod {
    /// Number of days covered, today included.
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Today => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }

    /// Returns the inclusive range of [`Self::days`] days ending today.
    #[must_use]
    pub fn range_ending(self, today: NaiveDate) -> DateRange {
        DateRange {
            start: today - Duration::days(self.days() - 1),
            end: today,
        }
    }
}

impl FromStr for AnalysisPeriod {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            other => Err(ReportError::InvalidPeriod(other.to_string())),
        }
    }
}

// ============================================================================
// Collection report
// ============================================================================

/// One group of the collection report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRow {
    /// Group identifier (an id or an ISO date).
    pub group_key: String,
    /// Human-readable group label.
    pub group_label: String,
    /// Obligations in the group.
    pub obligation_count: u64,
    /// Sum of totals.
    pub total_amount: Decimal,
    /// Sum of payments.
    pub paid_amount: Decimal,
    /// `total - paid`.
    pub pending_amount: Decimal,
    /// `paid / total * 100`, 0 when total is 0.
    pub collection_percentage: Decimal,
}

/// Collection report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    /// Report type identifier.
    pub report_type: String,
    /// Grouping used.
    pub group_by: GroupBy,
    /// Due-date range covered.
    pub range: DateRange,
    /// One row per group.
    pub rows: Vec<CollectionRow>,
    /// Totals across all rows.
    pub summary: CollectionRow,
}

// ============================================================================
// Outstanding dues
// ============================================================================

/// How late an outstanding obligation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    /// Not yet due.
    Low,
    /// 1 to 30 days late.
    Medium,
    /// 31 to 60 days late.
    High,
    /// More than 60 days late.
    Critical,
}

impl UrgencyLevel {
    /// Classifies by days overdue.
    #[must_use]
    pub const fn from_days_overdue(days: i64) -> Self {
        if days > 60 {
            Self::Critical
        } else if days > 30 {
            Self::High
        } else if days > 0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// One outstanding obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingRow {
    /// Obligation ID.
    pub obligation_id: Uuid,
    /// Student ID.
    pub student_id: Uuid,
    /// Student name.
    pub student_name: String,
    /// Admission number.
    pub admission_number: String,
    /// Class name.
    pub class_name: Option<String>,
    /// Fee category name.
    pub fee_category_name: String,
    /// Obligation total.
    pub total_amount: Decimal,
    /// Paid so far.
    pub paid_amount: Decimal,
    /// Still owed.
    pub pending_amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Days past due; negative while not yet due.
    pub days_overdue: i64,
    /// Status as of the report date.
    pub status: ObligationStatus,
    /// Lateness bucket.
    pub urgency_level: UrgencyLevel,
}

/// Outstanding dues report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingReport {
    /// Report type identifier.
    pub report_type: String,
    /// Reference date.
    pub as_of: NaiveDate,
    /// Minimum lateness applied.
    pub min_days_overdue: i64,
    /// Rows, most overdue first.
    pub rows: Vec<OutstandingRow>,
    /// Sum of pending amounts.
    pub total_pending: Decimal,
}

// ============================================================================
// Defaulters
// ============================================================================

/// Risk bucket of a defaulter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Up to 5,000 outstanding.
    Low,
    /// Over 5,000 outstanding.
    Medium,
    /// Over 10,000 outstanding.
    High,
}

impl RiskLevel {
    /// Classifies by total overdue outstanding.
    #[must_use]
    pub fn from_outstanding(amount: Decimal) -> Self {
        if amount > Decimal::from(10_000) {
            Self::High
        } else if amount > Decimal::from(5_000) {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One student owing overdue fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaulterRow {
    /// Student ID.
    pub student_id: Uuid,
    /// Student name.
    pub student_name: String,
    /// Admission number.
    pub admission_number: String,
    /// Class name.
    pub class_name: Option<String>,
    /// Overdue obligations counted.
    pub overdue_count: u64,
    /// Sum of their pending amounts.
    pub total_outstanding: Decimal,
    /// Earliest due date among them.
    pub oldest_due_date: NaiveDate,
    /// Days past the earliest due date.
    pub max_days_overdue: i64,
    /// Risk bucket.
    pub risk_level: RiskLevel,
}

/// Defaulters report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultersReport {
    /// Report type identifier.
    pub report_type: String,
    /// Reference date.
    pub as_of: NaiveDate,
    /// Minimum outstanding per student.
    pub min_outstanding_amount: Decimal,
    /// Minimum lateness per obligation.
    pub min_days_overdue: i64,
    /// Rows, largest outstanding first.
    pub rows: Vec<DefaulterRow>,
    /// Sum of outstanding across rows.
    pub total_outstanding: Decimal,
}

// ============================================================================
// Payment analysis
// ============================================================================

/// Payments received on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Day.
    pub date: NaiveDate,
    /// Number of payments.
    pub count: u64,
    /// Amount received.
    pub amount: Decimal,
}

/// Payments by one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBreakdown {
    /// Method.
    pub method: PaymentMethod,
    /// Number of payments.
    pub count: u64,
    /// Amount received.
    pub amount: Decimal,
    /// Share of the period total, in percent.
    pub percentage: Decimal,
}

/// Payments against one fee category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCollection {
    /// Fee category ID.
    pub fee_category_id: Uuid,
    /// Fee category name.
    pub fee_category_name: String,
    /// Number of payments.
    pub count: u64,
    /// Amount received.
    pub amount: Decimal,
}

/// Overall payment statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentStats {
    /// Number of payments.
    pub count: u64,
    /// Amount received.
    pub total_amount: Decimal,
    /// Mean payment, rounded to cents.
    pub average_amount: Decimal,
    /// Smallest payment.
    pub min_amount: Decimal,
    /// Largest payment.
    pub max_amount: Decimal,
}

/// Payment analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAnalysisReport {
    /// Report type identifier.
    pub report_type: String,
    /// Period requested.
    pub period: AnalysisPeriod,
    /// Payment-date range covered.
    pub range: DateRange,
    /// Per-day trend, oldest first.
    pub trend: Vec<TrendPoint>,
    /// Per-method breakdown, largest first.
    pub methods: Vec<MethodBreakdown>,
    /// Top fee categories by amount.
    pub top_categories: Vec<CategoryCollection>,
    /// Overall statistics.
    pub stats: PaymentStats,
}
