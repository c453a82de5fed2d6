//! Report error types.

use chrono::NaiveDate;
use thiserror::Error;

use bursar_shared::AppError;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Unknown grouping dimension.
    #[error("Invalid group_by: {0}. Expected one of student, class, category, date")]
    InvalidGroupBy(String),

    /// Unknown analysis period.
    #[error("Invalid period: {0}. Expected one of today, week, month, quarter, year")]
    InvalidPeriod(String),

    /// Unknown report type.
    #[error("Invalid report type: {0}")]
    InvalidReportType(String),

    /// Unknown export format.
    #[error("Invalid export format: {0}. Expected csv or json")]
    InvalidFormat(String),

    /// Negative outstanding threshold.
    #[error("Minimum outstanding amount cannot be negative")]
    NegativeThreshold,

    /// Rendering failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::InvalidGroupBy(_) => "INVALID_GROUP_BY",
            Self::InvalidPeriod(_) => "INVALID_PERIOD",
            Self::InvalidReportType(_) => "INVALID_REPORT_TYPE",
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::NegativeThreshold => "NEGATIVE_THRESHOLD",
            Self::Export(_) => "EXPORT_FAILED",
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Export(_) => Self::Internal(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
