//! Report routes and exports.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use bursar_core::fees::AuthorizationScope;
use bursar_core::reports::{
    AnalysisPeriod, CollectionReport, DateRange, DefaultersReport, GroupBy, OutstandingReport,
    PaymentAnalysisReport,
};
use bursar_core::{ExportFormat, ExportService, ReportKind};
use bursar_db::LedgerFilter;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::parse_opt;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the report routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/collection", get(collection_report))
        .route("/reports/outstanding", get(outstanding_report))
        .route("/reports/defaulters", get(defaulters_report))
        .route("/reports/payment-analysis", get(payment_analysis_report))
        .route("/reports/{report_type}/export", get(export_report))
}

/// Query parameters shared by every report.
///
/// Each report reads the parameters it needs; the export endpoint accepts
/// the union plus `format`.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Collection: first due date (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Collection: last due date (inclusive).
    pub end_date: Option<NaiveDate>,
    /// Collection: student, class, category or date (default: category).
    pub group_by: Option<String>,
    /// Outstanding and defaulters: minimum days past due (default: 0).
    pub min_days_overdue: Option<i64>,
    /// Defaulters: minimum overdue outstanding per student.
    pub min_outstanding_amount: Option<String>,
    /// Payment analysis: today, week, month, quarter or year (default: month).
    pub period: Option<String>,
    /// Filter by student.
    pub student_id: Option<Uuid>,
    /// Filter by class.
    pub class_id: Option<Uuid>,
    /// Filter by fee category.
    pub fee_category_id: Option<Uuid>,
    /// Export only: csv or json (default: csv).
    pub format: Option<String>,
}

impl ReportQuery {
    fn filter(&self) -> LedgerFilter {
        LedgerFilter {
            student_id: self.student_id,
            class_id: self.class_id,
            fee_category_id: self.fee_category_id,
        }
    }

    fn date_range(&self) -> Result<DateRange, ApiError> {
        let start = self
            .start_date
            .ok_or_else(|| ApiError::validation("start_date is required"))?;
        let end = self
            .end_date
            .ok_or_else(|| ApiError::validation("end_date is required"))?;
        Ok(DateRange::new(start, end)?)
    }

    fn group_by(&self) -> Result<GroupBy, ApiError> {
        Ok(parse_opt::<GroupBy>(self.group_by.as_deref())?.unwrap_or(GroupBy::Category))
    }

    fn min_days_overdue(&self) -> i64 {
        self.min_days_overdue.unwrap_or(0)
    }

    fn min_outstanding_amount(&self) -> Result<Option<Decimal>, ApiError> {
        self.min_outstanding_amount
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<Decimal>().map_err(|_| {
                    ApiError::validation(format!("Invalid min_outstanding_amount: {v}"))
                })
            })
            .transpose()
    }

    fn period(&self) -> Result<AnalysisPeriod, ApiError> {
        Ok(parse_opt::<AnalysisPeriod>(self.period.as_deref())?.unwrap_or(AnalysisPeriod::Month))
    }

    fn format(&self) -> Result<ExportFormat, ApiError> {
        Ok(parse_opt::<ExportFormat>(self.format.as_deref())?.unwrap_or(ExportFormat::Csv))
    }
}

async fn load_collection(
    state: &AppState,
    scope: &AuthorizationScope,
    query: &ReportQuery,
) -> Result<CollectionReport, ApiError> {
    let range = query.date_range()?;
    let group_by = query.group_by()?;
    Ok(state
        .report_repository()
        .collection(scope, range, group_by, &query.filter())
        .await?)
}

async fn load_outstanding(
    state: &AppState,
    scope: &AuthorizationScope,
    query: &ReportQuery,
) -> Result<OutstandingReport, ApiError> {
    Ok(state
        .report_repository()
        .outstanding(scope, query.min_days_overdue(), &query.filter())
        .await?)
}

async fn load_defaulters(
    state: &AppState,
    scope: &AuthorizationScope,
    query: &ReportQuery,
) -> Result<DefaultersReport, ApiError> {
    let threshold = query.min_outstanding_amount()?;
    Ok(state
        .report_repository()
        .defaulters(scope, threshold, query.min_days_overdue(), &query.filter())
        .await?)
}

async fn load_payment_analysis(
    state: &AppState,
    scope: &AuthorizationScope,
    query: &ReportQuery,
) -> Result<PaymentAnalysisReport, ApiError> {
    let period = query.period()?;
    Ok(state
        .report_repository()
        .payment_analysis(scope, period, &query.filter())
        .await?)
}

/// GET `/reports/collection`
async fn collection_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<CollectionReport>, ApiError> {
    Ok(Json(load_collection(&state, &auth.scope(), &query).await?))
}

/// GET `/reports/outstanding`
async fn outstanding_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<OutstandingReport>, ApiError> {
    Ok(Json(load_outstanding(&state, &auth.scope(), &query).await?))
}

/// GET `/reports/defaulters`
async fn defaulters_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<DefaultersReport>, ApiError> {
    Ok(Json(load_defaulters(&state, &auth.scope(), &query).await?))
}

/// GET `/reports/payment-analysis`
async fn payment_analysis_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<PaymentAnalysisReport>, ApiError> {
    Ok(Json(
        load_payment_analysis(&state, &auth.scope(), &query).await?,
    ))
}

/// GET `/reports/{report_type}/export?format=csv|json`
async fn export_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(report_type): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let kind: ReportKind = report_type.parse()?;
    let format = query.format()?;
    let scope = auth.scope();

    let rendered = match kind {
        ReportKind::Collection => {
            let report = load_collection(&state, &scope, &query).await?;
            ExportService::render(kind, &report, format)?
        }
        ReportKind::Outstanding => {
            let report = load_outstanding(&state, &scope, &query).await?;
            ExportService::render(kind, &report, format)?
        }
        ReportKind::Defaulters => {
            let report = load_defaulters(&state, &scope, &query).await?;
            ExportService::render(kind, &report, format)?
        }
        ReportKind::PaymentAnalysis => {
            let report = load_payment_analysis(&state, &scope, &query).await?;
            ExportService::render(kind, &report, format)?
        }
    };

    let disposition = format!("attachment; filename=\"{}\"", rendered.filename);
    Ok((
        [
            (CONTENT_TYPE, rendered.content_type.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        rendered.body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_report_query_defaults() {
        let query = ReportQuery::default();
        assert_eq!(query.group_by().unwrap(), GroupBy::Category);
        assert_eq!(query.period().unwrap(), AnalysisPeriod::Month);
        assert_eq!(query.format().unwrap(), ExportFormat::Csv);
        assert_eq!(query.min_days_overdue(), 0);
        assert_eq!(query.min_outstanding_amount().unwrap(), None);
        assert!(query.date_range().is_err());
    }

    #[test]
    fn test_report_query_parsing() {
        let query = ReportQuery {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31),
            group_by: Some("class".into()),
            min_outstanding_amount: Some("5000.50".into()),
            period: Some("quarter".into()),
            format: Some("JSON".into()),
            ..ReportQuery::default()
        };
        assert_eq!(query.group_by().unwrap(), GroupBy::Class);
        assert_eq!(query.period().unwrap(), AnalysisPeriod::Quarter);
        assert_eq!(query.format().unwrap(), ExportFormat::Json);
        assert_eq!(query.min_outstanding_amount().unwrap(), Some(dec!(5000.50)));
        assert!(query.date_range().is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let query = ReportQuery {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 31),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..ReportQuery::default()
        };
        let err = query.date_range().unwrap_err();
        assert_eq!(err.0.status_code(), 400);
    }

    #[test]
    fn test_bad_amount_rejected() {
        let query = ReportQuery {
            min_outstanding_amount: Some("lots".into()),
            ..ReportQuery::default()
        };
        assert!(query.min_outstanding_amount().is_err());
    }
}
