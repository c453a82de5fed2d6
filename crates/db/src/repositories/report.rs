//! Report repository.
//!
//! Loads scoped ledger lines inside one read-only snapshot and hands them to
//! [`ReportService`] for aggregation.

use std::collections::{HashMap, HashSet};

use bursar_core::fees::{AuthorizationScope, FeeError};
use bursar_core::reports::{
    AnalysisPeriod, CollectionReport, DateRange, DefaultersReport, GroupBy, ObligationLine,
    OutstandingReport, PaymentAnalysisReport, PaymentLine, ReportError, ReportService,
};
use bursar_shared::{AppError, ReportConfig};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::lines::{LedgerFilter, obligation_condition, obligation_lines};
use super::payment::payment_scope_condition;
use super::scope::visible_students;
use super::unit_of_work::{begin_snapshot, db_err, today};
use crate::entities::{
    fee_categories, payments, sea_orm_active_enums::ObligationStatus as DbObligationStatus,
    student_fee_obligations,
};

/// Error types for report queries.
#[derive(Debug, thiserror::Error)]
pub enum ReportQueryError {
    /// Invalid report parameters.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Ledger read failure.
    #[error(transparent)]
    Ledger(#[from] FeeError),
}

impl From<ReportQueryError> for AppError {
    fn from(err: ReportQueryError) -> Self {
        match err {
            ReportQueryError::Report(e) => e.into(),
            ReportQueryError::Ledger(e) => e.into(),
        }
    }
}

/// Repository for the read-only reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
    config: ReportConfig,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, config: ReportConfig) -> Self {
        Self { db, config }
    }

    /// Collection report over obligations due inside `range`.
    pub async fn collection(
        &self,
        scope: &AuthorizationScope,
        range: DateRange,
        group_by: GroupBy,
        filter: &LedgerFilter,
    ) -> Result<CollectionReport, ReportQueryError> {
        let today = today();
        let due_in_range = Condition::all()
            .add(student_fee_obligations::Column::DueDate.gte(range.start))
            .add(student_fee_obligations::Column::DueDate.lte(range.end));

        let lines = self.load_lines(scope, filter, due_in_range, today).await?;
        Ok(ReportService::collection_report(&lines, range, group_by))
    }

    /// Outstanding obligations at least `min_days_overdue` days past due.
    pub async fn outstanding(
        &self,
        scope: &AuthorizationScope,
        min_days_overdue: i64,
        filter: &LedgerFilter,
    ) -> Result<OutstandingReport, ReportQueryError> {
        let today = today();
        let due_by = Condition::all().add(
            student_fee_obligations::Column::DueDate.lte(days_before(today, min_days_overdue)),
        );

        let lines = self.load_lines(scope, filter, due_by, today).await?;
        Ok(ReportService::outstanding_dues(&lines, min_days_overdue, today))
    }

    /// Students whose overdue outstanding reaches `min_outstanding_amount`.
    ///
    /// Falls back to the configured default threshold when none is given.
    pub async fn defaulters(
        &self,
        scope: &AuthorizationScope,
        min_outstanding_amount: Option<Decimal>,
        min_days_overdue: i64,
        filter: &LedgerFilter,
    ) -> Result<DefaultersReport, ReportQueryError> {
        let threshold =
            min_outstanding_amount.unwrap_or(self.config.default_defaulter_threshold);
        if threshold < Decimal::ZERO {
            return Err(ReportError::NegativeThreshold.into());
        }

        let today = today();
        let overdue = Condition::all()
            .add(student_fee_obligations::Column::DueDate.lt(today))
            .add(student_fee_obligations::Column::DueDate.lte(days_before(today, min_days_overdue)));

        let lines = self.load_lines(scope, filter, overdue, today).await?;
        Ok(ReportService::defaulters(
            &lines,
            threshold,
            min_days_overdue,
            today,
        )?)
    }

    /// Analysis of payments received in `period` ending today.
    pub async fn payment_analysis(
        &self,
        scope: &AuthorizationScope,
        period: AnalysisPeriod,
        filter: &LedgerFilter,
    ) -> Result<PaymentAnalysisReport, ReportQueryError> {
        let today = today();
        let range = period.range_ending(today);

        let txn = begin_snapshot(&self.db).await?;
        let lines = load_payment_lines(&txn, scope, filter, range).await?;
        txn.commit().await.map_err(db_err)?;

        Ok(ReportService::payment_analysis(
            &lines,
            period,
            today,
            self.config.top_categories_limit,
        ))
    }

    async fn load_lines(
        &self,
        scope: &AuthorizationScope,
        filter: &LedgerFilter,
        extra: Condition,
        today: NaiveDate,
    ) -> Result<Vec<ObligationLine>, FeeError> {
        let txn = begin_snapshot(&self.db).await?;

        let visible = visible_students(&txn, scope).await?;
        if visible.is_empty() {
            return Ok(Vec::new());
        }

        let obligations = student_fee_obligations::Entity::find()
            .filter(obligation_condition(&visible, filter))
            .filter(student_fee_obligations::Column::Status.ne(DbObligationStatus::Waived))
            .filter(extra)
            .order_by_asc(student_fee_obligations::Column::DueDate)
            .all(&txn)
            .await
            .map_err(db_err)?;

        let lines = obligation_lines(&txn, &obligations, today).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(lines)
    }
}

/// `today - days`, saturating at the calendar bounds.
fn days_before(today: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|d| today.checked_sub_signed(d))
        .unwrap_or(if days > 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

async fn load_payment_lines(
    txn: &DatabaseTransaction,
    scope: &AuthorizationScope,
    filter: &LedgerFilter,
    range: DateRange,
) -> Result<Vec<PaymentLine>, FeeError> {
    let visible = visible_students(txn, scope).await?;
    if visible.is_empty() {
        return Ok(Vec::new());
    }

    let payments = payments::Entity::find()
        .filter(payment_scope_condition(&visible, filter))
        .filter(payments::Column::PaymentDate.gte(range.start))
        .filter(payments::Column::PaymentDate.lte(range.end))
        .order_by_asc(payments::Column::PaymentDate)
        .all(txn)
        .await
        .map_err(db_err)?;
    if payments.is_empty() {
        return Ok(Vec::new());
    }

    let obligation_ids: HashSet<Uuid> = payments.iter().map(|p| p.obligation_id).collect();
    let category_of: HashMap<Uuid, Uuid> = student_fee_obligations::Entity::find()
        .select_only()
        .column(student_fee_obligations::Column::Id)
        .column(student_fee_obligations::Column::FeeCategoryId)
        .filter(student_fee_obligations::Column::Id.is_in(obligation_ids))
        .into_tuple::<(Uuid, Uuid)>()
        .all(txn)
        .await
        .map_err(db_err)?
        .into_iter()
        .collect();

    let category_ids: HashSet<Uuid> = category_of.values().copied().collect();
    let category_names: HashMap<Uuid, String> = fee_categories::Entity::find()
        .select_only()
        .column(fee_categories::Column::Id)
        .column(fee_categories::Column::Name)
        .filter(fee_categories::Column::Id.is_in(category_ids))
        .into_tuple::<(Uuid, String)>()
        .all(txn)
        .await
        .map_err(db_err)?
        .into_iter()
        .collect();

    let lines = payments
        .into_iter()
        .filter_map(|p| {
            let fee_category_id = *category_of.get(&p.obligation_id)?;
            Some(PaymentLine {
                payment_id: p.id,
                obligation_id: p.obligation_id,
                fee_category_id,
                fee_category_name: category_names
                    .get(&fee_category_id)
                    .cloned()
                    .unwrap_or_default(),
                amount: p.amount,
                method: p.method.into(),
                payment_date: p.payment_date,
            })
        })
        .collect();

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_before() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(
            days_before(today, 40),
            NaiveDate::from_ymd_opt(2025, 4, 22).unwrap()
        );
        assert_eq!(
            days_before(today, -1),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
        assert_eq!(days_before(today, i64::MAX), NaiveDate::MIN);
    }

    #[test]
    fn test_query_error_maps_to_app_error() {
        let err: AppError = ReportQueryError::from(ReportError::NegativeThreshold).into();
        assert_eq!(err.status_code(), 400);

        let err: AppError = ReportQueryError::from(FeeError::Timeout("lock".into())).into();
        assert_eq!(err.status_code(), 503);
        assert!(err.is_retryable());
    }
}
