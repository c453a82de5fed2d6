//! Payment ledger repository.
//!
//! Recording and reversing a payment both lock the obligation row first
//! (`SELECT ... FOR UPDATE`), so concurrent writers on one obligation
//! serialize and each sees the other's committed payments.

use bursar_core::fees::{
    AuthorizationScope, Balance, FeeError, ObligationSnapshot, PaymentInput, PaymentMethod,
    PaymentService, Permission, ReversalResult, StatusEngine,
};
use bursar_shared::types::{PageRequest, PageResponse};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Set, Statement, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::lines::{LedgerFilter, obligation_condition, paid_sum};
use super::scope::{VisibleStudents, visible_students};
use super::unit_of_work::{
    LedgerSettings, begin_snapshot, db_err, run_bounded, set_lock_timeout, today,
};
use crate::entities::{
    payment_reversals, payments, sea_orm_active_enums::ObligationStatus as DbObligationStatus,
    student_fee_obligations,
};

/// Filters for listing payments.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Student, class and category filters.
    pub ledger: LedgerFilter,
    /// Only payments against this obligation.
    pub obligation_id: Option<Uuid>,
    /// Only payments made with this method.
    pub method: Option<PaymentMethod>,
    /// Earliest payment date.
    pub date_from: Option<NaiveDate>,
    /// Latest payment date.
    pub date_to: Option<NaiveDate>,
}

/// A recorded payment together with the obligation balance it produced.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedPayment {
    /// The inserted payment.
    pub payment: payments::Model,
    /// Balance after the payment.
    pub balance: Balance,
}

/// Repository for payments and reversals.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
    settings: LedgerSettings,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Records a payment against an obligation.
    ///
    /// The paid-sum read, validation, insert and status update run in one
    /// transaction holding the obligation row lock. A rejected payment leaves
    /// nothing behind.
    pub async fn record_payment(
        &self,
        scope: &AuthorizationScope,
        obligation_id: Uuid,
        input: PaymentInput,
        remarks: Option<String>,
    ) -> Result<RecordedPayment, FeeError> {
        scope.require(Permission::RecordPayment)?;

        let result = run_bounded(self.settings.unit_of_work_timeout, async {
            let txn = self.db.begin().await.map_err(db_err)?;
            set_lock_timeout(&txn, self.settings.lock_timeout_ms).await?;

            let obligation = lock_obligation(&txn, obligation_id).await?;
            let paid = paid_sum(&txn, obligation_id).await?;
            let total = obligation.total_amount();

            let today = today();
            let snapshot = ObligationSnapshot {
                id: obligation_id,
                total_amount: total,
                paid_amount: paid,
                due_date: obligation.due_date,
                status: obligation.status.into(),
            };
            let accepted = PaymentService::validate_payment(&snapshot, &input, today)?;

            let sequence = next_receipt_sequence(&txn).await?;
            let receipt_number = PaymentService::format_receipt_number(
                &self.settings.receipt_prefix,
                accepted.payment_date,
                sequence,
            );

            let payment = payments::ActiveModel {
                id: Set(Uuid::new_v4()),
                obligation_id: Set(obligation_id),
                amount: Set(accepted.amount),
                payment_date: Set(accepted.payment_date),
                method: Set(input.method.into()),
                transaction_reference: Set(accepted.reference),
                receipt_number: Set(receipt_number),
                processed_by: Set(scope.principal_id),
                remarks: Set(remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;

            update_status(&txn, obligation, accepted.status_after.into()).await?;
            txn.commit().await.map_err(db_err)?;

            Ok(RecordedPayment {
                payment,
                balance: Balance::new(
                    obligation_id,
                    total,
                    accepted.paid_after,
                    accepted.status_after,
                ),
            })
        })
        .await;

        match &result {
            Ok(recorded) => info!(
                obligation_id = %obligation_id,
                payment_id = %recorded.payment.id,
                receipt_number = %recorded.payment.receipt_number,
                amount = %recorded.payment.amount,
                status = %recorded.balance.status,
                "Payment recorded"
            ),
            Err(e) => warn!(obligation_id = %obligation_id, error = %e, "Payment rejected"),
        }
        result
    }

    /// Reverses a payment inside the reversal window.
    ///
    /// The payment row is deleted, an audit row is written and the obligation
    /// status is recomputed from the remaining payments.
    pub async fn reverse_payment(
        &self,
        scope: &AuthorizationScope,
        payment_id: Uuid,
        reason: &str,
    ) -> Result<ReversalResult, FeeError> {
        scope.require(Permission::ReversePayment)?;

        let result = run_bounded(self.settings.unit_of_work_timeout, async {
            let txn = self.db.begin().await.map_err(db_err)?;
            set_lock_timeout(&txn, self.settings.lock_timeout_ms).await?;

            let obligation_id: Uuid = payments::Entity::find_by_id(payment_id)
                .select_only()
                .column(payments::Column::ObligationId)
                .into_tuple()
                .one(&txn)
                .await
                .map_err(db_err)?
                .ok_or(FeeError::PaymentNotFound(payment_id))?;

            let obligation = lock_obligation(&txn, obligation_id).await?;

            // Read again under the obligation lock: a concurrent reversal may
            // have removed it while we waited.
            let payment = payments::Entity::find_by_id(payment_id)
                .one(&txn)
                .await
                .map_err(db_err)?
                .ok_or(FeeError::PaymentNotFound(payment_id))?;

            let today = today();
            let reason =
                self.settings
                    .reversal_policy
                    .validate(payment_id, payment.payment_date, reason, today)?;

            let total = obligation.total_amount();
            let paid_before = paid_sum(&txn, obligation_id).await?;
            let paid_after = paid_before - payment.amount;
            let persisted = obligation.status.into();
            let status_before =
                StatusEngine::recompute(persisted, total, paid_before, obligation.due_date, today);
            let status_after =
                StatusEngine::recompute(persisted, total, paid_after, obligation.due_date, today);

            let reversal = payment_reversals::ActiveModel {
                id: Set(Uuid::new_v4()),
                payment_id: Set(payment.id),
                obligation_id: Set(obligation_id),
                amount: Set(payment.amount),
                method: Set(payment.method),
                transaction_reference: Set(payment.transaction_reference.clone()),
                receipt_number: Set(payment.receipt_number.clone()),
                payment_date: Set(payment.payment_date),
                processed_by: Set(payment.processed_by),
                reason: Set(reason),
                reversed_by: Set(scope.principal_id),
                reversed_at: Set(Utc::now().into()),
                paid_before: Set(paid_before),
                paid_after: Set(paid_after),
                status_before: Set(status_before.into()),
                status_after: Set(status_after.into()),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;

            payment.delete(&txn).await.map_err(db_err)?;
            update_status(&txn, obligation, status_after.into()).await?;
            txn.commit().await.map_err(db_err)?;

            Ok(ReversalResult {
                payment_id,
                reversal_id: reversal.id,
                before: Balance::new(obligation_id, total, paid_before, status_before),
                after: Balance::new(obligation_id, total, paid_after, status_after),
            })
        })
        .await;

        match &result {
            Ok(reversal) => info!(
                payment_id = %payment_id,
                obligation_id = %reversal.after.obligation_id,
                status = %reversal.after.status,
                "Payment reversed"
            ),
            Err(e) => warn!(payment_id = %payment_id, error = %e, "Reversal rejected"),
        }
        result
    }

    /// Lists payments visible to the caller, newest first.
    pub async fn list(
        &self,
        scope: &AuthorizationScope,
        filter: &PaymentFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<payments::Model>, FeeError> {
        let txn = begin_snapshot(&self.db).await?;

        let visible = visible_students(&txn, scope).await?;
        if visible.is_empty() {
            return Ok(page.respond(Vec::new(), 0));
        }

        let mut condition = payment_scope_condition(&visible, &filter.ledger);
        if let Some(obligation_id) = filter.obligation_id {
            condition = condition.add(payments::Column::ObligationId.eq(obligation_id));
        }
        if let Some(method) = filter.method {
            condition = condition.add(payments::Column::Method.eq(
                crate::entities::sea_orm_active_enums::PaymentMethod::from(method),
            ));
        }
        if let Some(from) = filter.date_from {
            condition = condition.add(payments::Column::PaymentDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            condition = condition.add(payments::Column::PaymentDate.lte(to));
        }

        let query = payments::Entity::find().filter(condition);
        let total = query.clone().count(&txn).await.map_err(db_err)?;
        let data = query
            .order_by_desc(payments::Column::PaymentDate)
            .order_by_desc(payments::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.page_size())
            .all(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(page.respond(data, total))
    }

    /// Lists reversal audit records visible to the caller, newest first.
    pub async fn list_reversals(
        &self,
        scope: &AuthorizationScope,
        obligation_id: Option<Uuid>,
    ) -> Result<Vec<payment_reversals::Model>, FeeError> {
        let txn = begin_snapshot(&self.db).await?;

        let visible = visible_students(&txn, scope).await?;
        if visible.is_empty() {
            return Ok(Vec::new());
        }

        let mut condition = Condition::all();
        if visible.ids().is_some() {
            condition = condition.add(
                payment_reversals::Column::ObligationId
                    .in_subquery(scoped_obligation_ids(&visible, &LedgerFilter::default())),
            );
        }
        if let Some(obligation_id) = obligation_id {
            condition = condition.add(payment_reversals::Column::ObligationId.eq(obligation_id));
        }

        let reversals = payment_reversals::Entity::find()
            .filter(condition)
            .order_by_desc(payment_reversals::Column::ReversedAt)
            .all(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(reversals)
    }
}

async fn lock_obligation(
    txn: &DatabaseTransaction,
    obligation_id: Uuid,
) -> Result<student_fee_obligations::Model, FeeError> {
    student_fee_obligations::Entity::find_by_id(obligation_id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(FeeError::ObligationNotFound(obligation_id))
}

async fn update_status(
    txn: &DatabaseTransaction,
    obligation: student_fee_obligations::Model,
    status: DbObligationStatus,
) -> Result<(), FeeError> {
    let mut active: student_fee_obligations::ActiveModel = obligation.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await.map_err(db_err)?;
    Ok(())
}

async fn next_receipt_sequence(txn: &DatabaseTransaction) -> Result<i64, FeeError> {
    let row = txn
        .query_one(Statement::from_string(
            DbBackend::Postgres,
            "SELECT nextval('payment_receipt_seq') AS seq",
        ))
        .await
        .map_err(db_err)?
        .ok_or_else(|| FeeError::Internal("receipt sequence returned no row".to_string()))?;

    row.try_get::<i64>("", "seq").map_err(db_err)
}

/// `SELECT id FROM student_fee_obligations WHERE <scope and filter>`.
fn scoped_obligation_ids(
    visible: &VisibleStudents,
    filter: &LedgerFilter,
) -> sea_orm::sea_query::SelectStatement {
    student_fee_obligations::Entity::find()
        .select_only()
        .column(student_fee_obligations::Column::Id)
        .filter(obligation_condition(visible, filter))
        .into_query()
}

/// Restricts payments to obligations matching the scope and filter.
pub(crate) fn payment_scope_condition(visible: &VisibleStudents, filter: &LedgerFilter) -> Condition {
    if visible.ids().is_none() && filter.is_empty() {
        return Condition::all();
    }
    Condition::all()
        .add(payments::Column::ObligationId.in_subquery(scoped_obligation_ids(visible, filter)))
}
