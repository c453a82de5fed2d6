//! Obligation repository: assignment, waivers, balances and listings.

use std::collections::HashSet;

use bursar_core::fees::{
    AssignmentInput, AssignmentService, AuthorizationScope, Balance, CategoryInfo, FeeError,
    ObligationStatus, Permission, StatusEngine,
};
use bursar_core::reports::types::ObligationLine;
use bursar_shared::types::{PageRequest, PageResponse};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::lines::{LedgerFilter, obligation_condition, obligation_lines, paid_sum};
use super::scope::visible_students;
use super::unit_of_work::{
    LedgerSettings, begin_snapshot, db_err, is_unique_violation, run_bounded, set_lock_timeout,
    today,
};
use crate::entities::{
    classes, fee_categories, sea_orm_active_enums::ObligationStatus as DbObligationStatus,
    student_fee_obligations, students,
};

/// Input for charging a whole class.
#[derive(Debug, Clone)]
pub struct ClassAssignmentInput {
    /// Fee category to charge.
    pub fee_category_id: Uuid,
    /// Class whose active roster is charged.
    pub class_id: Uuid,
    /// Due date of every created obligation.
    pub due_date: NaiveDate,
    /// Discount applied to every created obligation.
    pub discount_amount: Decimal,
}

/// Filters for listing obligations.
#[derive(Debug, Clone, Default)]
pub struct ObligationFilter {
    /// Student, class and category filters.
    pub ledger: LedgerFilter,
    /// Status as of today.
    pub status: Option<ObligationStatus>,
    /// Earliest due date.
    pub due_from: Option<NaiveDate>,
    /// Latest due date.
    pub due_to: Option<NaiveDate>,
}

/// An obligation with its student, category and running balance.
#[derive(Debug, Clone, Serialize)]
pub struct ObligationView {
    /// Obligation ID.
    pub id: Uuid,
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
    /// Category amount at assignment time.
    pub base_amount: Decimal,
    /// Discount granted.
    pub discount_amount: Decimal,
    /// `base_amount - discount_amount`.
    pub total_amount: Decimal,
    /// Sum of payments.
    pub paid_amount: Decimal,
    /// `total_amount - paid_amount`.
    pub pending_amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Status as of today.
    pub status: ObligationStatus,
    /// Free-text remarks.
    pub remarks: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<FixedOffset>,
}

impl ObligationView {
    fn new(model: student_fee_obligations::Model, line: ObligationLine) -> Self {
        Self {
            id: model.id,
            student_id: line.student_id,
            pending_amount: line.pending_amount(),
            student_name: line.student_name,
            admission_number: line.admission_number,
            class_id: line.class_id,
            class_name: line.class_name,
            fee_category_id: line.fee_category_id,
            fee_category_name: line.fee_category_name,
            base_amount: model.base_amount,
            discount_amount: model.discount_amount,
            total_amount: line.total_amount,
            paid_amount: line.paid_amount,
            due_date: model.due_date,
            status: line.status,
            remarks: model.remarks,
            created_at: model.created_at,
        }
    }
}

/// Repository for student fee obligations.
#[derive(Debug, Clone)]
pub struct ObligationRepository {
    db: DatabaseConnection,
    settings: LedgerSettings,
}

impl ObligationRepository {
    /// Creates a new obligation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Charges a fee category to a list of students in one transaction.
    ///
    /// Either every obligation is created or none is.
    pub async fn assign_to_students(
        &self,
        scope: &AuthorizationScope,
        input: AssignmentInput,
        remarks: Option<String>,
    ) -> Result<Vec<student_fee_obligations::Model>, FeeError> {
        scope.require(Permission::AssignFees)?;

        let result = run_bounded(self.settings.unit_of_work_timeout, async {
            let txn = self.db.begin().await.map_err(db_err)?;
            set_lock_timeout(&txn, self.settings.lock_timeout_ms).await?;

            let created = insert_batch(&txn, scope.principal_id, &input, remarks).await?;

            txn.commit().await.map_err(db_err)?;
            Ok(created)
        })
        .await;

        match &result {
            Ok(created) => info!(
                fee_category_id = %input.fee_category_id,
                count = created.len(),
                "Fee assigned to students"
            ),
            Err(e) => warn!(
                fee_category_id = %input.fee_category_id,
                error = %e,
                "Fee assignment rejected"
            ),
        }
        result
    }

    /// Charges a fee category to every active student of a class.
    pub async fn assign_to_class(
        &self,
        scope: &AuthorizationScope,
        input: ClassAssignmentInput,
        remarks: Option<String>,
    ) -> Result<Vec<student_fee_obligations::Model>, FeeError> {
        scope.require(Permission::AssignFees)?;

        let result = run_bounded(self.settings.unit_of_work_timeout, async {
            let txn = self.db.begin().await.map_err(db_err)?;
            set_lock_timeout(&txn, self.settings.lock_timeout_ms).await?;

            classes::Entity::find_by_id(input.class_id)
                .one(&txn)
                .await
                .map_err(db_err)?
                .ok_or(FeeError::ClassNotFound(input.class_id))?;

            let roster: Vec<Uuid> = students::Entity::find()
                .select_only()
                .column(students::Column::Id)
                .filter(students::Column::ClassId.eq(input.class_id))
                .filter(students::Column::IsActive.eq(true))
                .order_by_asc(students::Column::AdmissionNumber)
                .into_tuple()
                .all(&txn)
                .await
                .map_err(db_err)?;

            if roster.is_empty() {
                return Err(FeeError::EmptyRoster(input.class_id));
            }

            let batch = AssignmentInput {
                fee_category_id: input.fee_category_id,
                student_ids: roster,
                due_date: input.due_date,
                discount_amount: input.discount_amount,
            };
            let created = insert_batch(&txn, scope.principal_id, &batch, remarks).await?;

            txn.commit().await.map_err(db_err)?;
            Ok(created)
        })
        .await;

        match &result {
            Ok(created) => info!(
                class_id = %input.class_id,
                fee_category_id = %input.fee_category_id,
                count = created.len(),
                "Fee assigned to class"
            ),
            Err(e) => warn!(
                class_id = %input.class_id,
                error = %e,
                "Class fee assignment rejected"
            ),
        }
        result
    }

    /// Waives an obligation that is not yet paid.
    pub async fn waive(
        &self,
        scope: &AuthorizationScope,
        obligation_id: Uuid,
        reason: &str,
    ) -> Result<student_fee_obligations::Model, FeeError> {
        scope.require(Permission::WaiveFees)?;

        let result = run_bounded(self.settings.unit_of_work_timeout, async {
            let txn = self.db.begin().await.map_err(db_err)?;
            set_lock_timeout(&txn, self.settings.lock_timeout_ms).await?;

            let obligation = student_fee_obligations::Entity::find_by_id(obligation_id)
                .lock_exclusive()
                .one(&txn)
                .await
                .map_err(db_err)?
                .ok_or(FeeError::ObligationNotFound(obligation_id))?;

            let reason =
                AssignmentService::validate_waiver(obligation_id, obligation.status.into(), reason)?;

            let mut active: student_fee_obligations::ActiveModel = obligation.into();
            active.status = Set(DbObligationStatus::Waived);
            active.remarks = Set(Some(format!("Waived: {reason}")));
            active.updated_at = Set(Utc::now().into());
            let updated = active.update(&txn).await.map_err(db_err)?;

            txn.commit().await.map_err(db_err)?;
            Ok(updated)
        })
        .await;

        match &result {
            Ok(_) => info!(obligation_id = %obligation_id, "Obligation waived"),
            Err(e) => warn!(obligation_id = %obligation_id, error = %e, "Waiver rejected"),
        }
        result
    }

    /// Point-in-time balance of one obligation.
    ///
    /// Obligations outside the caller's scope read as not found.
    pub async fn get_balance(
        &self,
        scope: &AuthorizationScope,
        obligation_id: Uuid,
    ) -> Result<Balance, FeeError> {
        let txn = begin_snapshot(&self.db).await?;

        let obligation = student_fee_obligations::Entity::find_by_id(obligation_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::ObligationNotFound(obligation_id))?;

        let visible = visible_students(&txn, scope).await?;
        if !visible.contains(obligation.student_id) {
            return Err(FeeError::ObligationNotFound(obligation_id));
        }

        let paid = paid_sum(&txn, obligation_id).await?;
        txn.commit().await.map_err(db_err)?;

        let total = obligation.total_amount();
        let status =
            StatusEngine::recompute(obligation.status.into(), total, paid, obligation.due_date, today());
        Ok(Balance::new(obligation_id, total, paid, status))
    }

    /// Lists obligations visible to the caller, ordered by due date.
    pub async fn list(
        &self,
        scope: &AuthorizationScope,
        filter: &ObligationFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<ObligationView>, FeeError> {
        let txn = begin_snapshot(&self.db).await?;
        let today = today();

        let visible = visible_students(&txn, scope).await?;
        if visible.is_empty() {
            return Ok(page.respond(Vec::new(), 0));
        }

        let mut condition = obligation_condition(&visible, &filter.ledger);
        if let Some(status) = filter.status {
            condition = condition.add(status_condition(status, today));
        }
        if let Some(from) = filter.due_from {
            condition = condition.add(student_fee_obligations::Column::DueDate.gte(from));
        }
        if let Some(to) = filter.due_to {
            condition = condition.add(student_fee_obligations::Column::DueDate.lte(to));
        }

        let query = student_fee_obligations::Entity::find().filter(condition);
        let total = query.clone().count(&txn).await.map_err(db_err)?;

        let models = query
            .order_by_asc(student_fee_obligations::Column::DueDate)
            .order_by_asc(student_fee_obligations::Column::Id)
            .offset(page.offset())
            .limit(page.page_size())
            .all(&txn)
            .await
            .map_err(db_err)?;

        let lines = obligation_lines(&txn, &models, today).await?;
        txn.commit().await.map_err(db_err)?;

        let views = models
            .into_iter()
            .zip(lines)
            .map(|(model, line)| ObligationView::new(model, line))
            .collect();
        Ok(page.respond(views, total))
    }
}

/// Validates and inserts one assignment batch inside `txn`.
async fn insert_batch(
    txn: &DatabaseTransaction,
    created_by: Uuid,
    input: &AssignmentInput,
    remarks: Option<String>,
) -> Result<Vec<student_fee_obligations::Model>, FeeError> {
    let category = fee_categories::Entity::find_by_id(input.fee_category_id)
        .lock_shared()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(FeeError::CategoryNotFound(input.fee_category_id))?;

    let known: HashSet<Uuid> = students::Entity::find()
        .select_only()
        .column(students::Column::Id)
        .filter(students::Column::Id.is_in(input.student_ids.iter().copied()))
        .into_tuple::<Uuid>()
        .all(txn)
        .await
        .map_err(db_err)?
        .into_iter()
        .collect();

    let owing: HashSet<Uuid> = student_fee_obligations::Entity::find()
        .select_only()
        .column(student_fee_obligations::Column::StudentId)
        .filter(student_fee_obligations::Column::StudentId.is_in(input.student_ids.iter().copied()))
        .filter(student_fee_obligations::Column::FeeCategoryId.eq(category.id))
        .filter(student_fee_obligations::Column::DueDate.eq(input.due_date))
        .into_tuple::<Uuid>()
        .all(txn)
        .await
        .map_err(db_err)?
        .into_iter()
        .collect();

    let info = CategoryInfo {
        id: category.id,
        amount: category.amount,
        is_active: category.is_active,
    };
    let planned = AssignmentService::plan(
        input,
        &info,
        |id| known.contains(&id),
        |id| owing.contains(&id),
        today(),
    )?;

    let remarks = remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
    let now: DateTime<FixedOffset> = Utc::now().into();
    let mut created = Vec::with_capacity(planned.len());

    for plan in planned {
        let model = student_fee_obligations::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(plan.student_id),
            fee_category_id: Set(plan.fee_category_id),
            base_amount: Set(plan.base_amount),
            discount_amount: Set(plan.discount_amount),
            due_date: Set(plan.due_date),
            status: Set(plan.status.into()),
            remarks: Set(remarks.clone()),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|e| {
            // A concurrent batch inserted the same triple after our check.
            if is_unique_violation(&e) {
                FeeError::DuplicateObligation {
                    student_id: plan.student_id,
                    fee_category_id: plan.fee_category_id,
                    due_date: plan.due_date,
                }
            } else {
                db_err(e)
            }
        })?;
        created.push(model);
    }

    Ok(created)
}

/// Matches obligations whose status as of `today` is `status`.
///
/// Unpaid obligations are persisted as pending or overdue depending on the
/// day of their last write, so the split between the two uses the due date.
fn status_condition(status: ObligationStatus, today: NaiveDate) -> Condition {
    let unpaid = Condition::any()
        .add(student_fee_obligations::Column::Status.eq(DbObligationStatus::Pending))
        .add(student_fee_obligations::Column::Status.eq(DbObligationStatus::Overdue));
    match status {
        ObligationStatus::Pending => Condition::all()
            .add(unpaid)
            .add(student_fee_obligations::Column::DueDate.gte(today)),
        ObligationStatus::Overdue => Condition::all()
            .add(unpaid)
            .add(student_fee_obligations::Column::DueDate.lt(today)),
        other => Condition::all().add(
            student_fee_obligations::Column::Status.eq(DbObligationStatus::from(other)),
        ),
    }
}
