//! Shared obligation queries: scoped filters, paid sums and flattened
//! ledger lines.

use std::collections::{HashMap, HashSet};

use bursar_core::fees::{FeeError, StatusEngine};
use bursar_core::reports::types::ObligationLine;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, QueryTrait,
};
use uuid::Uuid;

use super::scope::VisibleStudents;
use super::unit_of_work::db_err;
use crate::entities::{classes, fee_categories, payments, student_fee_obligations, students};

/// Student, class and category filters shared by listings and reports.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    /// Only this student.
    pub student_id: Option<Uuid>,
    /// Only students enrolled in this class.
    pub class_id: Option<Uuid>,
    /// Only this fee category.
    pub fee_category_id: Option<Uuid>,
}

impl LedgerFilter {
    /// Returns true if no filter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.student_id.is_none() && self.class_id.is_none() && self.fee_category_id.is_none()
    }
}

/// Builds the condition on `student_fee_obligations` for a scope and filter.
pub(crate) fn obligation_condition(visible: &VisibleStudents, filter: &LedgerFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(ids) = visible.ids() {
        condition =
            condition.add(student_fee_obligations::Column::StudentId.is_in(ids.iter().copied()));
    }
    if let Some(student_id) = filter.student_id {
        condition = condition.add(student_fee_obligations::Column::StudentId.eq(student_id));
    }
    if let Some(category_id) = filter.fee_category_id {
        condition = condition.add(student_fee_obligations::Column::FeeCategoryId.eq(category_id));
    }
    if let Some(class_id) = filter.class_id {
        condition = condition.add(
            student_fee_obligations::Column::StudentId.in_subquery(
                students::Entity::find()
                    .select_only()
                    .column(students::Column::Id)
                    .filter(students::Column::ClassId.eq(class_id))
                    .into_query(),
            ),
        );
    }

    condition
}

/// Sum of payments recorded against one obligation.
pub(crate) async fn paid_sum<C: ConnectionTrait>(
    conn: &C,
    obligation_id: Uuid,
) -> Result<Decimal, FeeError> {
    let sum: Option<Option<Decimal>> = payments::Entity::find()
        .select_only()
        .column_as(Expr::col(payments::Column::Amount).sum(), "paid")
        .filter(payments::Column::ObligationId.eq(obligation_id))
        .into_tuple()
        .one(conn)
        .await
        .map_err(db_err)?;

    Ok(sum.flatten().unwrap_or(Decimal::ZERO))
}

/// Payment sums per obligation. Obligations without payments are absent.
pub(crate) async fn paid_sums<C: ConnectionTrait>(
    conn: &C,
    obligation_ids: &[Uuid],
) -> Result<HashMap<Uuid, Decimal>, FeeError> {
    if obligation_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, Decimal)> = payments::Entity::find()
        .select_only()
        .column(payments::Column::ObligationId)
        .column_as(Expr::col(payments::Column::Amount).sum(), "paid")
        .filter(payments::Column::ObligationId.is_in(obligation_ids.iter().copied()))
        .group_by(payments::Column::ObligationId)
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(rows.into_iter().collect())
}

/// Joins obligations with their students, classes, categories and paid sums.
///
/// Each line carries the status as of `today`, so a pending charge whose due
/// date has passed reads as overdue.
pub(crate) async fn obligation_lines<C: ConnectionTrait>(
    conn: &C,
    obligations: &[student_fee_obligations::Model],
    today: NaiveDate,
) -> Result<Vec<ObligationLine>, FeeError> {
    if obligations.is_empty() {
        return Ok(Vec::new());
    }

    let student_ids: HashSet<Uuid> = obligations.iter().map(|o| o.student_id).collect();
    let category_ids: HashSet<Uuid> = obligations.iter().map(|o| o.fee_category_id).collect();
    let obligation_ids: Vec<Uuid> = obligations.iter().map(|o| o.id).collect();

    let students: HashMap<Uuid, students::Model> = students::Entity::find()
        .filter(students::Column::Id.is_in(student_ids))
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let class_ids: HashSet<Uuid> = students.values().filter_map(|s| s.class_id).collect();
    let class_names: HashMap<Uuid, String> = if class_ids.is_empty() {
        HashMap::new()
    } else {
        classes::Entity::find()
            .select_only()
            .column(classes::Column::Id)
            .column(classes::Column::Name)
            .filter(classes::Column::Id.is_in(class_ids))
            .into_tuple::<(Uuid, String)>()
            .all(conn)
            .await
            .map_err(db_err)?
            .into_iter()
            .collect()
    };

    let category_names: HashMap<Uuid, String> = fee_categories::Entity::find()
        .select_only()
        .column(fee_categories::Column::Id)
        .column(fee_categories::Column::Name)
        .filter(fee_categories::Column::Id.is_in(category_ids))
        .into_tuple::<(Uuid, String)>()
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .collect();

    let paid = paid_sums(conn, &obligation_ids).await?;

    let lines = obligations
        .iter()
        .map(|o| {
            let student = students.get(&o.student_id);
            let class_id = student.and_then(|s| s.class_id);
            let total_amount = o.total_amount();
            let paid_amount = paid.get(&o.id).copied().unwrap_or(Decimal::ZERO);

            ObligationLine {
                obligation_id: o.id,
                student_id: o.student_id,
                student_name: student.map(students::Model::full_name).unwrap_or_default(),
                admission_number: student
                    .map(|s| s.admission_number.clone())
                    .unwrap_or_default(),
                class_id,
                class_name: class_id.and_then(|id| class_names.get(&id).cloned()),
                fee_category_id: o.fee_category_id,
                fee_category_name: category_names
                    .get(&o.fee_category_id)
                    .cloned()
                    .unwrap_or_default(),
                total_amount,
                paid_amount,
                due_date: o.due_date,
                status: StatusEngine::recompute(
                    o.status.into(),
                    total_amount,
                    paid_amount,
                    o.due_date,
                    today,
                ),
            }
        })
        .collect();

    Ok(lines)
}
