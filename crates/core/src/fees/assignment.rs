//! Obligation assignment and waiver rules.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::FeeError;
use super::status::StatusEngine;
use super::types::{AssignmentInput, CategoryInfo, ObligationStatus, PlannedObligation};

/// Stateless service that turns an assignment request into obligations.
pub struct AssignmentService;

impl AssignmentService {
    /// Validates a batch assignment and plans one obligation per student.
    ///
    /// The batch is all or nothing: the first failing student aborts the plan.
    ///
    /// # Arguments
    ///
    /// * `input` - The assignment request
    /// * `category` - The category being charged
    /// * `student_exists` - Returns true if the student is known
    /// * `has_obligation` - Returns true if the student already owes this
    ///   category on `input.due_date`
    /// * `today` - Date used to derive the initial status
    ///
    /// # Errors
    ///
    /// Returns `FeeError` if validation fails.
    pub fn plan<S, D>(
        input: &AssignmentInput,
        category: &CategoryInfo,
        student_exists: S,
        has_obligation: D,
        today: NaiveDate,
    ) -> Result<Vec<PlannedObligation>, FeeError>
    where
        S: Fn(Uuid) -> bool,
        D: Fn(Uuid) -> bool,
    {
        if input.student_ids.is_empty() {
            return Err(FeeError::EmptyStudentList);
        }
        if !category.is_active {
            return Err(FeeError::CategoryInactive(category.id));
        }
        if input.discount_amount < Decimal::ZERO || input.discount_amount > category.amount {
            return Err(FeeError::InvalidDiscount {
                discount: input.discount_amount,
                base: category.amount,
            });
        }

        let total = category.amount - input.discount_amount;
        let status = StatusEngine::derive_status(total, Decimal::ZERO, input.due_date, today);

        let mut seen = HashSet::with_capacity(input.student_ids.len());
        let mut planned = Vec::with_capacity(input.student_ids.len());

        for &student_id in &input.student_ids {
            if !seen.insert(student_id) {
                return Err(FeeError::DuplicateStudentInBatch(student_id));
            }
            if !student_exists(student_id) {
                return Err(FeeError::StudentNotFound(student_id));
            }
            if has_obligation(student_id) {
                return Err(FeeError::DuplicateObligation {
                    student_id,
                    fee_category_id: category.id,
                    due_date: input.due_date,
                });
            }

            planned.push(PlannedObligation {
                student_id,
                fee_category_id: category.id,
                base_amount: category.amount,
                discount_amount: input.discount_amount,
                due_date: input.due_date,
                status,
            });
        }

        Ok(planned)
    }

    /// Validates an administrative waiver and returns the trimmed reason.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::Required` for a blank reason and
    /// `FeeError::CannotWaivePaid` for a fully paid obligation.
    pub fn validate_waiver(
        obligation_id: Uuid,
        current: ObligationStatus,
        reason: &str,
    ) -> Result<String, FeeError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(FeeError::Required("waiver reason"));
        }
        match current {
            ObligationStatus::Paid => Err(FeeError::CannotWaivePaid(obligation_id)),
            ObligationStatus::Waived => Err(FeeError::ObligationSettled {
                id: obligation_id,
                status: current,
            }),
            _ => Ok(reason.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn category(active: bool) -> CategoryInfo {
        CategoryInfo {
            id: Uuid::new_v4(),
            amount: dec!(1000),
            is_active: active,
        }
    }

    fn input(students: Vec<Uuid>, discount: Decimal) -> AssignmentInput {
        AssignmentInput {
            fee_category_id: Uuid::new_v4(),
            student_ids: students,
            due_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            discount_amount: discount,
        }
    }

    #[test]
    fn test_plan_creates_pending_obligations() {
        let students = vec![Uuid::new_v4(), Uuid::new_v4()];
        let planned = AssignmentService::plan(
            &input(students.clone(), dec!(100)),
            &category(true),
            |_| true,
            |_| false,
            today(),
        )
        .unwrap();

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].student_id, students[0]);
        assert_eq!(planned[0].total_amount(), dec!(900));
        assert!(planned.iter().all(|p| p.status == ObligationStatus::Pending));
    }

    #[test]
    fn test_past_due_assignment_starts_overdue() {
        let mut req = input(vec![Uuid::new_v4()], dec!(0));
        req.due_date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let planned =
            AssignmentService::plan(&req, &category(true), |_| true, |_| false, today()).unwrap();
        assert_eq!(planned[0].status, ObligationStatus::Overdue);
    }

    #[test]
    fn test_plan_rejections() {
        let s = Uuid::new_v4();
        let cat = category(true);

        assert!(matches!(
            AssignmentService::plan(&input(vec![], dec!(0)), &cat, |_| true, |_| false, today()),
            Err(FeeError::EmptyStudentList)
        ));
        assert!(matches!(
            AssignmentService::plan(
                &input(vec![s], dec!(0)),
                &category(false),
                |_| true,
                |_| false,
                today()
            ),
            Err(FeeError::CategoryInactive(_))
        ));
        assert!(matches!(
            AssignmentService::plan(&input(vec![s], dec!(1001)), &cat, |_| true, |_| false, today()),
            Err(FeeError::InvalidDiscount { .. })
        ));
        assert!(matches!(
            AssignmentService::plan(&input(vec![s], dec!(-1)), &cat, |_| true, |_| false, today()),
            Err(FeeError::InvalidDiscount { .. })
        ));
        assert!(matches!(
            AssignmentService::plan(&input(vec![s, s], dec!(0)), &cat, |_| true, |_| false, today()),
            Err(FeeError::DuplicateStudentInBatch(_))
        ));
        assert!(matches!(
            AssignmentService::plan(&input(vec![s], dec!(0)), &cat, |_| false, |_| false, today()),
            Err(FeeError::StudentNotFound(_))
        ));
    }

    #[test]
    fn test_existing_obligation_fails_whole_batch() {
        let ok = Uuid::new_v4();
        let dup = Uuid::new_v4();
        let err = AssignmentService::plan(
            &input(vec![ok, dup], dec!(0)),
            &category(true),
            |_| true,
            |id| id == dup,
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, FeeError::DuplicateObligation { student_id, .. } if student_id == dup));
        assert_eq!(err.http_status_code(), 409);
    }

    #[test]
    fn test_full_discount_is_paid_immediately() {
        let planned = AssignmentService::plan(
            &input(vec![Uuid::new_v4()], dec!(1000)),
            &category(true),
            |_| true,
            |_| false,
            today(),
        )
        .unwrap();
        assert_eq!(planned[0].total_amount(), dec!(0));
        assert_eq!(planned[0].status, ObligationStatus::Paid);
    }

    #[test]
    fn test_waiver_rules() {
        let id = Uuid::new_v4();
        assert_eq!(
            AssignmentService::validate_waiver(id, ObligationStatus::Overdue, " hardship ").unwrap(),
            "hardship"
        );
        assert!(AssignmentService::validate_waiver(id, ObligationStatus::Partial, "x").is_ok());
        assert!(matches!(
            AssignmentService::validate_waiver(id, ObligationStatus::Paid, "x"),
            Err(FeeError::CannotWaivePaid(_))
        ));
        assert!(matches!(
            AssignmentService::validate_waiver(id, ObligationStatus::Waived, "x"),
            Err(FeeError::ObligationSettled { .. })
        ));
        assert!(matches!(
            AssignmentService::validate_waiver(id, ObligationStatus::Pending, ""),
            Err(FeeError::Required(_))
        ));
    }
}
