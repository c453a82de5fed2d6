//! Unit and property-based tests for the reports module.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::service::ReportService;
use super::types::{
    AnalysisPeriod, DateRange, GroupBy, ObligationLine, PaymentLine, RiskLevel, UrgencyLevel,
};
use crate::fees::{ObligationStatus, PaymentMethod, StatusEngine};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn line(student: Uuid, total: Decimal, paid: Decimal, due_days_ago: i64) -> ObligationLine {
    let due_date = today() - Duration::days(due_days_ago);
    ObligationLine {
        obligation_id: Uuid::new_v4(),
        student_id: student,
        student_name: format!("Student {}", &student.to_string()[..4]),
        admission_number: "ADM-1".to_string(),
        class_id: None,
        class_name: None,
        fee_category_id: Uuid::nil(),
        fee_category_name: "Tuition".to_string(),
        total_amount: total,
        paid_amount: paid,
        due_date,
        status: StatusEngine::derive_status(total, paid, due_date, today()),
    }
}

fn payment(amount: Decimal, method: PaymentMethod, days_ago: i64, category: Uuid) -> PaymentLine {
    PaymentLine {
        payment_id: Uuid::new_v4(),
        obligation_id: Uuid::new_v4(),
        fee_category_id: category,
        fee_category_name: format!("Category {}", &category.to_string()[..4]),
        amount,
        method,
        payment_date: today() - Duration::days(days_ago),
    }
}

// ============================================================================
// Collection
// ============================================================================

#[test]
fn test_collection_groups_by_category() {
    let tuition = Uuid::new_v4();
    let bus = Uuid::new_v4();
    let mut a = line(Uuid::new_v4(), dec!(1000), dec!(400), 0);
    a.fee_category_id = tuition;
    a.fee_category_name = "Tuition".into();
    let mut b = line(Uuid::new_v4(), dec!(1000), dec!(1000), 0);
    b.fee_category_id = tuition;
    b.fee_category_name = "Tuition".into();
    let mut c = line(Uuid::new_v4(), dec!(300), dec!(0), 0);
    c.fee_category_id = bus;
    c.fee_category_name = "Bus".into();

    let range = DateRange::new(today() - Duration::days(5), today()).unwrap();
    let report = ReportService::collection_report(&[a, b, c], range, GroupBy::Category);

    assert_eq!(report.rows.len(), 2);
    let bus_row = &report.rows[0];
    assert_eq!(bus_row.group_label, "Bus");
    assert_eq!(bus_row.collection_percentage, dec!(0));
    let tuition_row = &report.rows[1];
    assert_eq!(tuition_row.obligation_count, 2);
    assert_eq!(tuition_row.paid_amount, dec!(1400));
    assert_eq!(tuition_row.pending_amount, dec!(600));
    assert_eq!(tuition_row.collection_percentage, dec!(70));

    assert_eq!(report.summary.total_amount, dec!(2300));
    assert_eq!(report.summary.paid_amount, dec!(1400));
    assert_eq!(report.summary.collection_percentage, dec!(60.87));
}

#[test]
fn test_collection_skips_out_of_range_and_waived() {
    let inside = line(Uuid::new_v4(), dec!(100), dec!(0), 1);
    let outside = line(Uuid::new_v4(), dec!(100), dec!(0), 40);
    let mut waived = line(Uuid::new_v4(), dec!(100), dec!(0), 1);
    waived.status = ObligationStatus::Waived;

    let range = DateRange::new(today() - Duration::days(7), today()).unwrap();
    let report = ReportService::collection_report(&[inside, outside, waived], range, GroupBy::Date);

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].group_key, "2025-06-14");
    assert_eq!(report.summary.obligation_count, 1);
}

#[test]
fn test_zero_total_collection_percentage_is_zero() {
    let range = DateRange::new(today(), today()).unwrap();
    let report = ReportService::collection_report(&[], range, GroupBy::Student);
    assert!(report.rows.is_empty());
    assert_eq!(report.summary.collection_percentage, Decimal::ZERO);
}

#[test]
fn test_invalid_date_range() {
    assert!(DateRange::new(today(), today() - Duration::days(1)).is_err());
}

// ============================================================================
// Outstanding dues
// ============================================================================

#[test]
fn test_outstanding_urgency_scenario() {
    let at_40 = line(Uuid::new_v4(), dec!(500), dec!(0), 40);
    let at_65 = line(Uuid::new_v4(), dec!(500), dec!(0), 65);
    let report = ReportService::outstanding_dues(&[at_40, at_65], 0, today());

    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].days_overdue, 65);
    assert_eq!(report.rows[0].urgency_level, UrgencyLevel::Critical);
    assert_eq!(report.rows[1].days_overdue, 40);
    assert_eq!(report.rows[1].urgency_level, UrgencyLevel::High);
    assert_eq!(report.total_pending, dec!(1000));
}

#[test]
fn test_outstanding_filters() {
    let paid = line(Uuid::new_v4(), dec!(500), dec!(500), 10);
    let future = line(Uuid::new_v4(), dec!(500), dec!(0), -5);
    let recent = line(Uuid::new_v4(), dec!(500), dec!(100), 3);
    let lines = [paid, future, recent];

    let report = ReportService::outstanding_dues(&lines, 0, today());
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].urgency_level, UrgencyLevel::Medium);
    assert_eq!(report.rows[0].pending_amount, dec!(400));

    let with_upcoming = ReportService::outstanding_dues(&lines, -7, today());
    assert_eq!(with_upcoming.rows.len(), 2);
    assert_eq!(with_upcoming.rows[1].urgency_level, UrgencyLevel::Low);

    let strict = ReportService::outstanding_dues(&lines, 5, today());
    assert!(strict.rows.is_empty());
}

#[test]
fn test_urgency_boundaries() {
    assert_eq!(UrgencyLevel::from_days_overdue(0), UrgencyLevel::Low);
    assert_eq!(UrgencyLevel::from_days_overdue(1), UrgencyLevel::Medium);
    assert_eq!(UrgencyLevel::from_days_overdue(30), UrgencyLevel::Medium);
    assert_eq!(UrgencyLevel::from_days_overdue(31), UrgencyLevel::High);
    assert_eq!(UrgencyLevel::from_days_overdue(60), UrgencyLevel::High);
    assert_eq!(UrgencyLevel::from_days_overdue(61), UrgencyLevel::Critical);
}

// ============================================================================
// Defaulters
// ============================================================================

#[test]
fn test_defaulters_group_by_student() {
    let heavy = Uuid::new_v4();
    let light = Uuid::new_v4();
    let lines = [
        line(heavy, dec!(8000), dec!(0), 45),
        line(heavy, dec!(4000), dec!(1000), 10),
        line(heavy, dec!(9000), dec!(0), -10),
        line(light, dec!(700), dec!(0), 5),
    ];

    let report = ReportService::defaulters(&lines, dec!(0), 0, today()).unwrap();
    assert_eq!(report.rows.len(), 2);

    let first = &report.rows[0];
    assert_eq!(first.student_id, heavy);
    assert_eq!(first.overdue_count, 2);
    assert_eq!(first.total_outstanding, dec!(11000));
    assert_eq!(first.max_days_overdue, 45);
    assert_eq!(first.risk_level, RiskLevel::High);
    assert_eq!(report.rows[1].risk_level, RiskLevel::Low);

    let filtered = ReportService::defaulters(&lines, dec!(1000), 0, today()).unwrap();
    assert_eq!(filtered.rows.len(), 1);

    let late_only = ReportService::defaulters(&lines, dec!(0), 30, today()).unwrap();
    assert_eq!(late_only.rows.len(), 1);
    assert_eq!(late_only.rows[0].total_outstanding, dec!(8000));
    assert_eq!(late_only.rows[0].risk_level, RiskLevel::Medium);
}

#[test]
fn test_risk_boundaries() {
    assert_eq!(RiskLevel::from_outstanding(dec!(5000)), RiskLevel::Low);
    assert_eq!(RiskLevel::from_outstanding(dec!(5000.01)), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_outstanding(dec!(10000)), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_outstanding(dec!(10000.01)), RiskLevel::High);
}

#[test]
fn test_defaulters_rejects_negative_threshold() {
    assert!(ReportService::defaulters(&[], dec!(-1), 0, today()).is_err());
}

// ============================================================================
// Payment analysis
// ============================================================================

#[test]
fn test_payment_analysis() {
    let tuition = Uuid::new_v4();
    let bus = Uuid::new_v4();
    let payments = [
        payment(dec!(400), PaymentMethod::Cash, 0, tuition),
        payment(dec!(600), PaymentMethod::Online, 0, tuition),
        payment(dec!(250), PaymentMethod::Upi, 3, bus),
        payment(dec!(999), PaymentMethod::Cash, 20, bus),
    ];

    let report = ReportService::payment_analysis(&payments, AnalysisPeriod::Week, today(), 10);

    assert_eq!(report.stats.count, 3);
    assert_eq!(report.stats.total_amount, dec!(1250));
    assert_eq!(report.stats.average_amount, dec!(416.67));
    assert_eq!(report.stats.min_amount, dec!(250));
    assert_eq!(report.stats.max_amount, dec!(600));

    assert_eq!(report.trend.len(), 2);
    assert_eq!(report.trend[0].date, today() - Duration::days(3));
    assert_eq!(report.trend[1].amount, dec!(1000));

    assert_eq!(report.methods[0].method, PaymentMethod::Online);
    assert_eq!(report.methods[0].percentage, dec!(48));
    assert_eq!(report.methods.len(), 3);

    assert_eq!(report.top_categories[0].fee_category_id, tuition);
    assert_eq!(report.top_categories[0].amount, dec!(1000));

    let limited = ReportService::payment_analysis(&payments, AnalysisPeriod::Month, today(), 1);
    assert_eq!(limited.top_categories.len(), 1);
    assert_eq!(limited.top_categories[0].fee_category_id, bus);
}

#[test]
fn test_empty_payment_analysis() {
    let report = ReportService::payment_analysis(&[], AnalysisPeriod::Today, today(), 10);
    assert_eq!(report.stats, super::types::PaymentStats::default());
    assert!(report.methods.is_empty());
    assert_eq!(report.range.start, today());
}

#[rstest]
#[case(AnalysisPeriod::Today, 1)]
#[case(AnalysisPeriod::Week, 7)]
#[case(AnalysisPeriod::Month, 30)]
#[case(AnalysisPeriod::Quarter, 90)]
#[case(AnalysisPeriod::Year, 365)]
fn test_period_range_length(#[case] period: AnalysisPeriod, #[case] days: i64) {
    let range = period.range_ending(today());
    assert_eq!(range.end, today());
    assert_eq!((range.end - range.start).num_days() + 1, days);
}

#[test]
fn test_week_excludes_eighth_day() {
    let tuition = Uuid::new_v4();
    let payments = [
        payment(dec!(100), PaymentMethod::Cash, 6, tuition),
        payment(dec!(900), PaymentMethod::Cash, 7, tuition),
    ];

    let report = ReportService::payment_analysis(&payments, AnalysisPeriod::Week, today(), 10);

    assert_eq!(report.range.start, today() - Duration::days(6));
    assert_eq!(report.stats.count, 1);
    assert_eq!(report.stats.total_amount, dec!(100));
}

#[test]
fn test_period_parsing() {
    assert_eq!("quarter".parse::<AnalysisPeriod>().unwrap(), AnalysisPeriod::Quarter);
    assert!("fortnight".parse::<AnalysisPeriod>().is_err());
    assert_eq!("class".parse::<GroupBy>().unwrap(), GroupBy::Class);
    assert!("teacher".parse::<GroupBy>().is_err());
}

proptest! {
    /// The summary row always equals the sum of the group rows.
    #[test]
    fn prop_collection_summary_sums_rows(
        amounts in prop::collection::vec((1i64..100_000i64, 0u8..=100u8, 0i64..30i64), 0..25),
    ) {
        let lines: Vec<ObligationLine> = amounts
            .iter()
            .map(|&(cents, paid_pct, days)| {
                let total = Decimal::new(cents, 2);
                let paid = (total * Decimal::from(paid_pct) / Decimal::ONE_HUNDRED).round_dp(2);
                line(Uuid::new_v4(), total, paid, days)
            })
            .collect();

        let range = DateRange::new(today() - Duration::days(30), today()).unwrap();
        let report = ReportService::collection_report(&lines, range, GroupBy::Student);

        let total: Decimal = report.rows.iter().map(|r| r.total_amount).sum();
        let paid: Decimal = report.rows.iter().map(|r| r.paid_amount).sum();
        prop_assert_eq!(report.summary.total_amount, total);
        prop_assert_eq!(report.summary.paid_amount, paid);
        prop_assert_eq!(report.summary.pending_amount, total - paid);
        prop_assert!(report.summary.collection_percentage <= Decimal::ONE_HUNDRED);
        prop_assert!(report.summary.collection_percentage >= Decimal::ZERO);
    }

    /// Method shares cover the whole period total.
    #[test]
    fn prop_method_amounts_sum_to_total(
        rows in prop::collection::vec((1i64..100_000i64, 0usize..6, 0i64..7i64), 1..30),
    ) {
        let payments: Vec<PaymentLine> = rows
            .iter()
            .map(|&(cents, m, days)| {
                payment(Decimal::new(cents, 2), PaymentMethod::ALL[m], days, Uuid::nil())
            })
            .collect();
        let report = ReportService::payment_analysis(&payments, AnalysisPeriod::Week, today(), 10);

        let sum: Decimal = report.methods.iter().map(|m| m.amount).sum();
        prop_assert_eq!(sum, report.stats.total_amount);
        prop_assert!(report.stats.min_amount <= report.stats.average_amount);
        prop_assert!(report.stats.average_amount <= report.stats.max_amount);
    }
}
