//! Report generation service.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::ReportError;
use super::types::{
    AnalysisPeriod, CategoryCollection, CollectionReport, CollectionRow, DateRange,
    DefaulterRow, DefaultersReport, GroupBy, MethodBreakdown, ObligationLine, OutstandingReport,
    OutstandingRow, PaymentAnalysisReport, PaymentLine, PaymentStats, RiskLevel, TrendPoint,
    UrgencyLevel,
};
use crate::fees::{ObligationStatus, PaymentMethod};

/// Default number of fee categories listed in payment analysis.
pub const DEFAULT_TOP_CATEGORIES: usize = 10;

/// Service for aggregating ledger lines into reports.
///
/// Waived obligations are excluded from every report: they are neither
/// collectable nor outstanding.
pub struct ReportService;

impl ReportService {
    /// `part / whole * 100` rounded to 2 decimal places, 0 when `whole` is 0.
    #[must_use]
    pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
        if whole.is_zero() {
            return Decimal::ZERO;
        }
        (part / whole * Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// Generates a collection report over obligations due inside `range`.
    #[must_use]
    pub fn collection_report(
        lines: &[ObligationLine],
        range: DateRange,
        group_by: GroupBy,
    ) -> CollectionReport {
        let mut groups: BTreeMap<(String, String), CollectionRow> = BTreeMap::new();

        for line in lines
            .iter()
            .filter(|l| l.status != ObligationStatus::Waived && range.contains(l.due_date))
        {
            let (key, label) = Self::group_of(line, group_by);
            let row = groups
                .entry((label.clone(), key.clone()))
                .or_insert_with(|| Self::empty_row(key, label));
            row.obligation_count += 1;
            row.total_amount += line.total_amount;
            row.paid_amount += line.paid_amount;
        }

        let mut summary = Self::empty_row("total".to_string(), "Total".to_string());
        let mut rows = Vec::with_capacity(groups.len());
        for mut row in groups.into_values() {
            row.pending_amount = row.total_amount - row.paid_amount;
            row.collection_percentage = Self::percentage(row.paid_amount, row.total_amount);

            summary.obligation_count += row.obligation_count;
            summary.total_amount += row.total_amount;
            summary.paid_amount += row.paid_amount;
            rows.push(row);
        }
        summary.pending_amount = summary.total_amount - summary.paid_amount;
        summary.collection_percentage =
            Self::percentage(summary.paid_amount, summary.total_amount);

        CollectionReport {
            report_type: "collection".to_string(),
            group_by,
            range,
            rows,
            summary,
        }
    }

    /// Lists obligations still owed whose due date is at least
    /// `min_days_overdue` days before `today`.
    ///
    /// A negative `min_days_overdue` also admits obligations not yet due.
    #[must_use]
    pub fn outstanding_dues(
        lines: &[ObligationLine],
        min_days_overdue: i64,
        today: NaiveDate,
    ) -> OutstandingReport {
        let mut rows: Vec<OutstandingRow> = lines
            .iter()
            .filter(|l| l.status != ObligationStatus::Waived)
            .filter(|l| l.pending_amount() > Decimal::ZERO)
            .filter(|l| l.days_overdue(today) >= min_days_overdue)
            .map(|l| {
                let days_overdue = l.days_overdue(today);
                OutstandingRow {
                    obligation_id: l.obligation_id,
                    student_id: l.student_id,
                    student_name: l.student_name.clone(),
                    admission_number: l.admission_number.clone(),
                    class_name: l.class_name.clone(),
                    fee_category_name: l.fee_category_name.clone(),
                    total_amount: l.total_amount,
                    paid_amount: l.paid_amount,
                    pending_amount: l.pending_amount(),
                    due_date: l.due_date,
                    days_overdue,
                    status: l.status,
                    urgency_level: UrgencyLevel::from_days_overdue(days_overdue),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.days_overdue
                .cmp(&a.days_overdue)
                .then_with(|| a.student_name.cmp(&b.student_name))
        });
        let total_pending = rows.iter().map(|r| r.pending_amount).sum();

        OutstandingReport {
            report_type: "outstanding".to_string(),
            as_of: today,
            min_days_overdue,
            rows,
            total_pending,
        }
    }

    /// Groups overdue obligations by student and keeps students owing at
    /// least `min_outstanding_amount`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NegativeThreshold` for a negative threshold.
    pub fn defaulters(
        lines: &[ObligationLine],
        min_outstanding_amount: Decimal,
        min_days_overdue: i64,
        today: NaiveDate,
    ) -> Result<DefaultersReport, ReportError> {
        if min_outstanding_amount < Decimal::ZERO {
            return Err(ReportError::NegativeThreshold);
        }

        let mut by_student: HashMap<Uuid, DefaulterRow> = HashMap::new();
        for line in lines
            .iter()
            .filter(|l| l.status != ObligationStatus::Waived)
            .filter(|l| l.pending_amount() > Decimal::ZERO)
            .filter(|l| {
                let days = l.days_overdue(today);
                days > 0 && days >= min_days_overdue
            })
        {
            let row = by_student
                .entry(line.student_id)
                .or_insert_with(|| DefaulterRow {
                    student_id: line.student_id,
                    student_name: line.student_name.clone(),
                    admission_number: line.admission_number.clone(),
                    class_name: line.class_name.clone(),
                    overdue_count: 0,
                    total_outstanding: Decimal::ZERO,
                    oldest_due_date: line.due_date,
                    max_days_overdue: 0,
                    risk_level: RiskLevel::Low,
                });
            row.overdue_count += 1;
            row.total_outstanding += line.pending_amount();
            row.oldest_due_date = row.oldest_due_date.min(line.due_date);
            row.max_days_overdue = row.max_days_overdue.max(line.days_overdue(today));
        }

        let mut rows: Vec<DefaulterRow> = by_student
            .into_values()
            .filter(|r| r.total_outstanding >= min_outstanding_amount)
            .map(|mut r| {
                r.risk_level = RiskLevel::from_outstanding(r.total_outstanding);
                r
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_outstanding
                .cmp(&a.total_outstanding)
                .then_with(|| a.student_name.cmp(&b.student_name))
        });
        let total_outstanding = rows.iter().map(|r| r.total_outstanding).sum();

        Ok(DefaultersReport {
            report_type: "defaulters".to_string(),
            as_of: today,
            min_outstanding_amount,
            min_days_overdue,
            rows,
            total_outstanding,
        })
    }

    /// Analyses payments received in `period` ending `today`.
    #[must_use]
    pub fn payment_analysis(
        payments: &[PaymentLine],
        period: AnalysisPeriod,
        today: NaiveDate,
        top_categories_limit: usize,
    ) -> PaymentAnalysisReport {
        let range = period.range_ending(today);
        let in_range: Vec<&PaymentLine> = payments
            .iter()
            .filter(|p| range.contains(p.payment_date))
            .collect();

        let mut trend: BTreeMap<NaiveDate, TrendPoint> = BTreeMap::new();
        let mut methods: HashMap<PaymentMethod, (u64, Decimal)> = HashMap::new();
        let mut categories: HashMap<Uuid, CategoryCollection> = HashMap::new();
        let mut stats = PaymentStats::default();

        for p in &in_range {
            let point = trend.entry(p.payment_date).or_insert_with(|| TrendPoint {
                date: p.payment_date,
                count: 0,
                amount: Decimal::ZERO,
            });
            point.count += 1;
            point.amount += p.amount;

            let method = methods.entry(p.method).or_insert((0, Decimal::ZERO));
            method.0 += 1;
            method.1 += p.amount;

            let category = categories
                .entry(p.fee_category_id)
                .or_insert_with(|| CategoryCollection {
                    fee_category_id: p.fee_category_id,
                    fee_category_name: p.fee_category_name.clone(),
                    count: 0,
                    amount: Decimal::ZERO,
                });
            category.count += 1;
            category.amount += p.amount;

            if stats.count == 0 {
                stats.min_amount = p.amount;
                stats.max_amount = p.amount;
            } else {
                stats.min_amount = stats.min_amount.min(p.amount);
                stats.max_amount = stats.max_amount.max(p.amount);
            }
            stats.count += 1;
            stats.total_amount += p.amount;
        }

        if stats.count > 0 {
            stats.average_amount = (stats.total_amount / Decimal::from(stats.count)).round_dp(2);
        }

        let mut method_rows: Vec<MethodBreakdown> = PaymentMethod::ALL
            .into_iter()
            .filter_map(|m| {
                methods.get(&m).map(|&(count, amount)| MethodBreakdown {
                    method: m,
                    count,
                    amount,
                    percentage: Self::percentage(amount, stats.total_amount),
                })
            })
            .collect();
        method_rows.sort_by(|a, b| b.amount.cmp(&a.amount));

        let mut top_categories: Vec<CategoryCollection> = categories.into_values().collect();
        top_categories.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.fee_category_name.cmp(&b.fee_category_name))
        });
        top_categories.truncate(top_categories_limit);

        PaymentAnalysisReport {
            report_type: "payment_analysis".to_string(),
            period,
            range,
            trend: trend.into_values().collect(),
            methods: method_rows,
            top_categories,
            stats,
        }
    }

    fn group_of(line: &ObligationLine, group_by: GroupBy) -> (String, String) {
        match group_by {
            GroupBy::Student => (
                line.student_id.to_string(),
                format!("{} ({})", line.student_name, line.admission_number),
            ),
            GroupBy::Class => match (line.class_id, &line.class_name) {
                (Some(id), Some(name)) => (id.to_string(), name.clone()),
                (Some(id), None) => (id.to_string(), id.to_string()),
                (None, _) => ("unassigned".to_string(), "Unassigned".to_string()),
            },
            GroupBy::Category => (
                line.fee_category_id.to_string(),
                line.fee_category_name.clone(),
            ),
            GroupBy::Date => {
                let date = line.due_date.format("%Y-%m-%d").to_string();
                (date.clone(), date)
            }
        }
    }

    fn empty_row(group_key: String, group_label: String) -> CollectionRow {
        CollectionRow {
            group_key,
            group_label,
            obligation_count: 0,
            total_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            pending_amount: Decimal::ZERO,
            collection_percentage: Decimal::ZERO,
        }
    }
}
