//! CSV layouts of the fee reports.

use chrono::NaiveDate;

use super::CsvExport;
use crate::reports::{
    CollectionReport, CollectionRow, DefaultersReport, OutstandingReport, PaymentAnalysisReport,
};

fn date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn collection_record(row: &CollectionRow) -> Vec<String> {
    vec![
        row.group_key.clone(),
        row.group_label.clone(),
        row.obligation_count.to_string(),
        row.total_amount.to_string(),
        row.paid_amount.to_string(),
        row.pending_amount.to_string(),
        row.collection_percentage.to_string(),
    ]
}

impl CsvExport for CollectionReport {
    fn headers(&self) -> Vec<&'static str> {
        vec![
            "group_key",
            "group_label",
            "obligation_count",
            "total_amount",
            "paid_amount",
            "pending_amount",
            "collection_percentage",
        ]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .chain(std::iter::once(&self.summary))
            .map(collection_record)
            .collect()
    }
}

impl CsvExport for OutstandingReport {
    fn headers(&self) -> Vec<&'static str> {
        vec![
            "obligation_id",
            "student_name",
            "admission_number",
            "class_name",
            "fee_category",
            "total_amount",
            "paid_amount",
            "pending_amount",
            "due_date",
            "days_overdue",
            "status",
            "urgency_level",
        ]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    r.obligation_id.to_string(),
                    r.student_name.clone(),
                    r.admission_number.clone(),
                    r.class_name.clone().unwrap_or_default(),
                    r.fee_category_name.clone(),
                    r.total_amount.to_string(),
                    r.paid_amount.to_string(),
                    r.pending_amount.to_string(),
                    date(r.due_date),
                    r.days_overdue.to_string(),
                    r.status.as_str().to_string(),
                    r.urgency_level.as_str().to_string(),
                ]
            })
            .collect()
    }
}

impl CsvExport for DefaultersReport {
    fn headers(&self) -> Vec<&'static str> {
        vec![
            "student_id",
            "student_name",
            "admission_number",
            "class_name",
            "overdue_count",
            "total_outstanding",
            "oldest_due_date",
            "max_days_overdue",
            "risk_level",
        ]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    r.student_id.to_string(),
                    r.student_name.clone(),
                    r.admission_number.clone(),
                    r.class_name.clone().unwrap_or_default(),
                    r.overdue_count.to_string(),
                    r.total_outstanding.to_string(),
                    date(r.oldest_due_date),
                    r.max_days_overdue.to_string(),
                    r.risk_level.as_str().to_string(),
                ]
            })
            .collect()
    }
}

/// Payment analysis flattens its sections into `section,key,count,amount,percentage`.
impl CsvExport for PaymentAnalysisReport {
    fn headers(&self) -> Vec<&'static str> {
        vec!["section", "key", "count", "amount", "percentage"]
    }

    fn records(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.trend.len() + self.methods.len() + 5);

        for p in &self.trend {
            out.push(vec![
                "trend".to_string(),
                date(p.date),
                p.count.to_string(),
                p.amount.to_string(),
                String::new(),
            ]);
        }
        for m in &self.methods {
            out.push(vec![
                "method".to_string(),
                m.method.as_str().to_string(),
                m.count.to_string(),
                m.amount.to_string(),
                m.percentage.to_string(),
            ]);
        }
        for c in &self.top_categories {
            out.push(vec![
                "category".to_string(),
                c.fee_category_name.clone(),
                c.count.to_string(),
                c.amount.to_string(),
                String::new(),
            ]);
        }

        let count = self.stats.count.to_string();
        for (key, amount) in [
            ("total", self.stats.total_amount),
            ("average", self.stats.average_amount),
            ("min", self.stats.min_amount),
            ("max", self.stats.max_amount),
        ] {
            out.push(vec![
                "stats".to_string(),
                key.to_string(),
                count.clone(),
                amount.to_string(),
                String::new(),
            ]);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::export::{ExportFormat, ExportService, ReportKind};
    use crate::fees::{ObligationStatus, StatusEngine};
    use crate::reports::{DateRange, GroupBy, ObligationLine, ReportService};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn line(name: &str, category: &str) -> ObligationLine {
        let due_date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        ObligationLine {
            obligation_id: Uuid::nil(),
            student_id: Uuid::nil(),
            student_name: name.to_string(),
            admission_number: "A-7".to_string(),
            class_id: None,
            class_name: Some("Grade 5".to_string()),
            fee_category_id: Uuid::nil(),
            fee_category_name: category.to_string(),
            total_amount: dec!(1000),
            paid_amount: dec!(0),
            due_date,
            status: StatusEngine::derive_status(dec!(1000), dec!(0), due_date, today()),
        }
    }

    #[test]
    fn test_collection_csv_includes_summary() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
        )
        .unwrap();
        let report =
            ReportService::collection_report(&[line("Ann", "Lab, Science")], range, GroupBy::Category);
        let out = ExportService::render(ReportKind::Collection, &report, ExportFormat::Csv).unwrap();
        let text = String::from_utf8(out.body).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(out.filename, "collection-report.csv");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("\"Lab, Science\""));
        assert!(lines[2].starts_with("total,Total,1,1000,0,1000,0"));
    }

    #[test]
    fn test_outstanding_csv_row() {
        let report = ReportService::outstanding_dues(&[line("O'Neil \"Jr\"", "Bus")], 0, today());
        assert_eq!(report.rows[0].status, ObligationStatus::Overdue);
        let text = String::from_utf8(ExportService::to_csv(&report).unwrap()).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.contains("\"O'Neil \"\"Jr\"\"\""));
        assert!(row.ends_with(",45,overdue,high"));
    }
}
