//! Report export to CSV and JSON.

mod records;

use std::str::FromStr;

use serde::Serialize;

use crate::reports::ReportError;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// The report serialized as JSON.
    Json,
}

impl ExportFormat {
    /// MIME type of the rendered body.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    /// File extension of the rendered body.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ReportError::InvalidFormat(s.to_string())),
        }
    }
}

/// Exportable report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Collection report.
    Collection,
    /// Outstanding dues.
    Outstanding,
    /// Defaulters.
    Defaulters,
    /// Payment analysis.
    PaymentAnalysis,
}

impl ReportKind {
    /// Returns the path segment naming the report.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Outstanding => "outstanding",
            Self::Defaulters => "defaulters",
            Self::PaymentAnalysis => "payment-analysis",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collection" => Ok(Self::Collection),
            "outstanding" => Ok(Self::Outstanding),
            "defaulters" => Ok(Self::Defaulters),
            "payment-analysis" | "payment_analysis" => Ok(Self::PaymentAnalysis),
            other => Err(ReportError::InvalidReportType(other.to_string())),
        }
    }
}

/// A report that can be flattened into CSV rows.
pub trait CsvExport {
    /// Column names.
    fn headers(&self) -> Vec<&'static str>;

    /// One record per row, in column order.
    fn records(&self) -> Vec<Vec<String>>;
}

/// A rendered export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedExport {
    /// MIME type.
    pub content_type: &'static str,
    /// Suggested file name.
    pub filename: String,
    /// Encoded body.
    pub body: Vec<u8>,
}

/// Stateless export renderer.
pub struct ExportService;

impl ExportService {
    /// Renders `report` in `format`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Export` if encoding fails.
    pub fn render<R>(
        kind: ReportKind,
        report: &R,
        format: ExportFormat,
    ) -> Result<RenderedExport, ReportError>
    where
        R: CsvExport + Serialize,
    {
        let body = match format {
            ExportFormat::Csv => Self::to_csv(report)?,
            ExportFormat::Json => {
                serde_json::to_vec(report).map_err(|e| ReportError::Export(e.to_string()))?
            }
        };

        Ok(RenderedExport {
            content_type: format.content_type(),
            filename: format!("{}-report.{}", kind.as_str(), format.extension()),
            body,
        })
    }

    /// Writes the header row then every record. Fields containing commas,
    /// quotes or newlines are quoted, with inner quotes doubled.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Export` if the writer fails.
    pub fn to_csv<R: CsvExport>(report: &R) -> Result<Vec<u8>, ReportError> {
        let mut csv = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        csv.write_record(report.headers())
            .map_err(|e| ReportError::Export(format!("CSV write error: {e}")))?;
        for record in report.records() {
            csv.write_record(&record)
                .map_err(|e| ReportError::Export(format!("CSV write error: {e}")))?;
        }

        csv.into_inner()
            .map_err(|e| ReportError::Export(format!("CSV flush error: {e}")))
    }
}
