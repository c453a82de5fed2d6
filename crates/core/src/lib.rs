//! Core business logic for Bursar.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `fees` - Fee catalog, obligation assignment, payment ledger rules and status derivation
//! - `reports` - Collection, outstanding, defaulter and payment analysis aggregation
//! - `export` - CSV and JSON rendering of reports

pub mod export;
pub mod fees;
pub mod reports;

pub use export::{CsvExport, ExportFormat, ExportService, RenderedExport, ReportKind};
pub use fees::{AuthorizationScope, FeeError, Permission, StatusEngine, Visibility};
pub use reports::{ReportError, ReportService};
