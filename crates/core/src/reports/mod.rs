//! Fee report generation.
//!
//! This module provides pure aggregation over ledger lines:
//! - Collection report grouped by student, class, category or due date
//! - Outstanding dues with urgency levels
//! - Defaulters with risk levels
//! - Payment method and trend analysis

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use service::{DEFAULT_TOP_CATEGORIES, ReportService};
pub use types::*;
