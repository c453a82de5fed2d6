//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every ledger call takes the caller's [`AuthorizationScope`]: mutations check
//! the role's permission, reads are restricted to the visible students.
//!
//! [`AuthorizationScope`]: bursar_core::fees::AuthorizationScope

pub mod fee_category;
pub mod lines;
pub mod obligation;
pub mod payment;
pub mod report;
pub mod scope;
pub mod unit_of_work;

pub use fee_category::{FeeCategoryFilter, FeeCategoryRepository};
pub use lines::LedgerFilter;
pub use obligation::{
    ClassAssignmentInput, ObligationFilter, ObligationRepository, ObligationView,
};
pub use payment::{PaymentFilter, PaymentRepository, RecordedPayment};
pub use report::{ReportQueryError, ReportRepository};
pub use scope::{VisibleStudents, visible_students};
pub use unit_of_work::LedgerSettings;
