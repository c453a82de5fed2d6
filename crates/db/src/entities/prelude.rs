//! `SeaORM` entity prelude.

pub use super::class_teachers::Entity as ClassTeachers;
pub use super::classes::Entity as Classes;
pub use super::fee_categories::Entity as FeeCategories;
pub use super::payment_reversals::Entity as PaymentReversals;
pub use super::payments::Entity as Payments;
pub use super::student_fee_obligations::Entity as StudentFeeObligations;
pub use super::student_guardians::Entity as StudentGuardians;
pub use super::students::Entity as Students;
