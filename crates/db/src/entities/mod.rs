//! `SeaORM` entity definitions.

pub mod prelude;

pub mod class_teachers;
pub mod classes;
pub mod fee_categories;
pub mod payment_reversals;
pub mod payments;
pub mod sea_orm_active_enums;
pub mod student_fee_obligations;
pub mod student_guardians;
pub mod students;
