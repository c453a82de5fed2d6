//! `SeaORM` Entity for payment_reversals table.
//!
//! Rows are append-only: one per reversed payment, carrying a snapshot of the
//! deleted payment.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ObligationStatus, PaymentMethod};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_reversals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub payment_id: Uuid,
    pub obligation_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub transaction_reference: Option<String>,
    pub receipt_number: String,
    pub payment_date: Date,
    pub processed_by: Uuid,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub reversed_by: Uuid,
    pub reversed_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub paid_before: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub paid_after: Decimal,
    pub status_before: ObligationStatus,
    pub status_after: ObligationStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student_fee_obligations::Entity",
        from = "Column::ObligationId",
        to = "super::student_fee_obligations::Column::Id"
    )]
    StudentFeeObligations,
}

impl Related<super::student_fee_obligations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentFeeObligations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
