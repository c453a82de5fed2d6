//! `SeaORM` Entity for payments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PaymentMethod;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub obligation_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub payment_date: Date,
    pub method: PaymentMethod,
    pub transaction_reference: Option<String>,
    #[sea_orm(unique)]
    pub receipt_number: String,
    pub processed_by: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    pub created_at: DateTimeWithTimeZone,
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
