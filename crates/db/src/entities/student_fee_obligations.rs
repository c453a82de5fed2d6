//! `SeaORM` Entity for student_fee_obligations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ObligationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "student_fee_obligations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub fee_category_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub base_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount_amount: Decimal,
    pub due_date: Date,
    pub status: ObligationStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// `base_amount - discount_amount`.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.base_amount - self.discount_amount
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Students,
    #[sea_orm(
        belongs_to = "super::fee_categories::Entity",
        from = "Column::FeeCategoryId",
        to = "super::fee_categories::Column::Id"
    )]
    FeeCategories,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_many = "super::payment_reversals::Entity")]
    PaymentReversals,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::fee_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeCategories.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::payment_reversals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentReversals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
