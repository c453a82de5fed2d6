//! `SeaORM` Entity for fee_categories table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::FeeFrequency;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fee_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub frequency: FeeFrequency,
    pub is_mandatory: bool,
    pub academic_year: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::student_fee_obligations::Entity")]
    StudentFeeObligations,
}

impl Related<super::student_fee_obligations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentFeeObligations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
