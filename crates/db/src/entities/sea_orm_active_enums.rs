//! `SeaORM` active enums mirroring the Postgres enum types.
//!
//! Each enum converts to and from its `bursar-core` counterpart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use bursar_core::fees::types as core;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "fee_frequency")]
pub enum FeeFrequency {
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    #[sea_orm(string_value = "semester")]
    Semester,
    #[sea_orm(string_value = "annual")]
    Annual,
    #[sea_orm(string_value = "one-time")]
    OneTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "obligation_status")]
pub enum ObligationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "overdue")]
    Overdue,
    #[sea_orm(string_value = "waived")]
    Waived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "card")]
    Card,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "cheque")]
    Cheque,
    #[sea_orm(string_value = "online")]
    Online,
    #[sea_orm(string_value = "upi")]
    Upi,
}

// ============================================================================
// Conversions to and from core types
// ============================================================================

impl From<core::FeeFrequency> for FeeFrequency {
    fn from(value: core::FeeFrequency) -> Self {
        match value {
            core::FeeFrequency::Monthly => Self::Monthly,
            core::FeeFrequency::Quarterly => Self::Quarterly,
            core::FeeFrequency::Semester => Self::Semester,
            core::FeeFrequency::Annual => Self::Annual,
            core::FeeFrequency::OneTime => Self::OneTime,
        }
    }
}

impl From<FeeFrequency> for core::FeeFrequency {
    fn from(value: FeeFrequency) -> Self {
        match value {
            FeeFrequency::Monthly => Self::Monthly,
            FeeFrequency::Quarterly => Self::Quarterly,
            FeeFrequency::Semester => Self::Semester,
            FeeFrequency::Annual => Self::Annual,
            FeeFrequency::OneTime => Self::OneTime,
        }
    }
}

impl From<core::ObligationStatus> for ObligationStatus {
    fn from(value: core::ObligationStatus) -> Self {
        match value {
            core::ObligationStatus::Pending => Self::Pending,
            core::ObligationStatus::Partial => Self::Partial,
            core::ObligationStatus::Paid => Self::Paid,
            core::ObligationStatus::Overdue => Self::Overdue,
            core::ObligationStatus::Waived => Self::Waived,
        }
    }
}

impl From<ObligationStatus> for core::ObligationStatus {
    fn from(value: ObligationStatus) -> Self {
        match value {
            ObligationStatus::Pending => Self::Pending,
            ObligationStatus::Partial => Self::Partial,
            ObligationStatus::Paid => Self::Paid,
            ObligationStatus::Overdue => Self::Overdue,
            ObligationStatus::Waived => Self::Waived,
        }
    }
}

impl From<core::PaymentMethod> for PaymentMethod {
    fn from(value: core::PaymentMethod) -> Self {
        match value {
            core::PaymentMethod::Cash => Self::Cash,
            core::PaymentMethod::Card => Self::Card,
            core::PaymentMethod::BankTransfer => Self::BankTransfer,
            core::PaymentMethod::Cheque => Self::Cheque,
            core::PaymentMethod::Online => Self::Online,
            core::PaymentMethod::Upi => Self::Upi,
        }
    }
}

impl From<PaymentMethod> for core::PaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::Card => Self::Card,
            PaymentMethod::BankTransfer => Self::BankTransfer,
            PaymentMethod::Cheque => Self::Cheque,
            PaymentMethod::Online => Self::Online,
            PaymentMethod::Upi => Self::Upi,
        }
    }
}
