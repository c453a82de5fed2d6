//! Fee and payment ledger logic.
//!
//! This module implements the rules behind the fee ledger:
//! - Fee category catalog validation
//! - Obligation assignment and waivers
//! - Payment acceptance and receipt numbering
//! - Status derivation
//! - Payment reversal policy
//! - Role-based authorization scope

pub mod assignment;
pub mod catalog;
pub mod error;
pub mod payment;
pub mod reversal;
pub mod scope;
pub mod status;
pub mod types;

#[cfg(test)]
mod payment_props;

pub use assignment::AssignmentService;
pub use catalog::CatalogService;
pub use error::FeeError;
pub use payment::PaymentService;
pub use reversal::{DEFAULT_REVERSAL_WINDOW_DAYS, ReversalPolicy};
pub use scope::{AuthorizationScope, Permission, Visibility};
pub use status::StatusEngine;
pub use types::{
    AcceptedPayment, AssignmentInput, Balance, CategoryInfo, CreateFeeCategoryInput, FeeFrequency,
    ObligationSnapshot, ObligationStatus, PaymentInput, PaymentMethod, PlannedObligation,
    ReversalResult, UpdateFeeCategoryInput,
};
