//! Fee category catalog rules.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::FeeError;
use super::types::{CreateFeeCategoryInput, UpdateFeeCategoryInput};

/// Stateless service for fee category validation.
pub struct CatalogService;

impl CatalogService {
    /// Validates a new category and returns its trimmed name.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::Required` for a blank name and
    /// `FeeError::NegativeFeeAmount` for an amount below zero.
    pub fn validate_create(input: &CreateFeeCategoryInput) -> Result<String, FeeError> {
        let name = Self::validate_name(&input.name)?;
        Self::validate_amount(input.amount)?;
        Ok(name)
    }

    /// Validates changes to an existing category.
    ///
    /// Once any obligation references the category only (de)activation is
    /// permitted, so every update is rejected.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::CategoryInUse` if the category is referenced,
    /// otherwise the same field errors as [`Self::validate_create`].
    pub fn validate_update(
        category_id: Uuid,
        input: &UpdateFeeCategoryInput,
        is_referenced: bool,
    ) -> Result<(), FeeError> {
        if is_referenced {
            return Err(FeeError::CategoryInUse(category_id));
        }
        if let Some(name) = &input.name {
            Self::validate_name(name)?;
        }
        if let Some(amount) = input.amount {
            Self::validate_amount(amount)?;
        }
        Ok(())
    }

    fn validate_name(name: &str) -> Result<String, FeeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FeeError::Required("name"));
        }
        Ok(name.to_string())
    }

    fn validate_amount(amount: Decimal) -> Result<(), FeeError> {
        if amount < Decimal::ZERO {
            return Err(FeeError::NegativeFeeAmount(amount));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::types::FeeFrequency;
    use rust_decimal_macros::dec;

    fn input(name: &str, amount: Decimal) -> CreateFeeCategoryInput {
        CreateFeeCategoryInput {
            name: name.to_string(),
            description: None,
            amount,
            frequency: FeeFrequency::Annual,
            is_mandatory: true,
            academic_year: Some("2025-2026".into()),
        }
    }

    #[test]
    fn test_create_validation() {
        assert_eq!(
            CatalogService::validate_create(&input("  Tuition ", dec!(1000))).unwrap(),
            "Tuition"
        );
        assert!(CatalogService::validate_create(&input("Free trip", dec!(0))).is_ok());
        assert!(matches!(
            CatalogService::validate_create(&input(" ", dec!(10))),
            Err(FeeError::Required("name"))
        ));
        assert!(matches!(
            CatalogService::validate_create(&input("Bus", dec!(-1))),
            Err(FeeError::NegativeFeeAmount(_))
        ));
    }

    #[test]
    fn test_update_rejected_once_referenced() {
        let changes = UpdateFeeCategoryInput {
            amount: Some(dec!(1200)),
            ..Default::default()
        };
        let id = Uuid::new_v4();
        assert!(CatalogService::validate_update(id, &changes, false).is_ok());
        let err = CatalogService::validate_update(id, &changes, true).unwrap_err();
        assert!(matches!(err, FeeError::CategoryInUse(got) if got == id));
        assert_eq!(err.http_status_code(), 422);
    }
}
