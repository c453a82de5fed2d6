//! Fee category repository.

use bursar_core::fees::{
    AuthorizationScope, CatalogService, CreateFeeCategoryInput, FeeError, Permission,
    UpdateFeeCategoryInput,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::unit_of_work::db_err;
use crate::entities::{fee_categories, student_fee_obligations};

/// Filters for listing fee categories.
#[derive(Debug, Clone, Default)]
pub struct FeeCategoryFilter {
    /// Only return active categories.
    pub active_only: bool,
    /// Only return categories for this academic year.
    pub academic_year: Option<String>,
}

/// Repository for the fee category catalog.
#[derive(Debug, Clone)]
pub struct FeeCategoryRepository {
    db: DatabaseConnection,
}

impl FeeCategoryRepository {
    /// Creates a new fee category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a fee category. Admin only.
    pub async fn create(
        &self,
        scope: &AuthorizationScope,
        input: CreateFeeCategoryInput,
    ) -> Result<fee_categories::Model, FeeError> {
        scope.require(Permission::ManageCatalog)?;
        let name = CatalogService::validate_create(&input)?;

        let now = Utc::now().into();
        let category = fee_categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(trimmed(input.description)),
            amount: Set(input.amount),
            frequency: Set(input.frequency.into()),
            is_mandatory: Set(input.is_mandatory),
            academic_year: Set(trimmed(input.academic_year)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        info!(fee_category_id = %category.id, name = %category.name, "Fee category created");
        Ok(category)
    }

    /// Updates a category that no obligation references yet.
    pub async fn update(
        &self,
        scope: &AuthorizationScope,
        category_id: Uuid,
        input: UpdateFeeCategoryInput,
    ) -> Result<fee_categories::Model, FeeError> {
        scope.require(Permission::ManageCatalog)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = fee_categories::Entity::find_by_id(category_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::CategoryNotFound(category_id))?;

        let references = student_fee_obligations::Entity::find()
            .filter(student_fee_obligations::Column::FeeCategoryId.eq(category_id))
            .count(&txn)
            .await
            .map_err(db_err)?;

        if let Err(e) = CatalogService::validate_update(category_id, &input, references > 0) {
            warn!(fee_category_id = %category_id, error = %e, "Fee category update rejected");
            return Err(e);
        }

        let mut active: fee_categories::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(trimmed(Some(description)));
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(frequency) = input.frequency {
            active.frequency = Set(frequency.into());
        }
        if let Some(is_mandatory) = input.is_mandatory {
            active.is_mandatory = Set(is_mandatory);
        }
        if let Some(academic_year) = input.academic_year {
            active.academic_year = Set(trimmed(Some(academic_year)));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(fee_category_id = %category_id, "Fee category updated");
        Ok(updated)
    }

    /// Activates or deactivates a category. Allowed whether or not it is
    /// referenced.
    pub async fn set_active(
        &self,
        scope: &AuthorizationScope,
        category_id: Uuid,
        is_active: bool,
    ) -> Result<fee_categories::Model, FeeError> {
        scope.require(Permission::ManageCatalog)?;

        let existing = self.get(category_id).await?;
        let mut active: fee_categories::ActiveModel = existing.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await.map_err(db_err)?;

        info!(fee_category_id = %category_id, is_active, "Fee category activation changed");
        Ok(updated)
    }

    /// Gets a category by ID.
    pub async fn get(&self, category_id: Uuid) -> Result<fee_categories::Model, FeeError> {
        fee_categories::Entity::find_by_id(category_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::CategoryNotFound(category_id))
    }

    /// Lists categories ordered by name.
    pub async fn list(
        &self,
        filter: &FeeCategoryFilter,
    ) -> Result<Vec<fee_categories::Model>, FeeError> {
        let mut condition = Condition::all();
        if filter.active_only {
            condition = condition.add(fee_categories::Column::IsActive.eq(true));
        }
        if let Some(year) = &filter.academic_year {
            condition = condition.add(fee_categories::Column::AcademicYear.eq(year.clone()));
        }

        fee_categories::Entity::find()
            .filter(condition)
            .order_by_asc(fee_categories::Column::Name)
            .order_by_asc(fee_categories::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
