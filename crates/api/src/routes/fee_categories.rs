//! Fee category catalog routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use bursar_core::fees::{CreateFeeCategoryInput, UpdateFeeCategoryInput};
use bursar_db::{FeeCategoryFilter, entities::fee_categories};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the fee category routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/fee-categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/fee-categories/{category_id}",
            get(get_category).patch(update_category),
        )
        .route(
            "/fee-categories/{category_id}/activation",
            post(set_activation),
        )
}

/// Query parameters for listing fee categories.
#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// Only active categories.
    pub active_only: Option<bool>,
    /// Only this academic year.
    pub academic_year: Option<String>,
}

/// Request body for (de)activating a category.
#[derive(Debug, Deserialize)]
pub struct ActivationRequest {
    /// New active flag.
    pub is_active: bool,
}

/// GET `/fee-categories`
async fn list_categories(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<Vec<fee_categories::Model>>, ApiError> {
    let filter = FeeCategoryFilter {
        active_only: query.active_only.unwrap_or(false),
        academic_year: query.academic_year,
    };
    Ok(Json(state.fee_categories().list(&filter).await?))
}

/// POST `/fee-categories`
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateFeeCategoryInput>,
) -> Result<(StatusCode, Json<fee_categories::Model>), ApiError> {
    let category = state.fee_categories().create(&auth.scope(), input).await?;
    info!(
        category_id = %category.id,
        principal_id = %auth.principal_id(),
        "Fee category created via API"
    );
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET `/fee-categories/{category_id}`
async fn get_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<Json<fee_categories::Model>, ApiError> {
    Ok(Json(state.fee_categories().get(category_id).await?))
}

/// PATCH `/fee-categories/{category_id}`
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(input): Json<UpdateFeeCategoryInput>,
) -> Result<Json<fee_categories::Model>, ApiError> {
    let category = state
        .fee_categories()
        .update(&auth.scope(), category_id, input)
        .await?;
    Ok(Json(category))
}

/// POST `/fee-categories/{category_id}/activation`
async fn set_activation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(body): Json<ActivationRequest>,
) -> Result<Json<fee_categories::Model>, ApiError> {
    let category = state
        .fee_categories()
        .set_active(&auth.scope(), category_id, body.is_active)
        .await?;
    Ok(Json(category))
}
