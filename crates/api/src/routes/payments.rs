//! Payment listing and reversal routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use bursar_core::fees::{PaymentMethod, ReversalResult};
use bursar_db::{
    LedgerFilter, PaymentFilter,
    entities::{payment_reversals, payments},
};
use bursar_shared::types::PageResponse;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{page_request, parse_opt};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the payment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments))
        .route("/payments/{payment_id}/reversal", post(reverse_payment))
        .route("/reversals", get(list_reversals))
}

/// Query parameters for listing payments.
#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    /// Filter by student.
    pub student_id: Option<Uuid>,
    /// Filter by class.
    pub class_id: Option<Uuid>,
    /// Filter by fee category.
    pub fee_category_id: Option<Uuid>,
    /// Filter by obligation.
    pub obligation_id: Option<Uuid>,
    /// Filter by payment method.
    pub method: Option<String>,
    /// Earliest payment date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Latest payment date (inclusive).
    pub date_to: Option<NaiveDate>,
    /// Page number (1-indexed, default: 1).
    pub page: Option<u32>,
    /// Items per page (default: 20, max: 100).
    pub per_page: Option<u32>,
}

/// Request body for reversing a payment.
#[derive(Debug, Deserialize)]
pub struct ReversalRequest {
    /// Why the payment is reversed.
    #[serde(default)]
    pub reason: String,
}

/// Query parameters for the reversal audit trail.
#[derive(Debug, Deserialize)]
pub struct ListReversalsQuery {
    /// Only reversals against this obligation.
    pub obligation_id: Option<Uuid>,
}

/// GET `/payments`
async fn list_payments(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<PageResponse<payments::Model>>, ApiError> {
    let filter = PaymentFilter {
        ledger: LedgerFilter {
            student_id: query.student_id,
            class_id: query.class_id,
            fee_category_id: query.fee_category_id,
        },
        obligation_id: query.obligation_id,
        method: parse_opt::<PaymentMethod>(query.method.as_deref())?,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let page = page_request(query.page, query.per_page);

    Ok(Json(
        state.payments().list(&auth.scope(), &filter, &page).await?,
    ))
}

/// POST `/payments/{payment_id}/reversal`
async fn reverse_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(payment_id): Path<Uuid>,
    Json(body): Json<ReversalRequest>,
) -> Result<Json<ReversalResult>, ApiError> {
    let result = state
        .payments()
        .reverse_payment(&auth.scope(), payment_id, &body.reason)
        .await?;
    info!(
        payment_id = %payment_id,
        reversal_id = %result.reversal_id,
        principal_id = %auth.principal_id(),
        "Payment reversed via API"
    );
    Ok(Json(result))
}

/// GET `/reversals`
async fn list_reversals(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListReversalsQuery>,
) -> Result<Json<Vec<payment_reversals::Model>>, ApiError> {
    let reversals = state
        .payments()
        .list_reversals(&auth.scope(), query.obligation_id)
        .await?;
    Ok(Json(reversals))
}
