//! Obligation routes: assignment, listing, balance, waiver and payment intake.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use bursar_core::fees::{AssignmentInput, Balance, ObligationStatus, PaymentInput, PaymentMethod};
use bursar_db::{
    ClassAssignmentInput, LedgerFilter, ObligationFilter, ObligationView, RecordedPayment,
    entities::student_fee_obligations,
};
use bursar_shared::types::PageResponse;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{page_request, parse_opt};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the obligation routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fees", get(list_fees))
        .route("/fees/assign/students", post(assign_to_students))
        .route("/fees/assign/class", post(assign_to_class))
        .route("/fees/{obligation_id}/balance", get(get_balance))
        .route("/fees/{obligation_id}/waive", post(waive))
        .route("/fees/{obligation_id}/payments", post(record_payment))
}

/// Request body for charging a list of students.
#[derive(Debug, Deserialize)]
pub struct AssignStudentsRequest {
    /// Fee category to charge.
    pub fee_category_id: Uuid,
    /// Students to charge.
    pub student_ids: Vec<Uuid>,
    /// Due date.
    pub due_date: NaiveDate,
    /// Discount per obligation (default 0).
    #[serde(default)]
    pub discount_amount: Decimal,
    /// Free-text remarks stored on every obligation.
    pub remarks: Option<String>,
}

/// Request body for charging a class roster.
#[derive(Debug, Deserialize)]
pub struct AssignClassRequest {
    /// Fee category to charge.
    pub fee_category_id: Uuid,
    /// Class whose active students are charged.
    pub class_id: Uuid,
    /// Due date.
    pub due_date: NaiveDate,
    /// Discount per obligation (default 0).
    #[serde(default)]
    pub discount_amount: Decimal,
    /// Free-text remarks stored on every obligation.
    pub remarks: Option<String>,
}

/// Response for a batch assignment.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    /// Number of obligations created.
    pub created: usize,
    /// Created obligations.
    pub data: Vec<student_fee_obligations::Model>,
}

/// Query parameters for listing obligations.
#[derive(Debug, Deserialize)]
pub struct ListFeesQuery {
    /// Filter by student.
    pub student_id: Option<Uuid>,
    /// Filter by class.
    pub class_id: Option<Uuid>,
    /// Filter by fee category.
    pub fee_category_id: Option<Uuid>,
    /// Filter by status: pending, partial, paid, overdue, waived.
    pub status: Option<String>,
    /// Earliest due date (inclusive).
    pub due_from: Option<NaiveDate>,
    /// Latest due date (inclusive).
    pub due_to: Option<NaiveDate>,
    /// Page number (1-indexed, default: 1).
    pub page: Option<u32>,
    /// Items per page (default: 20, max: 100).
    pub per_page: Option<u32>,
}

/// Request body for waiving an obligation.
#[derive(Debug, Deserialize)]
pub struct WaiveRequest {
    /// Why the obligation is waived.
    #[serde(default)]
    pub reason: String,
}

/// Request body for recording a payment.
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    /// Amount paid.
    pub amount: Decimal,
    /// Payment method: cash, card, bank_transfer, cheque, online or upi.
    pub method: String,
    /// External transaction reference.
    pub reference: Option<String>,
    /// Date received (default: today).
    pub payment_date: Option<NaiveDate>,
    /// Free-text remarks.
    pub remarks: Option<String>,
}

/// GET `/fees`
async fn list_fees(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListFeesQuery>,
) -> Result<Json<PageResponse<ObligationView>>, ApiError> {
    let filter = ObligationFilter {
        ledger: LedgerFilter {
            student_id: query.student_id,
            class_id: query.class_id,
            fee_category_id: query.fee_category_id,
        },
        status: parse_opt::<ObligationStatus>(query.status.as_deref())?,
        due_from: query.due_from,
        due_to: query.due_to,
    };
    let page = page_request(query.page, query.per_page);

    let fees = state
        .obligations()
        .list(&auth.scope(), &filter, &page)
        .await?;
    Ok(Json(fees))
}

/// POST `/fees/assign/students`
async fn assign_to_students(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AssignStudentsRequest>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    let input = AssignmentInput {
        fee_category_id: body.fee_category_id,
        student_ids: body.student_ids,
        due_date: body.due_date,
        discount_amount: body.discount_amount,
    };

    let created = state
        .obligations()
        .assign_to_students(&auth.scope(), input, body.remarks)
        .await?;
    Ok(created_response(created))
}

/// POST `/fees/assign/class`
async fn assign_to_class(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AssignClassRequest>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    let input = ClassAssignmentInput {
        fee_category_id: body.fee_category_id,
        class_id: body.class_id,
        due_date: body.due_date,
        discount_amount: body.discount_amount,
    };

    let created = state
        .obligations()
        .assign_to_class(&auth.scope(), input, body.remarks)
        .await?;
    Ok(created_response(created))
}

fn created_response(
    data: Vec<student_fee_obligations::Model>,
) -> (StatusCode, Json<AssignmentResponse>) {
    (
        StatusCode::CREATED,
        Json(AssignmentResponse {
            created: data.len(),
            data,
        }),
    )
}

/// GET `/fees/{obligation_id}/balance`
async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(obligation_id): Path<Uuid>,
) -> Result<Json<Balance>, ApiError> {
    let balance = state
        .obligations()
        .get_balance(&auth.scope(), obligation_id)
        .await?;
    Ok(Json(balance))
}

/// POST `/fees/{obligation_id}/waive`
async fn waive(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(obligation_id): Path<Uuid>,
    Json(body): Json<WaiveRequest>,
) -> Result<Json<student_fee_obligations::Model>, ApiError> {
    let obligation = state
        .obligations()
        .waive(&auth.scope(), obligation_id, &body.reason)
        .await?;
    Ok(Json(obligation))
}

/// POST `/fees/{obligation_id}/payments`
async fn record_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(obligation_id): Path<Uuid>,
    Json(body): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<RecordedPayment>), ApiError> {
    let method: PaymentMethod = body.method.trim().parse()?;
    let input = PaymentInput {
        amount: body.amount,
        method,
        reference: body.reference,
        payment_date: body.payment_date,
    };

    let recorded = state
        .payments()
        .record_payment(&auth.scope(), obligation_id, input, body.remarks)
        .await?;
    info!(
        obligation_id = %obligation_id,
        receipt_number = %recorded.payment.receipt_number,
        principal_id = %auth.principal_id(),
        "Payment recorded via API"
    );
    Ok((StatusCode::CREATED, Json(recorded)))
}
