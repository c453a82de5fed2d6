//! Error responses.
//!
//! Every handler error becomes `{"error": CODE, "message": text}` with the
//! status code of the underlying [`AppError`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bursar_core::{FeeError, ReportError};
use bursar_db::repositories::ReportQueryError;
use bursar_shared::AppError;
use serde_json::json;
use tracing::error;

/// Handler error wrapping the application taxonomy.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// A validation error with the given message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<FeeError> for ApiError {
    fn from(err: FeeError) -> Self {
        Self(err.into())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        Self(err.into())
    }
}

impl From<ReportQueryError> for ApiError {
    fn from(err: ReportQueryError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Infrastructure details stay in the logs.
        let message = if status.is_server_error() && !err.is_retryable() {
            error!(error = %err, "Request failed");
            "An internal error occurred".to_string()
        } else {
            err.to_string()
        };

        let body = if err.is_retryable() {
            json!({ "error": err.error_code(), "message": message, "retryable": true })
        } else {
            json!({ "error": err.error_code(), "message": message })
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_overpayment_response() {
        let response = ApiError::from(FeeError::Overpayment {
            amount: dec!(500),
            pending: dec!(300),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(
            body["message"],
            "Validation error: Payment amount (500) cannot exceed pending amount (300)"
        );
    }

    #[tokio::test]
    async fn test_timeout_is_retryable() {
        let response = ApiError::from(FeeError::Timeout("lock timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["error"], "TRANSIENT_FAILURE");
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn test_database_error_is_masked() {
        let response =
            ApiError::from(FeeError::Database("relation missing".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
    }
}
