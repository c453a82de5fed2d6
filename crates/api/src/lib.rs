//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for the fee ledger and reports
//! - Authentication middleware
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use bursar_db::{
    FeeCategoryRepository, LedgerSettings, ObligationRepository, PaymentRepository,
    ReportRepository,
};
use bursar_shared::{JwtService, ReportConfig};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Ledger settings (receipt prefix, reversal window, timeouts).
    pub ledger: LedgerSettings,
    /// Report defaults.
    pub reports: ReportConfig,
}

impl AppState {
    /// Fee category repository over the shared connection.
    #[must_use]
    pub fn fee_categories(&self) -> FeeCategoryRepository {
        FeeCategoryRepository::new((*self.db).clone())
    }

    /// Obligation repository over the shared connection.
    #[must_use]
    pub fn obligations(&self) -> ObligationRepository {
        ObligationRepository::new((*self.db).clone(), self.ledger.clone())
    }

    /// Payment repository over the shared connection.
    #[must_use]
    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new((*self.db).clone(), self.ledger.clone())
    }

    /// Report repository over the shared connection.
    #[must_use]
    pub fn report_repository(&self) -> ReportRepository {
        ReportRepository::new((*self.db).clone(), self.reports.clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
