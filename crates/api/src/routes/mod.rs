//! API route definitions.

use std::str::FromStr;

use axum::{Router, middleware};
use bursar_shared::types::PageRequest;

use crate::{AppState, error::ApiError, middleware::auth::auth_middleware};

pub mod fee_categories;
pub mod fees;
pub mod health;
pub mod payments;
pub mod reports;

/// Creates the API router, with the ledger routes behind the auth middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(fee_categories::routes())
        .merge(fees::routes())
        .merge(payments::routes())
        .merge(reports::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Parses an optional query value with its `FromStr` impl.
pub(crate) fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    ApiError: From<T::Err>,
{
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(T::from_str)
        .transpose()
        .map_err(ApiError::from)
}

/// Builds a page request from optional query values.
pub(crate) fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(defaults.page),
        per_page: per_page.unwrap_or(defaults.per_page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bursar_core::fees::PaymentMethod;

    #[test]
    fn test_parse_opt() {
        assert_eq!(
            parse_opt::<PaymentMethod>(Some("cash")).unwrap(),
            Some(PaymentMethod::Cash)
        );
        assert_eq!(parse_opt::<PaymentMethod>(Some("  ")).unwrap(), None);
        assert_eq!(parse_opt::<PaymentMethod>(None).unwrap(), None);
        assert!(parse_opt::<PaymentMethod>(Some("barter")).is_err());
    }

    #[test]
    fn test_page_request_defaults() {
        let page = page_request(None, Some(50));
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 50);
    }
}
